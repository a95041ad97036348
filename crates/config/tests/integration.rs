//! Integration tests for config

#[cfg(test)]
mod tests {
    use otumat_config::*;
    use otumat_errors::{ConfigError, Error};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &["OTUMAT_PRIVKEY_PATH", "OTUMAT_PUBKEY_PATH", "OTUMAT_EXCLUDE"];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[hash]
exclude = ["pycache", ".git"]

[keys]
private_key = "~/.keys/otumat.pem"
public_key = "/etc/otumat/otumat.pub"

[sidecar]
signature_extension = ".signature"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.hash.exclude, vec!["pycache", ".git"]);
        assert_eq!(
            config.keys.private_key,
            Some(PathBuf::from("~/.keys/otumat.pem"))
        );
        assert_eq!(
            config.public_key_path(),
            Some(PathBuf::from("/etc/otumat/otumat.pub"))
        );
        assert_eq!(config.sidecar.signature_extension, ".signature");
        assert_eq!(config.sidecar.public_key_extension, ".pub");
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[hash\nexclude = 3").unwrap();

        let err = Config::load_from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = Config::load_or_default(Some(missing.as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("OTUMAT_PRIVKEY_PATH", "/keys/private.pem");
        std::env::set_var("OTUMAT_PUBKEY_PATH", "/keys/public.pem");
        std::env::set_var("OTUMAT_EXCLUDE", "pycache, target ,,");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(
            config.private_key_path(),
            Some(PathBuf::from("/keys/private.pem"))
        );
        assert_eq!(
            config.public_key_path(),
            Some(PathBuf::from("/keys/public.pem"))
        );
        assert_eq!(config.hash.exclude, vec!["pycache", "target"]);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("OTUMAT_PRIVKEY_PATH", "  ");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));

        clear_env();
    }
}
