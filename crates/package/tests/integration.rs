//! Integration tests for sidecar artifacts

#[cfg(test)]
mod tests {
    use otumat_errors::{Error, PackageError};
    use otumat_hash::TreeHasher;
    use otumat_package::*;
    use rand::rngs::OsRng;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;
    use tempfile::TempDir;

    fn generate() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut OsRng, 1024).unwrap()
    }

    fn key_a() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(generate)
    }

    fn key_b() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(generate)
    }

    struct Fixture {
        _temp: TempDir,
        package_dir: PathBuf,
        out_dir: PathBuf,
        private_key: PathBuf,
        public_key: PathBuf,
    }

    fn write_pem(path: &Path, pem: &str) {
        fs::write(path, pem).unwrap();
    }

    fn fixture(private: &RsaPrivateKey, public: &RsaPrivateKey) -> Fixture {
        let temp = TempDir::new().unwrap();
        let package_dir = temp.path().join("src/demo");
        fs::create_dir_all(package_dir.join("__pycache__")).unwrap();
        fs::write(package_dir.join("__init__.py"), "from .core import run\n").unwrap();
        fs::write(package_dir.join("core.py"), "def run():\n    return 42\n").unwrap();
        fs::write(package_dir.join("__pycache__/core.cpython-312.pyc"), b"\x00\xff").unwrap();

        let keys = temp.path().join("keys");
        fs::create_dir_all(&keys).unwrap();
        let private_key = keys.join("private.pem");
        let public_key = keys.join("public.pem");
        write_pem(&private_key, &private.to_pkcs8_pem(LineEnding::LF).unwrap());
        write_pem(
            &public_key,
            &public
                .to_public_key()
                .to_public_key_pem(LineEnding::LF)
                .unwrap(),
        );

        Fixture {
            out_dir: temp.path().join("dist"),
            _temp: temp,
            package_dir,
            private_key,
            public_key,
        }
    }

    fn request<'a>(
        fx: &'a Fixture,
        layout: &'a SidecarLayout,
        hasher: &'a TreeHasher,
    ) -> SidecarRequest<'a> {
        SidecarRequest {
            package_dir: &fx.package_dir,
            out_dir: &fx.out_dir,
            private_key: Some(&fx.private_key),
            public_key: Some(&fx.public_key),
            layout,
            hasher,
        }
    }

    #[test]
    fn test_write_then_verify() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();

        let report = write_sidecars(&request(&fx, &layout, &hasher)).unwrap();
        assert_eq!(report.package, "demo");
        assert_eq!(report.signature, Some(fx.out_dir.join("demo.sig")));
        assert_eq!(report.public_key, Some(fx.out_dir.join("demo.pub")));

        let signature = fs::read_to_string(fx.out_dir.join("demo.sig")).unwrap();
        assert!(signature.ends_with('\n'));
        assert_eq!(
            fs::read(fx.out_dir.join("demo.pub")).unwrap(),
            fs::read(&fx.public_key).unwrap()
        );

        let digest = verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap();
        assert_eq!(Some(digest), report.digest);
    }

    #[test]
    fn test_modified_package_is_rejected() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        write_sidecars(&request(&fx, &layout, &hasher)).unwrap();

        fs::write(fx.package_dir.join("core.py"), "def run():\n    return 43\n").unwrap();

        let err = verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap_err();
        assert!(err.is_verification_failure());
    }

    #[test]
    fn test_cache_files_do_not_invalidate() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        write_sidecars(&request(&fx, &layout, &hasher)).unwrap();

        fs::write(fx.package_dir.join("__pycache__/new.pyc"), b"\x01").unwrap();
        verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap();
    }

    #[test]
    fn test_mismatched_keys_write_nothing() {
        let fx = fixture(key_a(), key_b());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();

        let err = write_sidecars(&request(&fx, &layout, &hasher)).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::KeyMismatch { .. })
        ));
        assert!(!fx.out_dir.join("demo.sig").exists());
        assert!(!fx.out_dir.join("demo.pub").exists());
    }

    #[test]
    fn test_no_keys_is_an_error() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();

        let mut req = request(&fx, &layout, &hasher);
        req.private_key = None;
        req.public_key = None;

        let err = write_sidecars(&req).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::NothingToWrite { .. })
        ));
    }

    #[test]
    fn test_unconfigured_sidecar_is_left_alone() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();

        fs::create_dir_all(&fx.out_dir).unwrap();
        fs::write(fx.out_dir.join("demo.pub"), "stale").unwrap();

        let mut req = request(&fx, &layout, &hasher);
        req.public_key = None;
        let report = write_sidecars(&req).unwrap();

        assert!(report.signature.is_some());
        assert!(report.public_key.is_none());
        assert_eq!(
            fs::read_to_string(fx.out_dir.join("demo.pub")).unwrap(),
            "stale"
        );
    }

    #[test]
    fn test_public_key_only() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();

        let mut req = request(&fx, &layout, &hasher);
        req.private_key = None;
        let report = write_sidecars(&req).unwrap();

        assert!(report.digest.is_none());
        assert!(fx.out_dir.join("demo.pub").exists());
        assert!(!fx.out_dir.join("demo.sig").exists());

        let err = verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::MissingSidecar { .. })
        ));
    }

    #[test]
    fn test_sidecars_inside_package_are_refused() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        let inside = fx.package_dir.join("meta");

        let mut req = request(&fx, &layout, &hasher);
        req.out_dir = &inside;

        let err = write_sidecars(&req).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::SidecarInsideTree { .. })
        ));
        assert!(!inside.exists());
    }

    #[test]
    fn test_parent_components_cannot_reach_into_package() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        let indirect = fx.package_dir.join("../missing/../demo/meta");

        let mut req = request(&fx, &layout, &hasher);
        req.out_dir = &indirect;

        let err = write_sidecars(&req).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::SidecarInsideTree { .. })
        ));
        assert!(!fx.package_dir.join("meta").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_out_dir_into_package_is_refused() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        std::os::unix::fs::symlink(&fx.package_dir, &fx.out_dir).unwrap();

        let err = write_sidecars(&request(&fx, &layout, &hasher)).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::SidecarInsideTree { .. })
        ));
        assert!(!fx.package_dir.join("demo.sig").exists());
        verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap_err();
    }

    #[test]
    fn test_failed_public_key_write_leaves_no_signature() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout::default();
        let hasher = TreeHasher::default();
        // A directory in the way makes the final rename fail
        fs::create_dir_all(fx.out_dir.join("demo.pub/occupied")).unwrap();

        let err = write_sidecars(&request(&fx, &layout, &hasher)).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::WriteFailed { .. })
        ));
        assert!(!fx.out_dir.join("demo.sig").exists());

        let leftovers: Vec<_> = fs::read_dir(&fx.out_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("demo.pub")]);
    }

    #[test]
    fn test_custom_layout_round_trip() {
        let fx = fixture(key_a(), key_a());
        let layout = SidecarLayout {
            signature_extension: ".cert".to_string(),
            public_key_extension: ".pem".to_string(),
        };
        let hasher = TreeHasher::default();

        write_sidecars(&request(&fx, &layout, &hasher)).unwrap();
        assert!(fx.out_dir.join("demo.cert").exists());
        assert!(fx.out_dir.join("demo.pem").exists());

        verify_sidecars(&fx.package_dir, &fx.out_dir, &layout, &hasher).unwrap();
        let err = verify_sidecars(
            &fx.package_dir,
            &fx.out_dir,
            &SidecarLayout::default(),
            &hasher,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::MissingSidecar { .. })
        ));
    }
}
