//! Writing sidecars at packaging time

use crate::layout::{ensure_outside_tree, package_name};
use crate::SidecarLayout;
use otumat_errors::{Error, PackageError, SigningError};
use otumat_hash::{ObjectId, TreeHasher};
use otumat_signing::{sign, verify_signature, PrivateKey, PublicKey, Signature};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Everything needed to produce a package's sidecars
#[derive(Debug, Clone, Copy)]
pub struct SidecarRequest<'a> {
    pub package_dir: &'a Path,
    pub out_dir: &'a Path,
    pub private_key: Option<&'a Path>,
    pub public_key: Option<&'a Path>,
    pub layout: &'a SidecarLayout,
    pub hasher: &'a TreeHasher,
}

/// What [`write_sidecars`] produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidecarReport {
    pub package: String,
    /// Tree digest that was signed, if a private key was configured
    pub digest: Option<ObjectId>,
    pub signature: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
}

/// Sign the package and write its sidecars.
///
/// Keys are loaded and the signature is produced before any file is
/// written. With both keys configured the signature must verify under the
/// public key. A sidecar whose key is not configured is left as it is.
///
/// # Errors
/// Returns an error if no key is configured, a key is unusable, the keys do
/// not form a pair, the tree cannot be hashed, or a sidecar cannot be written.
pub fn write_sidecars(request: &SidecarRequest<'_>) -> Result<SidecarReport, Error> {
    let name = package_name(request.package_dir)?;
    if request.private_key.is_none() && request.public_key.is_none() {
        return Err(PackageError::NothingToWrite { package: name }.into());
    }
    ensure_outside_tree(request.package_dir, request.out_dir)?;

    let paths = request.layout.paths(request.out_dir, &name);

    let public_key = request.public_key.map(read_public_key).transpose()?;

    let signed = match request.private_key {
        Some(path) => {
            let key = PrivateKey::from_pem_file(path)?;
            let digest = request.hasher.digest(request.package_dir)?;
            let signature = sign(&key, &digest.to_hex())?;
            Some((digest, signature))
        }
        None => None,
    };

    if let (Some((digest, signature)), Some((key, _))) = (&signed, &public_key) {
        check_pair(key, digest, signature, request.public_key)?;
    }

    fs::create_dir_all(request.out_dir).map_err(|e| write_failed(request.out_dir, &e))?;

    let mut report = SidecarReport {
        package: name.clone(),
        digest: None,
        signature: None,
        public_key: None,
    };

    // Both files are staged before either is moved into place
    let staged_signature = signed
        .as_ref()
        .map(|(_, signature)| stage(request.out_dir, signature.to_text().as_bytes()))
        .transpose()?;
    let staged_public_key = public_key
        .as_ref()
        .map(|(_, pem)| stage(request.out_dir, pem))
        .transpose()?;

    if let Some(staged) = staged_signature {
        persist(staged, &paths.signature)?;
    }
    if let Some(staged) = staged_public_key {
        if let Err(e) = persist(staged, &paths.public_key) {
            if signed.is_some() {
                let _ = fs::remove_file(&paths.signature);
            }
            return Err(e);
        }
    }

    match signed {
        Some((digest, _)) => {
            info!("wrote {} (digest {digest})", paths.signature.display());
            report.digest = Some(digest);
            report.signature = Some(paths.signature);
        }
        None => warn_if_stale(&paths.signature, &name),
    }

    if public_key.is_some() {
        info!("wrote {}", paths.public_key.display());
        report.public_key = Some(paths.public_key);
    } else {
        warn_if_stale(&paths.public_key, &name);
    }

    Ok(report)
}

fn stage(out_dir: &Path, contents: &[u8]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new_in(out_dir).map_err(|e| write_failed(out_dir, &e))?;
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|e| write_failed(file.path(), &e))?;
    Ok(file)
}

fn persist(file: NamedTempFile, path: &Path) -> Result<(), Error> {
    file.persist(path)
        .map(|_| ())
        .map_err(|e| write_failed(path, &e.error))
}

/// Parse the key for validation but keep the original bytes for the sidecar
fn read_public_key(path: &Path) -> Result<(PublicKey, Vec<u8>), Error> {
    let pem = fs::read(path).map_err(|e| Error::io_with_path(&e, path))?;
    let text = std::str::from_utf8(&pem).map_err(|_| SigningError::KeyFormat {
        message: format!("{} is not PEM text", path.display()),
    })?;
    let key = PublicKey::from_pem(text)?;
    Ok((key, pem))
}

fn check_pair(
    key: &PublicKey,
    digest: &ObjectId,
    signature: &Signature,
    public_key_path: Option<&Path>,
) -> Result<(), Error> {
    verify_signature(key, &digest.to_hex(), signature).map_err(|e| {
        if e.is_verification_failure() {
            PackageError::KeyMismatch {
                public_key: public_key_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            }
            .into()
        } else {
            e
        }
    })
}

fn warn_if_stale(path: &Path, package: &str) {
    if path.exists() {
        warn!(
            "{} exists but no key for it is configured; leaving it unchanged for {package}",
            path.display()
        );
    }
}

fn write_failed(path: &Path, err: &std::io::Error) -> Error {
    PackageError::WriteFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}
