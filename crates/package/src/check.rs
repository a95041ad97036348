//! Checking sidecars at install or audit time

use crate::layout::package_name;
use crate::SidecarLayout;
use otumat_errors::{Error, PackageError};
use otumat_hash::{ObjectId, TreeHasher};
use otumat_signing::{verify, PublicKey};
use std::fs;
use std::path::Path;
use tracing::info;

/// Recompute the package digest and verify it against the shipped sidecars.
/// Returns the verified digest.
///
/// # Errors
/// Returns [`PackageError::MissingSidecar`] if either sidecar is absent, and
/// a verification failure if the package or its signature was altered.
pub fn verify_sidecars(
    package_dir: &Path,
    out_dir: &Path,
    layout: &SidecarLayout,
    hasher: &TreeHasher,
) -> Result<ObjectId, Error> {
    let name = package_name(package_dir)?;
    let paths = layout.paths(out_dir, &name);

    let signature_text = read_sidecar(&paths.signature)?;
    let public_key = PublicKey::from_pem(&read_sidecar(&paths.public_key)?)?;

    let digest = hasher.digest(package_dir)?;
    verify(&public_key, &digest.to_hex(), &signature_text)?;

    info!("{name} verified (digest {digest})");
    Ok(digest)
}

fn read_sidecar(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PackageError::MissingSidecar {
            path: path.display().to_string(),
        }
        .into(),
        _ => Error::io_with_path(&e, path),
    })
}
