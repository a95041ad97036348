//! Sidecar naming

use otumat_config::SidecarConfig;
use otumat_errors::{Error, PackageError};
use std::path::{Component, Path, PathBuf};

/// File extensions used for the two sidecars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarLayout {
    pub signature_extension: String,
    pub public_key_extension: String,
}

impl Default for SidecarLayout {
    fn default() -> Self {
        Self::from(&SidecarConfig::default())
    }
}

impl From<&SidecarConfig> for SidecarLayout {
    fn from(config: &SidecarConfig) -> Self {
        Self {
            signature_extension: config.signature_extension.clone(),
            public_key_extension: config.public_key_extension.clone(),
        }
    }
}

impl SidecarLayout {
    /// Sidecar locations for `package_name` inside `out_dir`
    #[must_use]
    pub fn paths(&self, out_dir: &Path, package_name: &str) -> SidecarPaths {
        SidecarPaths {
            signature: out_dir.join(format!("{package_name}{}", self.signature_extension)),
            public_key: out_dir.join(format!("{package_name}{}", self.public_key_extension)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarPaths {
    pub signature: PathBuf,
    pub public_key: PathBuf,
}

/// Package name: the final component of the package directory
///
/// # Errors
/// Returns [`PackageError::InvalidPackageDir`] if the directory has no
/// UTF-8 name of its own (for example `/`).
pub fn package_name(package_dir: &Path) -> Result<String, Error> {
    let absolute = absolute(package_dir)?;
    absolute
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| invalid_dir(package_dir))
}

/// Where sidecars go when no output directory is given: beside the package
///
/// # Errors
/// Returns [`PackageError::InvalidPackageDir`] if the directory has no parent.
pub fn default_out_dir(package_dir: &Path) -> Result<PathBuf, Error> {
    let absolute = absolute(package_dir)?;
    absolute
        .parent()
        .filter(|_| absolute.file_name().is_some())
        .map(Path::to_path_buf)
        .ok_or_else(|| invalid_dir(package_dir))
}

/// Refuse a sidecar location inside the package, since writing there would
/// change the digest being signed. Both paths are compared after resolving
/// symlinks and `..`, so `out_dir` may name a directory that does not exist
/// yet.
///
/// # Errors
/// Returns [`PackageError::SidecarInsideTree`] if `out_path` resolves to the
/// package directory or anything below it.
pub fn ensure_outside_tree(package_dir: &Path, out_path: &Path) -> Result<(), Error> {
    let package = resolve(package_dir)?;
    let out = resolve(out_path)?;
    if out.starts_with(&package) {
        return Err(PackageError::SidecarInsideTree {
            out_dir: out.display().to_string(),
            package_dir: package.display().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Canonical form of `path`: the nearest existing ancestor is canonicalized
/// and the missing remainder is appended lexically
fn resolve(path: &Path) -> Result<PathBuf, Error> {
    let absolute = std::path::absolute(path).map_err(|e| Error::io_with_path(&e, path))?;

    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = std::fs::canonicalize(ancestor) else {
            continue;
        };
        let Ok(rest) = absolute.strip_prefix(ancestor) else {
            continue;
        };
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => resolved.push(name),
                _ => {}
            }
        }
        return Ok(resolved);
    }

    Ok(absolute)
}

/// Absolute form of `path`, resolving a trailing `..` the way the tree
/// hasher does so both agree on the package's name
fn absolute(path: &Path) -> Result<PathBuf, Error> {
    let absolute = std::path::absolute(path).map_err(|e| Error::io_with_path(&e, path))?;
    if absolute.file_name().is_some() {
        return Ok(absolute);
    }
    std::fs::canonicalize(path).map_err(|e| Error::io_with_path(&e, path))
}

fn invalid_dir(path: &Path) -> Error {
    PackageError::InvalidPackageDir {
        path: path.display().to_string(),
    }
    .into()
}
