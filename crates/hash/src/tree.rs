//! Deterministic directory listing and tree digest
//!
//! The listing mirrors `git ls-files -s`: one line per regular file with a
//! fixed mode, the blob hash, a fixed stage and the path relative to the
//! root's parent directory. Lines are ordered by a sorted depth-first walk,
//! and the digest is the blob hash of the concatenated lines.

use crate::{object_hash, ExclusionSet, ObjectId};
use otumat_errors::{Error, InputError};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Git's regular-file mode, written out in its octal digits
pub const ENTRY_MODE: u32 = 100_644;

/// Index stage; always the merged stage
pub const ENTRY_STAGE: u8 = 0;

/// One regular file inside a hashed tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub mode: u32,
    pub content_hash: ObjectId,
    pub stage: u8,
    /// `/`-separated path starting with the root directory's own name
    pub relative_path: String,
}

impl TreeEntry {
    #[must_use]
    pub fn new(content_hash: ObjectId, relative_path: impl Into<String>) -> Self {
        Self {
            mode: ENTRY_MODE,
            content_hash,
            stage: ENTRY_STAGE,
            relative_path: relative_path.into(),
        }
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\t{}",
            self.mode, self.content_hash, self.stage, self.relative_path
        )
    }
}

/// Ordered entries of a tree, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeListing {
    entries: Vec<TreeEntry>,
}

impl TreeListing {
    #[must_use]
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The newline-terminated lines that the digest is computed over
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for entry in &self.entries {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{entry}");
        }
        out
    }

    /// Blob hash of the rendered listing
    #[must_use]
    pub fn digest(&self) -> ObjectId {
        object_hash(self.render().as_bytes())
    }
}

/// Walks a directory and reduces it to a single digest
#[derive(Debug, Clone, Default)]
pub struct TreeHasher {
    exclusions: ExclusionSet,
}

impl TreeHasher {
    #[must_use]
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self { exclusions }
    }

    #[must_use]
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Compute the tree digest of `root`
    ///
    /// # Errors
    /// Returns an [`InputError`] if the root is missing or not a directory, or
    /// if any visited file cannot be read as UTF-8 text.
    pub fn digest(&self, root: &Path) -> Result<ObjectId, Error> {
        Ok(self.listing(root)?.digest())
    }

    /// List every file under `root` in digest order
    ///
    /// # Errors
    /// Returns an [`InputError`] if the root is missing or not a directory, or
    /// if any visited file cannot be read as UTF-8 text.
    pub fn listing(&self, root: &Path) -> Result<TreeListing, Error> {
        let root = resolve_root(root)?;
        let base = root.parent().unwrap_or(root.as_path()).to_path_buf();

        let mut listing = TreeListing::default();

        let root_excluded = match root.file_name() {
            Some(name) => self.exclusions.is_excluded(utf8_name(name, &root)?),
            None => false,
        };
        if root_excluded {
            debug!("root {} is excluded, listing is empty", root.display());
            return Ok(listing);
        }

        let mut ancestors = Vec::new();
        self.visit_dir(&root, &base, &mut ancestors, &mut listing.entries)?;

        debug!(
            "hashed tree {} ({} files)",
            root.display(),
            listing.entries.len()
        );
        Ok(listing)
    }

    fn visit_dir(
        &self,
        dir: &Path,
        base: &Path,
        ancestors: &mut Vec<PathBuf>,
        entries: &mut Vec<TreeEntry>,
    ) -> Result<(), Error> {
        let identity = fs::canonicalize(dir).map_err(|e| InputError::from_io_with_path(&e, dir))?;
        if ancestors.contains(&identity) {
            return Err(InputError::SymlinkCycle {
                path: dir.display().to_string(),
            }
            .into());
        }
        ancestors.push(identity);

        let mut children = fs::read_dir(dir)
            .and_then(|read_dir| read_dir.collect::<Result<Vec<_>, _>>())
            .map_err(|e| InputError::from_io_with_path(&e, dir))?;
        children.sort_by_key(fs::DirEntry::file_name);

        for child in children {
            let path = child.path();
            let file_name = child.file_name();
            let name = utf8_name(&file_name, &path)?;

            if self.exclusions.is_excluded(name) {
                trace!("skipping excluded {}", path.display());
                continue;
            }

            // Follows symlinks, like the files they point to were in the tree
            let metadata =
                fs::metadata(&path).map_err(|e| InputError::from_io_with_path(&e, &path))?;

            if metadata.is_dir() {
                self.visit_dir(&path, base, ancestors, entries)?;
            } else if metadata.is_file() {
                entries.push(hash_file(&path, base)?);
            } else {
                return Err(InputError::UnsupportedFileType {
                    path: path.display().to_string(),
                }
                .into());
            }
        }

        ancestors.pop();
        Ok(())
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, Error> {
    let metadata = fs::metadata(root).map_err(|e| InputError::root_from_io(&e, root))?;
    if !metadata.is_dir() {
        return Err(InputError::NotADirectory {
            path: root.display().to_string(),
        }
        .into());
    }

    let absolute = std::path::absolute(root).map_err(|e| Error::io_with_path(&e, root))?;
    if absolute.file_name().is_some() {
        return Ok(absolute);
    }

    // `..` suffixes and `/` have no name of their own
    fs::canonicalize(root).map_err(|e| InputError::root_from_io(&e, root).into())
}

fn hash_file(path: &Path, base: &Path) -> Result<TreeEntry, Error> {
    let contents =
        fs::read_to_string(path).map_err(|e| InputError::from_io_with_path(&e, path))?;
    let content_hash = object_hash(contents.as_bytes());
    let relative_path = posix_relative_path(path, base)?;

    trace!("{content_hash} {relative_path}");
    Ok(TreeEntry::new(content_hash, relative_path))
}

fn posix_relative_path(path: &Path, base: &Path) -> Result<String, Error> {
    let relative = path.strip_prefix(base).map_err(|_| {
        Error::internal(format!(
            "{} is not under {}",
            path.display(),
            base.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(name) = component {
            parts.push(utf8_name(name, path)?);
        }
    }
    Ok(parts.join("/"))
}

fn utf8_name<'a>(name: &'a std::ffi::OsStr, path: &Path) -> Result<&'a str, Error> {
    name.to_str().ok_or_else(|| {
        InputError::NonUtf8Path {
            path: path.display().to_string(),
        }
        .into()
    })
}
