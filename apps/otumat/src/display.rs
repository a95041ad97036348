//! Output rendering and formatting

use otumat_hash::{ObjectId, TreeListing};
use otumat_package::SidecarReport;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// What a command produced
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutput {
    Digest {
        root: PathBuf,
        digest: ObjectId,
    },
    Listing {
        root: PathBuf,
        digest: ObjectId,
        #[serde(flatten)]
        listing: TreeListing,
    },
    Signature {
        root: PathBuf,
        /// File the signature was written to, `None` when printed
        output: Option<PathBuf>,
        signature: String,
    },
    Verified {
        root: PathBuf,
    },
    Sidecars(SidecarReport),
    Checked {
        package_dir: PathBuf,
        digest: ObjectId,
    },
}

/// Output renderer for CLI results
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render a command result to stdout
    pub fn render(&self, output: &CommandOutput) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render_to(&mut out, output)
    }

    fn render_to(&self, out: &mut impl Write, output: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(output).map_err(io::Error::other)?;
            return writeln!(out, "{json}");
        }

        match output {
            CommandOutput::Digest { digest, .. } => writeln!(out, "{digest}"),
            CommandOutput::Listing { listing, .. } => write!(out, "{}", listing.render()),
            CommandOutput::Signature {
                output: None,
                signature,
                ..
            } => write!(out, "{signature}"),
            CommandOutput::Signature {
                output: Some(path), ..
            } => writeln!(out, "Signature written to {}", path.display()),
            CommandOutput::Verified { root } => writeln!(out, "[OK] {} verified", root.display()),
            CommandOutput::Sidecars(report) => {
                for path in report.signature.iter().chain(report.public_key.iter()) {
                    writeln!(out, "Wrote {}", path.display())?;
                }
                Ok(())
            }
            CommandOutput::Checked {
                package_dir,
                digest,
            } => writeln!(out, "[OK] {} verified (digest {digest})", package_dir.display()),
        }
    }
}
