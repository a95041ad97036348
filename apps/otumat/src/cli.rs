//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// otumat - hash, sign and verify package source trees
#[derive(Parser)]
#[command(name = "otumat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hash, sign and verify package source trees")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Exclusion controls shared by every command that reads a tree
#[derive(Args, Debug, Clone, Default)]
pub struct ExcludeArgs {
    /// Skip path components containing PAT (repeatable)
    #[arg(long = "exclude", value_name = "PAT")]
    pub patterns: Vec<String>,

    /// Drop the configured exclusion patterns before adding --exclude ones
    #[arg(long)]
    pub no_default_excludes: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the tree digest of a directory
    Hash {
        /// Directory to hash
        dir: PathBuf,

        /// Print the tree listing instead of the digest
        #[arg(long)]
        listing: bool,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    /// Sign the tree digest of a directory
    Sign {
        /// Directory to sign
        dir: PathBuf,

        /// PEM private key (defaults to keys.private_key from config)
        #[arg(short, long, value_name = "PRIVATE_PEM")]
        key: Option<PathBuf>,

        /// Write the signature here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    /// Verify a directory against a signature file
    Verify {
        /// Directory to verify
        dir: PathBuf,

        /// PEM public key (defaults to keys.public_key from config)
        #[arg(short, long, value_name = "PUBLIC_PEM")]
        key: Option<PathBuf>,

        /// Signature text file
        #[arg(short, long, value_name = "FILE")]
        signature: PathBuf,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    /// Write signature and public key sidecars for a package
    Package {
        /// Package directory
        package_dir: PathBuf,

        /// Directory for the sidecars (defaults to the package's parent)
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// PEM private key used to sign
        #[arg(long, value_name = "PEM")]
        privkey: Option<PathBuf>,

        /// PEM public key copied next to the package
        #[arg(long, value_name = "PEM")]
        pubkey: Option<PathBuf>,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    /// Check a package against its sidecars
    Check {
        /// Package directory
        package_dir: PathBuf,

        /// Directory holding the sidecars (defaults to the package's parent)
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },
}

impl Commands {
    /// Exclusion overrides given for this command
    pub fn exclude_args(&self) -> &ExcludeArgs {
        match self {
            Commands::Hash { exclude, .. }
            | Commands::Sign { exclude, .. }
            | Commands::Verify { exclude, .. }
            | Commands::Package { exclude, .. }
            | Commands::Check { exclude, .. } => exclude,
        }
    }
}
