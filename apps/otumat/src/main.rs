//! otumat - hash, sign and verify package source trees
//!
//! Thin front end over the otumat crates. Command output goes to stdout,
//! logs and errors go to stderr.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands};
use crate::display::{CommandOutput, OutputRenderer};
use crate::error::CliError;
use clap::Parser;
use otumat_config::Config;
use otumat_errors::Error;
use otumat_package::{
    default_out_dir, ensure_outside_tree, verify_sidecars, write_sidecars, SidecarLayout,
    SidecarRequest,
};
use otumat_signing::{sign_tree, verify_tree};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    let result = run(cli).and_then(|output| {
        OutputRenderer::new(json_mode)
            .render(&output)
            .map_err(CliError::from)
    });

    if let Err(e) = result {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

/// Main application logic
fn run(cli: Cli) -> Result<CommandOutput, CliError> {
    info!("Starting otumat v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref())?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.command);
    config.validate()?;
    debug!("effective config: {config:?}");

    execute_command(cli.command, &config)
}

/// Execute the specified command
fn execute_command(command: Commands, config: &Config) -> Result<CommandOutput, CliError> {
    let hasher = config.tree_hasher();

    match command {
        Commands::Hash { dir, listing, .. } => {
            if listing {
                let listing = hasher.listing(&dir)?;
                Ok(CommandOutput::Listing {
                    digest: listing.digest(),
                    root: dir,
                    listing,
                })
            } else {
                let digest = hasher.digest(&dir)?;
                Ok(CommandOutput::Digest { root: dir, digest })
            }
        }

        Commands::Sign { dir, output, .. } => {
            let key = config.private_key_path().ok_or_else(|| {
                CliError::InvalidArguments(
                    "no private key: pass --key or set keys.private_key".to_string(),
                )
            })?;
            if let Some(path) = &output {
                ensure_outside_tree(&dir, path)?;
            }
            let signature = sign_tree(&key, &dir, &hasher)?;
            if let Some(path) = &output {
                fs::write(path, &signature).map_err(|e| Error::io_with_path(&e, path))?;
                info!("wrote signature to {}", path.display());
            }
            Ok(CommandOutput::Signature {
                root: dir,
                output,
                signature,
            })
        }

        Commands::Verify { dir, signature, .. } => {
            let key = config.public_key_path().ok_or_else(|| {
                CliError::InvalidArguments(
                    "no public key: pass --key or set keys.public_key".to_string(),
                )
            })?;
            let signature_text =
                fs::read_to_string(&signature).map_err(|e| Error::io_with_path(&e, &signature))?;
            verify_tree(&key, &dir, &signature_text, &hasher)?;
            Ok(CommandOutput::Verified { root: dir })
        }

        Commands::Package {
            package_dir,
            out_dir,
            ..
        } => {
            let out_dir = resolve_out_dir(&package_dir, out_dir)?;
            let layout = SidecarLayout::from(&config.sidecar);
            let private_key = config.private_key_path();
            let public_key = config.public_key_path();
            let report = write_sidecars(&SidecarRequest {
                package_dir: &package_dir,
                out_dir: &out_dir,
                private_key: private_key.as_deref(),
                public_key: public_key.as_deref(),
                layout: &layout,
                hasher: &hasher,
            })?;
            Ok(CommandOutput::Sidecars(report))
        }

        Commands::Check {
            package_dir,
            out_dir,
            ..
        } => {
            let out_dir = resolve_out_dir(&package_dir, out_dir)?;
            let layout = SidecarLayout::from(&config.sidecar);
            let digest = verify_sidecars(&package_dir, &out_dir, &layout, &hasher)?;
            Ok(CommandOutput::Checked {
                package_dir,
                digest,
            })
        }
    }
}

fn resolve_out_dir(package_dir: &Path, out_dir: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match out_dir {
        Some(dir) => Ok(dir),
        None => Ok(default_out_dir(package_dir)?),
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, command: &Commands) {
    let exclude = command.exclude_args();
    if exclude.no_default_excludes {
        config.hash.exclude.clear();
    }
    config.hash.exclude.extend(exclude.patterns.iter().cloned());

    match command {
        Commands::Sign { key: Some(key), .. } => {
            config.keys.private_key = Some(key.clone());
        }
        Commands::Verify { key: Some(key), .. } => {
            config.keys.public_key = Some(key.clone());
        }
        Commands::Package {
            privkey, pubkey, ..
        } => {
            if let Some(key) = privkey {
                config.keys.private_key = Some(key.clone());
            }
            if let Some(key) = pubkey {
                config.keys.public_key = Some(key.clone());
            }
        }
        _ => {}
    }
}

/// Initialize tracing/logging
///
/// Logs always go to stderr so stdout carries only command output.
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "warn,otumat=debug,otumat_config=debug,otumat_hash=debug,otumat_package=debug,otumat_signing=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
