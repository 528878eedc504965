//! CLI for looper.

mod commands;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use looper_core::config::{self, LooperConfig};
use looper_core::LooperError;
use std::path::{Path, PathBuf};

use commands::{
    run_check_config, run_checksum, run_completions, run_init_config, run_ledger, run_loop,
};

/// Exit code for an integrity violation (checksum mismatch after copy).
pub const EXIT_INTEGRITY: i32 = 2;

/// Process exit status for a failed command: [`EXIT_INTEGRITY`] for a
/// checksum mismatch, 1 for anything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let fatal = err
        .downcast_ref::<LooperError>()
        .is_some_and(LooperError::is_fatal);
    if fatal {
        EXIT_INTEGRITY
    } else {
        1
    }
}

/// Top-level CLI for looper.
#[derive(Debug, Parser)]
#[command(name = "looper", version)]
#[command(about = "Copy files to a destination as they arrive, verified by checksum", long_about = None)]
pub struct Cli {
    /// Log to stderr instead of the log file under the XDG state dir.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Watch the source directory and copy settled files until interrupted.
    Run {
        /// Path to the TOML config file (default: ~/.config/looper/config.toml).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Run a single scan cycle and exit.
        #[arg(long)]
        once: bool,
    },

    /// Load and validate the config file, then print the effective settings.
    CheckConfig {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Write a commented template config file.
    InitConfig {
        /// Where to write it (default: ~/.config/looper/config.toml).
        path: Option<PathBuf>,
    },

    /// List source paths recorded as copied.
    Ledger {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Run { config, once } => {
                let cfg = load_config(config.as_deref())?;
                run_loop(cfg, once).await?;
            }
            CliCommand::CheckConfig { config } => {
                let path = config_file(config.as_deref())?;
                run_check_config(&path)?;
            }
            CliCommand::InitConfig { path } => {
                let path = match path {
                    Some(p) => p,
                    None => config::config_path()?,
                };
                run_init_config(&path)?;
            }
            CliCommand::Ledger { config } => {
                let cfg = load_config(config.as_deref())?;
                run_ledger(&cfg)?;
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

/// `--config` if given, else the XDG default; it must exist.
fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    if !path.exists() {
        bail!(
            "no config file at {}; pass --config or run `looper init-config`",
            path.display()
        );
    }
    Ok(path)
}

fn load_config(explicit: Option<&Path>) -> Result<LooperConfig> {
    let path = config_file(explicit)?;
    let cfg = config::load_from(&path)?;
    tracing::debug!("loaded config from {}: {:?}", path.display(), cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
