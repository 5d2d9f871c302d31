//! Command-line front end: parses a subcommand, builds a `SessionConfig`
//! and a `LocalBackend`, and drives the matching engine operation to
//! completion. This is the only place in the workspace that calls
//! `std::process::exit` — every lower crate returns `Result` instead.

mod commands;
mod error;
mod support;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use backend::LocalBackend;
use error::EngineError;
use session::SessionConfig;
use volume::CipherParams;

/// An incremental directory backup engine, in the style of Duplicity.
#[derive(Parser)]
#[command(name = "duplirs", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Passphrase used for GPG symmetric encryption of volumes. Required
    /// for `backup`; must match the original passphrase for `restore` and
    /// `verify`.
    #[arg(long, env = "DUPLIRS_PASSPHRASE", global = true)]
    passphrase: Option<String>,

    /// Logging verbosity, 0 (errors only) through 5 (trace).
    #[arg(long, default_value_t = 3, global = true)]
    verbosity: u8,

    /// Separator used between hour/minute/second fields in remote
    /// filenames. Must not be one of `.`, `+`, `-`.
    #[arg(long, default_value_t = ':', global = true)]
    time_separator: char,
}

#[derive(Subcommand)]
enum Command {
    /// Back up `source` into `target`: full if `target` carries no
    /// matched chain yet, incremental otherwise.
    Backup { source: PathBuf, target: PathBuf },

    /// Restore `target` into `dest`, optionally as of `--time`.
    Restore {
        target: PathBuf,
        dest: PathBuf,

        /// Restore as of this time instead of the latest backup. Uses the
        /// same format backup filenames are stamped with, e.g.
        /// `2024-01-01T00:00:00Z`.
        #[arg(long)]
        time: Option<String>,
    },

    /// Print the backup and signature chains found in `target`, along
    /// with any orphans or anomalies.
    CollectionStatus { target: PathBuf },

    /// Restore `target` to a scratch directory and compare it against the
    /// live `source` tree, reporting the first mismatch found.
    Verify { source: PathBuf, target: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(cli) {
        eprintln!("duplirs: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), EngineError> {
    match cli.command {
        Command::Backup { source, target } => {
            let session = build_session(&target, &cli, None)?;
            let backend = open_backend(&target)?;
            commands::backup::run(&source, &session, &backend)
        }
        Command::Restore { target, dest, time } => {
            let restore_time = time
                .as_deref()
                .map(|token| {
                    naming::parse_time(token, cli.time_separator)
                        .ok_or_else(|| EngineError::message(format!("unrecognized --time value {token:?}")))
                })
                .transpose()?;
            let session = build_session(&target, &cli, restore_time)?;
            let backend = open_backend(&target)?;
            commands::restore::run(&dest, &session, &backend)
        }
        Command::CollectionStatus { target } => {
            let session = build_session(&target, &cli, None)?;
            let backend = open_backend(&target)?;
            commands::collection_status::run(&session, &backend)
        }
        Command::Verify { source, target } => {
            let session = build_session(&target, &cli, None)?;
            let backend = open_backend(&target)?;
            commands::verify::run(&source, &session, &backend)
        }
    }
}

/// `target` doubles as both the backend's storage root and the session's
/// archive directory: signatures and manifests live in the clear
/// alongside the encrypted volumes rather than in a separate local cache.
fn open_backend(target: &Path) -> Result<LocalBackend, EngineError> {
    std::fs::create_dir_all(target)
        .map_err(|err| EngineError::message(format!("creating {}: {err}", target.display())))?;
    Ok(LocalBackend::new(target))
}

fn build_session(
    target: &Path,
    cli: &Cli,
    restore_time: Option<OffsetDateTime>,
) -> Result<SessionConfig, EngineError> {
    let cipher_params = CipherParams {
        passphrase: cli.passphrase.clone(),
        ..Default::default()
    };

    let mut builder = SessionConfig::builder(target.to_path_buf(), OffsetDateTime::now_utc())
        .verbosity(cli.verbosity)
        .time_separator(cli.time_separator)
        .cipher_params(cipher_params);

    if let Some(t) = restore_time {
        builder = builder.restore_time(t);
    }

    Ok(builder.build()?)
}
