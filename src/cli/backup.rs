//! Backup and restore CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use crate::backup::{Reconciler, RestoreMode, Snapshotter};
use crate::concurrency::cancel_pair;
use crate::config::{Settings, SplitItPaths};
use crate::display::{format_preview, format_snapshot_history};
use crate::error::{SplitError, SplitResult};
use crate::storage::{Ledger, LedgerStore};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot the whole ledger
    Create,

    /// List retained snapshots
    List,

    /// Write a snapshot to a file or stdout
    Export {
        /// Snapshot ID (defaults to the latest)
        snapshot: Option<String>,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Restore subcommands
#[derive(Subcommand)]
pub enum RestoreCommands {
    /// Check a snapshot file's structure and checksum
    Validate {
        file: PathBuf,
    },

    /// Show what restoring a snapshot would change
    Preview {
        file: PathBuf,

        /// replace or merge
        #[arg(short, long, default_value = "merge")]
        mode: RestoreMode,
    },

    /// Restore a snapshot into the ledger
    Apply {
        file: PathBuf,

        /// replace or merge
        #[arg(short, long, default_value = "merge")]
        mode: RestoreMode,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

fn snapshot_owner(settings: &Settings) -> &str {
    if settings.owner.trim().is_empty() {
        "local"
    } else {
        &settings.owner
    }
}

/// Handle a backup command
pub async fn handle_backup_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    paths: &SplitItPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> SplitResult<()> {
    let snapshotter = Snapshotter::new(
        ledger,
        paths.clone(),
        settings.snapshot_retention.clone(),
    );

    match cmd {
        BackupCommands::Create => {
            let envelope = snapshotter
                .create(snapshot_owner(settings), ledger.store().store_id())
                .await?;
            println!("Snapshot created: {}", envelope.metadata.id);
            println!("  Contents: {}", envelope.data.counts());
            println!("  Checksum: {}", envelope.checksum);
        }

        BackupCommands::List => {
            let history = snapshotter.history().await?;
            print!("{}", format_snapshot_history(&history));
        }

        BackupCommands::Export { snapshot, output } => {
            let envelope = match snapshot {
                Some(id) => snapshotter.load(&id).await?,
                None => snapshotter.latest().await?.ok_or_else(|| {
                    SplitError::Config(
                        "No snapshots yet. Create one with: splitit backup create".into(),
                    )
                })?,
            };
            let bytes = snapshotter.export(&envelope)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &bytes).await?;
                    eprintln!("Exported {} to {}", envelope.metadata.id, path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
    }

    Ok(())
}

/// Handle a restore command
pub async fn handle_restore_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    paths: &SplitItPaths,
    settings: &Settings,
    cmd: RestoreCommands,
) -> SplitResult<()> {
    let reconciler = Reconciler::new(ledger);

    match cmd {
        RestoreCommands::Validate { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let report = reconciler.validate(&bytes);
            println!("{}", report.summary());
            if !report.valid {
                return Err(SplitError::Integrity(report.errors));
            }
        }

        RestoreCommands::Preview { file, mode } => {
            let bytes = tokio::fs::read(&file).await?;
            let envelope = reconciler.parse(&bytes)?;
            let preview = reconciler.preview(&envelope, mode).await?;
            print!("{}", format_preview(&preview));
        }

        RestoreCommands::Apply { file, mode, force } => {
            let bytes = tokio::fs::read(&file).await?;
            let envelope = reconciler.parse(&bytes)?;

            if !force {
                let preview = reconciler.preview(&envelope, mode).await?;
                print!("{}", format_preview(&preview));
                println!();
                if mode == RestoreMode::Replace {
                    println!("WARNING: replace overwrites every matching record!");
                }
                println!("To proceed, run again with --force flag:");
                println!("  splitit restore apply {} --mode {} --force", file.display(), mode);
                return Ok(());
            }

            println!("Creating snapshot of current data before restore...");
            let safety = Snapshotter::new(
                ledger,
                paths.clone(),
                settings.snapshot_retention.clone(),
            )
            .create(snapshot_owner(settings), ledger.store().store_id())
            .await?;
            println!("Pre-restore snapshot saved: {}", safety.metadata.id);

            let (handle, token) = cancel_pair();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.cancel();
                }
            });
            let result = reconciler.apply(&envelope, mode, &token).await;
            watcher.abort();

            let summary = result?;
            println!("Restore complete!");
            println!("{}", summary.summary());
        }
    }

    Ok(())
}
