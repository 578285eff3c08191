use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use splitit::cli::{
    handle_backup_command, handle_balances_command, handle_expense_command, handle_group_command,
    handle_notifications_command, handle_participant_command, handle_restore_command,
    handle_settle_command, open_ledger, BackupCommands, BalancesArgs, ExpenseCommands,
    GroupCommands, NotificationsArgs, ParticipantCommands, RestoreCommands, SettleArgs,
};
use splitit::config::{Settings, SplitItPaths};
use splitit::models::ParticipantKey;
use splitit::services::ParticipantService;
use splitit::storage::LedgerStore;

#[derive(Parser)]
#[command(
    name = "splitit",
    author = "Kaylee Beyene",
    version,
    about = "Shared expense ledger with debt simplification",
    long_about = "SplitIt records shared expenses and settlements within groups, \
                  keeps a minimal set of who-owes-whom balances, and takes \
                  checksummed snapshots that can be restored or merged."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize SplitIt with an owner identity
    Init {
        /// Your participant key (usually an email address)
        #[arg(short, long)]
        owner: String,
        /// Default currency for new groups
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Show configuration
    Config,

    /// Participant management commands
    #[command(subcommand)]
    Participant(ParticipantCommands),

    /// Group management commands
    #[command(subcommand)]
    Group(GroupCommands),

    /// Expense commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Record a settlement payment
    Settle(SettleArgs),

    /// Show simplified balances
    Balances(BalancesArgs),

    /// Show activity notifications
    Notifications(NotificationsArgs),

    /// Snapshot commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Restore commands
    #[command(subcommand)]
    Restore(RestoreCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPLITIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = SplitItPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("SplitIt - shared expenses, simplified");
        println!();
        println!("Run 'splitit --help' for usage information.");
        println!("Run 'splitit init --owner <email>' to get started.");
        return Ok(());
    };

    if let Commands::Init { owner, currency } = &command {
        paths.ensure_directories()?;
        settings.owner = owner.trim().to_lowercase();
        if let Some(currency) = currency {
            settings.default_currency = currency.trim().to_uppercase();
        }
        settings.save(&paths)?;

        let ledger = open_ledger(&paths, &settings).await?;
        let me = ParticipantService::new(&ledger)
            .get_or_create(&ParticipantKey::new(&settings.owner))
            .await?;

        println!("Initialized SplitIt at: {}", paths.base_dir().display());
        println!("  Owner:            {}", me.key);
        println!("  Default currency: {}", settings.default_currency);
        return Ok(());
    }

    let ledger = open_ledger(&paths, &settings).await?;

    match command {
        Commands::Init { .. } => {}
        Commands::Config => {
            println!("SplitIt Configuration");
            println!("=====================");
            println!("Base directory:     {}", paths.base_dir().display());
            println!("Data directory:     {}", paths.data_dir().display());
            println!("Snapshot directory: {}", paths.snapshot_dir().display());
            println!("Audit log:          {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Owner:            {}", settings.owner);
            println!("  Default currency: {}", settings.default_currency);
            println!(
                "  Snapshots kept:   {}",
                settings.snapshot_retention.max_snapshots
            );
            println!(
                "  Store retries:    {} attempts, {} ms timeout",
                settings.retry.max_attempts, settings.retry.call_timeout_ms
            );
            println!("  Store ID:         {}", ledger.store().store_id());
        }
        Commands::Participant(cmd) => handle_participant_command(&ledger, cmd).await?,
        Commands::Group(cmd) => handle_group_command(&ledger, &settings, cmd).await?,
        Commands::Expense(cmd) => handle_expense_command(&ledger, &settings, cmd).await?,
        Commands::Settle(args) => handle_settle_command(&ledger, args).await?,
        Commands::Balances(args) => handle_balances_command(&ledger, &settings, args).await?,
        Commands::Notifications(args) => {
            handle_notifications_command(&ledger, &settings, args).await?
        }
        Commands::Backup(cmd) => handle_backup_command(&ledger, &paths, &settings, cmd).await?,
        Commands::Restore(cmd) => handle_restore_command(&ledger, &paths, &settings, cmd).await?,
        Commands::Audit { limit } => {
            let entries = match ledger.audit() {
                Some(audit) => audit.read_recent(limit)?,
                None => Vec::new(),
            };
            if entries.is_empty() {
                println!("No audit entries.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
    }

    Ok(())
}
