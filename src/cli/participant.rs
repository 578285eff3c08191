//! Participant CLI commands

use clap::Subcommand;

use crate::error::SplitResult;
use crate::models::ParticipantKey;
use crate::services::ParticipantService;
use crate::storage::{Ledger, LedgerStore};

/// Participant subcommands
#[derive(Subcommand)]
pub enum ParticipantCommands {
    /// Register a participant
    Add {
        /// Participant key (usually an email address)
        key: String,
        /// Display name; defaults to the part of the key before '@'
        #[arg(short, long)]
        name: Option<String>,
        /// Preferred display currency
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// List all participants
    List,
    /// Change a participant's display name
    Rename {
        key: String,
        name: String,
    },
}

/// Handle a participant command
pub async fn handle_participant_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    cmd: ParticipantCommands,
) -> SplitResult<()> {
    let service = ParticipantService::new(ledger);

    match cmd {
        ParticipantCommands::Add {
            key,
            name,
            currency,
        } => {
            let name = name.unwrap_or_else(|| key.split('@').next().unwrap_or(&key).to_string());
            let participant = service.register(key.as_str(), &name, currency.as_deref()).await?;
            println!("Registered participant: {}", participant.display_name());
            println!("  Key:      {}", participant.key);
            println!("  Currency: {}", participant.currency);
        }

        ParticipantCommands::List => {
            let participants = service.list().await?;
            if participants.is_empty() {
                println!("No participants found.");
                return Ok(());
            }
            for participant in participants {
                println!(
                    "  {:<32} {:<20} {}",
                    participant.key.as_str(),
                    participant.display_name(),
                    participant.currency
                );
            }
        }

        ParticipantCommands::Rename { key, name } => {
            let participant = service.rename(&ParticipantKey::new(&key), &name).await?;
            println!("Renamed {} to {}", participant.key, participant.display_name());
        }
    }

    Ok(())
}
