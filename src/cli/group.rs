//! Group CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_group_details, format_group_list};
use crate::error::SplitResult;
use crate::models::ParticipantKey;
use crate::services::GroupService;
use crate::storage::{Ledger, LedgerStore};

use super::resolve_actor;

/// Group subcommands
#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a new group
    Create {
        /// Group name
        name: String,
        /// Currency code (defaults to the configured default currency)
        #[arg(short, long)]
        currency: Option<String>,
        /// Member key; repeat for several members
        #[arg(short, long = "member")]
        members: Vec<String>,
        /// Create the group on behalf of this participant
        #[arg(long = "as")]
        as_participant: Option<String>,
    },
    /// List groups
    List {
        /// Include archived groups
        #[arg(short, long)]
        all: bool,
    },
    /// Show group details
    Show {
        /// Group name or ID
        group: String,
    },
    /// Add a member to a group
    AddMember {
        group: String,
        member: String,
    },
    /// Remove a member with no outstanding balance
    RemoveMember {
        group: String,
        member: String,
    },
    /// Rename a group
    Rename {
        group: String,
        name: String,
    },
    /// Archive a group
    Archive {
        group: String,
    },
}

/// Handle a group command
pub async fn handle_group_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    settings: &Settings,
    cmd: GroupCommands,
) -> SplitResult<()> {
    let service = GroupService::new(ledger);

    match cmd {
        GroupCommands::Create {
            name,
            currency,
            members,
            as_participant,
        } => {
            let creator = resolve_actor(as_participant.as_deref(), settings)?;
            let currency = currency.unwrap_or_else(|| settings.default_currency.clone());
            let members = members.iter().map(ParticipantKey::new).collect();

            let group = service.create(&name, &currency, creator, members).await?;
            println!("Created group: {}", group.name);
            println!("  Currency: {}", group.currency);
            println!("  Members:  {}", group.members.len());
            println!("  ID:       {}", group.id);
        }

        GroupCommands::List { all } => {
            let groups = service.list(all).await?;
            print!("{}", format_group_list(&groups));
        }

        GroupCommands::Show { group } => {
            let found = service.find(&group).await?;
            print!("{}", format_group_details(&found));
        }

        GroupCommands::AddMember { group, member } => {
            let found = service.find(&group).await?;
            let updated = service.add_member(found.id, ParticipantKey::new(&member)).await?;
            println!("Added {} to {}", member, updated.name);
        }

        GroupCommands::RemoveMember { group, member } => {
            let found = service.find(&group).await?;
            let updated = service
                .remove_member(found.id, &ParticipantKey::new(&member))
                .await?;
            println!("Removed {} from {}", member, updated.name);
        }

        GroupCommands::Rename { group, name } => {
            let found = service.find(&group).await?;
            let updated = service.rename(found.id, &name).await?;
            println!("Renamed group to: {}", updated.name);
        }

        GroupCommands::Archive { group } => {
            let found = service.find(&group).await?;
            let archived = service.archive(found.id).await?;
            println!("Archived group: {}", archived.name);
        }
    }

    Ok(())
}
