//! Settlement, balance, and notification commands

use chrono::NaiveDate;
use clap::Args;

use crate::config::Settings;
use crate::display::{format_balances, format_net_positions};
use crate::error::SplitResult;
use crate::models::ParticipantKey;
use crate::services::{
    BalanceService, GroupService, NotificationService, SettlementInput, SettlementService,
};
use crate::storage::{Ledger, LedgerStore};

use super::resolve_actor;

/// Record a payment between two members
#[derive(Args)]
pub struct SettleArgs {
    /// Group name or ID
    pub group: String,
    /// Participant paying
    pub from: String,
    /// Participant receiving
    pub to: String,
    pub amount: f64,
    /// How it was paid (cash, bank transfer, ...)
    #[arg(short, long)]
    pub method: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

/// Show who owes whom
#[derive(Args)]
pub struct BalancesArgs {
    /// Group name or ID; omit to show one participant across all groups
    pub group: Option<String>,
    /// Only debts involving this participant
    #[arg(short, long)]
    pub participant: Option<String>,
    /// Also print each member's net position
    #[arg(long)]
    pub net: bool,
}

/// Show activity notifications
#[derive(Args)]
pub struct NotificationsArgs {
    /// Only unread notifications
    #[arg(short, long)]
    pub unread: bool,
    /// Mark everything as read after listing
    #[arg(short, long)]
    pub mark_read: bool,
    /// Read notifications of this participant instead of the owner
    #[arg(long = "as")]
    pub as_participant: Option<String>,
}

pub async fn handle_settle_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    args: SettleArgs,
) -> SplitResult<()> {
    let group = GroupService::new(ledger).find(&args.group).await?;

    let mut input = SettlementInput::new(
        group.id,
        ParticipantKey::new(&args.from),
        ParticipantKey::new(&args.to),
        args.amount,
    );
    input.method = args.method;
    input.notes = args.notes;
    input.date = args.date;

    let edges = SettlementService::new(ledger).record(input).await?;
    println!("Recorded settlement in {}", group.name);
    println!();
    println!("{}", format_balances(&edges).trim_end());
    Ok(())
}

pub async fn handle_balances_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    settings: &Settings,
    args: BalancesArgs,
) -> SplitResult<()> {
    let balances = BalanceService::new(ledger);
    let participant = args.participant.as_deref().map(ParticipantKey::new);

    match args.group {
        Some(group) => {
            let group = GroupService::new(ledger).find(&group).await?;
            let mut edges = balances.edges_for_group(group.id).await?;
            if let Some(who) = &participant {
                edges.retain(|e| e.involves(who));
            }

            println!("Balances for {}", group.name);
            println!();
            println!("{}", format_balances(&edges).trim_end());

            if args.net {
                let net = balances.net_positions(group.id).await?;
                println!();
                println!("Net positions:");
                print!("{}", format_net_positions(&net, &group.currency));
            }
        }
        None => {
            let who = match participant {
                Some(who) => who,
                None => resolve_actor(None, settings)?,
            };
            let edges = balances.edges_for_participant(&who).await?;
            println!("Balances involving {}", who);
            println!();
            println!("{}", format_balances(&edges).trim_end());
        }
    }
    Ok(())
}

pub async fn handle_notifications_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    settings: &Settings,
    args: NotificationsArgs,
) -> SplitResult<()> {
    let recipient = resolve_actor(args.as_participant.as_deref(), settings)?;
    let service = NotificationService::new(ledger);

    let notifications = service.for_recipient(&recipient, args.unread).await?;
    if notifications.is_empty() {
        println!("No notifications.");
    }
    for notification in &notifications {
        println!(
            "{} [{}] {}{}",
            notification.timestamp.format("%Y-%m-%d %H:%M"),
            notification.kind,
            notification.message,
            if notification.read { "" } else { " (new)" }
        );
    }

    if args.mark_read {
        let marked = service.mark_all_read(&recipient).await?;
        if marked > 0 {
            println!("Marked {} notification(s) as read", marked);
        }
    }
    Ok(())
}
