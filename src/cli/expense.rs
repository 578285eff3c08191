//! Expense CLI commands

use chrono::NaiveDate;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_expense_details, format_expense_list};
use crate::error::SplitResult;
use crate::models::amount::format_amount;
use crate::models::{ParticipantKey, SplitShare, SplitType};
use crate::services::{ExpenseEdit, ExpenseInput, ExpenseService, GroupService};
use crate::storage::{Ledger, LedgerStore};

use super::resolve_actor;

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Group name or ID
        group: String,
        /// What the money was spent on
        title: String,
        /// Total amount
        amount: f64,
        /// Who paid; defaults to the configured owner
        #[arg(short, long)]
        payer: Option<String>,
        /// Split type (equal, exact, percentage, shares)
        #[arg(short, long, default_value = "equal")]
        split: SplitType,
        /// Share as KEY or KEY=VALUE; repeat per participant. Equal splits
        /// with no shares cover every member
        #[arg(long = "share", value_parser = parse_share)]
        shares: Vec<SplitShare>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        tag: Vec<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List a group's expenses
    List {
        group: String,
    },
    /// Show an expense with its splits and comments
    Show {
        expense: String,
    },
    /// Edit an expense; a new amount rescales the existing splits
    Edit {
        expense: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        amount: Option<f64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Delete an expense
    Delete {
        expense: String,
    },
    /// Comment on an expense
    Comment {
        expense: String,
        text: String,
        /// Comment on behalf of this participant
        #[arg(long = "as")]
        as_participant: Option<String>,
    },
}

/// Parse `KEY` or `KEY=VALUE`
fn parse_share(s: &str) -> Result<SplitShare, String> {
    match s.split_once('=') {
        None => Ok(SplitShare::new(ParticipantKey::new(s), 1.0)),
        Some((key, value)) => {
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("invalid share value in '{}'", s))?;
            Ok(SplitShare::new(ParticipantKey::new(key), value))
        }
    }
}

/// Handle an expense command
pub async fn handle_expense_command<S: LedgerStore>(
    ledger: &Ledger<S>,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> SplitResult<()> {
    let service = ExpenseService::new(ledger);
    let groups = GroupService::new(ledger);

    match cmd {
        ExpenseCommands::Add {
            group,
            title,
            amount,
            payer,
            split,
            shares,
            category,
            tag,
            notes,
            date,
        } => {
            let group = groups.find(&group).await?;
            let payer = resolve_actor(payer.as_deref(), settings)?;

            let mut input = ExpenseInput::equal(group.id, title, payer, amount);
            input.split_type = split;
            input.shares = shares;
            input.category = category;
            input.tags = tag;
            input.notes = notes;
            input.date = date;

            let expense = service.create(input).await?;
            println!(
                "Recorded expense: {} ({})",
                expense.title,
                format_amount(expense.amount, &expense.currency)
            );
            for split in &expense.splits {
                println!(
                    "  {:<24} {:>14}",
                    split.participant.as_str(),
                    format_amount(split.amount, &expense.currency)
                );
            }
            println!("  ID: {}", expense.id);
        }

        ExpenseCommands::List { group } => {
            let group = groups.find(&group).await?;
            let expenses = service.list(group.id).await?;
            print!("{}", format_expense_list(&expenses));
        }

        ExpenseCommands::Show { expense } => {
            let expense = service.find(&expense).await?;
            let comments = service.comments(expense.id).await?;
            print!("{}", format_expense_details(&expense, &comments));
        }

        ExpenseCommands::Edit {
            expense,
            title,
            amount,
            category,
            notes,
            date,
        } => {
            let found = service.find(&expense).await?;
            let edit = ExpenseEdit {
                title,
                amount,
                category,
                notes,
                date,
            };
            if edit.title.is_none()
                && edit.amount.is_none()
                && edit.category.is_none()
                && edit.notes.is_none()
                && edit.date.is_none()
            {
                println!("No changes specified.");
                return Ok(());
            }

            let updated = service.edit(found.id, edit).await?;
            println!("Updated expense: {}", updated.title);
        }

        ExpenseCommands::Delete { expense } => {
            let found = service.find(&expense).await?;
            let deleted = service.delete(found.id).await?;
            println!("Deleted expense: {}", deleted.title);
        }

        ExpenseCommands::Comment {
            expense,
            text,
            as_participant,
        } => {
            let found = service.find(&expense).await?;
            let author = resolve_actor(as_participant.as_deref(), settings)?;
            service.comment(found.id, author, &text).await?;
            println!("Comment added to {}", found.title);
        }
    }

    Ok(())
}
