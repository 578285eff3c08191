//! Expense display formatting

use crate::models::amount::format_amount;
use crate::models::{Comment, Expense};

/// Format a group's expenses, oldest first
pub fn format_expense_list(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return "No expenses recorded.".to_string();
    }

    let title_width = expenses
        .iter()
        .map(|e| e.title.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let payer_width = expenses
        .iter()
        .map(|e| e.payer.as_str().len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<10}  {:<12}  {:<title_width$}  {:<payer_width$}  {:>14}  {}\n",
        "Date",
        "ID",
        "Title",
        "Payer",
        "Amount",
        "Split",
        title_width = title_width,
        payer_width = payer_width,
    ));
    output.push_str(&format!(
        "{:-<10}  {:-<12}  {:-<title_width$}  {:-<payer_width$}  {:->14}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        title_width = title_width,
        payer_width = payer_width,
    ));

    for expense in expenses {
        output.push_str(&format!(
            "{:<10}  {:<12}  {:<title_width$}  {:<payer_width$}  {:>14}  {}\n",
            expense.date.format("%Y-%m-%d"),
            expense.id.to_string(),
            expense.title,
            expense.payer,
            format_amount(expense.amount, &expense.currency),
            expense.split_type,
            title_width = title_width,
            payer_width = payer_width,
        ));
    }

    output
}

/// Format one expense with its splits and comments
pub fn format_expense_details(expense: &Expense, comments: &[Comment]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Expense: {}\n", expense.title));
    output.push_str(&format!("  ID:       {}\n", expense.id));
    output.push_str(&format!("  Date:     {}\n", expense.date));
    output.push_str(&format!("  Paid by:  {}\n", expense.payer));
    output.push_str(&format!(
        "  Amount:   {}\n",
        format_amount(expense.amount, &expense.currency)
    ));
    output.push_str(&format!("  Category: {}\n", expense.category));
    if let Some(notes) = &expense.notes {
        output.push_str(&format!("  Notes:    {}\n", notes));
    }

    output.push_str(&format!("  Splits ({}):\n", expense.split_type));
    for split in &expense.splits {
        output.push_str(&format!(
            "    {:<24} {:>14}\n",
            split.participant.as_str(),
            format_amount(split.amount, &expense.currency)
        ));
    }

    if !comments.is_empty() {
        output.push_str("  Comments:\n");
        for comment in comments {
            output.push_str(&format!(
                "    [{}] {}: {}\n",
                comment.timestamp.format("%Y-%m-%d %H:%M"),
                comment.author,
                comment.text
            ));
        }
    }

    output
}
