//! Balance display formatting

use crate::models::amount::format_amount;
use crate::models::BalanceEdge;
use crate::netting::NetPositions;

/// Format the debts of a group as "from owes to" lines
pub fn format_balances(edges: &[BalanceEdge]) -> String {
    if edges.is_empty() {
        return "All settled up.".to_string();
    }

    let from_width = edges
        .iter()
        .map(|e| e.from.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    for edge in edges {
        output.push_str(&format!(
            "{:<from_width$}  owes  {:<24}  {:>14}\n",
            edge.from.as_str(),
            edge.to.as_str(),
            format_amount(edge.amount, &edge.currency),
            from_width = from_width,
        ));
    }
    output
}

/// Format each participant's net position
pub fn format_net_positions(net: &NetPositions, currency: &str) -> String {
    let mut output = String::new();
    for (participant, amount) in net {
        let label = if *amount > 0.0 {
            "is owed"
        } else if *amount < 0.0 {
            "owes"
        } else {
            "settled"
        };
        output.push_str(&format!(
            "  {:<24} {:<8} {:>14}\n",
            participant.as_str(),
            label,
            format_amount(amount.abs(), currency)
        ));
    }
    output
}
