//! Debt netting engine
//!
//! Pure functions turning a group's expense and settlement history into the
//! smallest set of balance edges that reproduces everyone's net position.
//!
//! # Algorithm
//!
//! 1. Every participant in the history starts at a net position of zero.
//! 2. For each expense split not owed by the payer, the payer gains the split
//!    amount and the split participant loses it.
//! 3. For each settlement, the payer (`from`) gains the amount and the
//!    recipient (`to`) loses it.
//! 4. Positions within [`EPSILON`] of zero are settled and dropped.
//! 5. Debtors and creditors are each sorted by descending magnitude, ties
//!    broken by ascending participant key.
//! 6. The largest debtor is greedily matched against the largest creditor
//!    until one side runs out.
//!
//! The ordering in step 5 makes the output a deterministic function of the
//! history, independent of the order records were read in.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::amount::{is_negligible, EPSILON};
use crate::models::{BalanceEdge, Expense, GroupId, ParticipantKey, Settlement};

/// Net position per participant: positive is owed money, negative owes money
pub type NetPositions = BTreeMap<ParticipantKey, f64>;

/// Compute every participant's net position from the history
pub fn net_positions(expenses: &[Expense], settlements: &[Settlement]) -> NetPositions {
    let mut net = NetPositions::new();

    for expense in expenses {
        net.entry(expense.payer.clone()).or_insert(0.0);
        for split in &expense.splits {
            net.entry(split.participant.clone()).or_insert(0.0);
            if split.participant == expense.payer {
                continue;
            }
            *net.entry(expense.payer.clone()).or_insert(0.0) += split.amount;
            *net.entry(split.participant.clone()).or_insert(0.0) -= split.amount;
        }
    }

    for settlement in settlements {
        *net.entry(settlement.from.clone()).or_insert(0.0) += settlement.amount;
        *net.entry(settlement.to.clone()).or_insert(0.0) -= settlement.amount;
    }

    net
}

/// Reduce net positions to a minimal set of debtor to creditor edges
pub fn simplify(group_id: GroupId, currency: &str, net: &NetPositions) -> Vec<BalanceEdge> {
    let mut debtors: Vec<(ParticipantKey, f64)> = Vec::new();
    let mut creditors: Vec<(ParticipantKey, f64)> = Vec::new();

    for (participant, amount) in net {
        if is_negligible(*amount) {
            continue;
        }
        if *amount < 0.0 {
            debtors.push((participant.clone(), amount.abs()));
        } else {
            creditors.push((participant.clone(), *amount));
        }
    }

    debtors.sort_by(by_magnitude_then_key);
    creditors.sort_by(by_magnitude_then_key);

    let mut edges = Vec::new();
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let settle = debtors[d].1.min(creditors[c].1);

        if settle >= EPSILON {
            edges.push(BalanceEdge::new(
                group_id,
                debtors[d].0.clone(),
                creditors[c].0.clone(),
                settle,
                currency,
            ));
        }

        debtors[d].1 -= settle;
        creditors[c].1 -= settle;

        if debtors[d].1 < EPSILON {
            d += 1;
        }
        if creditors[c].1 < EPSILON {
            c += 1;
        }
    }

    edges
}

/// Run the full engine over a group's history
pub fn compute_edges(
    group_id: GroupId,
    currency: &str,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Vec<BalanceEdge> {
    simplify(group_id, currency, &net_positions(expenses, settlements))
}

fn by_magnitude_then_key(a: &(ParticipantKey, f64), b: &(ParticipantKey, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::amount::approx_eq;
    use crate::models::Split;
    use chrono::NaiveDate;

    fn key(s: &str) -> ParticipantKey {
        ParticipantKey::new(s)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn expense(group: GroupId, payer: &str, splits: &[(&str, f64)]) -> Expense {
        let amount = splits.iter().map(|(_, a)| a).sum();
        Expense::new(
            group,
            key(payer),
            amount,
            "USD",
            splits.iter().map(|(p, a)| Split::new(key(p), *a)).collect(),
            date(),
        )
    }

    fn settlement(group: GroupId, from: &str, to: &str, amount: f64) -> Settlement {
        Settlement::new(group, key(from), key(to), amount, "USD", date())
    }

    fn triples(edges: &[BalanceEdge]) -> Vec<(String, String, f64)> {
        edges
            .iter()
            .map(|e| (e.from.to_string(), e.to.to_string(), e.amount))
            .collect()
    }

    #[test]
    fn test_equal_split_three_way() {
        let group = GroupId::new();
        let history = vec![expense(group, "a", &[("a", 30.0), ("b", 30.0), ("c", 30.0)])];

        let net = net_positions(&history, &[]);
        assert!(approx_eq(net[&key("a")], 60.0));
        assert!(approx_eq(net[&key("b")], -30.0));
        assert!(approx_eq(net[&key("c")], -30.0));

        let edges = compute_edges(group, "USD", &history, &[]);
        assert_eq!(
            triples(&edges),
            vec![
                ("b".to_string(), "a".to_string(), 30.0),
                ("c".to_string(), "a".to_string(), 30.0),
            ]
        );
    }

    #[test]
    fn test_settlement_clears_edge() {
        let group = GroupId::new();
        let history = vec![expense(group, "a", &[("a", 30.0), ("b", 30.0), ("c", 30.0)])];
        let paid = vec![settlement(group, "b", "a", 30.0)];

        let edges = compute_edges(group, "USD", &history, &paid);
        assert_eq!(triples(&edges), vec![("c".to_string(), "a".to_string(), 30.0)]);
    }

    #[test]
    fn test_partial_settlement_reduces_edge() {
        let group = GroupId::new();
        let history = vec![expense(group, "a", &[("a", 50.0), ("b", 50.0)])];
        let paid = vec![settlement(group, "b", "a", 20.0)];

        let edges = compute_edges(group, "USD", &history, &paid);
        assert_eq!(edges.len(), 1);
        assert!(approx_eq(edges[0].amount, 30.0));
    }

    #[test]
    fn test_overpayment_reverses_direction() {
        let group = GroupId::new();
        let history = vec![expense(group, "a", &[("a", 10.0), ("b", 10.0)])];
        let paid = vec![settlement(group, "b", "a", 15.0)];

        let edges = compute_edges(group, "USD", &history, &paid);
        assert_eq!(triples(&edges), vec![("a".to_string(), "b".to_string(), 5.0)]);
    }

    #[test]
    fn test_chain_is_simplified() {
        // b owes a 10, c owes b 10: c should pay a directly
        let group = GroupId::new();
        let history = vec![
            expense(group, "a", &[("b", 10.0)]),
            expense(group, "b", &[("c", 10.0)]),
        ];

        let edges = compute_edges(group, "USD", &history, &[]);
        assert_eq!(triples(&edges), vec![("c".to_string(), "a".to_string(), 10.0)]);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let group = GroupId::new();
        let history = vec![
            expense(group, "z", &[("m", 10.0)]),
            expense(group, "y", &[("n", 10.0)]),
        ];

        let edges = compute_edges(group, "USD", &history, &[]);
        assert_eq!(
            triples(&edges),
            vec![
                ("m".to_string(), "y".to_string(), 10.0),
                ("n".to_string(), "z".to_string(), 10.0),
            ]
        );
    }

    #[test]
    fn test_output_independent_of_history_order() {
        let group = GroupId::new();
        let mut history = vec![
            expense(group, "a", &[("b", 12.5), ("c", 7.5)]),
            expense(group, "b", &[("a", 3.0), ("d", 20.0)]),
            expense(group, "d", &[("c", 4.25)]),
        ];
        let forward = compute_edges(group, "USD", &history, &[]);
        history.reverse();
        let backward = compute_edges(group, "USD", &history, &[]);

        assert_eq!(triples(&forward), triples(&backward));
    }

    #[test]
    fn test_conservation_and_no_self_loops() {
        let group = GroupId::new();
        let history = vec![
            expense(group, "a", &[("a", 20.0), ("b", 20.0), ("c", 20.0)]),
            expense(group, "b", &[("a", 15.0), ("d", 45.0)]),
            expense(group, "c", &[("d", 9.99), ("e", 0.01)]),
        ];
        let paid = vec![settlement(group, "d", "b", 10.0)];

        let net = net_positions(&history, &paid);
        let edges = compute_edges(group, "USD", &history, &paid);

        for edge in &edges {
            assert_ne!(edge.from, edge.to);
            assert!(edge.amount > 0.0);
        }

        for (participant, position) in &net {
            let owed_to: f64 = edges.iter().filter(|e| &e.to == participant).map(|e| e.amount).sum();
            let owed_by: f64 = edges.iter().filter(|e| &e.from == participant).map(|e| e.amount).sum();
            assert!(
                (owed_to - owed_by - position).abs() < EPSILON,
                "{} nets {} but edges give {}",
                participant,
                position,
                owed_to - owed_by
            );
        }
    }

    #[test]
    fn test_empty_history_yields_no_edges() {
        assert!(compute_edges(GroupId::new(), "USD", &[], &[]).is_empty());
    }

    #[test]
    fn test_payer_only_split_yields_no_edges() {
        let group = GroupId::new();
        let history = vec![expense(group, "a", &[("a", 40.0)])];
        assert!(compute_edges(group, "USD", &history, &[]).is_empty());
    }
}
