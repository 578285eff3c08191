//! Monetary amount helpers
//!
//! Amounts are stored and transmitted as decimal numbers (`f64`). Netting
//! treats anything closer to zero than [`EPSILON`] as settled. Splits are
//! allocated in whole cents so that they always add back up to the total.

/// Threshold below which a balance is considered settled
pub const EPSILON: f64 = 0.01;

/// Largest amount a single expense or settlement may carry
pub const MAX_AMOUNT: f64 = 1e13;

const MAX_CENTS: i64 = 1_000_000_000_000_000;

/// Check if an amount is close enough to zero to be ignored
pub fn is_negligible(amount: f64) -> bool {
    amount.abs() < EPSILON
}

/// Check if two amounts agree within [`EPSILON`]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Check that an amount is a finite number strictly greater than zero
pub fn is_positive(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Check that an amount does not exceed [`MAX_AMOUNT`]
pub fn within_limit(amount: f64) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// Round to the nearest cent
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Divide `total_cents` proportionally to `weights` using the largest
/// remainder method
///
/// The result always sums to `total_cents`. Ties in the remainder go to the
/// earlier index. Returns `None` when the weights are empty, negative, or sum
/// to zero, and when `total_cents` is beyond [`MAX_AMOUNT`].
pub fn allocate_cents(total_cents: i64, weights: &[f64]) -> Option<Vec<i64>> {
    if !(0..=MAX_CENTS).contains(&total_cents) {
        return None;
    }
    if weights.is_empty() || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 {
        return None;
    }

    let exact: Vec<f64> = weights
        .iter()
        .map(|w| total_cents as f64 * w / weight_sum)
        .collect();
    let mut shares: Vec<i64> = exact.iter().map(|e| e.floor() as i64).collect();
    let allocated = shares
        .iter()
        .try_fold(0i64, |acc, c| acc.checked_add(*c))?;
    let mut leftover = total_cents.checked_sub(allocated)?;

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    for idx in order.into_iter().cycle() {
        if leftover <= 0 {
            break;
        }
        shares[idx] += 1;
        leftover -= 1;
    }

    Some(shares)
}

/// Format an amount with its currency code for terminal output
pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}
