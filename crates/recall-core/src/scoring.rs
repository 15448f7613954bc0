//! Frecency scoring
//!
//! A score is the product of two factors:
//! - recency: exponential decay over whole days since the last use
//! - frequency: `ln(1 + uses)`, so heavy use helps but never dominates forever
//!
//! Anything never used scores exactly zero.

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Default half-life of a use, in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

/// Zero, negative or non-finite half-lives turn decay into NaN or growth
pub fn is_valid_half_life(days: f64) -> bool {
    days.is_finite() && days > 0.0
}

/// Whole days between two instants, rounded up
///
/// The difference is taken as an absolute value so a last-used time in the
/// future (clock skew, copied data) decays like one in the past.
pub fn days_between(now_millis: i64, then_millis: i64) -> u64 {
    let diff = now_millis.abs_diff(then_millis);
    diff / MILLIS_PER_DAY + u64::from(diff % MILLIS_PER_DAY != 0)
}

/// Recency factor, 1.0 for something used today
pub fn decay_score(last_used_millis: Option<i64>, now_millis: i64, half_life_days: f64) -> f64 {
    let Some(last_used) = last_used_millis else {
        return 0.0;
    };

    let decay_rate = -std::f64::consts::LN_2 / half_life_days;
    let days = days_between(now_millis, last_used) as f64;
    (decay_rate * days).exp()
}

/// Frequency factor
pub fn frequency_score(usage_count: Option<u64>) -> f64 {
    match usage_count {
        None | Some(0) => 0.0,
        Some(count) => (count as f64).ln_1p(),
    }
}

pub fn frecency_score(
    last_used_millis: Option<i64>,
    usage_count: Option<u64>,
    now_millis: i64,
    half_life_days: f64,
) -> f64 {
    decay_score(last_used_millis, now_millis, half_life_days) * frequency_score(usage_count)
}
