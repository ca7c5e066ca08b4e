//! Coin-toss delays.
//!
//! A delay is the number of independent Bernoulli trials until the first
//! success, so waiting times are geometric: a discrete stand-in for an
//! exponential delay, truncated at the horizon.

use contagion_types::Timestamp;
use rand::Rng;

/// Time of the next success of a `probability`-biased coin tossed once per
/// tick starting after `now`.
///
/// Tosses stop at the first success or when the budget up to `horizon` is
/// spent. The result is capped at `horizon` and, whenever `now` is before
/// the horizon, lies strictly after `now`. A coin that can never succeed
/// lands on `horizon` without drawing from `rng`.
///
/// # Panics
///
/// Panics if `probability` is outside `[0, 1]`.
pub fn toss_coin<R: Rng + ?Sized>(
    rng: &mut R,
    now: Timestamp,
    probability: f64,
    horizon: Timestamp,
) -> Timestamp {
    if probability == 0.0 {
        return horizon;
    }
    let budget = now.ticks_until(horizon);

    // Ends at budget + 1 when every toss within the budget fails
    let mut trials = 1;
    while trials <= budget && !rng.gen_bool(probability) {
        trials += 1;
    }

    now.saturating_add(trials).min(horizon)
}
