//! Final performance score: a closed-form composite of attempt count and
//! elapsed time, zero on a loss. Constants and evaluation order are fixed;
//! callers rely on exact reproducibility at the boundaries.

/// `F = exp(-0.3 * (attempts - 1))`: 1.0 at a first-try win, strictly
/// decreasing per extra attempt.
fn attempt_factor(attempts: u32) -> f64 {
    (-0.3 * (attempts as f64 - 1.0)).exp()
}

/// `G = 1 / (1 + 0.005 * max(0, elapsed - 30))`: full credit inside a
/// 30-second grace period, mild hyperbolic decay after.
fn speed_factor(elapsed_secs: f64) -> f64 {
    1.0 / (1.0 + 0.005 * (elapsed_secs - 30.0).max(0.0))
}

/// `floor(1500 * (0.9F + 0.1G) * (0.6 + 0.4*F*G))`, or 0 when not won.
pub fn final_score(attempts: u32, elapsed_secs: f64, win: bool) -> u32 {
    if !win || attempts == 0 {
        return 0;
    }
    let f = attempt_factor(attempts);
    let g = speed_factor(elapsed_secs);
    (1500.0 * (0.9 * f + 0.1 * g) * (0.6 + 0.4 * (f * g))).floor() as u32
}
