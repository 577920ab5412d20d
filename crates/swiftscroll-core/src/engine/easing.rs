//! Pixel-allocation curve for notch animations.
//!
//! An animation's lifetime splits into a short accelerating head and a longer
//! decaying tail; the caller passes the crossover fraction derived from the
//! stored phase durations. The curve maps elapsed-time fraction to the
//! cumulative fraction of the pixel budget released so far: it rises as a
//! cubic ease-in through the head, crosses over releasing exactly the head's
//! time share of the budget, then finishes as a cubic ease-out through the
//! tail. Both one-sided slopes at the crossover equal 3 in normalized units,
//! so the eased curve is C¹ and monotonic.

/// Cumulative budget fraction released by elapsed-time fraction `t`, with
/// the head/tail boundary at time fraction `crossover`.
///
/// `t` is clamped to [0, 1]. With `eased` false the curve is piecewise linear
/// through the same crossover, which collapses to the identity.
#[inline]
pub fn allocation_progress(t: f64, crossover: f64, eased: bool) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if !eased {
        return t;
    }
    let c = crossover.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    if t < c {
        c * ease_in_cubic(t / c)
    } else {
        c + (1.0 - c) * ease_out_cubic((t - c) / (1.0 - c))
    }
}

/// Cubic ease-in: f(u) = u³
#[inline]
fn ease_in_cubic(u: f64) -> f64 {
    u * u * u
}

/// Cubic ease-out: f(u) = 1 - (1-u)³
#[inline]
fn ease_out_cubic(u: f64) -> f64 {
    let inv = 1.0 - u;
    1.0 - inv * inv * inv
}
