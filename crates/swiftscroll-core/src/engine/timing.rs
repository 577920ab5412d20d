//! Time calculation helpers for notch animations.

use std::time::{Duration, Instant};

/// Elapsed fraction of `lifetime` at `now`, clamped to [0, 1].
#[inline]
pub fn progress(start: Instant, now: Instant, lifetime: Duration) -> f64 {
    if lifetime.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(start);
    (elapsed.as_secs_f64() / lifetime.as_secs_f64()).clamp(0.0, 1.0)
}

/// Duration of the accelerating head phase: `L / (1 + r)`.
#[inline]
pub fn head_duration(lifetime: Duration, tail_to_head_ratio: u32) -> Duration {
    lifetime.div_f64(1.0 + tail_to_head_ratio.max(1) as f64)
}

/// Duration of the decaying tail phase: `L·r / (1 + r)`.
#[inline]
pub fn tail_duration(lifetime: Duration, tail_to_head_ratio: u32) -> Duration {
    lifetime.saturating_sub(head_duration(lifetime, tail_to_head_ratio))
}
