//! A single in-flight notch contribution.

use std::time::{Duration, Instant};

use super::easing::allocation_progress;
use super::timing::{head_duration, progress, tail_duration};
use super::EngineParams;

/// Residuals below this are considered fully paid out.
const SPENT_EPSILON: f64 = 1e-6;

/// One absorbed notch, tracked until its pixel budget is fully emitted.
///
/// Parameters are captured at absorb time so a settings change never
/// retro-warps an animation mid-flight.
#[derive(Debug, Clone)]
pub struct NotchAnimation {
    start: Instant,
    lifetime: Duration,
    /// Accelerating phase; the allocation curve crosses over where it ends.
    head: Duration,
    /// Decaying phase, `tail_to_head_ratio` times the head.
    tail: Duration,
    eased: bool,
    /// Total pixel budget (magnitude).
    budget_px: f64,
    /// Direction sign, +1 or -1.
    direction: i32,
    /// Cumulative pixels already charged toward emissions.
    accounted_px: f64,
}

impl NotchAnimation {
    /// Capture a new animation from the parameters the notch arrived with.
    ///
    /// `budget_px` is the already-accelerated magnitude; the lifetime is the
    /// nominal `animation_time_ms`, never stretched by acceleration.
    pub fn new(now: Instant, budget_px: u32, direction: i32, params: &EngineParams) -> Self {
        let lifetime = Duration::from_millis(u64::from(params.animation_time_ms.max(1)));
        Self {
            start: now,
            lifetime,
            head: head_duration(lifetime, params.tail_to_head_ratio),
            tail: tail_duration(lifetime, params.tail_to_head_ratio),
            eased: params.animation_easing,
            budget_px: f64::from(budget_px),
            direction: if direction < 0 { -1 } else { 1 },
            accounted_px: 0.0,
        }
    }

    /// Pixels owed to date, per the allocation curve.
    pub fn cumulative_owed(&self, now: Instant) -> f64 {
        let t = progress(self.start, now, self.lifetime);
        let crossover =
            self.head.as_secs_f64() / (self.head.as_secs_f64() + self.tail.as_secs_f64());
        self.budget_px * allocation_progress(t, crossover, self.eased)
    }

    /// Pixels owed since the last commit. Never negative.
    pub fn newly_owed(&self, now: Instant) -> f64 {
        (self.cumulative_owed(now) - self.accounted_px).max(0.0)
    }

    /// Charge `px` toward this animation's budget.
    pub fn commit(&mut self, px: f64) {
        self.accounted_px = (self.accounted_px + px).min(self.budget_px);
    }

    /// Pixels still owed across the remaining lifetime.
    pub fn remaining_px(&self) -> f64 {
        self.budget_px - self.accounted_px
    }

    /// Whether the budget has been fully charged.
    pub fn is_spent(&self) -> bool {
        self.remaining_px() <= SPENT_EPSILON
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }
}
