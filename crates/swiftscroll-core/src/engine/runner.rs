//! Per-axis animation runner.
//!
//! Each axis owns an ordered list of in-flight notch animations, a sub-pixel
//! residual carried across ticks, and the acceleration stacking state. The
//! engine drives one runner per axis from a single shared tick.

use std::time::{Duration, Instant};

use tracing::trace;

use super::animation::NotchAnimation;
use super::{Axis, NotchEvent, TargetWindow};

/// A batched synthetic emission produced by one tick on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEmission {
    pub delta_px: i32,
    pub target: TargetWindow,
}

#[derive(Debug)]
pub struct AxisRunner {
    axis: Axis,
    animations: Vec<NotchAnimation>,
    /// Sub-pixel remainder carried across ticks so integer emissions lose no
    /// motion. Signed.
    residual: f64,
    last_notch: Option<Instant>,
    acceleration: u32,
    /// Destination captured at the most recent notch.
    target: Option<TargetWindow>,
}

impl AxisRunner {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            animations: Vec::new(),
            residual: 0.0,
            last_notch: None,
            acceleration: 1,
            target: None,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Absorb one notch under the parameters it arrived with.
    ///
    /// Returns an immediate emission when the horizontal-smoothness gate
    /// bypasses animation; otherwise the notch joins the active list and
    /// pays out over subsequent ticks.
    pub fn absorb(&mut self, notch: &NotchEvent) -> Option<TickEmission> {
        let sign = notch.delta.signum();
        if sign == 0 {
            return None;
        }
        let params = &notch.params;

        self.stack_acceleration(notch.arrived, params.acceleration_delta_ms, params.acceleration_max);
        self.last_notch = Some(notch.arrived);
        self.target = Some(notch.target);

        let budget_px = params.step_size_px.max(1) * self.acceleration;
        if self.axis == Axis::Horizontal && !params.horizontal_smoothness {
            // Pass-through shaping: the whole accelerated budget in one event.
            return Some(TickEmission {
                delta_px: budget_px as i32 * sign,
                target: notch.target,
            });
        }

        trace!(
            axis = ?self.axis,
            budget_px,
            acceleration = self.acceleration,
            "notch absorbed"
        );
        self.animations
            .push(NotchAnimation::new(notch.arrived, budget_px, sign, params));
        None
    }

    /// One scheduling step: prune spent animations, charge newly owed pixels,
    /// fold in the residual, and split off the integer emission.
    pub fn tick(&mut self, now: Instant) -> Option<TickEmission> {
        self.animations.retain(|a| !a.is_spent());
        if self.animations.is_empty() && self.residual.abs() < 1.0 {
            return None;
        }

        let mut owed = self.residual;
        for animation in &mut self.animations {
            let px = animation.newly_owed(now);
            animation.commit(px);
            owed += px * f64::from(animation.direction());
        }

        let delta_px = split_whole_px(owed);
        self.residual = owed - f64::from(delta_px);

        if delta_px == 0 {
            return None;
        }
        let target = self.target?;
        Some(TickEmission { delta_px, target })
    }

    /// Put an emission that failed to inject back into the owed pool; the
    /// pixels go out on a later tick instead of being lost.
    pub fn refund(&mut self, emission: TickEmission) {
        self.residual += f64::from(emission.delta_px);
    }

    /// Discard all in-flight state without emitting the remainder.
    pub fn clear(&mut self) {
        self.animations.clear();
        self.residual = 0.0;
        self.last_notch = None;
        self.acceleration = 1;
        self.target = None;
    }

    pub fn acceleration(&self) -> u32 {
        self.acceleration
    }

    fn stack_acceleration(&mut self, arrived: Instant, delta_ms: u32, max: u32) {
        let window = Duration::from_millis(u64::from(delta_ms));
        match self.last_notch {
            Some(last) if arrived.saturating_duration_since(last) <= window => {
                self.acceleration = (self.acceleration + 1).min(max.max(1));
            }
            _ => self.acceleration = 1,
        }
    }

    /// Signed pixels still owed, including the carried residual. Test hook
    /// for the conservation invariant.
    #[cfg(test)]
    pub fn owed_px(&self) -> f64 {
        self.residual
            + self
                .animations
                .iter()
                .map(|a| a.remaining_px() * f64::from(a.direction()))
                .sum::<f64>()
    }
}

/// Whole pixels in `owed`, toward zero, with a small tolerance so float
/// drift just below an integer still pays out.
#[inline]
fn split_whole_px(owed: f64) -> i32 {
    const EPS: f64 = 1e-6;
    if owed >= 0.0 {
        (owed + EPS).floor() as i32
    } else {
        (owed - EPS).ceil() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineParams;

    fn params() -> EngineParams {
        EngineParams {
            step_size_px: 12,
            animation_time_ms: 250,
            acceleration_delta_ms: 60,
            acceleration_max: 6,
            tail_to_head_ratio: 2,
            animation_easing: true,
            horizontal_smoothness: true,
            reverse_wheel_direction: false,
        }
    }

    fn notch(axis: Axis, delta: i32, arrived: Instant, params: EngineParams) -> NotchEvent {
        NotchEvent {
            axis,
            delta,
            arrived,
            target: TargetWindow(0x10),
            params,
        }
    }

    /// Drive the runner to completion and return every emitted delta.
    fn drain(runner: &mut AxisRunner, from: Instant, lifetime_ms: u64) -> Vec<i32> {
        let mut emitted = Vec::new();
        for ms in (0..=lifetime_ms + 50).step_by(10) {
            if let Some(e) = runner.tick(from + Duration::from_millis(ms)) {
                emitted.push(e.delta_px);
            }
        }
        emitted
    }

    #[test]
    fn single_notch_conserves_motion() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        assert!(runner
            .absorb(&notch(Axis::Vertical, 120, start, params()))
            .is_none());

        let emitted = drain(&mut runner, start, 250);
        assert_eq!(emitted.iter().sum::<i32>(), 12);
        assert!(emitted.iter().all(|d| *d > 0));
        // More than one tick fired: the motion was actually distributed.
        assert!(emitted.len() > 1);
        assert!(runner.owed_px().abs() < 1e-6);
    }

    #[test]
    fn acceleration_stack_of_three() {
        // Notches at t=0, 30, 55 with a 60 ms window: budgets 1x, 2x, 3x.
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = params();
        runner.absorb(&notch(Axis::Vertical, 120, start, p));
        assert_eq!(runner.acceleration(), 1);
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(30), p));
        assert_eq!(runner.acceleration(), 2);
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(55), p));
        assert_eq!(runner.acceleration(), 3);

        let emitted = drain(&mut runner, start, 350);
        assert_eq!(emitted.iter().sum::<i32>(), 6 * 12);
    }

    #[test]
    fn acceleration_resets_after_quiet_gap() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = params();
        runner.absorb(&notch(Axis::Vertical, 120, start, p));
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(40), p));
        assert_eq!(runner.acceleration(), 2);
        // Gap strictly above acceleration_delta_ms resets to exactly 1.
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(101), p));
        assert_eq!(runner.acceleration(), 1);
    }

    #[test]
    fn acceleration_caps_at_max() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = params();
        for k in 0..10 {
            runner.absorb(&notch(
                Axis::Vertical,
                120,
                start + Duration::from_millis(k * 20),
                p,
            ));
        }
        assert_eq!(runner.acceleration(), p.acceleration_max);
    }

    #[test]
    fn consecutive_notches_stack_min_k_max() {
        let start = Instant::now();
        let p = params();
        for k in 1..=8u32 {
            let mut runner = AxisRunner::new(Axis::Vertical);
            for i in 0..k {
                runner.absorb(&notch(
                    Axis::Vertical,
                    120,
                    start + Duration::from_millis(u64::from(i) * 10),
                    p,
                ));
            }
            assert_eq!(runner.acceleration(), k.min(p.acceleration_max));
        }
    }

    #[test]
    fn opposite_notches_cancel_without_losing_pixels() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = EngineParams {
            acceleration_delta_ms: 0,
            ..params()
        };
        runner.absorb(&notch(Axis::Vertical, 120, start, p));
        runner.absorb(&notch(Axis::Vertical, -120, start + Duration::from_millis(100), p));

        let emitted: i32 = drain(&mut runner, start, 400).iter().sum();
        assert_eq!(emitted, 0);
        assert!(runner.owed_px().abs() < 1e-6);
    }

    #[test]
    fn overlapping_notches_accumulate() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = EngineParams {
            acceleration_delta_ms: 0, // no stacking, budgets stay 1x
            ..params()
        };
        runner.absorb(&notch(Axis::Vertical, 120, start, p));
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(100), p));

        let emitted: i32 = drain(&mut runner, start, 400).iter().sum();
        assert_eq!(emitted, 24);
    }

    #[test]
    fn horizontal_bypass_emits_once_in_full() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Horizontal);
        let p = EngineParams {
            horizontal_smoothness: false,
            ..params()
        };
        let immediate = runner
            .absorb(&notch(Axis::Horizontal, 120, start, p))
            .expect("bypass emits immediately");
        assert_eq!(immediate.delta_px, 12);
        // Nothing left to animate afterwards.
        assert!(runner.tick(start + Duration::from_millis(10)).is_none());
    }

    #[test]
    fn horizontal_bypass_applies_acceleration() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Horizontal);
        let p = EngineParams {
            horizontal_smoothness: false,
            ..params()
        };
        runner.absorb(&notch(Axis::Horizontal, -120, start, p));
        let second = runner
            .absorb(&notch(Axis::Horizontal, -120, start + Duration::from_millis(20), p))
            .unwrap();
        assert_eq!(second.delta_px, -24);
    }

    #[test]
    fn profile_switch_keeps_in_flight_parameters() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let slow = EngineParams {
            step_size_px: 8,
            acceleration_delta_ms: 0,
            ..params()
        };
        let fast = EngineParams {
            step_size_px: 16,
            acceleration_delta_ms: 0,
            ..params()
        };
        runner.absorb(&notch(Axis::Vertical, 120, start, slow));
        runner.absorb(&notch(Axis::Vertical, 120, start + Duration::from_millis(100), fast));

        let emitted: i32 = drain(&mut runner, start, 400).iter().sum();
        assert_eq!(emitted, 8 + 16);
    }

    #[test]
    fn refund_keeps_pixels_owed() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        runner.absorb(&notch(Axis::Vertical, 120, start, params()));

        let mut total = 0i32;
        let mut refunded_once = false;
        for ms in (0..=300).step_by(10) {
            if let Some(e) = runner.tick(start + Duration::from_millis(ms)) {
                if !refunded_once {
                    // Simulate one failed injection mid-flight.
                    runner.refund(e);
                    refunded_once = true;
                } else {
                    total += e.delta_px;
                }
            }
        }
        assert!(refunded_once);
        assert_eq!(total, 12);
    }

    #[test]
    fn clear_discards_remainder() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        runner.absorb(&notch(Axis::Vertical, 120, start, params()));
        runner.tick(start + Duration::from_millis(50));
        runner.clear();
        assert_eq!(runner.acceleration(), 1);
        assert!(runner.tick(start + Duration::from_millis(300)).is_none());
        assert!(runner.owed_px().abs() < 1e-9);
    }

    #[test]
    fn target_follows_latest_notch() {
        let start = Instant::now();
        let mut runner = AxisRunner::new(Axis::Vertical);
        let p = params();
        runner.absorb(&notch(Axis::Vertical, 120, start, p));
        let mut late = notch(Axis::Vertical, 120, start + Duration::from_millis(100), p);
        late.target = TargetWindow(0x20);
        runner.absorb(&late);

        let emission = runner
            .tick(start + Duration::from_millis(250))
            .expect("pixels owed");
        assert_eq!(emission.target, TargetWindow(0x20));
    }
}
