//! The smooth scroll engine.
//!
//! Two independent axis runners absorb wheel notches and pay their pixel
//! budgets out over a fixed-cadence tick, emitting re-synthesized wheel
//! events through a [`WheelEmitter`]. Notches arrive over an unbounded
//! channel from the hook thread, each carrying the parameter tuple resolved
//! for it, and are drained at the start of every tick.

pub mod animation;
pub mod easing;
pub mod runner;
pub mod timing;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::settings::{AppSettings, ScrollProfile};
use crate::Result;
use runner::AxisRunner;

pub use runner::TickEmission;

/// Tick cadence shared by both axis runners. Chosen inside the 8–16 ms band
/// and constant for the lifetime of the engine.
pub const ENGINE_TICK: Duration = Duration::from_millis(10);

/// Scroll axis of a notch or emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Opaque destination window handle, captured at notch arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWindow(pub isize);

/// One accepted wheel notch, already axis-classified and direction-signed.
#[derive(Debug, Clone, Copy)]
pub struct NotchEvent {
    pub axis: Axis,
    /// Signed raw delta; only the sign feeds the animation.
    pub delta: i32,
    /// Monotonic arrival timestamp, used for acceleration stacking.
    pub arrived: Instant,
    pub target: TargetWindow,
    /// Effective parameters resolved for this notch, bound at publish time.
    /// Two quick notches under different profiles each keep their own tuple
    /// even when they land inside the same tick interval.
    pub params: EngineParams,
}

/// The effective runtime parameter tuple for one notch, produced by the
/// resolver from either a selected profile or the global defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub step_size_px: u32,
    pub animation_time_ms: u32,
    pub acceleration_delta_ms: u32,
    pub acceleration_max: u32,
    pub tail_to_head_ratio: u32,
    pub animation_easing: bool,
    pub horizontal_smoothness: bool,
    pub reverse_wheel_direction: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::from_globals(&AppSettings::default())
    }
}

impl EngineParams {
    pub fn from_globals(settings: &AppSettings) -> Self {
        Self {
            step_size_px: settings.step_size_px,
            animation_time_ms: settings.animation_time_ms,
            acceleration_delta_ms: settings.acceleration_delta_ms,
            acceleration_max: settings.acceleration_max,
            tail_to_head_ratio: settings.tail_to_head_ratio,
            animation_easing: settings.animation_easing,
            horizontal_smoothness: settings.horizontal_smoothness,
            reverse_wheel_direction: settings.reverse_wheel_direction,
        }
    }

    pub fn from_profile(profile: &ScrollProfile) -> Self {
        Self {
            step_size_px: profile.step_size_px,
            animation_time_ms: profile.animation_time_ms,
            acceleration_delta_ms: profile.acceleration_delta_ms,
            acceleration_max: profile.acceleration_max,
            tail_to_head_ratio: profile.tail_to_head_ratio,
            animation_easing: profile.animation_easing,
            horizontal_smoothness: profile.horizontal_smoothness,
            reverse_wheel_direction: profile.reverse_wheel_direction,
        }
    }
}

/// Seam for synthetic wheel delivery; the Win32 implementation posts wheel
/// messages to the target window, tests record them.
pub trait WheelEmitter: Send + Sync {
    fn emit(&self, axis: Axis, delta_px: i32, target: TargetWindow) -> Result<()>;
}

/// Cloneable front half of the engine.
#[derive(Clone)]
pub struct EngineHandle {
    notch_tx: mpsc::UnboundedSender<NotchEvent>,
}

impl EngineHandle {
    /// Queue a notch for the next tick. Returns false once the engine has
    /// stopped, in which case the caller should forward the event instead.
    pub fn submit(&self, notch: NotchEvent) -> bool {
        self.notch_tx.send(notch).is_ok()
    }
}

/// The tick-driven core. Exclusive owner of both axis runners.
pub struct ScrollEngine {
    emitter: Arc<dyn WheelEmitter>,
    vertical: AxisRunner,
    horizontal: AxisRunner,
    notch_rx: mpsc::UnboundedReceiver<NotchEvent>,
}

impl ScrollEngine {
    pub fn new(emitter: Arc<dyn WheelEmitter>) -> (Self, EngineHandle) {
        let (notch_tx, notch_rx) = mpsc::unbounded_channel();
        let engine = Self {
            emitter,
            vertical: AxisRunner::new(Axis::Vertical),
            horizontal: AxisRunner::new(Axis::Horizontal),
            notch_rx,
        };
        (engine, EngineHandle { notch_tx })
    }

    /// Drive both runners until the shutdown signal flips. In-flight
    /// animations are discarded on stop, without emitting their remainder.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(tick_ms = ENGINE_TICK.as_millis() as u64, "scroll engine started");
        let mut interval = tokio::time::interval(ENGINE_TICK);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.on_tick(Instant::now());
                }
            }
        }

        self.vertical.clear();
        self.horizontal.clear();
        info!("scroll engine stopped");
    }

    fn on_tick(&mut self, now: Instant) {
        // Drain arrivals first so a notch never waits a full extra tick.
        while let Ok(notch) = self.notch_rx.try_recv() {
            let runner = match notch.axis {
                Axis::Vertical => &mut self.vertical,
                Axis::Horizontal => &mut self.horizontal,
            };
            if let Some(immediate) = runner.absorb(&notch) {
                Self::emit_or_refund(&*self.emitter, runner, immediate);
            }
        }

        for runner in [&mut self.vertical, &mut self.horizontal] {
            if let Some(emission) = runner.tick(now) {
                Self::emit_or_refund(&*self.emitter, runner, emission);
            }
        }
    }

    fn emit_or_refund(emitter: &dyn WheelEmitter, runner: &mut AxisRunner, emission: TickEmission) {
        if let Err(e) = emitter.emit(runner.axis(), emission.delta_px, emission.target) {
            // Skip this tick's emission; the pixels remain owed.
            warn!("{e}");
            runner.refund(emission);
        } else {
            debug!(axis = ?runner.axis(), delta_px = emission.delta_px, "synthetic wheel emitted");
        }
    }
}
