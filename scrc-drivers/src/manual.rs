//! Manual driver fed by live human input
//!
//! Input capture runs elsewhere (a keyboard hook, a HID reader) and writes
//! into a shared [`LiveControls`]. The racing loop reads it once per tick.
//! Every field is its own atomic, so a reader may see fields from two
//! different key events but never a half-written value.

use scrc_core::{
    gearbox::ShiftSchedule, ControlCommand, DrivingStrategy, GearState, SensorFrame,
};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// f64 stored as its bit pattern
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Stored in `gear_override` while the gearbox is in charge
const NO_OVERRIDE: i32 = i32::MIN;

/// Control state shared between input capture and the racing loop
#[derive(Debug)]
pub struct LiveControls {
    accelerate: AtomicF64,
    brake: AtomicF64,
    steer: AtomicF64,
    reverse: AtomicBool,
    gear_override: AtomicI32,
}

impl Default for LiveControls {
    fn default() -> Self {
        Self {
            accelerate: AtomicF64::default(),
            brake: AtomicF64::default(),
            steer: AtomicF64::default(),
            reverse: AtomicBool::new(false),
            gear_override: AtomicI32::new(NO_OVERRIDE),
        }
    }
}

/// Point-in-time copy of [`LiveControls`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlSnapshot {
    pub accelerate: f64,
    pub brake: f64,
    pub steer: f64,
    pub reverse: bool,
    pub gear_override: Option<i32>,
}

impl LiveControls {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_accelerate(&self, value: f64) {
        self.accelerate.store(value);
    }

    pub fn set_brake(&self, value: f64) {
        self.brake.store(value);
    }

    pub fn set_steer(&self, value: f64) {
        self.steer.store(value);
    }

    pub fn set_reverse(&self, requested: bool) {
        self.reverse.store(requested, Ordering::Relaxed);
    }

    /// Force a gear, or hand control back to the gearbox with `None`
    ///
    /// `Some(0)` is a real override and holds neutral.
    pub fn set_gear_override(&self, gear: Option<i32>) {
        self.gear_override
            .store(gear.unwrap_or(NO_OVERRIDE), Ordering::Relaxed);
    }

    /// Apply a key press using the WASD + X layout
    ///
    /// Returns false for keys with no binding.
    pub fn press(&self, key: char) -> bool {
        match key.to_ascii_lowercase() {
            'w' => self.set_accelerate(1.0),
            's' => self.set_brake(1.0),
            'a' => self.set_steer(1.0),
            'd' => self.set_steer(-1.0),
            'x' => self.set_reverse(true),
            _ => return false,
        }
        true
    }

    /// Apply a key release using the WASD + X layout
    pub fn release(&self, key: char) -> bool {
        match key.to_ascii_lowercase() {
            'w' => self.set_accelerate(0.0),
            's' => self.set_brake(0.0),
            'a' | 'd' => self.set_steer(0.0),
            'x' => self.set_reverse(false),
            _ => return false,
        }
        true
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let gear = self.gear_override.load(Ordering::Relaxed);
        ControlSnapshot {
            accelerate: self.accelerate.load(),
            brake: self.brake.load(),
            steer: self.steer.load(),
            reverse: self.reverse.load(Ordering::Relaxed),
            gear_override: (gear != NO_OVERRIDE).then_some(gear),
        }
    }
}

/// Strategy that forwards human input
pub struct ManualDriver {
    controls: Arc<LiveControls>,
    schedule: ShiftSchedule,
}

impl ManualDriver {
    pub fn new(controls: Arc<LiveControls>) -> Self {
        Self {
            controls,
            schedule: ShiftSchedule::default(),
        }
    }

    pub fn controls(&self) -> &Arc<LiveControls> {
        &self.controls
    }
}

impl DrivingStrategy for ManualDriver {
    fn name(&self) -> &str {
        "manual"
    }

    fn decide(
        &mut self,
        frame: &SensorFrame,
        _previous: &ControlCommand,
        gear: &mut GearState,
    ) -> ControlCommand {
        let input = self.controls.snapshot();

        match input.gear_override {
            Some(forced) => gear.set(forced),
            None => {
                gear.refresh(&self.schedule, frame, input.reverse);
            }
        }

        // Reverse needs throttle to move the car backwards
        let accelerate = if input.reverse { 1.0 } else { input.accelerate };

        let cmd = ControlCommand::new(accelerate, input.brake, input.steer, gear.gear).clamped();
        debug!("Manual command: {}", cmd);
        cmd
    }
}
