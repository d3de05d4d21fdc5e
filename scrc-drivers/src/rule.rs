//! Hand-tuned autonomous driver
//!
//! Follows the track axis and holds a target speed. No learning involved;
//! it mostly serves as a baseline next to the model driver.

use scrc_core::{
    gearbox::ShiftSchedule, ControlCommand, DrivingStrategy, GearState, SensorFrame,
};

/// Steering lock of the default car (radians)
const STEER_LOCK: f64 = 0.366;

#[derive(Debug, Clone, Copy)]
pub struct RuleConfig {
    /// Cruise speed in km/h
    pub target_speed: f64,
    /// Brake only when this far above the target (km/h)
    pub brake_margin: f64,
    /// Weight of lateral offset against heading error
    pub track_pos_gain: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            target_speed: 100.0,
            brake_margin: 10.0,
            track_pos_gain: 0.5,
        }
    }
}

pub struct RuleDriver {
    config: RuleConfig,
    schedule: ShiftSchedule,
}

impl RuleDriver {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            config,
            schedule: ShiftSchedule::default(),
        }
    }
}

impl Default for RuleDriver {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl DrivingStrategy for RuleDriver {
    fn name(&self) -> &str {
        "rule"
    }

    fn decide(
        &mut self,
        frame: &SensorFrame,
        _previous: &ControlCommand,
        gear: &mut GearState,
    ) -> ControlCommand {
        let speed = frame.scalar_or_zero("speedX");
        let angle = frame.scalar_or_zero("angle");
        let track_pos = frame.scalar_or_zero("trackPos");

        let steer = (angle - track_pos * self.config.track_pos_gain) / STEER_LOCK;

        let (accelerate, brake) = if speed < self.config.target_speed {
            // Ease off as the target approaches
            let gap = (self.config.target_speed - speed) / self.config.target_speed;
            ((gap * 2.0).min(1.0), 0.0)
        } else if speed > self.config.target_speed + self.config.brake_margin {
            (0.0, 0.3)
        } else {
            (0.0, 0.0)
        };

        gear.refresh(&self.schedule, frame, false);
        ControlCommand::new(accelerate, brake, steer, gear.gear).clamped()
    }
}
