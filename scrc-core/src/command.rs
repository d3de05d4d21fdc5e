//! Control command model and wire encoder

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tick's driving decision
///
/// Always fully populated; the wire never carries a partial command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Throttle (0.0 to 1.0)
    pub accelerate: f64,

    /// Brake pedal (0.0 to 1.0)
    pub brake: f64,

    /// Steering (-1.0 = full right, 1.0 = full left)
    pub steer: f64,

    /// Gear (-1 = reverse, 0 = neutral, 1..=6 forward)
    pub gear: i32,
}

impl ControlCommand {
    pub fn new(accelerate: f64, brake: f64, steer: f64, gear: i32) -> Self {
        Self {
            accelerate,
            brake,
            steer,
            gear,
        }
    }

    /// Copy with pedals clamped to [0, 1] and steering to [-1, 1]
    pub fn clamped(self) -> Self {
        Self {
            accelerate: self.accelerate.clamp(0.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
            steer: self.steer.clamp(-1.0, 1.0),
            gear: self.gear,
        }
    }

    /// Encode as `(accel A) (brake B) (steer S) (gear G)`
    ///
    /// No validation happens here; strategies clamp before returning.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(accel {}) (brake {}) (steer {}) (gear {})",
            self.accelerate, self.brake, self.steer, self.gear
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SensorFrame;

    #[test]
    fn test_encode_exact_layout() {
        let cmd = ControlCommand::new(1.0, 0.0, -0.25, 3);
        assert_eq!(cmd.encode(), "(accel 1) (brake 0) (steer -0.25) (gear 3)");
    }

    #[test]
    fn test_encode_reverse_gear() {
        let cmd = ControlCommand::new(1.0, 0.0, 0.0, -1);
        assert!(cmd.encode().ends_with("(gear -1)"));
    }

    #[test]
    fn test_encoded_command_parses_back_as_frame() {
        let cmd = ControlCommand::new(0.734, 0.125, -0.0625, 4);
        let frame = SensorFrame::parse(&cmd.encode());
        assert_eq!(frame.scalar("accel"), Some(0.734));
        assert_eq!(frame.scalar("brake"), Some(0.125));
        assert_eq!(frame.scalar("steer"), Some(-0.0625));
        assert_eq!(frame.scalar("gear"), Some(4.0));
    }

    #[test]
    fn test_default_is_first_gear_idle() {
        let cmd = ControlCommand::default();
        assert_eq!(cmd.accelerate, 0.0);
        assert_eq!(cmd.brake, 0.0);
        assert_eq!(cmd.steer, 0.0);
        assert_eq!(cmd.gear, 1);
    }

    #[test]
    fn test_clamped() {
        let cmd = ControlCommand::new(1.7, -0.2, -3.0, 5).clamped();
        assert_eq!(cmd, ControlCommand::new(1.0, 0.0, -1.0, 5));
    }

    #[test]
    fn test_serde_roundtrip() {
        let cmd = ControlCommand::new(0.5, 0.25, 0.1, 2);
        let json = serde_json::to_string(&cmd).unwrap();
        let back: ControlCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
