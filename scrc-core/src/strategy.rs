//! Driving strategy and model plug-in traits

use crate::command::ControlCommand;
use crate::features::FeatureVector;
use crate::frame::SensorFrame;
use crate::gearbox::GearState;
use anyhow::Result;

/// Trait for anything that can drive the car
///
/// Each strategy is responsible for:
/// - Turning a sensor frame into accelerate/brake/steer values
/// - Refreshing the gear through the gearbox (unless it overrides gear)
/// - Never failing: internal errors fall back to the previous command
pub trait DrivingStrategy: Send {
    /// Get the name of this strategy (e.g., "manual", "model")
    fn name(&self) -> &str;

    /// Decide this tick's command
    ///
    /// `previous` is the command sent on the last tick and is the fallback
    /// for accelerate/brake/steer when the strategy cannot compute new ones.
    fn decide(
        &mut self,
        frame: &SensorFrame,
        previous: &ControlCommand,
        gear: &mut GearState,
    ) -> ControlCommand;

    /// Called when the server restarts the race
    fn on_restart(&mut self) {}

    /// Called when the server shuts the client down
    fn on_shutdown(&mut self) {}
}

/// Model output for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub accelerate: f64,
    pub brake: f64,
    pub steer: f64,
}

impl Prediction {
    pub fn is_finite(&self) -> bool {
        self.accelerate.is_finite() && self.brake.is_finite() && self.steer.is_finite()
    }
}

/// Trained regressor mapping a normalized feature vector to pedal/steer values
pub trait Predictor: Send {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;
}

/// Input normalization fitted alongside the predictor
pub trait FeatureScaler: Send {
    fn normalize(&self, features: &FeatureVector) -> Result<FeatureVector>;
}
