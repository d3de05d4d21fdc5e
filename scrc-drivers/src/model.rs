//! Model-driven autonomous driver
//!
//! Wraps an externally trained predictor and its feature scaler. Gear is
//! never predicted; the gearbox handles it just like for the other drivers.

use anyhow::{bail, Result};
use scrc_core::{
    gearbox::ShiftSchedule, ControlCommand, DrivingStrategy, FeatureScaler, FeatureVector,
    GearState, Prediction, Predictor, SensorFrame,
};
use tracing::{debug, warn};

pub struct ModelDriver {
    scaler: Box<dyn FeatureScaler>,
    predictor: Box<dyn Predictor>,
    schedule: ShiftSchedule,
    failures: u64,
}

impl ModelDriver {
    pub fn new(scaler: Box<dyn FeatureScaler>, predictor: Box<dyn Predictor>) -> Self {
        Self {
            scaler,
            predictor,
            schedule: ShiftSchedule::default(),
            failures: 0,
        }
    }

    /// Number of ticks that fell back to the previous command
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn infer(&self, frame: &SensorFrame) -> Result<Prediction> {
        let features = FeatureVector::extract(frame);
        let scaled = self.scaler.normalize(&features)?;
        let prediction = self.predictor.predict(&scaled)?;
        if !prediction.is_finite() {
            bail!("non-finite prediction {:?}", prediction);
        }
        Ok(prediction)
    }
}

impl DrivingStrategy for ModelDriver {
    fn name(&self) -> &str {
        "model"
    }

    fn decide(
        &mut self,
        frame: &SensorFrame,
        previous: &ControlCommand,
        gear: &mut GearState,
    ) -> ControlCommand {
        gear.refresh(&self.schedule, frame, false);

        match self.infer(frame) {
            Ok(p) => {
                debug!(
                    "Prediction accel={:.3} brake={:.3} steer={:.3}",
                    p.accelerate, p.brake, p.steer
                );
                ControlCommand::new(p.accelerate, p.brake, p.steer, gear.gear).clamped()
            }
            Err(e) => {
                self.failures += 1;
                warn!("Model prediction failed, holding previous command: {:#}", e);
                ControlCommand {
                    gear: gear.gear,
                    ..*previous
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Identity;

    impl FeatureScaler for Identity {
        fn normalize(&self, features: &FeatureVector) -> Result<FeatureVector> {
            Ok(features.clone())
        }
    }

    struct Fixed(Prediction);

    impl Predictor for Fixed {
        fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl Predictor for Broken {
        fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
            Err(anyhow!("model exploded"))
        }
    }

    const FRAME: &str = "(speedX 90)(rpm 6000)(gear 3)(trackPos 0.1)(angle 0.02)";

    #[test]
    fn test_prediction_becomes_command() {
        let mut driver = ModelDriver::new(
            Box::new(Identity),
            Box::new(Fixed(Prediction { accelerate: 0.8, brake: 0.0, steer: -0.1 })),
        );
        let mut gear = GearState::default();
        let cmd = driver.decide(&SensorFrame::parse(FRAME), &ControlCommand::default(), &mut gear);
        assert_eq!(cmd, ControlCommand::new(0.8, 0.0, -0.1, 4));
        assert_eq!(driver.failures(), 0);
    }

    #[test]
    fn test_prediction_is_clamped() {
        let mut driver = ModelDriver::new(
            Box::new(Identity),
            Box::new(Fixed(Prediction { accelerate: 1.4, brake: -0.2, steer: 2.0 })),
        );
        let mut gear = GearState::default();
        let cmd = driver.decide(&SensorFrame::parse(FRAME), &ControlCommand::default(), &mut gear);
        assert_eq!(cmd.accelerate, 1.0);
        assert_eq!(cmd.brake, 0.0);
        assert_eq!(cmd.steer, 1.0);
    }

    #[test]
    fn test_failure_holds_previous_and_refreshes_gear() {
        let mut driver = ModelDriver::new(Box::new(Identity), Box::new(Broken));
        let previous = ControlCommand::new(0.6, 0.1, 0.25, 3);
        let mut gear = GearState::new(3);
        let cmd = driver.decide(&SensorFrame::parse(FRAME), &previous, &mut gear);
        assert_eq!(cmd.accelerate, 0.6);
        assert_eq!(cmd.brake, 0.1);
        assert_eq!(cmd.steer, 0.25);
        assert_eq!(cmd.gear, 4);
        assert_eq!(gear.gear, 4);
        assert_eq!(driver.failures(), 1);
    }

    #[test]
    fn test_non_finite_prediction_is_a_failure() {
        let mut driver = ModelDriver::new(
            Box::new(Identity),
            Box::new(Fixed(Prediction { accelerate: f64::NAN, brake: 0.0, steer: 0.0 })),
        );
        let previous = ControlCommand::new(0.3, 0.0, 0.0, 2);
        let mut gear = GearState::new(2);
        let cmd = driver.decide(&SensorFrame::parse("(rpm 4000)(gear 2)"), &previous, &mut gear);
        assert_eq!(cmd, previous);
        assert_eq!(driver.failures(), 1);
    }
}
