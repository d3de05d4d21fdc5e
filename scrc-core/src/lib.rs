//! SCRC Client Core Library
//!
//! This crate provides the wire model, gearbox and strategy traits shared by
//! every driver of the simulated-racing client protocol.

pub mod command;
pub mod features;
pub mod frame;
pub mod gearbox;
pub mod protocol;
pub mod strategy;

pub use command::ControlCommand;
pub use features::FeatureVector;
pub use frame::SensorFrame;
pub use gearbox::{GearState, ShiftSchedule};
pub use strategy::{DrivingStrategy, FeatureScaler, Prediction, Predictor};
