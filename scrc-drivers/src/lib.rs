//! Driving strategies for the SCRC client

pub mod manual;
pub mod mlp;
pub mod model;
pub mod rule;

pub use manual::{ControlSnapshot, LiveControls, ManualDriver};
pub use mlp::{DenseLayer, MlpPredictor, ModelLoadError, StandardScaler};
pub use model::ModelDriver;
pub use rule::{RuleConfig, RuleDriver};
