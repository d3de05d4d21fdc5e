//! JSON-persisted feature scaler and multilayer perceptron
//!
//! Training happens offline. These types only load the exported parameters
//! and run the forward pass.
//!
//! Scaler file:
//!
//! ```json
//! { "mean": [..], "scale": [..] }
//! ```
//!
//! Model file (weights are `[outputs][inputs]`, hidden layers use ReLU, the
//! output layer is linear and its first three values are accel/brake/steer):
//!
//! ```json
//! { "layers": [ { "weights": [[..], ..], "biases": [..] }, .. ] }
//! ```

use anyhow::{bail, ensure, Result};
use scrc_core::{FeatureScaler, FeatureVector, Prediction, Predictor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading model parameters from disk
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("inconsistent shape: {0}")]
    Shape(String),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelLoadError> {
    let data = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ModelLoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Standardization `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelLoadError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let scaler: Self = read_json(path.as_ref())?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.mean.len() != self.scale.len() {
            return Err(ModelLoadError::Shape(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn normalize(&self, features: &FeatureVector) -> Result<FeatureVector> {
        ensure!(
            features.len() == self.mean.len(),
            "scaler expects {} features, got {}",
            self.mean.len(),
            features.len()
        );

        Ok(features
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fitted with zero variance
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect::<Vec<_>>()
            .into())
    }
}

/// One fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }
}

/// Feed-forward regressor with ReLU hidden layers
///
/// Deserializing runs the same shape checks as [`MlpPredictor::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMlp")]
pub struct MlpPredictor {
    pub layers: Vec<DenseLayer>,
}

#[derive(Deserialize)]
struct RawMlp {
    layers: Vec<DenseLayer>,
}

impl TryFrom<RawMlp> for MlpPredictor {
    type Error = ModelLoadError;

    fn try_from(raw: RawMlp) -> Result<Self, Self::Error> {
        Self::new(raw.layers)
    }
}

impl MlpPredictor {
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, ModelLoadError> {
        let model = Self { layers };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        read_json(path.as_ref())
    }

    /// Width of the expected input vector
    pub fn input_len(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        let Some(last) = self.layers.last() else {
            return Err(ModelLoadError::Shape("model has no layers".to_string()));
        };

        let mut width = self.input_len();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.biases.len() {
                return Err(ModelLoadError::Shape(format!(
                    "layer {} has {} weight rows but {} biases",
                    i,
                    layer.weights.len(),
                    layer.biases.len()
                )));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != width) {
                return Err(ModelLoadError::Shape(format!(
                    "layer {} row {} expects {} inputs",
                    i, row, width
                )));
            }
            width = layer.biases.len();
        }

        if last.biases.len() < 3 {
            return Err(ModelLoadError::Shape(format!(
                "output layer has {} units, need at least 3",
                last.biases.len()
            )));
        }
        Ok(())
    }
}

impl Predictor for MlpPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        ensure!(
            features.len() == self.input_len(),
            "model expects {} features, got {}",
            self.input_len(),
            features.len()
        );

        // Layers are public, so a hand-built model may skip validation
        let hidden = self.layers.len().saturating_sub(1);
        let mut activations = features.as_slice().to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);
            if i < hidden {
                activations.iter_mut().for_each(|a| *a = a.max(0.0));
            }
        }

        match activations[..] {
            [accelerate, brake, steer, ..] => Ok(Prediction {
                accelerate,
                brake,
                steer,
            }),
            _ => bail!("model produced {} outputs, need at least 3", activations.len()),
        }
    }
}
