use crate::domain::error::{AppError, Result};
use crate::domain::features::FeatureVector;
use crate::infrastructure::artifacts::ArtifactProvider;
use std::sync::Arc;
use tracing::debug;

/// Runs the submitted features through scaler and model.
///
/// Synchronous and bounded: one element-wise standardization and one dot
/// product per call. No retries; a failed prediction is final for that
/// request.
pub struct PredictUseCase {
    artifacts: Arc<dyn ArtifactProvider>,
}

impl PredictUseCase {
    pub fn new(artifacts: Arc<dyn ArtifactProvider>) -> Self {
        Self { artifacts }
    }

    pub fn execute(&self, features: &FeatureVector) -> Result<f64> {
        // Both artifacts must be present before anything runs.
        let scaler = self.artifacts.scaler();
        let model = self.artifacts.model();
        let (scaler, model) = match (scaler, model) {
            (Ok(s), Ok(m)) => (s, m),
            (scaler, model) => {
                let mut missing = Vec::new();
                if let Err(e) = &scaler {
                    missing.push(format!("scaler ({e})"));
                }
                if let Err(e) = &model {
                    missing.push(format!("model ({e})"));
                }
                return Err(AppError::ArtifactsUnavailable(missing.join("; ")));
            }
        };

        let row = features.to_row();
        debug!(?row, "Assembled feature row");

        let scaled = scaler.transform(&row).map_err(as_prediction_failure)?;
        let prediction = model.predict(&scaled).map_err(as_prediction_failure)?;

        Ok(prediction)
    }
}

fn as_prediction_failure(err: AppError) -> AppError {
    match err {
        AppError::PredictionFailure(_) => err,
        other => AppError::PredictionFailure(other.to_string()),
    }
}

/// Display formatting happens here and nowhere earlier; the raw scalar is
/// never rounded inside the pipeline.
pub fn format_prediction(value: f64) -> String {
    format!("{:.2}", value)
}
