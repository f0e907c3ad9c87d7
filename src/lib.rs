pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use application::PredictUseCase;
pub use domain::error::{AppError, Result};
pub use domain::features::{Classes, FeatureVector, Region};
pub use infrastructure::artifacts::{
    ArtifactLayout, ArtifactStore, Predictor, RidgeModel, StandardScaler, Transformer,
};
pub use infrastructure::config::Settings;
