pub mod api;
pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod predictor;
pub mod preprocess;
pub mod state;

pub use crate::error::PredictError;
pub use crate::labels::{ClassNames, LabelError, LabelFormat};
pub use crate::models::cosplay_cnn::CosplayCnn;
pub use crate::models::ImageClassifier;
pub use crate::predictor::{Candidate, Prediction, Predictor};
pub use crate::state::AppState;
