//! Outbound integrations

pub mod ml_engine;

pub use ml_engine::{parse_prediction, AuthMode, ImageScorer, MlEngineClient, PredictionError};
