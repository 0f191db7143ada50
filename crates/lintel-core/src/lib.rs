pub mod annotations;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ingest;
pub mod pipeline;
pub mod rules;
pub mod stats;
pub mod types;

pub use classify::{Classification, ClassificationNote, ElementClassifier};
pub use config::Config;
pub use error::AnalysisError;
pub use pipeline::{AnalysisOutput, Analyzer};
pub use stats::{AggregateValue, AnalysisResult, Statistics, TypeStatistics};
pub use types::*;
