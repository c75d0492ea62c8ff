//! Regional Sentiment library
//!
//! Data collection, emotion scoring and statistical comparison of Steam
//! reviews across language communities. The binary in `main.rs` wires these
//! modules to one subcommand per pipeline step.

pub mod analysis;
pub mod cli_style;
pub mod config;
pub mod emotion;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod plot;
pub mod stats;
pub mod workbook;

pub use config::{AppConfig, CliOverrides, Stage};
pub use model::{DominantEmotion, Emotion, EmotionScores, GameMetadata, ReviewRecord, Sentiment};
