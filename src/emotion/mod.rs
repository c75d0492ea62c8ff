//! Eight-dimension emotion scoring of review texts.
//!
//! A review is sent to the text generator with a fixed prompt; the reply is
//! parsed into clamped intensities, the dominant emotion is resolved and the
//! sentiment follows from its polarity.

mod classifier;
mod pipeline;
mod prompt;
mod scoring;

pub use classifier::{classify, EmotionClassifier};
pub use pipeline::{classify_workbook, emotion_columns, recommendation_label, ClassifySummary};
pub use prompt::build_prompt;
pub use scoring::{parse_response, resolve_dominant, ParseError, ParsedScores};
