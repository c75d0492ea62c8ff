//! Record types shared by the fetch, classification and analysis pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary review polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 2] = [Sentiment::Positive, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }

    /// Maps a Steam "voted up" flag to a polarity.
    pub fn from_recommendation(voted_up: bool) -> Self {
        if voted_up {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("Unknown sentiment: {}", other)),
        }
    }
}

/// The eight emotion categories scored for every review.
///
/// The declaration order is the canonical order used for output columns and
/// for breaking ties when resolving the dominant emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emotion {
    Anger,
    Disgust,
    Anticipation,
    Fear,
    Joy,
    Sadness,
    Trust,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Anticipation,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Trust,
        Emotion::Surprise,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Anger => "Anger",
            Emotion::Disgust => "Disgust",
            Emotion::Anticipation => "Anticipation",
            Emotion::Fear => "Fear",
            Emotion::Joy => "Joy",
            Emotion::Sadness => "Sadness",
            Emotion::Trust => "Trust",
            Emotion::Surprise => "Surprise",
        }
    }

    /// Fixed emotion -> polarity lookup.
    pub fn polarity(&self) -> Sentiment {
        match self {
            Emotion::Anger | Emotion::Disgust | Emotion::Fear | Emotion::Sadness => {
                Sentiment::Negative
            }
            Emotion::Anticipation | Emotion::Joy | Emotion::Trust | Emotion::Surprise => {
                Sentiment::Positive
            }
        }
    }

    /// Position in [`Emotion::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown emotion: {}", trimmed))
    }
}

/// Dominant emotion of a scored review, or the sentinel written when
/// classification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DominantEmotion {
    Emotion(Emotion),
    Error,
}

impl DominantEmotion {
    pub const ERROR_LABEL: &'static str = "error";

    pub fn as_str(&self) -> &'static str {
        match self {
            DominantEmotion::Emotion(e) => e.name(),
            DominantEmotion::Error => Self::ERROR_LABEL,
        }
    }

    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            DominantEmotion::Emotion(e) => Some(*e),
            DominantEmotion::Error => None,
        }
    }
}

impl fmt::Display for DominantEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DominantEmotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::ERROR_LABEL) {
            return Ok(DominantEmotion::Error);
        }
        s.parse::<Emotion>().map(DominantEmotion::Emotion)
    }
}

/// Output of the emotion classifier for a single review.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScores {
    pub sentiment: Sentiment,
    pub confidence: f64,
    /// Intensities in [`Emotion::ALL`] order, each within [0, 1].
    pub intensities: [f64; 8],
    pub dominant: DominantEmotion,
}

impl EmotionScores {
    /// The record used when the classifier call fails outright.
    pub fn failed() -> Self {
        Self {
            sentiment: Sentiment::Negative,
            confidence: 0.0,
            intensities: [0.0; 8],
            dominant: DominantEmotion::Error,
        }
    }

    pub fn intensity(&self, emotion: Emotion) -> f64 {
        self.intensities[emotion.index()]
    }

    pub fn is_failed(&self) -> bool {
        self.dominant == DominantEmotion::Error
    }
}

/// A single Steam user review as kept for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub review_id: String,
    pub language: String,
    pub is_recommended: Option<bool>,
    pub votes_up: u64,
    pub votes_funny: u64,
    pub weighted_score: f64,
    /// Playtime when the review was written, formatted as hours ("12.5h").
    pub playtime_at_review: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub steam_purchase: bool,
}

/// Per-title metadata read from the prepared study workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameMetadata {
    pub steam_id: String,
    pub name: String,
    pub price: Option<f64>,
    pub review_score: Option<f64>,
    /// English minus Chinese aggregate review score.
    pub score_gap: Option<f64>,
    pub median_playtime: Option<f64>,
}

impl GameMetadata {
    /// True when every numeric field needed for clustering is present.
    pub fn is_complete(&self) -> bool {
        self.price.is_some()
            && self.review_score.is_some()
            && self.score_gap.is_some()
            && self.median_playtime.is_some()
    }
}
