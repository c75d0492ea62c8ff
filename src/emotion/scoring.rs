use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

use crate::model::{DominantEmotion, Emotion, EmotionScores, Sentiment};

/// Reasons a classifier reply cannot be turned into scores.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response JSON is not an object")]
    NotAnObject,

    #[error("Response has no 'emotions' object")]
    MissingEmotions,

    #[error("Intensity for {emotion} is not numeric: {value}")]
    NonNumeric { emotion: Emotion, value: String },
}

/// Confidence and intensities as read from a reply, already clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScores {
    pub confidence: f64,
    pub intensities: [f64; 8],
}

/// Reasoning models may prefix their answer with a `<think>` block.
static THINK_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").ok());

/// Clamps into [0, 1]; NaN becomes 0.
fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let cleaned = match THINK_BLOCK.as_ref() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    let trimmed = cleaned.trim();

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(first_err) => {
            // Tolerate chatter around the object.
            let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
                return Err(ParseError::InvalidJson(first_err.to_string()));
            };
            if end < start {
                return Err(ParseError::InvalidJson(first_err.to_string()));
            }
            serde_json::from_str(&trimmed[start..=end])
                .map_err(|e| ParseError::InvalidJson(e.to_string()))?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject),
    }
}

/// Looks a key up exactly first, then ignoring ASCII case.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Parses a classifier reply into clamped scores.
///
/// Missing emotions count as 0. Numbers and numeric strings are accepted and
/// clamped into [0, 1], NaN reads as 0. Any other intensity value fails the
/// whole reply, as does a missing `emotions` object. Confidence is read the
/// same way but never fails: missing or non-numeric reads as 0.
pub fn parse_response(raw: &str) -> Result<ParsedScores, ParseError> {
    let root = parse_json_object(raw)?;

    let emotions = match lookup(&root, "emotions") {
        Some(Value::Object(map)) => map,
        _ => return Err(ParseError::MissingEmotions),
    };

    let mut intensities = [0.0; 8];
    for emotion in Emotion::ALL {
        let value = match lookup(emotions, emotion.name()) {
            None => 0.0,
            Some(v) => numeric(v).ok_or_else(|| ParseError::NonNumeric {
                emotion,
                value: v.to_string(),
            })?,
        };
        intensities[emotion.index()] = clamp_unit(value);
    }

    let confidence = lookup(&root, "confidence")
        .and_then(numeric)
        .map(clamp_unit)
        .unwrap_or(0.0);

    Ok(ParsedScores {
        confidence,
        intensities,
    })
}

/// Highest-scoring emotion. Among tied maxima the first one with positive
/// polarity wins, otherwise the first tied one in canonical order.
pub fn resolve_dominant(intensities: &[f64; 8]) -> Emotion {
    let max = intensities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<Emotion> = Emotion::ALL
        .iter()
        .copied()
        .filter(|e| intensities[e.index()] == max)
        .collect();

    tied.iter()
        .copied()
        .find(|e| e.polarity() == Sentiment::Positive)
        .or_else(|| tied.first().copied())
        .unwrap_or(Emotion::ALL[0])
}

impl From<ParsedScores> for EmotionScores {
    /// The sentiment is always the polarity of the dominant emotion.
    fn from(parsed: ParsedScores) -> Self {
        let dominant = resolve_dominant(&parsed.intensities);
        EmotionScores {
            sentiment: dominant.polarity(),
            confidence: parsed.confidence,
            intensities: parsed.intensities,
            dominant: DominantEmotion::Emotion(dominant),
        }
    }
}
