use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::prompt::build_prompt;
use super::scoring::parse_response;
use crate::config::LlmSettings;
use crate::llm::{GenerationOptions, TextGenerator};
use crate::model::EmotionScores;

/// Scores reviews one at a time with a text generator.
pub struct EmotionClassifier {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
}

impl EmotionClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, options: GenerationOptions) -> Self {
        Self { generator, options }
    }

    pub fn from_settings(generator: Arc<dyn TextGenerator>, settings: &LlmSettings) -> Self {
        Self::new(
            generator,
            GenerationOptions {
                temperature: settings.temperature,
                json_format: true,
                timeout: Duration::from_secs(settings.timeout_sec),
            },
        )
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    /// Classifies one review. Never fails: a generator error or an
    /// unusable reply yields [`EmotionScores::failed`].
    pub async fn classify(&self, text: &str) -> EmotionScores {
        classify(self.generator.as_ref(), &self.options, text).await
    }
}

pub async fn classify(
    generator: &dyn TextGenerator,
    options: &GenerationOptions,
    text: &str,
) -> EmotionScores {
    let prompt = build_prompt(text);

    let raw = match generator.generate(&prompt, options).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Classifier call failed: {}", e);
            return EmotionScores::failed();
        }
    };

    match parse_response(&raw) {
        Ok(parsed) => EmotionScores::from(parsed),
        Err(e) => {
            warn!("Unusable classifier reply: {}", e);
            debug!("Raw reply: {}", raw);
            EmotionScores::failed()
        }
    }
}
