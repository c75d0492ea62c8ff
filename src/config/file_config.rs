use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Contents of the optional TOML config file. Every field is optional; absent
/// fields fall back to the built-in defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub figures: Option<FiguresConfig>,
    pub steam: Option<SteamReviewsConfig>,
    pub regional: Option<RegionalScoresConfig>,
    pub steamspy: Option<SteamSpyConfig>,
    pub llm: Option<LlmConfig>,
    pub classify: Option<ClassifyConfig>,
    pub regional_test: Option<RegionalTestConfig>,
    pub emotion_compare: Option<EmotionCompareConfig>,
    pub score_gap: Option<ScoreGapConfig>,
    pub early_access: Option<EarlyAccessConfig>,
    pub cluster: Option<ClusterConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FiguresConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Height of the 3D cluster scatter, which needs more vertical room.
    pub scatter_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SteamReviewsConfig {
    pub base_url: Option<String>,
    pub app_ids: Option<Vec<u64>>,
    pub output: Option<String>,
    pub top_n: Option<usize>,
    pub num_per_page: Option<u32>,
    pub max_pages: Option<u32>,
    pub filter: Option<String>,
    pub language: Option<String>,
    pub page_delay_ms: Option<u64>,
    /// `[min, max]` seconds slept before each app id.
    pub before_delay_secs: Option<[f64; 2]>,
    /// `[min, max]` seconds slept after each app id.
    pub after_delay_secs: Option<[f64; 2]>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RegionalScoresConfig {
    /// Page URL with an `{app_id}` placeholder.
    pub url_template: Option<String>,
    pub app_ids: Option<Vec<u64>>,
    pub output: Option<String>,
    /// "webdriver" or "http"
    pub page_source: Option<String>,
    pub webdriver_url: Option<String>,
    pub render_wait_secs: Option<[f64; 2]>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SteamSpyConfig {
    pub base_url: Option<String>,
    pub app_ids: Option<Vec<u64>>,
    pub output: Option<String>,
    pub delay_secs: Option<[f64; 2]>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClassifyConfig {
    pub input: Option<String>,
    pub output: Option<String>,
    pub skip_sheets: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RegionalTestConfig {
    pub input: Option<String>,
    pub sheet: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EmotionCompareConfig {
    pub input: Option<String>,
    pub skip_sheets: Option<Vec<String>>,
    pub output: Option<String>,
    pub figure: Option<String>,
    pub english_language: Option<String>,
    pub chinese_language: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScoreGapConfig {
    pub input: Option<String>,
    pub sheet: Option<String>,
    pub output: Option<String>,
    pub figure: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EarlyAccessConfig {
    pub input: Option<String>,
    pub sheet: Option<String>,
    pub figure: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClusterConfig {
    pub input: Option<String>,
    pub sheet: Option<String>,
    pub output: Option<String>,
    pub figure: Option<String>,
    pub k: Option<usize>,
    pub seed: Option<u64>,
    pub restarts: Option<usize>,
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[steam]
app_ids = [10, 20]
top_n = 5
before_delay_secs = [0.0, 0.5]

[llm]
model = "qwen2.5:7b"
temperature = 0.3
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        let steam = config.steam.unwrap();
        assert_eq!(steam.app_ids, Some(vec![10, 20]));
        assert_eq!(steam.top_n, Some(5));
        assert_eq!(steam.before_delay_secs, Some([0.0, 0.5]));
        assert!(steam.base_url.is_none());

        let llm = config.llm.unwrap();
        assert_eq!(llm.model.as_deref(), Some("qwen2.5:7b"));
        assert_eq!(llm.temperature, Some(0.3));
        assert!(config.cluster.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[steam]\ntop_n = \"many\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/regional.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
