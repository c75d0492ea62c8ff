mod file_config;

pub use file_config::{
    ClassifyConfig, ClusterConfig, EarlyAccessConfig, EmotionCompareConfig, FiguresConfig,
    FileConfig, LlmConfig, RegionalScoresConfig, RegionalTestConfig, ScoreGapConfig,
    SteamReviewsConfig, SteamSpyConfig,
};

use crate::fetch::{DelayRange, PageSourceKind};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Titles sampled for the top-review download.
pub const DEFAULT_REVIEW_APP_IDS: [u64; 39] = [
    1623730, 1517290, 1551360, 1987080, 2050650, 1919590, 1196590, 1451940, 529340, 1966900,
    2344520, 860510, 1084600, 1515210, 668580, 1850570, 1985810, 2239150, 1371980, 780310,
    1338770, 2427700, 1388880, 2138710, 1034140, 990630, 1475810, 1465460, 2163330, 1954200,
    1601580, 2114740, 1875830, 1335790, 1509510, 2144740, 973810, 1497440, 1328840,
];
pub const DEFAULT_REGIONAL_APP_IDS: [u64; 2] = [2358720, 1623730];
pub const DEFAULT_PLAYTIME_APP_IDS: [u64; 2] = [2140330, 1190970];

pub const DEFAULT_STEAM_BASE_URL: &str = "https://store.steampowered.com";
pub const DEFAULT_REGIONAL_URL_TEMPLATE: &str =
    "https://www.togeproductions.com/SteamScout/steamAPI.php?appID={app_id}";
pub const DEFAULT_STEAMSPY_BASE_URL: &str = "https://steamspy.com/api.php";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "deepseek-r1:8b";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Per-run overrides taken from the command line. They win over both the
/// config file and the defaults.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub figure: Option<PathBuf>,
    pub app_ids: Vec<u64>,
}

/// The pipeline a set of [`CliOverrides`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchReviews,
    FetchRegionalScores,
    FetchPlaytime,
    Classify,
    RegionalTest,
    EmotionCompare,
    ScoreGapFigure,
    EarlyAccessFigure,
    Cluster,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub figures: FigureSettings,
    pub steam: SteamReviewsSettings,
    pub regional: RegionalScoresSettings,
    pub steamspy: SteamSpySettings,
    pub llm: LlmSettings,
    pub classify: ClassifySettings,
    pub regional_test: RegionalTestSettings,
    pub emotion_compare: EmotionCompareSettings,
    pub score_gap: ScoreGapSettings,
    pub early_access: EarlyAccessSettings,
    pub cluster: ClusterSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureSettings {
    pub width: u32,
    pub height: u32,
    pub scatter_height: u32,
}

impl Default for FigureSettings {
    fn default() -> Self {
        Self {
            width: 2400,
            height: 1200,
            scatter_height: 1600,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteamReviewsSettings {
    pub base_url: String,
    pub app_ids: Vec<u64>,
    pub output: PathBuf,
    pub top_n: usize,
    pub num_per_page: u32,
    pub max_pages: u32,
    pub filter: String,
    pub language: String,
    pub page_delay_ms: u64,
    pub before_delay: DelayRange,
    pub after_delay: DelayRange,
    pub request_timeout_sec: u64,
}

impl Default for SteamReviewsSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STEAM_BASE_URL.to_string(),
            app_ids: DEFAULT_REVIEW_APP_IDS.to_vec(),
            output: PathBuf::from("steam_reviews_top50.xlsx"),
            top_n: 50,
            num_per_page: 100,
            max_pages: 20,
            filter: "all".to_string(),
            language: "all".to_string(),
            page_delay_ms: 1000,
            before_delay: DelayRange::new(3.0, 5.0),
            after_delay: DelayRange::new(1.0, 2.0),
            request_timeout_sec: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalScoresSettings {
    pub url_template: String,
    pub app_ids: Vec<u64>,
    pub output: PathBuf,
    pub page_source: PageSourceKind,
    pub webdriver_url: String,
    pub render_wait: DelayRange,
    pub request_timeout_sec: u64,
}

impl Default for RegionalScoresSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_REGIONAL_URL_TEMPLATE.to_string(),
            app_ids: DEFAULT_REGIONAL_APP_IDS.to_vec(),
            output: PathBuf::from("regional_review_scores.xlsx"),
            page_source: PageSourceKind::Webdriver,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            render_wait: DelayRange::new(40.0, 70.0),
            request_timeout_sec: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteamSpySettings {
    pub base_url: String,
    pub app_ids: Vec<u64>,
    pub output: PathBuf,
    pub delay: DelayRange,
    pub request_timeout_sec: u64,
}

impl Default for SteamSpySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STEAMSPY_BASE_URL.to_string(),
            app_ids: DEFAULT_PLAYTIME_APP_IDS.to_vec(),
            output: PathBuf::from("steamspy_api_results.xlsx"),
            delay: DelayRange::new(1.0, 2.0),
            request_timeout_sec: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_sec: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            temperature: 0.1,
            timeout_sec: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifySettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub skip_sheets: Vec<String>,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("steam_reviews_top50.xlsx"),
            output: PathBuf::from("emotion_scores.xlsx"),
            skip_sheets: vec!["0_Summary".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalTestSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
}

impl Default for RegionalTestSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("games_studied_regional_score.xlsx"),
            sheet: "Sheet1".to_string(),
            output: PathBuf::from("Table 2.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionCompareSettings {
    pub input: PathBuf,
    pub skip_sheets: Vec<String>,
    pub output: PathBuf,
    pub figure: PathBuf,
    pub english_language: String,
    pub chinese_language: String,
}

impl Default for EmotionCompareSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("emotion_scores.xlsx"),
            skip_sheets: vec!["Sheet1".to_string(), "0_Summary".to_string()],
            output: PathBuf::from("emotion_analysis.xlsx"),
            figure: PathBuf::from("figure8.png"),
            english_language: "english".to_string(),
            chinese_language: "schinese".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGapSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub figure: PathBuf,
}

impl Default for ScoreGapSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("games_studied.xlsx"),
            sheet: "All".to_string(),
            output: PathBuf::from("score_gap_groups.xlsx"),
            figure: PathBuf::from("figure5.png"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarlyAccessSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub figure: PathBuf,
}

impl Default for EarlyAccessSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Gen9_5000.xlsx"),
            sheet: "All".to_string(),
            figure: PathBuf::from("early_access_scores.png"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub figure: PathBuf,
    pub k: usize,
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("games_studied.xlsx"),
            sheet: "All".to_string(),
            output: PathBuf::from("clustered_results.xlsx"),
            figure: PathBuf::from("figure7.png"),
            k: 4,
            seed: 42,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl AppConfig {
    /// Loads the TOML file if one was given and merges it over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(FileConfig::load).transpose()?;
        Self::resolve(file)
    }

    /// Resolve configuration from an optional TOML file config.
    /// File values override the built-in defaults where present.
    pub fn resolve(file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let mut config = AppConfig::default();

        if let Some(f) = file.figures {
            let figures = &mut config.figures;
            set(&mut figures.width, f.width);
            set(&mut figures.height, f.height);
            set(&mut figures.scatter_height, f.scatter_height);
        }

        if let Some(f) = file.steam {
            let steam = &mut config.steam;
            set(&mut steam.base_url, f.base_url);
            set(&mut steam.app_ids, f.app_ids);
            set_path(&mut steam.output, f.output);
            set(&mut steam.top_n, f.top_n);
            set(&mut steam.num_per_page, f.num_per_page);
            set(&mut steam.max_pages, f.max_pages);
            set(&mut steam.filter, f.filter);
            set(&mut steam.language, f.language);
            set(&mut steam.page_delay_ms, f.page_delay_ms);
            set(&mut steam.before_delay, f.before_delay_secs.map(DelayRange::from));
            set(&mut steam.after_delay, f.after_delay_secs.map(DelayRange::from));
            set(&mut steam.request_timeout_sec, f.request_timeout_sec);
        }

        if let Some(f) = file.regional {
            let regional = &mut config.regional;
            set(&mut regional.url_template, f.url_template);
            set(&mut regional.app_ids, f.app_ids);
            set_path(&mut regional.output, f.output);
            if let Some(kind) = f.page_source {
                regional.page_source = parse_page_source(&kind)?;
            }
            set(&mut regional.webdriver_url, f.webdriver_url);
            set(&mut regional.render_wait, f.render_wait_secs.map(DelayRange::from));
            set(&mut regional.request_timeout_sec, f.request_timeout_sec);
        }

        if let Some(f) = file.steamspy {
            let steamspy = &mut config.steamspy;
            set(&mut steamspy.base_url, f.base_url);
            set(&mut steamspy.app_ids, f.app_ids);
            set_path(&mut steamspy.output, f.output);
            set(&mut steamspy.delay, f.delay_secs.map(DelayRange::from));
            set(&mut steamspy.request_timeout_sec, f.request_timeout_sec);
        }

        if let Some(f) = file.llm {
            let llm = &mut config.llm;
            set(&mut llm.base_url, f.base_url);
            set(&mut llm.model, f.model);
            set(&mut llm.temperature, f.temperature);
            set(&mut llm.timeout_sec, f.timeout_sec);
        }

        if let Some(f) = file.classify {
            let classify = &mut config.classify;
            set_path(&mut classify.input, f.input);
            set_path(&mut classify.output, f.output);
            set(&mut classify.skip_sheets, f.skip_sheets);
        }

        if let Some(f) = file.regional_test {
            let regional_test = &mut config.regional_test;
            set_path(&mut regional_test.input, f.input);
            set(&mut regional_test.sheet, f.sheet);
            set_path(&mut regional_test.output, f.output);
        }

        if let Some(f) = file.emotion_compare {
            let compare = &mut config.emotion_compare;
            set_path(&mut compare.input, f.input);
            set(&mut compare.skip_sheets, f.skip_sheets);
            set_path(&mut compare.output, f.output);
            set_path(&mut compare.figure, f.figure);
            set(&mut compare.english_language, f.english_language);
            set(&mut compare.chinese_language, f.chinese_language);
        }

        if let Some(f) = file.score_gap {
            let score_gap = &mut config.score_gap;
            set_path(&mut score_gap.input, f.input);
            set(&mut score_gap.sheet, f.sheet);
            set_path(&mut score_gap.output, f.output);
            set_path(&mut score_gap.figure, f.figure);
        }

        if let Some(f) = file.early_access {
            let early_access = &mut config.early_access;
            set_path(&mut early_access.input, f.input);
            set(&mut early_access.sheet, f.sheet);
            set_path(&mut early_access.figure, f.figure);
        }

        if let Some(f) = file.cluster {
            let cluster = &mut config.cluster;
            set_path(&mut cluster.input, f.input);
            set(&mut cluster.sheet, f.sheet);
            set_path(&mut cluster.output, f.output);
            set_path(&mut cluster.figure, f.figure);
            set(&mut cluster.k, f.k);
            set(&mut cluster.seed, f.seed);
            set(&mut cluster.restarts, f.restarts);
            set(&mut cluster.max_iterations, f.max_iterations);
            set(&mut cluster.tolerance, f.tolerance);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.steam.top_n == 0 {
            bail!("steam.top_n must be at least 1");
        }
        if !(1..=100).contains(&self.steam.num_per_page) {
            bail!(
                "steam.num_per_page must be between 1 and 100, got {}",
                self.steam.num_per_page
            );
        }
        if self.steam.max_pages == 0 {
            bail!("steam.max_pages must be at least 1");
        }
        for (name, range) in [
            ("steam.before_delay_secs", &self.steam.before_delay),
            ("steam.after_delay_secs", &self.steam.after_delay),
            ("regional.render_wait_secs", &self.regional.render_wait),
            ("steamspy.delay_secs", &self.steamspy.delay),
        ] {
            if !range.is_valid() {
                bail!(
                    "{} must be [min, max] with 0 <= min <= max, got [{}, {}]",
                    name,
                    range.min_secs(),
                    range.max_secs()
                );
            }
        }
        if !self.regional.url_template.contains("{app_id}") {
            bail!("regional.url_template must contain an {{app_id}} placeholder");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            );
        }
        if self.cluster.k == 0 {
            bail!("cluster.k must be at least 1");
        }
        if self.cluster.restarts == 0 || self.cluster.max_iterations == 0 {
            bail!("cluster.restarts and cluster.max_iterations must be at least 1");
        }
        if self.figures.width == 0 || self.figures.height == 0 || self.figures.scatter_height == 0
        {
            bail!("figure dimensions must be non-zero");
        }
        Ok(())
    }

    /// Applies command-line overrides to the settings of one pipeline.
    /// Positional app ids replace the configured list when any are given.
    pub fn apply_overrides(&mut self, stage: Stage, overrides: &CliOverrides) {
        let CliOverrides {
            input,
            output,
            figure,
            app_ids,
        } = overrides;

        match stage {
            Stage::FetchReviews => {
                set_ids(&mut self.steam.app_ids, app_ids);
                set(&mut self.steam.output, output.clone());
            }
            Stage::FetchRegionalScores => {
                set_ids(&mut self.regional.app_ids, app_ids);
                set(&mut self.regional.output, output.clone());
            }
            Stage::FetchPlaytime => {
                set_ids(&mut self.steamspy.app_ids, app_ids);
                set(&mut self.steamspy.output, output.clone());
            }
            Stage::Classify => {
                set(&mut self.classify.input, input.clone());
                set(&mut self.classify.output, output.clone());
            }
            Stage::RegionalTest => {
                set(&mut self.regional_test.input, input.clone());
                set(&mut self.regional_test.output, output.clone());
            }
            Stage::EmotionCompare => {
                set(&mut self.emotion_compare.input, input.clone());
                set(&mut self.emotion_compare.output, output.clone());
                set(&mut self.emotion_compare.figure, figure.clone());
            }
            Stage::ScoreGapFigure => {
                set(&mut self.score_gap.input, input.clone());
                set(&mut self.score_gap.output, output.clone());
                set(&mut self.score_gap.figure, figure.clone());
            }
            Stage::EarlyAccessFigure => {
                set(&mut self.early_access.input, input.clone());
                set(&mut self.early_access.figure, figure.clone());
            }
            Stage::Cluster => {
                set(&mut self.cluster.input, input.clone());
                set(&mut self.cluster.output, output.clone());
                set(&mut self.cluster.figure, figure.clone());
            }
        }
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_path(target: &mut PathBuf, value: Option<String>) {
    set(target, value.map(PathBuf::from));
}

fn set_ids(target: &mut Vec<u64>, ids: &[u64]) {
    if !ids.is_empty() {
        *target = ids.to_vec();
    }
}

/// Parses a page source name using clap's ValueEnum trait.
fn parse_page_source(s: &str) -> Result<PageSourceKind> {
    PageSourceKind::from_str(s, true)
        .map_err(|_| anyhow::anyhow!("Unknown page source '{}', expected webdriver or http", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_research_constants() {
        let config = AppConfig::resolve(None).unwrap();
        assert_eq!(config.steam.app_ids.len(), 39);
        assert_eq!(config.steam.app_ids[0], 1623730);
        assert_eq!(config.steam.top_n, 50);
        assert_eq!(config.steam.before_delay, DelayRange::new(3.0, 5.0));
        assert_eq!(config.regional.app_ids, vec![2358720, 1623730]);
        assert_eq!(config.regional.render_wait, DelayRange::new(40.0, 70.0));
        assert_eq!(config.steamspy.app_ids, vec![2140330, 1190970]);
        assert_eq!(config.llm.model, "deepseek-r1:8b");
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.regional_test.output, PathBuf::from("Table 2.xlsx"));
        assert_eq!(config.cluster.k, 4);
        assert_eq!(config.cluster.seed, 42);
    }

    #[test]
    fn test_parse_page_source() {
        assert_eq!(parse_page_source("http").unwrap(), PageSourceKind::Http);
        assert_eq!(
            parse_page_source("WEBDRIVER").unwrap(),
            PageSourceKind::Webdriver
        );
        assert!(parse_page_source("curl").is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = FileConfig {
            steam: Some(SteamReviewsConfig {
                app_ids: Some(vec![1, 2, 3]),
                top_n: Some(10),
                after_delay_secs: Some([0.0, 0.0]),
                ..Default::default()
            }),
            regional: Some(RegionalScoresConfig {
                page_source: Some("http".to_string()),
                ..Default::default()
            }),
            cluster: Some(ClusterConfig {
                output: Some("out/clusters.xlsx".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(Some(file)).unwrap();
        assert_eq!(config.steam.app_ids, vec![1, 2, 3]);
        assert_eq!(config.steam.top_n, 10);
        assert_eq!(config.steam.after_delay, DelayRange::none());
        // Untouched fields keep their defaults
        assert_eq!(config.steam.before_delay, DelayRange::new(3.0, 5.0));
        assert_eq!(config.regional.page_source, PageSourceKind::Http);
        assert_eq!(config.cluster.output, PathBuf::from("out/clusters.xlsx"));
        assert_eq!(config.cluster.k, 4);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            classify: Some(ClassifyConfig {
                input: Some("from_toml.xlsx".to_string()),
                output: Some("toml_out.xlsx".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut config = AppConfig::resolve(Some(file)).unwrap();

        config.apply_overrides(
            Stage::Classify,
            &CliOverrides {
                input: Some(PathBuf::from("from_cli.xlsx")),
                ..Default::default()
            },
        );

        assert_eq!(config.classify.input, PathBuf::from("from_cli.xlsx"));
        // TOML value used when the CLI doesn't specify
        assert_eq!(config.classify.output, PathBuf::from("toml_out.xlsx"));
    }

    #[test]
    fn test_positional_ids_replace_list() {
        let mut config = AppConfig::default();
        config.apply_overrides(Stage::FetchPlaytime, &CliOverrides::default());
        assert_eq!(config.steamspy.app_ids, DEFAULT_PLAYTIME_APP_IDS.to_vec());

        config.apply_overrides(
            Stage::FetchPlaytime,
            &CliOverrides {
                app_ids: vec![730],
                ..Default::default()
            },
        );
        assert_eq!(config.steamspy.app_ids, vec![730]);
        // Other stages are untouched
        assert_eq!(config.steam.app_ids.len(), 39);
    }

    #[test]
    fn test_validation_errors() {
        let bad_delay = FileConfig {
            steamspy: Some(SteamSpyConfig {
                delay_secs: Some([2.0, 1.0]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(Some(bad_delay)).unwrap_err();
        assert!(err.to_string().contains("steamspy.delay_secs"));

        let bad_page = FileConfig {
            steam: Some(SteamReviewsConfig {
                num_per_page: Some(500),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(Some(bad_page)).is_err());

        let bad_template = FileConfig {
            regional: Some(RegionalScoresConfig {
                url_template: Some("https://example.com/scores".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(Some(bad_template))
            .unwrap_err()
            .to_string()
            .contains("{app_id}"));

        let bad_source = FileConfig {
            regional: Some(RegionalScoresConfig {
                page_source: Some("telnet".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(Some(bad_source)).is_err());
    }
}
