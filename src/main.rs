use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use regional_sentiment::analysis::{
    run_cluster, run_early_access_figure, run_emotion_compare, run_regional_test,
    run_score_gap_figure,
};
use regional_sentiment::cli_style::{
    get_styles, print_error, print_key_value, print_section_header, print_success,
    print_warning,
};
use regional_sentiment::emotion::{classify_workbook, EmotionClassifier};
use regional_sentiment::fetch::{
    create_page_source, fetch_playtime, fetch_regional_scores, fetch_reviews,
};
use regional_sentiment::llm::OllamaProvider;
use regional_sentiment::{AppConfig, CliOverrides, Stage};

#[derive(Parser, Debug)]
#[command(styles=get_styles(), version, about)]
struct CliArgs {
    /// Optional TOML file overriding the built-in defaults.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the most helpful reviews of each app into one sheet per app.
    FetchReviews(IdArgs),
    /// Scrape the per-language review score table of each app.
    FetchRegionalScores(IdArgs),
    /// Look up the median playtime of each app on SteamSpy.
    FetchPlaytime(IdArgs),
    /// Score every review of the review workbook with the language model.
    Classify(PathArgs),
    /// z tests of each language's scores against the global scores.
    RegionalTest(PathArgs),
    /// Compare dominant emotions of English and Chinese reviews.
    EmotionCompare(PathArgs),
    /// Box plots of the score gap by review score and by price.
    ScoreGapFigure(PathArgs),
    /// Box plots of review scores by Early Access status.
    EarlyAccessFigure(PathArgs),
    /// k-means clustering of titles by score gap, price and review score.
    Cluster(PathArgs),
}

#[derive(Args, Debug)]
struct IdArgs {
    /// Output workbook.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// App ids to process instead of the configured list.
    pub app_ids: Vec<u64>,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Input workbook.
    #[clap(long)]
    pub input: Option<PathBuf>,

    /// Output workbook.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Output figure.
    #[clap(long)]
    pub figure: Option<PathBuf>,
}

impl Command {
    fn stage_and_overrides(&self) -> (Stage, CliOverrides) {
        let stage = match self {
            Command::FetchReviews(_) => Stage::FetchReviews,
            Command::FetchRegionalScores(_) => Stage::FetchRegionalScores,
            Command::FetchPlaytime(_) => Stage::FetchPlaytime,
            Command::Classify(_) => Stage::Classify,
            Command::RegionalTest(_) => Stage::RegionalTest,
            Command::EmotionCompare(_) => Stage::EmotionCompare,
            Command::ScoreGapFigure(_) => Stage::ScoreGapFigure,
            Command::EarlyAccessFigure(_) => Stage::EarlyAccessFigure,
            Command::Cluster(_) => Stage::Cluster,
        };
        let overrides = match self {
            Command::FetchReviews(a)
            | Command::FetchRegionalScores(a)
            | Command::FetchPlaytime(a) => CliOverrides {
                output: a.output.clone(),
                app_ids: a.app_ids.clone(),
                ..Default::default()
            },
            Command::Classify(a)
            | Command::RegionalTest(a)
            | Command::EmotionCompare(a)
            | Command::ScoreGapFigure(a)
            | Command::EarlyAccessFigure(a)
            | Command::Cluster(a) => CliOverrides {
                input: a.input.clone(),
                output: a.output.clone(),
                figure: a.figure.clone(),
                ..Default::default()
            },
        };
        (stage, overrides)
    }
}

async fn run(stage: Stage, config: &AppConfig) -> Result<()> {
    match stage {
        Stage::FetchReviews => {
            let outcomes = fetch_reviews(&config.steam).await?;
            let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
            print_section_header("Review download");
            print_key_value("Apps", &outcomes.len().to_string());
            print_key_value("Failed", &failed.to_string());
            print_key_value("Workbook", &config.steam.output.display().to_string());
            if failed > 0 {
                print_warning(&format!("{} apps could not be fetched", failed));
            }
        }
        Stage::FetchRegionalScores => {
            let source = create_page_source(&config.regional)?;
            let saved = fetch_regional_scores(&config.regional, source.as_ref()).await?;
            print_success(&format!(
                "Saved {} of {} regional score tables to {}",
                saved,
                config.regional.app_ids.len(),
                config.regional.output.display()
            ));
        }
        Stage::FetchPlaytime => {
            let results = fetch_playtime(&config.steamspy).await?;
            let found = results.iter().filter(|(_, hours)| hours.is_some()).count();
            print_success(&format!(
                "Median playtime found for {} of {} apps",
                found,
                results.len()
            ));
        }
        Stage::Classify => {
            let provider = Arc::new(OllamaProvider::new(
                config.llm.base_url.clone(),
                config.llm.model.clone(),
            ));
            let classifier = EmotionClassifier::from_settings(provider, &config.llm);
            let summary = classify_workbook(&config.classify, &classifier).await?;
            print_section_header("Emotion scoring");
            print_key_value("Sheets", &summary.sheets.to_string());
            print_key_value("Reviews", &summary.reviews.to_string());
            print_key_value("Failed", &summary.failed.to_string());
        }
        Stage::RegionalTest => {
            let report = run_regional_test(&config.regional_test)?;
            for language in &report.skipped {
                print_warning(&format!("Skipped {}: insufficient data", language));
            }
        }
        Stage::EmotionCompare => {
            run_emotion_compare(&config.emotion_compare, &config.figures)?;
            print_success(&format!(
                "Wrote {} and {}",
                config.emotion_compare.output.display(),
                config.emotion_compare.figure.display()
            ));
        }
        Stage::ScoreGapFigure => {
            run_score_gap_figure(&config.score_gap, &config.figures)?;
            print_success(&format!("Wrote {}", config.score_gap.figure.display()));
        }
        Stage::EarlyAccessFigure => {
            run_early_access_figure(&config.early_access, &config.figures)?;
            print_success(&format!("Wrote {}", config.early_access.figure.display()));
        }
        Stage::Cluster => {
            let sizes = run_cluster(&config.cluster, &config.figures)?;
            print_section_header("Clusters");
            for (i, size) in sizes.iter().enumerate() {
                print_key_value(&format!("Cluster {}", i), &size.to_string());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let (stage, overrides) = cli_args.command.stage_and_overrides();
    let mut config = AppConfig::load(cli_args.config.as_deref())?;
    config.apply_overrides(stage, &overrides);
    info!("Running {:?}", stage);

    if let Err(e) = run(stage, &config).await {
        error!("{:?} failed: {:#}", stage, e);
        print_error(&format!("{:#}", e));
        return Err(e);
    }
    Ok(())
}
