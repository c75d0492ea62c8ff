//! Study analyses: the regional z tests, the emotion comparison, the
//! interval box plots and the clustering.

mod clustering;
mod emotion_compare;
mod grouping;

pub use clustering::{
    cluster_table, complete_games, run_cluster, standardize, KMeans, KMeansFit,
};
pub use emotion_compare::{
    collect_observations, compare_group, group_sheet, legend_sheet, run_emotion_compare,
    EmotionObservation, EmotionRow, GroupComparison,
};
pub use grouping::{
    bucket_summary, early_access_panels, run_early_access_figure, run_score_gap_figure,
    shared_range, summary_table, BinSpec, BucketSummary,
};
pub use regional_test::{
    regional_z_tests, results_table, run_regional_test, Direction, RegionalTestReport,
    RegionalTestRow,
};
