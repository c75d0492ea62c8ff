//! Statistical routines used by the comparison tables.
//!
//! Distributions come from `statrs`; everything else is small enough to be
//! computed directly.

mod contingency;
mod correction;
mod descriptive;
mod hypothesis;

pub use contingency::Crosstab;
pub use correction::{bonferroni, bonferroni_all, significance_stars, SIGNIFICANCE_LEGEND};
pub use descriptive::{mean, population_std, quantile, sample_std, BoxStats};
pub use hypothesis::{
    chi_square_independence, fisher_exact, z_test_against_baseline, ChiSquareResult, ZTestResult,
};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Degenerate variance: standard error is zero")]
    DegenerateVariance,

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Distribution error: {0}")]
    Distribution(String),
}
