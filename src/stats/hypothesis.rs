use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use statrs::function::factorial::ln_binomial;

use super::descriptive::{mean, sample_std};
use super::StatsError;

/// Relative tolerance used when comparing hypergeometric probabilities
/// against the observed table's probability.
const FISHER_REL_TOLERANCE: f64 = 1e-7;

/// Two-sample z test of a group against a baseline sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZTestResult {
    pub sample_mean: f64,
    pub baseline_mean: f64,
    pub z: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// `z = (mean(A) - mean(B)) / sqrt(s_A^2 / n_A + s_B^2 / n_B)` with sample
/// standard deviations, and `p = 2 * (1 - Phi(|z|))`.
pub fn z_test_against_baseline(
    sample: &[f64],
    baseline: &[f64],
) -> Result<ZTestResult, StatsError> {
    for values in [sample, baseline] {
        if values.len() < 2 {
            return Err(StatsError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
    }

    let (sample_mean, sample_sd) = mean_and_sd(sample)?;
    let (baseline_mean, baseline_sd) = mean_and_sd(baseline)?;

    let se = (sample_sd.powi(2) / sample.len() as f64
        + baseline_sd.powi(2) / baseline.len() as f64)
        .sqrt();
    if se == 0.0 || !se.is_finite() {
        return Err(StatsError::DegenerateVariance);
    }

    let z = (sample_mean - baseline_mean) / se;
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = (2.0 * normal.sf(z.abs())).min(1.0);

    Ok(ZTestResult {
        sample_mean,
        baseline_mean,
        z,
        p_value,
    })
}

fn mean_and_sd(values: &[f64]) -> Result<(f64, f64), StatsError> {
    let insufficient = || StatsError::InsufficientData {
        needed: 2,
        got: values.len(),
    };
    let m = mean(values).ok_or_else(insufficient)?;
    let sd = sample_std(values).ok_or_else(insufficient)?;
    Ok((m, sd))
}

/// Pearson chi-square test of independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// Chi-square test on an r x c table of counts.
///
/// Rows and columns that are entirely zero carry no information and would
/// produce zero expected counts, so they are dropped first. Yates' continuity
/// correction is applied when the remaining table has one degree of freedom.
/// A table left with fewer than two rows or columns has no degrees of freedom
/// and yields a statistic of 0 with p = 1.
pub fn chi_square_independence(observed: &[Vec<f64>]) -> Result<ChiSquareResult, StatsError> {
    let width = observed.first().map(|r| r.len()).unwrap_or(0);
    if observed.iter().any(|r| r.len() != width) {
        return Err(StatsError::InvalidTable(
            "rows have different lengths".to_string(),
        ));
    }
    if observed.iter().flatten().any(|v| *v < 0.0 || !v.is_finite()) {
        return Err(StatsError::InvalidTable(
            "counts must be finite and non-negative".to_string(),
        ));
    }

    let keep_cols: Vec<usize> = (0..width)
        .filter(|&c| observed.iter().any(|r| r[c] > 0.0))
        .collect();
    let table: Vec<Vec<f64>> = observed
        .iter()
        .filter(|r| r.iter().any(|v| *v > 0.0))
        .map(|r| keep_cols.iter().map(|&c| r[c]).collect())
        .collect();

    let n_rows = table.len();
    let n_cols = keep_cols.len();
    if n_rows < 2 || n_cols < 2 {
        return Ok(ChiSquareResult {
            statistic: 0.0,
            dof: 0,
            p_value: 1.0,
        });
    }

    let row_totals: Vec<f64> = table.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols)
        .map(|c| table.iter().map(|r| r[c]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();
    let dof = (n_rows - 1) * (n_cols - 1);

    let mut statistic = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &obs) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            let mut obs = obs;
            if dof == 1 {
                let diff = expected - obs;
                obs += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (obs - expected).powi(2) / expected;
        }
    }

    let dist = ChiSquared::new(dof as f64).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(ChiSquareResult {
        statistic,
        dof,
        p_value: dist.sf(statistic),
    })
}

/// Two-sided Fisher exact test on a 2x2 table `[[a, b], [c, d]]`.
///
/// The p-value sums the probabilities of every table with the same margins
/// that is no more likely than the observed one. Tables with an empty row or
/// column carry no evidence and return 1. Probabilities are compared in log
/// space so tables with thousands of observations stay finite.
pub fn fisher_exact(table: [[u64; 2]; 2]) -> Result<f64, StatsError> {
    let [[a, b], [c, d]] = table;
    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let col2 = b + d;
    if row1 == 0 || row2 == 0 || col1 == 0 || col2 == 0 {
        return Ok(1.0);
    }

    let total = row1 + row2;
    // Hypergeometric log-probability of `x` in the top-left cell.
    let ln_denominator = ln_binomial(total, row1);
    let ln_pmf = |x: u64| ln_binomial(col1, x) + ln_binomial(col2, row1 - x) - ln_denominator;

    let low = (row1 + col1).saturating_sub(total);
    let high = row1.min(col1);
    let ln_observed = ln_pmf(a);
    if !ln_observed.is_finite() {
        return Err(StatsError::Distribution(format!(
            "non-finite probability for table {:?}",
            table
        )));
    }
    let ln_threshold = ln_observed + FISHER_REL_TOLERANCE.ln_1p();

    let p: f64 = (low..=high)
        .map(ln_pmf)
        .filter(|ln_p| *ln_p <= ln_threshold)
        .map(f64::exp)
        .sum();
    Ok(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_z_test_matches_closed_form() {
        // Baseline mean 25, sample sd 5; group mean 20, sample sd 10.
        let result = z_test_against_baseline(&[10.0, 20.0, 30.0], &[20.0, 25.0, 30.0]).unwrap();
        let expected_z = -5.0 / (100.0f64 / 3.0 + 25.0 / 3.0).sqrt();

        assert!(approx(result.sample_mean, 20.0, 1e-12));
        assert!(approx(result.baseline_mean, 25.0, 1e-12));
        assert!(approx(result.z, expected_z, 1e-12));
        assert!(approx(result.z, -0.7745966692414833, 1e-12));
        assert!(approx(result.p_value, 0.438578026081, 1e-9));
    }

    #[test]
    fn test_z_test_sign_of_difference() {
        let higher = z_test_against_baseline(&[80.0, 90.0, 85.0], &[60.0, 70.0, 65.0]).unwrap();
        assert!(higher.z > 0.0);
        assert!(higher.p_value < 0.05);
    }

    #[test]
    fn test_z_test_insufficient_and_degenerate() {
        assert_eq!(
            z_test_against_baseline(&[1.0], &[1.0, 2.0]),
            Err(StatsError::InsufficientData { needed: 2, got: 1 })
        );
        assert_eq!(
            z_test_against_baseline(&[3.0, 3.0], &[3.0, 3.0, 3.0]),
            Err(StatsError::DegenerateVariance)
        );
    }

    #[test]
    fn test_chi_square_two_degrees_of_freedom() {
        let table = vec![vec![10.0, 20.0, 30.0], vec![20.0, 20.0, 20.0]];
        let result = chi_square_independence(&table).unwrap();
        assert_eq!(result.dof, 2);
        assert!(approx(result.statistic, 16.0 / 3.0, 1e-9));
        // For two degrees of freedom the survival function is exp(-x / 2).
        assert!(approx(result.p_value, 0.06948345122280154, 1e-9));
    }

    #[test]
    fn test_chi_square_drops_empty_columns_and_applies_yates() {
        let table = vec![vec![10.0, 0.0, 30.0], vec![20.0, 0.0, 20.0]];
        let result = chi_square_independence(&table).unwrap();
        assert_eq!(result.dof, 1);
        assert!(approx(result.statistic, 4.32, 1e-9));
        assert!(approx(result.p_value, 0.03766692222862868, 1e-6));
    }

    #[test]
    fn test_chi_square_without_degrees_of_freedom() {
        let single_row = vec![vec![5.0, 3.0], vec![0.0, 0.0]];
        let result = chi_square_independence(&single_row).unwrap();
        assert_eq!(result.dof, 0);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);

        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(chi_square_independence(&empty).unwrap().p_value, 1.0);
    }

    #[test]
    fn test_chi_square_rejects_ragged_tables() {
        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            chi_square_independence(&ragged),
            Err(StatsError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_fisher_exact_reference_values() {
        assert!(approx(
            fisher_exact([[8, 2], [1, 5]]).unwrap(),
            0.03496503496503496,
            1e-9
        ));
        assert!(approx(
            fisher_exact([[3, 1], [1, 3]]).unwrap(),
            0.4857142857142857,
            1e-9
        ));
        assert!(approx(
            fisher_exact([[5, 0], [0, 5]]).unwrap(),
            0.007936507936507936,
            1e-9
        ));
    }

    #[test]
    fn test_fisher_exact_large_tables() {
        let identical = fisher_exact([[300, 700], [300, 700]]).unwrap();
        assert!(identical > 0.99 && identical <= 1.0);

        let huge = fisher_exact([[3000, 7000], [3000, 7000]]).unwrap();
        assert!(huge > 0.99 && huge <= 1.0);

        let different = fisher_exact([[600, 400], [400, 600]]).unwrap();
        assert!(different >= 0.0 && different < 1e-10);
    }

    #[test]
    fn test_fisher_exact_empty_margin() {
        assert_eq!(fisher_exact([[0, 10], [0, 12]]).unwrap(), 1.0);
        assert_eq!(fisher_exact([[0, 0], [0, 0]]).unwrap(), 1.0);
    }
}
