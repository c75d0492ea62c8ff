/// Star legend written next to every significance table.
pub const SIGNIFICANCE_LEGEND: [(&str, &str); 3] = [
    ("*", "p < 0.05"),
    ("**", "p < 0.01"),
    ("***", "p < 0.001"),
];

/// Bonferroni-adjusted p-value: `min(1, p * m)`.
pub fn bonferroni(p: f64, comparisons: usize) -> f64 {
    (p * comparisons as f64).min(1.0)
}

/// Adjusts a family of p-values using its own size as `m`.
pub fn bonferroni_all(p_values: &[f64]) -> Vec<f64> {
    p_values
        .iter()
        .map(|p| bonferroni(*p, p_values.len()))
        .collect()
}

/// Star tier for a p-value; boundaries are exclusive.
pub fn significance_stars(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonferroni_caps_at_one() {
        assert_eq!(bonferroni(0.01, 8), 0.08);
        assert_eq!(bonferroni(0.2, 8), 1.0);
        assert_eq!(bonferroni(0.0, 8), 0.0);
    }

    #[test]
    fn test_bonferroni_all_uses_family_size() {
        let adjusted = bonferroni_all(&[0.001, 0.02, 0.5, 0.3]);
        assert_eq!(adjusted, vec![0.004, 0.08, 1.0, 1.0]);
        assert!(bonferroni_all(&[]).is_empty());
    }

    #[test]
    fn test_star_boundaries_are_exclusive() {
        assert_eq!(significance_stars(0.0009), "***");
        assert_eq!(significance_stars(0.001), "**");
        assert_eq!(significance_stars(0.009), "**");
        assert_eq!(significance_stars(0.01), "*");
        assert_eq!(significance_stars(0.049), "*");
        assert_eq!(significance_stars(0.05), "");
        assert_eq!(significance_stars(1.0), "");
        assert_eq!(significance_stars(f64::NAN), "");
    }
}
