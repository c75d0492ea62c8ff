use std::collections::HashMap;
use std::hash::Hash;

/// Counts over a fixed set of row labels and a fixed set of column labels.
///
/// Both label sets are chosen up front, so a category that never occurs in
/// the data still shows up with a count of zero. Observations with an unknown
/// row are dropped; observations with a known row but an unknown column are
/// not tabulated but still count toward the row's number of observations.
#[derive(Debug, Clone)]
pub struct Crosstab<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    row_index: HashMap<R, usize>,
    column_index: HashMap<C, usize>,
    counts: Vec<Vec<u64>>,
    observations: Vec<u64>,
}

impl<R, C> Crosstab<R, C>
where
    R: Clone + Eq + Hash,
    C: Clone + Eq + Hash,
{
    pub fn new(rows: impl IntoIterator<Item = R>, columns: impl IntoIterator<Item = C>) -> Self {
        let rows: Vec<R> = rows.into_iter().collect();
        let columns: Vec<C> = columns.into_iter().collect();
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let counts = vec![vec![0; columns.len()]; rows.len()];
        let observations = vec![0; rows.len()];
        Self {
            rows,
            columns,
            row_index,
            column_index,
            counts,
            observations,
        }
    }

    /// Records an observation of `row` that falls in none of the columns.
    /// Returns false when the row is unknown.
    pub fn count_untabulated(&mut self, row: &R) -> bool {
        match self.row_index.get(row) {
            Some(&r) => {
                self.observations[r] += 1;
                true
            }
            None => false,
        }
    }

    /// Records one observation. Returns false when it was not tabulated.
    pub fn increment(&mut self, row: &R, column: &C) -> bool {
        let Some(&r) = self.row_index.get(row) else {
            return false;
        };
        self.observations[r] += 1;
        match self.column_index.get(column) {
            Some(&c) => {
                self.counts[r][c] += 1;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn count(&self, row: &R, column: &C) -> u64 {
        match (self.row_index.get(row), self.column_index.get(column)) {
            (Some(&r), Some(&c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Every observation recorded for the row, tabulated or not.
    pub fn row_observations(&self, row: &R) -> u64 {
        self.row_index
            .get(row)
            .map(|&r| self.observations[r])
            .unwrap_or(0)
    }

    /// Sum of the tabulated counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Share of the row's observations that fall in `column`, in percent.
    /// An empty row has a rate of 0.
    pub fn rate(&self, row: &R, column: &C) -> f64 {
        let total = self.row_observations(row);
        if total == 0 {
            return 0.0;
        }
        self.count(row, column) as f64 / total as f64 * 100.0
    }

    /// The 2x2 table `[[in, out], [in, out]]` for one column against every
    /// other observation, across two rows.
    pub fn one_vs_rest(&self, first: &R, second: &R, column: &C) -> [[u64; 2]; 2] {
        let split = |row: &R| {
            let hit = self.count(row, column);
            [hit, self.row_observations(row) - hit]
        };
        [split(first), split(second)]
    }

    /// Counts as a dense matrix in label order, for the chi-square test.
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| row.iter().map(|c| *c as f64).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Crosstab<&'static str, &'static str> {
        let mut tab = Crosstab::new(["english", "schinese"], ["Joy", "Anger", "Fear"]);
        tab.increment(&"english", &"Joy");
        tab.increment(&"english", &"Joy");
        tab.increment(&"english", &"Anger");
        tab.increment(&"schinese", &"Anger");
        tab
    }

    #[test]
    fn test_absent_category_counts_zero() {
        let tab = sample();
        assert_eq!(tab.count(&"english", &"Fear"), 0);
        assert_eq!(tab.count(&"schinese", &"Joy"), 0);
        assert_eq!(tab.to_matrix(), vec![vec![2.0, 1.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_unknown_labels() {
        let mut tab = sample();
        assert!(!tab.increment(&"german", &"Joy"));
        assert_eq!(tab.row_observations(&"german"), 0);

        // Not tabulated, but part of the row's observations
        assert!(!tab.increment(&"english", &"error"));
        assert_eq!(tab.total(), 4);
        assert_eq!(tab.row_observations(&"english"), 4);
        assert_eq!(tab.rate(&"english", &"Joy"), 50.0);
        assert_eq!(tab.one_vs_rest(&"english", &"schinese", &"Joy"), [[2, 2], [0, 1]]);
    }

    #[test]
    fn test_rates_and_one_vs_rest() {
        let tab = sample();
        assert!((tab.rate(&"english", &"Joy") - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(tab.rate(&"schinese", &"Anger"), 100.0);
        assert_eq!(tab.one_vs_rest(&"english", &"schinese", &"Anger"), [[1, 2], [1, 0]]);

        let empty: Crosstab<&str, &str> = Crosstab::new(["a"], ["x"]);
        assert_eq!(empty.rate(&"a", &"x"), 0.0);
    }
}
