//! Standardised k-means over (score gap, price, review score).

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{ClusterSettings, FigureSettings};
use crate::model::GameMetadata;
use crate::plot::{draw_scatter_3d, FigureSize, ScatterAxes, ScatterGroup, VIRIDIS};
use crate::stats::{mean, population_std};
use crate::workbook::{Cell, Sheet, Table, WorkbookReader, WorkbookWriter};

const OUTPUT_COLUMNS: [&str; 5] = ["steamId", "name", "ScoreGap", "price", "reviewScore"];

/// Rescales every feature to zero mean and unit population standard
/// deviation. Constant features are only centred.
pub fn standardize<const D: usize>(points: &[[f64; D]]) -> Vec<[f64; D]> {
    let mut scaled = points.to_vec();
    for d in 0..D {
        let column: Vec<f64> = points.iter().map(|p| p[d]).collect();
        let (Some(m), Some(sd)) = (mean(&column), population_std(&column)) else {
            continue;
        };
        let sd = if sd > 0.0 { sd } else { 1.0 };
        for p in scaled.iter_mut() {
            p[d] = (p[d] - m) / sd;
        }
    }
    scaled
}

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub k: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    /// Relative to the mean per-feature variance of the data.
    pub tolerance: f64,
    pub seed: u64,
}

impl KMeans {
    pub fn from_settings(settings: &ClusterSettings) -> Self {
        Self {
            k: settings.k,
            restarts: settings.restarts,
            max_iterations: settings.max_iterations,
            tolerance: settings.tolerance,
            seed: settings.seed,
        }
    }

    /// Best of `restarts` runs by inertia. The same seed always gives the
    /// same labels.
    pub fn fit<const D: usize>(&self, points: &[[f64; D]]) -> Result<KMeansFit<D>> {
        if self.k == 0 {
            bail!("k must be at least 1");
        }
        if points.len() < self.k {
            bail!(
                "Cannot form {} clusters from {} points",
                self.k,
                points.len()
            );
        }

        let threshold = self.tolerance * mean_variance(points);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit<D>> = None;

        for run in 0..self.restarts.max(1) {
            let initial = self.init_centroids(points, &mut rng);
            let fit = self.lloyd(points, initial, threshold);
            debug!(
                "k-means run {}: inertia {:.4} after {} iterations",
                run, fit.inertia, fit.iterations
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| anyhow::anyhow!("k-means produced no result"))
    }

    /// k-means++ seeding: the first centre uniformly, each further one with
    /// probability proportional to its squared distance from the nearest
    /// centre chosen so far.
    fn init_centroids<const D: usize>(
        &self,
        points: &[[f64; D]],
        rng: &mut StdRng,
    ) -> Vec<[f64; D]> {
        let mut centroids = vec![points[rng.random_range(0..points.len())]];
        let mut distances: Vec<f64> = points
            .iter()
            .map(|p| squared_distance(p, &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let total: f64 = distances.iter().sum();
            let next = if total > 0.0 {
                let mut target = rng.random::<f64>() * total;
                let mut chosen = points.len() - 1;
                for (i, d) in distances.iter().enumerate() {
                    if target < *d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                chosen
            } else {
                rng.random_range(0..points.len())
            };

            let centroid = points[next];
            for (d, p) in distances.iter_mut().zip(points.iter()) {
                *d = d.min(squared_distance(p, &centroid));
            }
            centroids.push(centroid);
        }
        centroids
    }

    fn lloyd<const D: usize>(
        &self,
        points: &[[f64; D]],
        mut centroids: Vec<[f64; D]>,
        threshold: f64,
    ) -> KMeansFit<D> {
        let mut labels = vec![0; points.len()];
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            for (label, p) in labels.iter_mut().zip(points.iter()) {
                *label = nearest(p, &centroids).0;
            }

            let mut sums = vec![[0.0; D]; self.k];
            let mut counts = vec![0usize; self.k];
            for (label, p) in labels.iter().zip(points.iter()) {
                counts[*label] += 1;
                for d in 0..D {
                    sums[*label][d] += p[d];
                }
            }

            let mut shift = 0.0;
            for (c, (sum, count)) in centroids.iter_mut().zip(sums.iter().zip(counts.iter())) {
                // An empty cluster keeps its centre.
                if *count == 0 {
                    continue;
                }
                let mut updated = [0.0; D];
                for d in 0..D {
                    updated[d] = sum[d] / *count as f64;
                }
                shift += squared_distance(c, &updated);
                *c = updated;
            }

            if shift <= threshold {
                break;
            }
        }

        let mut inertia = 0.0;
        for (label, p) in labels.iter_mut().zip(points.iter()) {
            let (closest, distance) = nearest(p, &centroids);
            *label = closest;
            inertia += distance;
        }

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

fn mean_variance<const D: usize>(points: &[[f64; D]]) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let total: f64 = (0..D)
        .filter_map(|d| {
            let column: Vec<f64> = points.iter().map(|p| p[d]).collect();
            population_std(&column).map(|sd| sd * sd)
        })
        .sum();
    total / D as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit<const D: usize> {
    /// Cluster index per input point.
    pub labels: Vec<usize>,
    pub centroids: Vec<[f64; D]>,
    /// Sum of squared distances to the assigned centres.
    pub inertia: f64,
    pub iterations: usize,
}

impl<const D: usize> KMeansFit<D> {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for label in &self.labels {
            sizes[*label] += 1;
        }
        sizes
    }
}

/// Titles with every field clustering needs; other rows are dropped.
pub fn complete_games(table: &Table) -> Vec<GameMetadata> {
    (0..table.len())
        .map(|row| GameMetadata {
            steam_id: table.get(row, "steamId").as_text().unwrap_or_default(),
            name: table.get(row, "name").as_text().unwrap_or_default(),
            price: table.get(row, "price").as_f64(),
            review_score: table.get(row, "reviewScore").as_f64(),
            score_gap: table.get(row, "ScoreGap").as_f64(),
            median_playtime: table.get(row, "medianPlaytime").as_f64(),
        })
        .filter(GameMetadata::is_complete)
        .collect()
}

/// `[score gap, price, review score]`, unscaled.
fn features(game: &GameMetadata) -> [f64; 3] {
    [
        game.score_gap.unwrap_or_default(),
        game.price.unwrap_or_default(),
        game.review_score.unwrap_or_default(),
    ]
}

fn steam_id_cell(id: &str) -> Cell {
    match id.parse::<u64>() {
        Ok(n) => n.into(),
        Err(_) => id.into(),
    }
}

pub fn cluster_table(games: &[GameMetadata], labels: &[usize], cluster: usize) -> Table {
    let mut table = Table::new(OUTPUT_COLUMNS);
    for (game, _) in games
        .iter()
        .zip(labels.iter())
        .filter(|(_, label)| **label == cluster)
    {
        table.push_row(vec![
            steam_id_cell(&game.steam_id),
            game.name.as_str().into(),
            game.score_gap.into(),
            game.price.into(),
            game.review_score.into(),
        ]);
    }
    table
}

pub fn run_cluster(settings: &ClusterSettings, figures: &FigureSettings) -> Result<Vec<usize>> {
    let mut reader = WorkbookReader::open(&settings.input)?;
    let table = reader.read_sheet(&settings.sheet)?;
    let games = complete_games(&table);
    let dropped = table.len() - games.len();
    if dropped > 0 {
        warn!("Dropped {} titles with missing numeric fields", dropped);
    }

    let raw: Vec<[f64; 3]> = games.iter().map(features).collect();
    let fit = KMeans::from_settings(settings).fit(&standardize(&raw))?;
    let sizes = fit.cluster_sizes();
    info!(
        "Clustered {} titles into {} groups (inertia {:.3}): {:?}",
        games.len(),
        settings.k,
        fit.inertia,
        sizes
    );

    let mut writer = WorkbookWriter::new(&settings.output);
    for cluster in 0..settings.k {
        writer.add_sheet(Sheet::from_table(
            format!("Cluster_{}", cluster),
            cluster_table(&games, &fit.labels, cluster),
        ));
    }
    writer.flush()?;
    info!("Cluster sheets saved to {:?}", settings.output);

    let groups: Vec<ScatterGroup> = (0..settings.k)
        .map(|cluster| ScatterGroup {
            label: format!("Cluster {}", cluster),
            color: VIRIDIS[cluster % VIRIDIS.len()],
            points: raw
                .iter()
                .zip(fit.labels.iter())
                .filter(|(_, label)| **label == cluster)
                .map(|(p, _)| (p[0], p[1], p[2]))
                .collect(),
        })
        .collect();
    draw_scatter_3d(
        &settings.figure,
        FigureSize::new(figures.width, figures.scatter_height),
        "Clusters",
        &ScatterAxes {
            x: "Score Gap".to_string(),
            y: "Price".to_string(),
            z: "Review Score".to_string(),
        },
        &groups,
    )?;

    Ok(sizes)
}
