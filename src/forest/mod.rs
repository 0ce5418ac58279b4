//! Isolation Forest outlier model
//!
//! Anomalies are easier to isolate than normal points: random axis-aligned
//! splits separate them in fewer steps. The forest averages each row's path
//! length over many randomized trees.
//!
//! Scores follow the `score_samples` convention: `-2^(-E[h(x)] / c(psi))`,
//! so values lie in [-1, 0) and lower means more anomalous. Labels mark the
//! `contamination` share of rows with the lowest scores. Tree construction
//! draws from a seeded RNG, so identical data and seed reproduce identical
//! scores and labels.

pub mod scaler;

use ndarray::{Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::config::ForestConfig;
use crate::error::{AnomalyError, Result};

pub use scaler::StandardScaler;

const AUTO_MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(data: &Array2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: grow(data, rows, 0, max_depth, rng),
        }
    }

    fn path_length(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

fn grow(data: &Array2<f64>, rows: Vec<usize>, depth: usize, max_depth: usize, rng: &mut StdRng) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // only features that still vary within this node can split it
    let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|feature| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then_some((feature, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(lo..hi);

    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.iter().partition(|&&r| data[[r, feature]] < threshold);

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(data, left, depth + 1, max_depth, rng)),
        right: Box::new(grow(data, right, depth + 1, max_depth, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile of `values`, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    /// Scores below this are outliers.
    offset: f64,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            n_features: 0,
            offset: f64::NEG_INFINITY,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Builds the trees on `data` (rows are samples) and calibrates the
    /// outlier offset on the same rows.
    pub fn fit(&mut self, data: &Array2<f64>) -> Result<()> {
        self.config.validate()?;

        let n_rows = data.nrows();
        if n_rows == 0 || data.ncols() == 0 {
            return Err(AnomalyError::ModelFit(format!(
                "cannot fit on a {}x{} matrix",
                n_rows,
                data.ncols()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::ModelFit("features contain NaN or infinite values".into()));
        }

        let sample_size = match self.config.max_samples {
            Some(requested) if requested > n_rows => {
                return Err(AnomalyError::ModelFit(format!(
                    "max_samples {requested} exceeds the {n_rows} available rows"
                )));
            }
            Some(requested) => requested,
            None => n_rows.min(AUTO_MAX_SAMPLES),
        };
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.trees = (0..self.config.n_estimators)
            .map(|_| {
                let rows: Vec<usize> = if self.config.bootstrap {
                    (0..sample_size).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    index::sample(&mut rng, n_rows, sample_size).into_vec()
                };
                IsolationTree::build(data, rows, max_depth, &mut rng)
            })
            .collect();
        self.sample_size = sample_size;
        self.n_features = data.ncols();

        let scores = self.scores(data);
        self.offset = percentile(&scores, 100.0 * self.config.contamination);

        debug!(
            rows = n_rows,
            features = data.ncols(),
            trees = self.trees.len(),
            sample_size,
            offset = self.offset,
            "isolation forest fitted"
        );
        Ok(())
    }

    /// Negated anomaly score per row, lower is more anomalous.
    ///
    /// Fails with `ModelFit` before `fit` or when `data` has a different
    /// number of features than the fitting matrix.
    pub fn score_samples(&self, data: &Array2<f64>) -> Result<Vec<f64>> {
        self.ensure_fitted(data)?;
        Ok(self.scores(data))
    }

    /// True for rows scoring below the calibrated offset.
    pub fn predict(&self, data: &Array2<f64>) -> Result<Vec<bool>> {
        let scores = self.score_samples(data)?;
        Ok(scores.into_iter().map(|s| s < self.offset).collect())
    }

    /// Fits on `data` and returns `(is_outlier, score)` for the same rows.
    pub fn fit_predict(&mut self, data: &Array2<f64>) -> Result<(Vec<bool>, Vec<f64>)> {
        self.fit(data)?;
        let scores = self.scores(data);
        let labels = scores.iter().map(|s| *s < self.offset).collect();
        Ok((labels, scores))
    }

    fn ensure_fitted(&self, data: &Array2<f64>) -> Result<()> {
        if !self.is_fitted() {
            return Err(AnomalyError::ModelFit("forest is not fitted".into()));
        }
        if data.ncols() != self.n_features {
            return Err(AnomalyError::ModelFit(format!(
                "expected {} features, got {}",
                self.n_features,
                data.ncols()
            )));
        }
        Ok(())
    }

    fn scores(&self, data: &Array2<f64>) -> Vec<f64> {
        let normaliser = average_path_length(self.sample_size);
        data.rows()
            .into_iter()
            .map(|row| {
                let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / self.trees.len() as f64;
                if normaliser > 0.0 {
                    -(2.0_f64.powf(-mean_depth / normaliser))
                } else {
                    -0.5
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered_with_outliers() -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut data = Array2::zeros((102, 2));
        for i in 0..100 {
            data[[i, 0]] = rng.gen_range(-1.0..1.0);
            data[[i, 1]] = rng.gen_range(-1.0..1.0);
        }
        data[[100, 0]] = 10.0;
        data[[100, 1]] = 10.0;
        data[[101, 0]] = -10.0;
        data[[101, 1]] = -9.0;
        data
    }

    #[test]
    fn test_outliers_score_lowest() {
        let data = clustered_with_outliers();
        let mut forest = IsolationForest::new(ForestConfig {
            contamination: 0.02,
            ..ForestConfig::volume()
        });
        let (labels, scores) = forest.fit_predict(&data).unwrap();

        assert!(scores[100] < scores[0]);
        assert!(scores[101] < scores[0]);
        assert!(labels[100] && labels[101]);
        assert!(forest.is_fitted());
        assert_eq!(forest.predict(&data).unwrap(), labels);
        assert_eq!(forest.score_samples(&data).unwrap(), scores);
        assert!(scores.iter().all(|s| (-1.0..0.0).contains(s)));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let data = clustered_with_outliers();
        let config = ForestConfig::multi_feature();

        let first = IsolationForest::new(config.clone()).fit_predict(&data).unwrap();
        let second = IsolationForest::new(config).fit_predict(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_constant_data_has_no_outliers() {
        let data = Array2::from_elem((40, 1), 5.0);
        let (labels, scores) = IsolationForest::new(ForestConfig::volume())
            .fit_predict(&data)
            .unwrap();
        assert!(labels.iter().all(|l| !l));
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_empty_matrix_fails() {
        let data = Array2::<f64>::zeros((0, 1));
        let err = IsolationForest::new(ForestConfig::volume()).fit(&data).unwrap_err();
        assert!(matches!(err, AnomalyError::ModelFit(_)));
    }

    #[test]
    fn test_max_samples_above_rows_fails() {
        let data = Array2::<f64>::zeros((10, 1));
        let config = ForestConfig {
            max_samples: Some(64),
            ..ForestConfig::volume()
        };
        let err = IsolationForest::new(config).fit(&data).unwrap_err();
        assert!(matches!(err, AnomalyError::ModelFit(_)));
    }

    #[test]
    fn test_unfitted_forest_refuses_to_score() {
        let data = clustered_with_outliers();
        let forest = IsolationForest::new(ForestConfig::volume());

        assert!(!forest.is_fitted());
        assert!(matches!(forest.score_samples(&data), Err(AnomalyError::ModelFit(_))));
        assert!(matches!(forest.predict(&data), Err(AnomalyError::ModelFit(_))));
    }

    #[test]
    fn test_feature_count_must_match_fit() {
        let mut forest = IsolationForest::new(ForestConfig::volume());
        forest.fit(&clustered_with_outliers()).unwrap();

        let narrow = Array2::<f64>::zeros((5, 1));
        assert!(matches!(forest.predict(&narrow), Err(AnomalyError::ModelFit(_))));
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 10.0) - 1.3).abs() < 1e-12);
    }
}
