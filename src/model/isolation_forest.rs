use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

use super::{ModelError, ScoringModel};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Training parameters for [`IsolationForest::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Upper bound on rows sampled per tree; capped at the training set size.
    pub max_samples: usize,
    /// Expected share of anomalies in the training data, in `(0, 0.5]`.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams("n_estimators must be positive".into()));
        }
        if self.max_samples < 2 {
            return Err(ModelError::InvalidParams("max_samples must be at least 2".into()));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::InvalidParams(format!(
                "contamination {} must be in (0, 0.5]",
                self.contamination
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree stored as a flat arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow<R: AsRef<[f64]>>(
        rows: &[R],
        sample: Vec<usize>,
        n_features: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(rows, sample, n_features, 0, height_limit, rng);
        tree
    }

    fn build<R: AsRef<[f64]>>(
        &mut self,
        rows: &[R],
        sample: Vec<usize>,
        n_features: usize,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        if depth >= height_limit || sample.len() <= 1 {
            self.nodes.push(Node::Leaf { size: sample.len() });
            return id;
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|feature| {
                let (min, max) = sample.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &i| {
                    let v = rows[i].as_ref()[feature];
                    (acc.0.min(v), acc.1.max(v))
                });
                (max > min).then_some((feature, min, max))
            })
            .collect();

        if candidates.is_empty() {
            self.nodes.push(Node::Leaf { size: sample.len() });
            return id;
        }

        let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(min..max);
        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i].as_ref()[feature] <= threshold);

        self.nodes.push(Node::Leaf { size: 0 });
        let left = self.build(rows, left_sample, n_features, depth + 1, height_limit, rng);
        let right = self.build(rows, right_sample, n_features, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(*size),
            }
        }
    }

    /// Children must point forward inside the arena so traversal terminates.
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} splits on unknown feature {}", id, feature));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", id));
                }
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", id, child));
                    }
                }
            }
        }
        Ok(())
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

/// Linear-interpolated percentile, `p` in `[0, 100]`.
fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

/// Isolation forest anomaly model.
///
/// `score` is the raw anomaly score shifted by the training-set
/// `contamination` percentile, so negative scores are anomalous and
/// `classify(x) == (score(x) < 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    n_features: usize,
    sample_size: usize,
    contamination: f64,
    offset: f64,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit a forest on a feature matrix. Deterministic for a given seed.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R], params: &ForestParams) -> Result<Self, ModelError> {
        params.validate()?;

        if rows.len() < 2 {
            return Err(ModelError::InvalidTrainingData(format!(
                "need at least 2 rows, got {}",
                rows.len()
            )));
        }
        let n_features = rows[0].as_ref().len();
        if n_features == 0 {
            return Err(ModelError::InvalidTrainingData("rows have no features".into()));
        }
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_features {
                return Err(ModelError::InvalidTrainingData(format!(
                    "row {} has {} features, expected {}",
                    i,
                    row.len(),
                    n_features
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::InvalidTrainingData(format!(
                    "row {} contains a non-finite value",
                    i
                )));
            }
        }

        // Split thresholds are drawn from [min, max) per column; that span must be finite.
        for feature in 0..n_features {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, r| {
                let v = r.as_ref()[feature];
                (acc.0.min(v), acc.1.max(v))
            });
            if !(max - min).is_finite() {
                return Err(ModelError::InvalidTrainingData(format!(
                    "feature {} spans [{}, {}], which overflows",
                    feature, min, max
                )));
            }
        }

        let sample_size = params.max_samples.min(rows.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_estimators)
            .map(|_| {
                let sample = rand::seq::index::sample(&mut rng, rows.len(), sample_size).into_vec();
                IsolationTree::grow(rows, sample, n_features, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            n_features,
            sample_size,
            contamination: params.contamination,
            offset: 0.0,
            trees,
        };

        let mut training_scores: Vec<f64> = rows.iter().map(|r| forest.raw_score(r.as_ref())).collect();
        forest.offset = percentile(&mut training_scores, params.contamination * 100.0);

        tracing::info!(
            trees = params.n_estimators,
            rows = rows.len(),
            sample_size,
            offset = forest.offset,
            "Isolation forest fitted"
        );
        Ok(forest)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Structural checks for a forest that came from outside this process.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::InvalidArtifact("forest has no trees".into()));
        }
        if self.n_features == 0 || self.sample_size < 2 || !self.offset.is_finite() {
            return Err(ModelError::InvalidArtifact(format!(
                "bad forest header (n_features={}, sample_size={}, offset={})",
                self.n_features, self.sample_size, self.offset
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|e| ModelError::InvalidArtifact(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// `-2^(-E[h(x)] / c(n))`: close to -1 for isolated points, near -0.5 for inliers.
    fn raw_score(&self, row: &[f64]) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        -(2f64.powf(-mean_path / average_path_length(self.sample_size)))
    }

    fn check_row(&self, row: &[f64]) -> Result<(), ScoringError> {
        if row.len() != self.n_features {
            return Err(ScoringError::FeatureCountMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        if let Some(feature) = row.iter().position(|v| !v.is_finite()) {
            return Err(ScoringError::NonFiniteFeature { feature });
        }
        if self.trees.is_empty() {
            return Err(ScoringError::InvalidModel("forest has no trees".into()));
        }
        Ok(())
    }
}

impl ScoringModel for IsolationForest {
    fn score(&self, row: &[f64]) -> Result<f64, ScoringError> {
        self.check_row(row)?;
        Ok(self.raw_score(row) - self.offset)
    }

    fn classify(&self, row: &[f64]) -> Result<bool, ScoringError> {
        Ok(self.score(row)? < 0.0)
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }
}
