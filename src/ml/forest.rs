use crate::error::{AppError, Result};
use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for the bagged tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,

    /// Maximum depth per tree
    pub max_depth: usize,

    /// Minimum total sample weight required to split a node
    pub min_samples_split: f32,

    /// Minimum total sample weight required in a leaf
    pub min_samples_leaf: f32,

    /// Seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5.0,
            min_samples_leaf: 2.0,
            seed: 42,
        }
    }
}

/// A random forest built by bootstrap-bagging decision trees.
///
/// Each tree is fitted on a bootstrap sample (drawn with replacement, same
/// size as the training set) from a single seeded RNG, so the whole ensemble
/// is deterministic for a given seed. Prediction is a majority vote;
/// probabilities are the vote fractions across trees.
#[derive(Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree<f64, usize>>,
    params: ForestParams,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit the ensemble on a feature matrix and class indices.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> Result<Self> {
        let n_samples = x.nrows();
        if n_samples == 0 || y.is_empty() {
            return Err(AppError::InsufficientData(
                "cannot train a forest on an empty dataset".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(AppError::Training(format!(
                "feature rows ({n_samples}) and labels ({}) are misaligned",
                y.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(AppError::Training("n_trees must be at least 1".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

            let mut sample_x = Array2::zeros((n_samples, x.ncols()));
            let mut sample_y = Array1::zeros(n_samples);
            for (row, &index) in indices.iter().enumerate() {
                sample_x.row_mut(row).assign(&x.row(index));
                sample_y[row] = y[index];
            }

            let dataset = Dataset::new(sample_x, sample_y);
            let tree = DecisionTree::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(Some(params.max_depth))
                .min_weight_split(params.min_samples_split)
                .min_weight_leaf(params.min_samples_leaf)
                .fit(&dataset)
                .map_err(|e| AppError::Training(format!("decision tree fit failed: {e}")))?;

            trees.push(tree);
        }

        Ok(Self {
            trees,
            params,
            n_classes,
            n_features: x.ncols(),
        })
    }

    /// Majority-vote class indices for a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let votes = self.vote_counts(x)?;

        Ok(votes
            .iter()
            .map(|counts| {
                // First maximum wins, so ties resolve to the lowest class.
                let mut best = 0;
                for (class, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = class;
                    }
                }
                best
            })
            .collect())
    }

    /// Per-class vote fractions for a feature matrix.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let votes = self.vote_counts(x)?;
        let n_trees = self.trees.len() as f64;

        let mut proba = Array2::zeros((votes.len(), self.n_classes));
        for (i, counts) in votes.iter().enumerate() {
            for (class, &count) in counts.iter().enumerate() {
                proba[[i, class]] = count as f64 / n_trees;
            }
        }
        Ok(proba)
    }

    /// Mean normalized impurity-decrease importance per feature.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (j, importance) in tree.feature_importance().into_iter().enumerate() {
                totals[j] += importance;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for value in &mut totals {
                *value /= sum;
            }
        }
        totals
    }

    /// Number of classes the forest votes over.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of features the forest was fitted on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// The hyperparameters the forest was fitted with.
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    fn vote_counts(&self, x: &Array2<f64>) -> Result<Vec<Vec<usize>>> {
        if x.ncols() != self.n_features {
            return Err(AppError::Training(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut votes = vec![vec![0usize; self.n_classes]; x.nrows()];
        for tree in &self.trees {
            let predictions = tree.predict(x);
            for (i, &class) in predictions.iter().enumerate() {
                if class < self.n_classes {
                    votes[i][class] += 1;
                }
            }
        }
        Ok(votes)
    }
}

impl std::fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomForest")
            .field("n_trees", &self.trees.len())
            .field("n_classes", &self.n_classes)
            .field("n_features", &self.n_features)
            .field("params", &self.params)
            .finish()
    }
}
