use crate::error::{AppError, Result};
use crate::ml::features::FeatureEngineer;
use crate::ml::labeling::classify_record;
use crate::models::{Criticality, SowRecord};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// A record annotated with its rule-derived criticality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub record: SowRecord,
    pub criticality: Criticality,
}

/// Aligned output of dataset preparation: features, labels and the
/// annotated records, all in the input row order.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Feature matrix (n_samples × FEATURE_COUNT)
    pub features: Array2<f64>,

    /// Rule-derived labels, index-aligned with the feature rows
    pub labels: Vec<Criticality>,

    /// Input records with their labels, same order
    pub annotated: Vec<AnnotatedRecord>,
}

impl PreparedDataset {
    /// Class counts over the labels, in class order.
    pub fn class_distribution(&self) -> BTreeMap<Criticality, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }
}

/// Orchestrates labeling and feature engineering over a full dataset.
///
/// The first `prepare` call fits the owned feature engineer; later calls
/// reuse the fitted state, so every matrix this preparer emits lives in the
/// same feature space.
#[derive(Debug, Default)]
pub struct DatasetPreparer {
    engineer: FeatureEngineer,
}

impl DatasetPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The owned feature engineer.
    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    /// Consume the preparer, handing the fitted engineer to the trainer.
    pub fn into_engineer(self) -> FeatureEngineer {
        self.engineer
    }

    /// Label and featurize every record, preserving input order exactly.
    pub fn prepare(&mut self, records: &[SowRecord]) -> Result<PreparedDataset> {
        for record in records {
            record.validate()?;
        }

        let features = if self.engineer.is_fitted() {
            self.engineer.transform(records)?
        } else {
            self.engineer.fit_transform(records)?
        };

        let labels: Vec<Criticality> = records.iter().map(classify_record).collect();
        let annotated = records
            .iter()
            .zip(labels.iter())
            .map(|(record, &criticality)| AnnotatedRecord {
                record: record.clone(),
                criticality,
            })
            .collect();

        info!(
            records = records.len(),
            features = features.ncols(),
            "dataset prepared"
        );

        Ok(PreparedDataset {
            features,
            labels,
            annotated,
        })
    }
}

/// A stratified train/test split.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub x_train: Array2<f64>,
    pub y_train: Vec<Criticality>,
    pub x_test: Array2<f64>,
    pub y_test: Vec<Criticality>,
}

/// Split features and labels into train/test sets, preserving class
/// proportions. Every class present must have at least 2 members; each class
/// contributes at least one test row. Fails rather than degrading to a
/// non-stratified split.
pub fn stratified_split(
    features: &Array2<f64>,
    labels: &[Criticality],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitDataset> {
    if features.nrows() != labels.len() {
        return Err(AppError::Dataset(format!(
            "feature rows ({}) and labels ({}) are misaligned",
            features.nrows(),
            labels.len()
        )));
    }
    if !(0.0..1.0).contains(&test_fraction) || test_fraction <= 0.0 {
        return Err(AppError::Dataset(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let mut by_class: BTreeMap<Criticality, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(index);
    }

    for (class, indices) in &by_class {
        if indices.len() < 2 {
            return Err(AppError::InsufficientData(format!(
                "class {class} has {} member(s); at least 2 are required for a stratified split",
                indices.len()
            )));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for indices in by_class.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);

        let n_test = ((shuffled.len() as f64 * test_fraction).floor() as usize).max(1);
        let (test, train) = shuffled.split_at(n_test);
        test_indices.extend_from_slice(test);
        train_indices.extend_from_slice(train);
    }

    // Stable row order within each side of the split.
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    let take = |indices: &[usize]| -> (Array2<f64>, Vec<Criticality>) {
        let mut x = Array2::zeros((indices.len(), features.ncols()));
        let mut y = Vec::with_capacity(indices.len());
        for (row, &index) in indices.iter().enumerate() {
            x.row_mut(row).assign(&features.row(index));
            y.push(labels[index]);
        }
        (x, y)
    };

    let (x_train, y_train) = take(&train_indices);
    let (x_test, y_test) = take(&test_indices);

    info!(
        train = y_train.len(),
        test = y_test.len(),
        "stratified split complete"
    );

    Ok(SplitDataset {
        x_train,
        y_train,
        x_test,
        y_test,
    })
}
