use crate::ml::features::FeatureEngineer;
use crate::ml::forest::{ForestParams, RandomForest};
use crate::models::Criticality;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Model evaluation metrics over train and test sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy on the training set
    pub train_accuracy: f64,

    /// Accuracy on the held-out test set
    pub test_accuracy: f64,

    /// Training set size
    pub train_size: usize,

    /// Test set size
    pub test_size: usize,

    /// Test-set metrics per class, keyed by display label
    pub per_class: BTreeMap<String, ClassMetrics>,

    /// Test-set confusion matrix, rows = truth, cols = prediction, both in
    /// class order (BAJO, MEDIO, ALTO, CRÍTICO)
    pub confusion_matrix: Array2<usize>,
}

impl ModelMetrics {
    /// The human-readable summary persisted next to the artifact.
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            train_accuracy: self.train_accuracy,
            test_accuracy: self.test_accuracy,
            train_size: self.train_size,
            test_size: self.test_size,
        }
    }
}

/// The key/value metrics record written as the artifact's JSON sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
}

/// Compute accuracy, per-class precision/recall/f1 and the ordered confusion
/// matrix for a pair of label vectors.
///
/// Panics when the vectors differ in length.
pub fn evaluate_predictions(
    y_true: &[Criticality],
    y_pred: &[Criticality],
) -> (f64, BTreeMap<String, ClassMetrics>, Array2<usize>) {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "label vectors must be the same length"
    );

    let n_classes = Criticality::ALL.len();
    let mut confusion = Array2::zeros((n_classes, n_classes));
    for (truth, pred) in y_true.iter().zip(y_pred.iter()) {
        confusion[[truth.as_index(), pred.as_index()]] += 1;
    }

    let accuracy = if y_true.is_empty() {
        0.0
    } else {
        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        correct as f64 / y_true.len() as f64
    };

    let mut per_class = BTreeMap::new();
    for class in Criticality::ALL {
        let index = class.as_index();
        let tp = confusion[[index, index]];
        let fp: usize = (0..n_classes)
            .filter(|&row| row != index)
            .map(|row| confusion[[row, index]])
            .sum();
        let fn_count: usize = (0..n_classes)
            .filter(|&col| col != index)
            .map(|col| confusion[[index, col]])
            .sum();
        let support: usize = (0..n_classes).map(|col| confusion[[index, col]]).sum();

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        per_class.insert(
            class.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1_score,
                support,
            },
        );
    }

    (accuracy, per_class, confusion)
}

/// The persisted training bundle: classifier, fitted feature engineer,
/// training timestamp and evaluation metrics. Immutable once saved; loaded
/// wholesale for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Trained forest
    pub model: RandomForest,

    /// Fitted feature engineer (encoders + scaler)
    pub engineer: FeatureEngineer,

    /// Hyperparameters the model was trained with
    pub params: ForestParams,

    /// When training completed
    pub training_date: DateTime<Utc>,

    /// Evaluation metrics from the training run
    pub metrics: ModelMetrics,

    /// Feature names in matrix column order
    pub feature_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use Criticality::*;

    #[test]
    fn test_evaluate_perfect_predictions() {
        let labels = vec![Bajo, Medio, Alto, Critico, Critico];
        let (accuracy, per_class, confusion) = evaluate_predictions(&labels, &labels);

        assert_eq!(accuracy, 1.0);
        assert_eq!(confusion[[3, 3]], 2);
        assert_eq!(confusion.sum(), 5);

        let critico = &per_class["CRÍTICO"];
        assert_eq!(critico.precision, 1.0);
        assert_eq!(critico.recall, 1.0);
        assert_eq!(critico.support, 2);
    }

    #[test]
    fn test_evaluate_misclassification() {
        let y_true = vec![Critico, Critico, Bajo, Bajo];
        let y_pred = vec![Critico, Alto, Bajo, Bajo];
        let (accuracy, per_class, confusion) = evaluate_predictions(&y_true, &y_pred);

        assert_eq!(accuracy, 0.75);
        // One CRÍTICO truth predicted as ALTO.
        assert_eq!(confusion[[3, 2]], 1);

        let critico = &per_class["CRÍTICO"];
        assert_eq!(critico.recall, 0.5);
        assert_eq!(critico.precision, 1.0);

        let alto = &per_class["ALTO"];
        assert_eq!(alto.precision, 0.0);
        assert_eq!(alto.support, 0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_evaluate_mismatched_lengths_panics() {
        evaluate_predictions(&[Bajo, Medio], &[Bajo]);
    }

    #[test]
    fn test_summary_keys_round_trip() {
        let summary = TrainingSummary {
            train_accuracy: 0.98,
            test_accuracy: 0.93,
            train_size: 120,
            test_size: 30,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"train_accuracy\""));
        assert!(json.contains("\"test_accuracy\""));
        assert!(json.contains("\"train_size\""));
        assert!(json.contains("\"test_size\""));

        let back: TrainingSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
