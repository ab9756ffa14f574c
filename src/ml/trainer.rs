use crate::error::{AppError, Result};
use crate::ml::features::{FeatureEngineer, FEATURE_COUNT, FEATURE_NAMES};
use crate::ml::forest::{ForestParams, RandomForest};
use crate::ml::models::{evaluate_predictions, ModelArtifact, ModelMetrics};
use crate::models::{Criticality, N_CLASSES};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::path::Path;
use tracing::info;

/// Trainer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Untrained,
    Trained,
    Persisted,
}

/// Trains, evaluates and persists the criticality classifier.
///
/// Lifecycle: `Untrained` → `Trained` (after [`train`](Self::train)) →
/// `Persisted` (after [`save`](Self::save)). Prediction, evaluation and
/// persistence all require a trained model.
#[derive(Debug)]
pub struct CriticalityTrainer {
    engineer: FeatureEngineer,
    params: ForestParams,
    model: Option<RandomForest>,
    training_date: Option<DateTime<Utc>>,
    train_accuracy: f64,
    train_size: usize,
    metrics: Option<ModelMetrics>,
    persisted: bool,
}

impl CriticalityTrainer {
    /// Create a trainer around a fitted feature engineer.
    pub fn new(engineer: FeatureEngineer, params: ForestParams) -> Result<Self> {
        if !engineer.is_fitted() {
            return Err(AppError::UnfittedState(
                "trainer requires a fitted feature engineer".to_string(),
            ));
        }
        Ok(Self {
            engineer,
            params,
            model: None,
            training_date: None,
            train_accuracy: 0.0,
            train_size: 0,
            metrics: None,
            persisted: false,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TrainerState {
        match (&self.model, self.persisted) {
            (None, _) => TrainerState::Untrained,
            (Some(_), false) => TrainerState::Trained,
            (Some(_), true) => TrainerState::Persisted,
        }
    }

    /// The fitted feature engineer this trainer scores through.
    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    /// Metrics from the last evaluation, if any.
    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.as_ref()
    }

    /// Timestamp of the last training run, if any.
    pub fn training_date(&self) -> Option<DateTime<Utc>> {
        self.training_date
    }

    /// Fit the forest on the training split.
    pub fn train(&mut self, x_train: &Array2<f64>, y_train: &[Criticality]) -> Result<()> {
        info!(
            n_trees = self.params.n_trees,
            max_depth = self.params.max_depth,
            train_size = y_train.len(),
            "training criticality classifier"
        );

        let indices: Vec<usize> = y_train.iter().map(Criticality::as_index).collect();
        let model = RandomForest::fit(x_train, &indices, N_CLASSES, self.params.clone())?;

        let train_pred = to_labels(&model.predict(x_train)?)?;
        let (train_accuracy, _, _) = evaluate_predictions(y_train, &train_pred);

        self.train_accuracy = train_accuracy;
        self.train_size = y_train.len();
        self.training_date = Some(Utc::now());
        self.model = Some(model);
        self.metrics = None;
        self.persisted = false;

        info!(train_accuracy, "classifier trained");
        Ok(())
    }

    /// Evaluate the trained model on the held-out split and keep the metrics
    /// for persistence.
    pub fn evaluate(
        &mut self,
        x_test: &Array2<f64>,
        y_test: &[Criticality],
    ) -> Result<ModelMetrics> {
        let model = self.trained_model()?;

        let test_pred = to_labels(&model.predict(x_test)?)?;
        let (test_accuracy, per_class, confusion_matrix) =
            evaluate_predictions(y_test, &test_pred);

        let metrics = ModelMetrics {
            train_accuracy: self.train_accuracy,
            test_accuracy,
            train_size: self.train_size,
            test_size: y_test.len(),
            per_class,
            confusion_matrix,
        };

        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            "evaluation complete"
        );

        self.metrics = Some(metrics.clone());
        Ok(metrics)
    }

    /// Predict criticality labels for a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<Criticality>> {
        let model = self.trained_model()?;
        to_labels(&model.predict(x)?)
    }

    /// Predict the per-class probability matrix (columns in class order).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.trained_model()?.predict_proba(x)
    }

    /// Feature importances ranked descending; ties keep the original
    /// feature order.
    pub fn feature_importance(&self) -> Result<Vec<(String, f64)>> {
        let model = self.trained_model()?;

        let mut ranked: Vec<(String, f64)> = FEATURE_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(model.feature_importances())
            .collect();
        // Stable sort, so equal scores stay in column order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }

    /// Persist the artifact bundle plus a sibling human-readable metrics
    /// record (`<stem>_metrics.json`).
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let model = self.trained_model()?.clone();
        let metrics = self.metrics.clone().ok_or_else(|| {
            AppError::InvalidStateTransition(
                "evaluate must run before save so the artifact carries metrics".to_string(),
            )
        })?;
        let training_date = self.training_date.ok_or_else(|| {
            AppError::UnfittedState("classifier has not been trained".to_string())
        })?;

        let artifact = ModelArtifact {
            model,
            engineer: self.engineer.clone(),
            params: self.params.clone(),
            training_date,
            metrics,
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = bincode::serialize(&artifact)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;

        let metrics_path = sibling_metrics_path(path);
        let summary = serde_json::to_string_pretty(&artifact.metrics.summary())?;
        std::fs::write(&metrics_path, summary)?;

        self.persisted = true;
        info!(artifact = %path.display(), metrics = %metrics_path.display(), "model saved");
        Ok(())
    }

    /// Reconstruct a trained trainer from a persisted artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let artifact: ModelArtifact = bincode::deserialize(&bytes).map_err(|e| {
            AppError::CorruptArtifact(format!("failed to decode artifact: {e}"))
        })?;

        let scaler_columns = artifact
            .engineer
            .state()
            .map(|state| state.scaler.n_features())
            .ok_or_else(|| {
                AppError::CorruptArtifact(
                    "artifact carries an unfitted feature engineer".to_string(),
                )
            })?;
        if scaler_columns != FEATURE_COUNT {
            return Err(AppError::CorruptArtifact(format!(
                "artifact scaler covers {scaler_columns} columns, expected {FEATURE_COUNT}"
            )));
        }
        if artifact.feature_names.len() != FEATURE_COUNT {
            return Err(AppError::CorruptArtifact(format!(
                "artifact lists {} feature names, expected {FEATURE_COUNT}",
                artifact.feature_names.len()
            )));
        }
        if artifact.model.n_features() != FEATURE_COUNT {
            return Err(AppError::CorruptArtifact(format!(
                "model expects {} features, pipeline produces {FEATURE_COUNT}",
                artifact.model.n_features()
            )));
        }
        if artifact.model.n_classes() != N_CLASSES {
            return Err(AppError::CorruptArtifact(format!(
                "model votes over {} classes, expected {N_CLASSES}",
                artifact.model.n_classes()
            )));
        }

        info!(
            artifact = %path.display(),
            training_date = %artifact.training_date,
            test_accuracy = artifact.metrics.test_accuracy,
            "model loaded"
        );

        Ok(Self {
            engineer: artifact.engineer,
            params: artifact.params,
            model: Some(artifact.model),
            training_date: Some(artifact.training_date),
            train_accuracy: artifact.metrics.train_accuracy,
            train_size: artifact.metrics.train_size,
            metrics: Some(artifact.metrics),
            persisted: true,
        })
    }

    fn trained_model(&self) -> Result<&RandomForest> {
        self.model.as_ref().ok_or_else(|| {
            AppError::UnfittedState("classifier has not been trained".to_string())
        })
    }
}

/// Path of the artifact's human-readable metrics sibling.
pub fn sibling_metrics_path(artifact_path: &Path) -> std::path::PathBuf {
    let stem = artifact_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    artifact_path.with_file_name(format!("{stem}_metrics.json"))
}

fn to_labels(indices: &[usize]) -> Result<Vec<Criticality>> {
    indices
        .iter()
        .map(|&index| {
            Criticality::from_index(index).ok_or_else(|| {
                AppError::Training(format!("prediction index {index} out of class range"))
            })
        })
        .collect()
}
