//! Criticality classification pipeline: rule-based labeling, feature
//! engineering, the bagged tree ensemble, training/evaluation and the
//! gold-case validation harness.

pub mod dataset;
pub mod features;
pub mod forest;
pub mod labeling;
pub mod models;
pub mod trainer;
pub mod validation;

pub use dataset::{
    stratified_split, AnnotatedRecord, DatasetPreparer, PreparedDataset, SplitDataset,
};
pub use features::{
    CategoryEncoder, FeatureEngineer, FeatureEngineerState, ScalerState, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use forest::{ForestParams, RandomForest};
pub use labeling::{classify, classify_record};
pub use models::{ClassMetrics, ModelArtifact, ModelMetrics, TrainingSummary};
pub use trainer::{sibling_metrics_path, CriticalityTrainer, TrainerState};
pub use validation::{validate_critical_cases, CaseResult, ValidationReport};
