use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset configuration
    pub data: DataConfig,

    /// Synthetic generator configuration
    pub generator: GeneratorConfig,

    /// Training configuration
    pub training: TrainingConfig,

    /// Gold-case validation configuration
    pub validation: ValidationConfig,

    /// Model artifact configuration
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: SOW_)
            .add_source(
                config::Environment::with_prefix("SOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the SOW dataset CSV
    pub dataset_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total number of records to generate, gold cases included
    pub total_records: usize,

    /// Fixed seed for reproducible datasets; omit for entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of the dataset held out for testing
    pub test_fraction: f64,

    /// Seed for the stratified split and the ensemble's bootstrap sampling
    pub seed: u64,

    /// Number of trees in the ensemble
    pub n_trees: usize,

    /// Maximum depth per tree
    pub max_depth: usize,

    /// Minimum total sample weight required to split a node
    pub min_samples_split: f32,

    /// Minimum total sample weight required in a leaf
    pub min_samples_leaf: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Gold-case accuracy below this emits a warning signal
    pub accuracy_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the persisted model artifact
    pub artifact_path: PathBuf,
}
