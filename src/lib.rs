//! Feature engineering and criticality classification for Statement-of-Work
//! (SOW) contract records.
//!
//! The pipeline ingests tabular SOW records, derives a rule-based
//! criticality label per record (`BAJO`/`MEDIO`/`ALTO`/`CRÍTICO`), engineers
//! a fixed 14-dimension feature vector, trains a bagged tree ensemble on the
//! labeled features and persists the trained bundle for a downstream serving
//! layer. A gold-case validation harness re-scores known critical contracts
//! through the trained pipeline.

pub mod config;
pub mod data;
pub mod error;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
