use crate::error::{AppError, Result};
use crate::models::SowRecord;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of engineered features per record.
pub const FEATURE_COUNT: usize = 14;

/// Feature names in matrix column order. The order is part of the serving
/// contract and must never change between fit and transform.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "days_to_expire",
    "is_expired",
    "is_critical_window",
    "is_high_priority_window",
    "has_workers",
    "worker_count",
    "worker_criticality_score",
    "budget_normalized",
    "budget_per_worker",
    "risk_score",
    "supplier_encoded",
    "business_unit_encoded",
    "primary_lob_encoded",
    "currency_encoded",
];

/// Dense integer encoding for one categorical field.
///
/// Codes are assigned over the sorted distinct values seen at fit time, so
/// two engineers fitted on the same data produce identical encodings. A value
/// unseen at fit time maps to the reserved code one past the last fitted
/// code instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: BTreeMap<String, usize>,
}

impl CategoryEncoder {
    /// Fit an encoder over the distinct values of an iterator.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = values.into_iter().collect();
        let codes = unique
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value.to_string(), code))
            .collect();
        Self { codes }
    }

    /// Encode a value; unseen values get the reserved unknown code.
    pub fn encode(&self, value: &str) -> usize {
        self.codes.get(value).copied().unwrap_or_else(|| self.unknown_code())
    }

    /// The reserved code for values absent at fit time.
    pub fn unknown_code(&self) -> usize {
        self.codes.len()
    }

    /// Number of fitted categories.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the encoder has no fitted categories.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Per-column centering and scaling statistics.
///
/// Fitted once over the training matrix (zero mean, unit variance per
/// column); the same constants are applied to every later matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl ScalerState {
    /// Fit means and scales over the columns of a matrix.
    pub fn fit(matrix: &Array2<f64>) -> Result<Self> {
        let n_rows = matrix.nrows();
        if n_rows == 0 {
            return Err(AppError::InsufficientData(
                "cannot fit scaler statistics on an empty dataset".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(matrix.ncols());
        let mut scales = Vec::with_capacity(matrix.ncols());

        for column in matrix.columns() {
            let mean = column.sum() / n_rows as f64;
            let variance =
                column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_rows as f64;
            let std = variance.sqrt();

            means.push(mean);
            // Constant columns pass through unscaled.
            scales.push(if std > 0.0 { std } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    /// Center and scale a matrix in place with the fitted constants.
    pub fn apply(&self, matrix: &mut Array2<f64>) {
        for (j, mut column) in matrix.columns_mut().into_iter().enumerate() {
            let mean = self.means[j];
            let scale = self.scales[j];
            column.mapv_inplace(|v| (v - mean) / scale);
        }
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}

/// Fitted feature-engineering state: one encoder per categorical field plus
/// the scaler. Produced once by [`FeatureEngineer::fit`] and read-only after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineerState {
    pub supplier: CategoryEncoder,
    pub business_unit: CategoryEncoder,
    pub primary_lob: CategoryEncoder,
    pub currency: CategoryEncoder,
    pub scaler: ScalerState,
}

/// Derives the fixed 14-dim feature vector from raw SOW records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureEngineer {
    state: Option<FeatureEngineerState>,
}

impl FeatureEngineer {
    /// Create an unfitted feature engineer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether encoders and scaler have been fitted.
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The fitted state, if any.
    pub fn state(&self) -> Option<&FeatureEngineerState> {
        self.state.as_ref()
    }

    /// Fit encoders and scaler over a training set. The state is fitted
    /// exactly once; refitting an already-fitted engineer is rejected so two
    /// engineers fitted on different data can never be confused.
    pub fn fit(&mut self, records: &[SowRecord]) -> Result<()> {
        if self.is_fitted() {
            return Err(AppError::InvalidStateTransition(
                "feature engineer is already fitted".to_string(),
            ));
        }
        if records.is_empty() {
            return Err(AppError::InsufficientData(
                "cannot fit a feature engineer on an empty dataset".to_string(),
            ));
        }

        let supplier = CategoryEncoder::fit(records.iter().map(|r| r.supplier.as_str()));
        let business_unit =
            CategoryEncoder::fit(records.iter().map(|r| r.business_unit.as_str()));
        let primary_lob =
            CategoryEncoder::fit(records.iter().map(|r| r.primary_lob.as_str()));
        let currency = CategoryEncoder::fit(records.iter().map(|r| r.currency.as_str()));

        let mut partial = FeatureEngineerState {
            supplier,
            business_unit,
            primary_lob,
            currency,
            scaler: ScalerState {
                means: vec![],
                scales: vec![],
            },
        };

        let raw = raw_matrix(records, &partial);
        partial.scaler = ScalerState::fit(&raw)?;

        self.state = Some(partial);
        Ok(())
    }

    /// First-time fit followed by a transform of the same records.
    pub fn fit_transform(&mut self, records: &[SowRecord]) -> Result<Array2<f64>> {
        self.fit(records)?;
        self.transform(records)
    }

    /// Transform records with the previously fitted state.
    pub fn transform(&self, records: &[SowRecord]) -> Result<Array2<f64>> {
        let state = self.state.as_ref().ok_or_else(|| {
            AppError::UnfittedState(
                "transform called before fit_transform/fit".to_string(),
            )
        })?;

        let mut matrix = raw_matrix(records, state);
        state.scaler.apply(&mut matrix);
        Ok(matrix)
    }
}

#[cfg(test)]
impl ScalerState {
    pub(crate) fn from_parts(means: Vec<f64>, scales: Vec<f64>) -> Self {
        Self { means, scales }
    }
}

#[cfg(test)]
impl FeatureEngineer {
    pub(crate) fn with_state(state: FeatureEngineerState) -> Self {
        Self { state: Some(state) }
    }
}

/// Assemble the unscaled feature matrix for a set of records.
fn raw_matrix(records: &[SowRecord], state: &FeatureEngineerState) -> Array2<f64> {
    let mut matrix = Array2::zeros((records.len(), FEATURE_COUNT));

    for (i, record) in records.iter().enumerate() {
        let numeric = numeric_features(record);
        for (j, value) in numeric.into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
        matrix[[i, 10]] = state.supplier.encode(&record.supplier) as f64;
        matrix[[i, 11]] = state.business_unit.encode(&record.business_unit) as f64;
        matrix[[i, 12]] = state.primary_lob.encode(&record.primary_lob) as f64;
        matrix[[i, 13]] = state.currency.encode(&record.currency) as f64;
    }

    matrix
}

/// The ten numeric features, in column order.
fn numeric_features(record: &SowRecord) -> [f64; 10] {
    let days = record.days_before_expiration as f64;
    let workers = record.active_sow_workers as f64;
    let budget = record.latest_maximum_budget;

    let is_expired = if days < 0.0 { 1.0 } else { 0.0 };
    let is_critical_window = if days <= 30.0 { 1.0 } else { 0.0 };
    let is_high_priority_window = if days > 30.0 && days <= 60.0 { 1.0 } else { 0.0 };
    let has_workers = if workers > 0.0 { 1.0 } else { 0.0 };
    let worker_criticality_score = workers * is_critical_window;
    let budget_normalized = budget / 1_000_000.0;
    let budget_per_worker = if workers > 0.0 { budget / workers } else { 0.0 };
    let risk_score = (30.0 - days) * has_workers * (1.0 + workers.ln_1p());

    [
        days,
        is_expired,
        is_critical_window,
        is_high_priority_window,
        has_workers,
        workers,
        worker_criticality_score,
        budget_normalized,
        budget_per_worker,
        risk_score,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_record(
        sow_id: &str,
        days: i64,
        workers: u32,
        budget: f64,
        supplier: &str,
        currency: &str,
    ) -> SowRecord {
        SowRecord {
            sow_id: sow_id.to_string(),
            days_before_expiration: days,
            sow_status: "Active".to_string(),
            sow_title: "Software Development Services".to_string(),
            contract_id: format!("CNT-{sow_id}"),
            active_sow_workers: workers,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            latest_maximum_budget: budget,
            currency: currency.to_string(),
            supplier: supplier.to_string(),
            business_unit: "Technology".to_string(),
            primary_lob: "Data Engineering".to_string(),
            sow_owner: "Sarah Chen".to_string(),
        }
    }

    fn training_records() -> Vec<SowRecord> {
        vec![
            make_record("A", 28, 25, 1_500_000.0, "Accenture", "USD"),
            make_record("B", 120, 0, 80_000.0, "Deloitte", "EUR"),
            make_record("C", 45, 8, 450_000.0, "Cognizant", "USD"),
            make_record("D", -5, 8, 450_000.0, "Accenture", "GBP"),
        ]
    }

    #[test]
    fn test_numeric_feature_formulas() {
        let record = make_record("A", 28, 25, 1_500_000.0, "Accenture", "USD");
        let features = numeric_features(&record);

        assert_eq!(features[0], 28.0); // days_to_expire
        assert_eq!(features[1], 0.0); // is_expired
        assert_eq!(features[2], 1.0); // is_critical_window
        assert_eq!(features[3], 0.0); // is_high_priority_window
        assert_eq!(features[4], 1.0); // has_workers
        assert_eq!(features[5], 25.0); // worker_count
        assert_eq!(features[6], 25.0); // worker_criticality_score
        assert_eq!(features[7], 1.5); // budget_normalized
        assert_eq!(features[8], 60_000.0); // budget_per_worker

        let expected_risk = (30.0 - 28.0) * 1.0 * (1.0 + 25.0_f64.ln_1p());
        assert!((features[9] - expected_risk).abs() < 1e-6);
        assert!((features[9] - 8.516_193).abs() < 1e-3);
    }

    #[test]
    fn test_budget_per_worker_zero_workers() {
        let record = make_record("A", 20, 0, 75_000.0, "Accenture", "USD");
        let features = numeric_features(&record);

        assert_eq!(features[4], 0.0);
        assert_eq!(features[8], 0.0);
        // risk_score is zeroed by has_workers
        assert_eq!(features[9], 0.0);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let engineer = FeatureEngineer::new();
        let err = engineer.transform(&training_records()).unwrap_err();
        assert!(matches!(err, AppError::UnfittedState(_)));
    }

    #[test]
    fn test_fit_on_empty_dataset_fails() {
        let mut engineer = FeatureEngineer::new();
        let err = engineer.fit(&[]).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_refit_rejected() {
        let records = training_records();
        let mut engineer = FeatureEngineer::new();
        engineer.fit(&records).unwrap();

        let err = engineer.fit(&records).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_fit_transform_shape_and_idempotent_transform() {
        let records = training_records();
        let mut engineer = FeatureEngineer::new();

        let first = engineer.fit_transform(&records).unwrap();
        assert_eq!(first.shape(), &[4, FEATURE_COUNT]);

        let second = engineer.transform(&records).unwrap();
        let third = engineer.transform(&records).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_scaling_zero_mean_unit_variance() {
        let records = training_records();
        let mut engineer = FeatureEngineer::new();
        let matrix = engineer.fit_transform(&records).unwrap();

        // Non-constant columns come out centered with unit variance.
        let n = matrix.nrows() as f64;
        let days = matrix.column(0);
        let mean = days.sum() / n;
        let variance = days.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9);
        assert!((variance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_encoding_sorted_and_deterministic() {
        let encoder = CategoryEncoder::fit(["Deloitte", "Accenture", "Cognizant", "Accenture"]);

        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.encode("Accenture"), 0);
        assert_eq!(encoder.encode("Cognizant"), 1);
        assert_eq!(encoder.encode("Deloitte"), 2);
    }

    #[test]
    fn test_unseen_category_maps_to_reserved_code() {
        let records = training_records();
        let mut engineer = FeatureEngineer::new();
        engineer.fit(&records).unwrap();

        let unseen = vec![make_record("Z", 10, 2, 50_000.0, "Brand New Vendor", "USD")];
        let matrix = engineer.transform(&unseen).unwrap();

        let state = engineer.state().unwrap();
        assert_eq!(state.supplier.encode("Brand New Vendor"), state.supplier.unknown_code());
        // The transform itself must not fail; the supplier column is the
        // scaled reserved code.
        assert_eq!(matrix.shape(), &[1, FEATURE_COUNT]);
    }

    #[test]
    fn test_constant_column_passes_through() {
        // All records share one currency: the column is constant and must
        // scale to exactly zero rather than NaN.
        let records = vec![
            make_record("A", 28, 2, 100_000.0, "Accenture", "USD"),
            make_record("B", 90, 4, 200_000.0, "Deloitte", "USD"),
        ];
        let mut engineer = FeatureEngineer::new();
        let matrix = engineer.fit_transform(&records).unwrap();

        for value in matrix.column(13) {
            assert_eq!(*value, 0.0);
        }
    }
}
