use crate::error::Result;
use crate::models::SowRecord;
use std::path::Path;
use tracing::info;

/// Load a SOW dataset from a CSV file, validating every record.
///
/// Accepts the external display-name headers ("SOW ID", "# Days before
/// expiration", ...) or the snake_case schema. Fail-fast: the first
/// malformed row or invalid field aborts the load.
pub fn load_dataset(path: &Path) -> Result<Vec<SowRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: SowRecord = row?;
        record.validate()?;
        records.push(record);
    }

    info!(path = %path.display(), records = records.len(), "dataset loaded");
    Ok(records)
}

/// Write a SOW dataset as CSV with the external display-name columns.
pub fn write_dataset(path: &Path, records: &[SowRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), records = records.len(), "dataset written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generator::gold_cases;
    use crate::error::AppError;
    use chrono::NaiveDate;

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sows.csv");

        let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
        let records = gold_cases(today);
        write_dataset(&path, &records).unwrap();

        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded.len(), records.len());
        for (a, b) in loaded.iter().zip(records.iter()) {
            assert_eq!(a.sow_id, b.sow_id);
            assert_eq!(a.days_before_expiration, b.days_before_expiration);
            assert_eq!(a.active_sow_workers, b.active_sow_workers);
            assert_eq!(a.start_date, b.start_date);
            assert_eq!(a.latest_maximum_budget, b.latest_maximum_budget);
        }
    }

    #[test]
    fn test_snake_case_headers_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sows.csv");
        std::fs::write(
            &path,
            "\
sow_id,days_before_expiration,sow_status,sow_title,contract_id,active_sow_workers,start_date,end_date,latest_maximum_budget,currency,supplier,business_unit,primary_lob,sow_owner
SOW-2025-0001,45,Active,QA Testing Services,CNT-2025-0001,3,2025-01-01,2025-10-09,120000,USD,Wipro,Finance,Quality Assurance,David Kim
",
        )
        .unwrap();

        let records = load_dataset(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].days_before_expiration, 45);
    }

    #[test]
    fn test_invalid_field_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sows.csv");
        std::fs::write(
            &path,
            "\
sow_id,days_before_expiration,sow_status,sow_title,contract_id,active_sow_workers,start_date,end_date,latest_maximum_budget,currency,supplier,business_unit,primary_lob,sow_owner
,45,Active,QA Testing Services,CNT-2025-0001,3,2025-01-01,2025-10-09,120000,USD,Wipro,Finance,Quality Assurance,David Kim
",
        )
        .unwrap();

        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, AppError::RecordValidation { .. }));
    }

    #[test]
    fn test_missing_column_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sows.csv");
        std::fs::write(&path, "sow_id,currency\nSOW-1,USD\n").unwrap();

        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
    }
}
