use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A Statement-of-Work contract record.
///
/// Field names follow the snake_case schema; serde renames map to the
/// external display-name columns of the Fieldglass export ("SOW ID",
/// "# Days before expiration", ...), with snake_case accepted as an alias.
/// Records are created externally (upload or synthetic generator) and are
/// read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SowRecord {
    /// Unique SOW identifier
    #[serde(rename = "SOW ID", alias = "sow_id")]
    pub sow_id: String,

    /// Days until the contract expires; negative means already expired
    #[serde(rename = "# Days before expiration", alias = "days_before_expiration")]
    pub days_before_expiration: i64,

    /// Contract status (Active, Pending Renewal, Expired, ...)
    #[serde(rename = "SOW Status", alias = "sow_status")]
    pub sow_status: String,

    /// Human-readable title
    #[serde(rename = "SOW title", alias = "sow_title")]
    pub sow_title: String,

    /// Parent contract identifier
    #[serde(rename = "Contract Id", alias = "contract_id")]
    pub contract_id: String,

    /// Number of workers currently staffed on the SOW
    #[serde(rename = "Active SOW workers", alias = "active_sow_workers")]
    pub active_sow_workers: u32,

    /// Contract start date
    #[serde(rename = "Start Date", alias = "start_date")]
    pub start_date: NaiveDate,

    /// Contract end date
    #[serde(rename = "End date", alias = "end_date")]
    pub end_date: NaiveDate,

    /// Latest approved maximum budget
    #[serde(rename = "Latest maximum budget", alias = "latest_maximum_budget")]
    pub latest_maximum_budget: f64,

    /// Budget currency code
    #[serde(rename = "currency")]
    pub currency: String,

    /// Supplier name
    #[serde(rename = "supplier")]
    pub supplier: String,

    /// Owning business unit
    #[serde(rename = "Business Unit", alias = "business_unit")]
    pub business_unit: String,

    /// Primary line of business
    #[serde(rename = "Primary LOB", alias = "primary_lob")]
    pub primary_lob: String,

    /// Responsible owner
    #[serde(rename = "SOW owner", alias = "sow_owner")]
    pub sow_owner: String,
}

impl SowRecord {
    /// Validate required fields, naming the offending column on failure.
    pub fn validate(&self) -> Result<()> {
        fn require(field: &str, value: &str) -> Result<()> {
            if value.trim().is_empty() {
                return Err(AppError::RecordValidation {
                    field: field.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            Ok(())
        }

        require("SOW ID", &self.sow_id)?;
        require("SOW Status", &self.sow_status)?;
        require("currency", &self.currency)?;
        require("supplier", &self.supplier)?;
        require("Business Unit", &self.business_unit)?;
        require("Primary LOB", &self.primary_lob)?;

        if !self.latest_maximum_budget.is_finite() || self.latest_maximum_budget < 0.0 {
            return Err(AppError::RecordValidation {
                field: "Latest maximum budget".to_string(),
                message: format!(
                    "must be a non-negative number, got {}",
                    self.latest_maximum_budget
                ),
            });
        }

        Ok(())
    }
}
