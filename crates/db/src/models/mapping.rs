//! Period-employee mapping entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use evalcycle_core::types::{DbId, Timestamp};

/// A row from the `period_employee_mappings` table. The anchor key for all
/// per-employee workflow state within a period.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PeriodEmployeeMapping {
    pub id: DbId,
    pub period_id: DbId,
    pub employee_id: DbId,
    pub is_excluded: bool,
    pub exclusion_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for enrolling an employee into a period.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMapping {
    pub period_id: DbId,
    pub employee_id: DbId,
    pub is_excluded: Option<bool>,
    pub exclusion_reason: Option<String>,
}
