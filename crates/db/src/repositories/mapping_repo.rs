//! Repository for the `period_employee_mappings` table.

use sqlx::PgPool;

use evalcycle_core::types::DbId;

use crate::models::mapping::{CreateMapping, PeriodEmployeeMapping};

/// Column list for period_employee_mappings queries.
const COLUMNS: &str =
    "id, period_id, employee_id, is_excluded, exclusion_reason, created_at, updated_at";

/// Provides CRUD operations for employee enrollment into periods.
pub struct MappingRepo;

impl MappingRepo {
    /// Enroll an employee into a period. The step-approval state bundle is
    /// created alongside the mapping (all four slots defaulted to
    /// `pending`) in the same transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMapping,
    ) -> Result<PeriodEmployeeMapping, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO period_employee_mappings
                (period_id, employee_id, is_excluded, exclusion_reason)
             VALUES ($1, $2, COALESCE($3, false), $4)
             RETURNING {COLUMNS}"
        );
        let mapping = sqlx::query_as::<_, PeriodEmployeeMapping>(&query)
            .bind(input.period_id)
            .bind(input.employee_id)
            .bind(input.is_excluded)
            .bind(&input.exclusion_reason)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO step_approval_states (mapping_id) VALUES ($1)")
            .bind(mapping.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(mapping)
    }

    /// Find the mapping anchoring an employee's workflow state in a period.
    pub async fn find_by_period_and_employee(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<Option<PeriodEmployeeMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM period_employee_mappings \
             WHERE period_id = $1 AND employee_id = $2"
        );
        sqlx::query_as::<_, PeriodEmployeeMapping>(&query)
            .bind(period_id)
            .bind(employee_id)
            .fetch_optional(pool)
            .await
    }

    /// List all mappings for a period, ordered by employee id.
    pub async fn list_for_period(
        pool: &PgPool,
        period_id: DbId,
    ) -> Result<Vec<PeriodEmployeeMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM period_employee_mappings \
             WHERE period_id = $1 ORDER BY employee_id ASC"
        );
        sqlx::query_as::<_, PeriodEmployeeMapping>(&query)
            .bind(period_id)
            .fetch_all(pool)
            .await
    }

    /// Set or clear the exclusion flag on a mapping.
    pub async fn set_exclusion(
        pool: &PgPool,
        id: DbId,
        is_excluded: bool,
        reason: Option<&str>,
    ) -> Result<Option<PeriodEmployeeMapping>, sqlx::Error> {
        let query = format!(
            "UPDATE period_employee_mappings \
             SET is_excluded = $2, exclusion_reason = $3 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PeriodEmployeeMapping>(&query)
            .bind(id)
            .bind(is_excluded)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }
}
