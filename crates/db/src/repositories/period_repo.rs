//! Repository for the `evaluation_periods` table.

use sqlx::PgPool;

use evalcycle_core::phase::{DeadlineField, EvaluationPhase, PeriodStatus};
use evalcycle_core::types::{DbId, Timestamp};

use crate::models::period::{CreatePeriod, EvaluationPeriod};

/// Column list for evaluation_periods queries.
const COLUMNS: &str = "id, name, starts_on, current_phase, status, \
    evaluation_setup_deadline, performance_deadline, \
    self_evaluation_deadline, peer_evaluation_deadline, \
    created_at, updated_at";

/// Provides CRUD operations for evaluation periods. Periods are never
/// deleted; their lifecycle is driven entirely through `status`.
pub struct PeriodRepo;

impl PeriodRepo {
    /// Insert a new period, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePeriod,
    ) -> Result<EvaluationPeriod, sqlx::Error> {
        let query = format!(
            "INSERT INTO evaluation_periods
                (name, starts_on, evaluation_setup_deadline, performance_deadline,
                 self_evaluation_deadline, peer_evaluation_deadline)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .bind(&input.name)
            .bind(input.starts_on)
            .bind(input.evaluation_setup_deadline)
            .bind(input.performance_deadline)
            .bind(input.self_evaluation_deadline)
            .bind(input.peer_evaluation_deadline)
            .fetch_one(pool)
            .await
    }

    /// Find a period by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EvaluationPeriod>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM evaluation_periods WHERE id = $1");
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all periods currently in progress, oldest first. Only these
    /// are considered by the phase scheduler.
    pub async fn list_in_progress(pool: &PgPool) -> Result<Vec<EvaluationPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM evaluation_periods \
             WHERE status = 'in_progress' ORDER BY id ASC"
        );
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .fetch_all(pool)
            .await
    }

    /// Set a period's current phase, returning the updated row.
    pub async fn update_phase(
        pool: &PgPool,
        id: DbId,
        phase: EvaluationPhase,
    ) -> Result<Option<EvaluationPeriod>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluation_periods SET current_phase = $2 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .bind(id)
            .bind(phase.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Set a period's lifecycle status, returning the updated row.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: PeriodStatus,
    ) -> Result<Option<EvaluationPeriod>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluation_periods SET status = $2 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Set or clear one deadline column, returning the updated row.
    ///
    /// Chain validation happens in the engine before this is called; the
    /// column name comes from [`DeadlineField::column`], never from user
    /// input.
    pub async fn update_deadline(
        pool: &PgPool,
        id: DbId,
        field: DeadlineField,
        value: Option<Timestamp>,
    ) -> Result<Option<EvaluationPeriod>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluation_periods SET {} = $2 \
             WHERE id = $1 RETURNING {COLUMNS}",
            field.column()
        );
        sqlx::query_as::<_, EvaluationPeriod>(&query)
            .bind(id)
            .bind(value)
            .fetch_optional(pool)
            .await
    }
}
