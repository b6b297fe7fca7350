//! Repository for the revision request ledger.
//!
//! Requests are appended by the workflow engine during fan-out (inside
//! the engine's transaction); this repository covers the read side and
//! the recipient-owned read/complete mutations (fan-in).

use sqlx::PgPool;

use evalcycle_core::types::DbId;

use crate::models::revision::{
    CreateRevisionRequest, RevisionRequest, RevisionRequestRecipient, RevisionRequestWithRecipient,
};

/// Column list for revision_requests queries.
pub const REQUEST_COLUMNS: &str =
    "id, period_id, employee_id, step, comment, requested_by, created_at";

/// Column list for revision_request_recipients queries.
pub const RECIPIENT_COLUMNS: &str = "id, revision_request_id, recipient_id, recipient_type, \
    is_read, read_at, is_completed, completed_at, response_comment, created_at, updated_at";

/// Read and fan-in access to the revision request ledger.
pub struct RevisionRepo;

impl RevisionRepo {
    /// Append one request with its recipient row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRevisionRequest,
    ) -> Result<RevisionRequest, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO revision_requests (period_id, employee_id, step, comment, requested_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, RevisionRequest>(&query)
            .bind(input.period_id)
            .bind(input.employee_id)
            .bind(&input.step)
            .bind(&input.comment)
            .bind(input.requested_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO revision_request_recipients \
                (revision_request_id, recipient_id, recipient_type) \
             VALUES ($1, $2, $3)",
        )
        .bind(request.id)
        .bind(input.recipient_id)
        .bind(&input.recipient_type)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    /// List requests for one employee and step in a period, newest first.
    pub async fn list_for_employee_step(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        step: &str,
    ) -> Result<Vec<RevisionRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM revision_requests \
             WHERE period_id = $1 AND employee_id = $2 AND step = $3 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RevisionRequest>(&query)
            .bind(period_id)
            .bind(employee_id)
            .bind(step)
            .fetch_all(pool)
            .await
    }

    /// List a person's inbox: requests addressed to them within a period,
    /// newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        period_id: DbId,
        recipient_id: DbId,
    ) -> Result<Vec<RevisionRequestWithRecipient>, sqlx::Error> {
        sqlx::query_as::<_, RevisionRequestWithRecipient>(
            "SELECT
                r.id, r.period_id, r.employee_id, r.step, r.comment,
                r.requested_by, r.created_at,
                rr.id AS recipient_row_id,
                rr.recipient_id,
                rr.recipient_type,
                rr.is_read,
                rr.is_completed
             FROM revision_requests r
             JOIN revision_request_recipients rr ON rr.revision_request_id = r.id
             WHERE r.period_id = $1 AND rr.recipient_id = $2
             ORDER BY r.created_at DESC",
        )
        .bind(period_id)
        .bind(recipient_id)
        .fetch_all(pool)
        .await
    }

    /// List the recipient rows of one request.
    pub async fn list_recipients_for_request(
        pool: &PgPool,
        revision_request_id: DbId,
    ) -> Result<Vec<RevisionRequestRecipient>, sqlx::Error> {
        let query = format!(
            "SELECT {RECIPIENT_COLUMNS} FROM revision_request_recipients \
             WHERE revision_request_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, RevisionRequestRecipient>(&query)
            .bind(revision_request_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a recipient row as read. Idempotent; keeps the first read_at.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RevisionRequestRecipient>, sqlx::Error> {
        let query = format!(
            "UPDATE revision_request_recipients \
             SET is_read = true, read_at = COALESCE(read_at, now()) \
             WHERE id = $1 RETURNING {RECIPIENT_COLUMNS}"
        );
        sqlx::query_as::<_, RevisionRequestRecipient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a recipient row as completed with an optional response
    /// comment. Sibling recipients of the same or related requests are
    /// untouched; completion never flips the step slot by itself.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        response_comment: Option<&str>,
    ) -> Result<Option<RevisionRequestRecipient>, sqlx::Error> {
        let query = format!(
            "UPDATE revision_request_recipients \
             SET is_completed = true, \
                 completed_at = COALESCE(completed_at, now()), \
                 is_read = true, \
                 read_at = COALESCE(read_at, now()), \
                 response_comment = COALESCE($2, response_comment) \
             WHERE id = $1 RETURNING {RECIPIENT_COLUMNS}"
        );
        sqlx::query_as::<_, RevisionRequestRecipient>(&query)
            .bind(id)
            .bind(response_comment)
            .fetch_optional(pool)
            .await
    }
}
