//! Revision request ledger models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use evalcycle_core::types::{DbId, Timestamp};

/// A row from the `revision_requests` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevisionRequest {
    pub id: DbId,
    pub period_id: DbId,
    pub employee_id: DbId,
    pub step: String,
    pub comment: String,
    pub requested_by: DbId,
    pub created_at: Timestamp,
}

/// A row from the `revision_request_recipients` table. Exactly one per
/// request in this design; read/complete state is only ever mutated by
/// the targeted person.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevisionRequestRecipient {
    pub id: DbId,
    pub revision_request_id: DbId,
    pub recipient_id: DbId,
    pub recipient_type: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub response_comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A request joined with its recipient row, as listed on worklists.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevisionRequestWithRecipient {
    pub id: DbId,
    pub period_id: DbId,
    pub employee_id: DbId,
    pub step: String,
    pub comment: String,
    pub requested_by: DbId,
    pub created_at: Timestamp,
    pub recipient_row_id: DbId,
    pub recipient_id: DbId,
    pub recipient_type: String,
    pub is_read: bool,
    pub is_completed: bool,
}

/// DTO for appending one request + recipient pair to the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRevisionRequest {
    pub period_id: DbId,
    pub employee_id: DbId,
    pub step: String,
    pub comment: String,
    pub requested_by: DbId,
    pub recipient_id: DbId,
    pub recipient_type: String,
}
