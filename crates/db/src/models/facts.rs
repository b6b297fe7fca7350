//! Collaborator fact models: evaluation lines and the raw completion
//! facts the status aggregator reconciles with approval state. The
//! workflow engine only ever reads these tables; the content layer that
//! writes evaluation data lives outside this system.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use evalcycle_core::types::{DbId, Timestamp};

/// A row from the `evaluation_lines` table: who evaluates whom.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EvaluationLine {
    pub id: DbId,
    pub period_id: DbId,
    pub employee_id: DbId,
    pub primary_evaluator_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an evaluation line with its secondary evaluators.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvaluationLine {
    pub period_id: DbId,
    pub employee_id: DbId,
    pub primary_evaluator_id: Option<DbId>,
    pub secondary_evaluator_ids: Vec<DbId>,
}

/// An `(assigned, completed)` pair produced by aggregate count queries.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct CompletionCounts {
    pub assigned: i64,
    pub completed: i64,
}

/// Completion counts extended with record existence, for the
/// approval-aware vocabulary.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct RecordCompletionCounts {
    pub assigned: i64,
    pub records: i64,
    pub completed: i64,
}

/// Aggregate facts for an employee's self-evaluation: item completion
/// plus the two all-items submission flags.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct SelfEvaluationFacts {
    pub assigned: i64,
    pub records: i64,
    pub completed: i64,
    pub all_submitted_to_evaluator: bool,
    pub all_submitted_to_manager: bool,
}

/// A row from the `final_evaluations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FinalEvaluation {
    pub id: DbId,
    pub period_id: DbId,
    pub employee_id: DbId,
    pub grade: Option<String>,
    pub is_confirmed: bool,
    pub confirmed_by: Option<DbId>,
    pub confirmed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One evaluation line seen from an evaluator's side: the target employee
/// and the role the evaluator holds for them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EvaluatorAssignment {
    pub employee_id: DbId,
    pub evaluator_role: String,
}
