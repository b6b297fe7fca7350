//! Evaluation period entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use evalcycle_core::error::CoreError;
use evalcycle_core::phase::{DeadlineField, EvaluationPhase, PeriodStatus, DEADLINE_ORDER};
use evalcycle_core::types::{DbId, Timestamp};

/// A row from the `evaluation_periods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EvaluationPeriod {
    pub id: DbId,
    pub name: String,
    pub starts_on: NaiveDate,
    pub current_phase: String,
    pub status: String,
    pub evaluation_setup_deadline: Option<Timestamp>,
    pub performance_deadline: Option<Timestamp>,
    pub self_evaluation_deadline: Option<Timestamp>,
    pub peer_evaluation_deadline: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EvaluationPeriod {
    /// Parsed current phase.
    pub fn phase(&self) -> Result<EvaluationPhase, CoreError> {
        EvaluationPhase::from_str_value(&self.current_phase)
    }

    /// Parsed lifecycle status.
    pub fn lifecycle(&self) -> Result<PeriodStatus, CoreError> {
        PeriodStatus::from_str_value(&self.status)
    }

    /// Value of one deadline column.
    pub fn deadline(&self, field: DeadlineField) -> Option<Timestamp> {
        match field {
            DeadlineField::EvaluationSetup => self.evaluation_setup_deadline,
            DeadlineField::Performance => self.performance_deadline,
            DeadlineField::SelfEvaluation => self.self_evaluation_deadline,
            DeadlineField::PeerEvaluation => self.peer_evaluation_deadline,
        }
    }

    /// The full deadline chain in order, for generic validation.
    pub fn deadline_chain(&self) -> Vec<(DeadlineField, Option<Timestamp>)> {
        DEADLINE_ORDER
            .iter()
            .map(|f| (*f, self.deadline(*f)))
            .collect()
    }
}

/// DTO for creating a new evaluation period.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePeriod {
    pub name: String,
    pub starts_on: NaiveDate,
    pub evaluation_setup_deadline: Option<Timestamp>,
    pub performance_deadline: Option<Timestamp>,
    pub self_evaluation_deadline: Option<Timestamp>,
    pub peer_evaluation_deadline: Option<Timestamp>,
}
