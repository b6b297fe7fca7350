//! Evaluation period phases, period lifecycle status, and the
//! deadline-chain rules that govern automatic phase advancement.
//!
//! This module lives in `core` (zero internal deps) so it can be used by
//! both the repository layer and the workflow engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// The phase a period is currently in.
///
/// Phases only ever move forward through the order below; there is no
/// transition back. `Closure` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPhase {
    EvaluationSetup,
    Performance,
    SelfEvaluation,
    PeerEvaluation,
    Closure,
}

/// All phases in workflow order.
pub const PHASE_ORDER: &[EvaluationPhase] = &[
    EvaluationPhase::EvaluationSetup,
    EvaluationPhase::Performance,
    EvaluationPhase::SelfEvaluation,
    EvaluationPhase::PeerEvaluation,
    EvaluationPhase::Closure,
];

impl EvaluationPhase {
    /// The phase that follows this one, or `None` for `Closure`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::EvaluationSetup => Some(Self::Performance),
            Self::Performance => Some(Self::SelfEvaluation),
            Self::SelfEvaluation => Some(Self::PeerEvaluation),
            Self::PeerEvaluation => Some(Self::Closure),
            Self::Closure => None,
        }
    }

    /// The deadline field whose expiry ends this phase, or `None` for
    /// `Closure`, which never auto-advances.
    pub fn governing_deadline(self) -> Option<DeadlineField> {
        match self {
            Self::EvaluationSetup => Some(DeadlineField::EvaluationSetup),
            Self::Performance => Some(DeadlineField::Performance),
            Self::SelfEvaluation => Some(DeadlineField::SelfEvaluation),
            Self::PeerEvaluation => Some(DeadlineField::PeerEvaluation),
            Self::Closure => None,
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EvaluationSetup => "evaluation_setup",
            Self::Performance => "performance",
            Self::SelfEvaluation => "self_evaluation",
            Self::PeerEvaluation => "peer_evaluation",
            Self::Closure => "closure",
        }
    }

    /// Parse from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "evaluation_setup" => Ok(Self::EvaluationSetup),
            "performance" => Ok(Self::Performance),
            "self_evaluation" => Ok(Self::SelfEvaluation),
            "peer_evaluation" => Ok(Self::PeerEvaluation),
            "closure" => Ok(Self::Closure),
            _ => Err(CoreError::Validation(format!(
                "Invalid evaluation phase '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Period lifecycle status
// ---------------------------------------------------------------------------

/// Lifecycle status of an evaluation period.
///
/// Only `InProgress` periods are considered by the phase scheduler. A
/// `Completed` period rejects all deadline and phase mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Waiting,
    InProgress,
    Completed,
}

impl PeriodStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid period status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Deadline fields
// ---------------------------------------------------------------------------

/// One of the four per-phase deadline columns on an evaluation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineField {
    EvaluationSetup,
    Performance,
    SelfEvaluation,
    PeerEvaluation,
}

/// All deadline fields in chain order.
pub const DEADLINE_ORDER: &[DeadlineField] = &[
    DeadlineField::EvaluationSetup,
    DeadlineField::Performance,
    DeadlineField::SelfEvaluation,
    DeadlineField::PeerEvaluation,
];

impl DeadlineField {
    /// Human-readable label used in chain-validation error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::EvaluationSetup => "evaluation_setup_deadline",
            Self::Performance => "performance_deadline",
            Self::SelfEvaluation => "self_evaluation_deadline",
            Self::PeerEvaluation => "peer_evaluation_deadline",
        }
    }

    /// The database column holding this deadline.
    pub fn column(self) -> &'static str {
        // Column names match the labels one-for-one.
        self.label()
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "evaluation_setup_deadline" => Ok(Self::EvaluationSetup),
            "performance_deadline" => Ok(Self::Performance),
            "self_evaluation_deadline" => Ok(Self::SelfEvaluation),
            "peer_evaluation_deadline" => Ok(Self::PeerEvaluation),
            _ => Err(CoreError::Validation(format!(
                "Invalid deadline field '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Deadline chain validation
// ---------------------------------------------------------------------------

/// Validate that configured deadlines form a strictly increasing chain.
///
/// The chain is `starts_on < evaluation_setup < performance <
/// self_evaluation < peer_evaluation`, where unset deadlines are skipped:
/// each configured deadline must be strictly after the closest configured
/// entry before it (falling back to the period start date). The chain is
/// expressed as an ordered list so adding a phase later is a one-line
/// change.
///
/// Returns a [`CoreError::Validation`] naming the offending adjacent pair.
pub fn validate_deadline_chain(
    starts_on: NaiveDate,
    deadlines: &[(DeadlineField, Option<Timestamp>)],
) -> Result<(), CoreError> {
    let start = starts_on
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CoreError::Internal("Invalid period start date".into()))?;

    let mut prev_label = "starts_on";
    let mut prev_value = start;

    for (field, value) in deadlines {
        let Some(value) = value else { continue };
        if *value <= prev_value {
            return Err(CoreError::Validation(format!(
                "Deadline chain violated: {} must be strictly after {}",
                field.label(),
                prev_label
            )));
        }
        prev_label = field.label();
        prev_value = *value;
    }

    Ok(())
}
