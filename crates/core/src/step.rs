//! Approvable workflow steps, their approval statuses, and the recipient
//! roles used by revision requests.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the four independently-approvable stages of an employee's
/// evaluation. The four slots on a state bundle are mutually independent:
/// changing one never implies a change to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStep {
    Criteria,
    #[serde(rename = "self")]
    SelfEvaluation,
    Primary,
    Secondary,
}

/// All approvable steps.
pub const STEP_ORDER: &[ApprovalStep] = &[
    ApprovalStep::Criteria,
    ApprovalStep::SelfEvaluation,
    ApprovalStep::Primary,
    ApprovalStep::Secondary,
];

impl ApprovalStep {
    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Criteria => "criteria",
            Self::SelfEvaluation => "self",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    /// Prefix of the slot columns on `step_approval_states`.
    pub fn column_prefix(self) -> &'static str {
        match self {
            Self::Criteria => "criteria",
            Self::SelfEvaluation => "self",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "criteria" => Ok(Self::Criteria),
            "self" => Ok(Self::SelfEvaluation),
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            _ => Err(CoreError::Validation(format!("Invalid step '{s}'"))),
        }
    }
}

/// Approval status of a single step slot (or of a single secondary
/// evaluator's row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    RevisionRequested,
    RevisionCompleted,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::RevisionRequested => "revision_requested",
            Self::RevisionCompleted => "revision_completed",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "revision_requested" => Ok(Self::RevisionRequested),
            "revision_completed" => Ok(Self::RevisionCompleted),
            _ => Err(CoreError::Validation(format!(
                "Invalid approval status '{s}'"
            ))),
        }
    }
}

/// Role under which a person receives a revision request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    Evaluatee,
    PrimaryEvaluator,
    SecondaryEvaluator,
}

impl RecipientType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Evaluatee => "evaluatee",
            Self::PrimaryEvaluator => "primary_evaluator",
            Self::SecondaryEvaluator => "secondary_evaluator",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "evaluatee" => Ok(Self::Evaluatee),
            "primary_evaluator" => Ok(Self::PrimaryEvaluator),
            "secondary_evaluator" => Ok(Self::SecondaryEvaluator),
            _ => Err(CoreError::Validation(format!(
                "Invalid recipient type '{s}'"
            ))),
        }
    }
}

/// Validate the comment rule for a status transition: requesting a
/// revision without a comment is rejected. Returns the trimmed comment
/// when one is required and present.
pub fn require_revision_comment<'a>(
    status: ApprovalStatus,
    comment: Option<&'a str>,
) -> Result<Option<&'a str>, CoreError> {
    if status != ApprovalStatus::RevisionRequested {
        return Ok(comment);
    }
    match comment.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(Some(c)),
        _ => Err(CoreError::Validation(
            "A comment is required when requesting a revision".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn step_string_round_trip() {
        for step in STEP_ORDER {
            assert_eq!(ApprovalStep::from_str_value(step.as_str()).unwrap(), *step);
        }
    }

    #[test]
    fn self_step_serializes_as_short_name() {
        assert_eq!(ApprovalStep::SelfEvaluation.as_str(), "self");
    }

    #[test]
    fn unknown_step_rejected() {
        assert!(ApprovalStep::from_str_value("peer").is_err());
    }

    #[test]
    fn status_string_round_trip() {
        for s in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::RevisionRequested,
            ApprovalStatus::RevisionCompleted,
        ] {
            assert_eq!(ApprovalStatus::from_str_value(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn revision_without_comment_fails() {
        let err = require_revision_comment(ApprovalStatus::RevisionRequested, None).unwrap_err();
        assert_matches!(err, crate::error::CoreError::Validation(_));
    }

    #[test]
    fn revision_with_blank_comment_fails() {
        assert!(require_revision_comment(ApprovalStatus::RevisionRequested, Some("  ")).is_err());
    }

    #[test]
    fn revision_with_comment_passes() {
        let c = require_revision_comment(ApprovalStatus::RevisionRequested, Some(" redo "))
            .unwrap();
        assert_eq!(c, Some("redo"));
    }

    #[test]
    fn approve_without_comment_passes() {
        assert!(require_revision_comment(ApprovalStatus::Approved, None).is_ok());
    }
}
