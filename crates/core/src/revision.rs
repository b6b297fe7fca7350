//! Recipient resolution for revision fan-out.
//!
//! When a step is sent back for revision, one request is created per
//! intended recipient. The recipient set depends on the step:
//!
//! | step            | recipients                                   |
//! |-----------------|----------------------------------------------|
//! | criteria, self  | the evaluatee and the primary evaluator      |
//! | primary         | the primary evaluator only                   |
//! | secondary       | every currently-assigned secondary evaluator |
//!
//! When two roles resolve to the same person (the evaluatee may also be
//! the primary evaluator) the set collapses to a single recipient with
//! `RecipientType::Evaluatee`, so nobody is notified twice for one
//! directive.

use serde::Serialize;

use crate::step::{ApprovalStep, RecipientType};
use crate::types::DbId;

/// One resolved revision-request recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub recipient_id: DbId,
    pub recipient_type: RecipientType,
}

/// Resolve the step-wide recipient set for a revision request.
///
/// `primary_evaluator` may be absent when no evaluation line is configured
/// yet; the corresponding recipient is simply skipped. Duplicate secondary
/// evaluator ids collapse to one recipient.
pub fn resolve_recipients(
    step: ApprovalStep,
    evaluatee: DbId,
    primary_evaluator: Option<DbId>,
    secondary_evaluators: &[DbId],
) -> Vec<Recipient> {
    let mut recipients: Vec<Recipient> = Vec::new();

    let mut push = |id: DbId, recipient_type: RecipientType| {
        if !recipients.iter().any(|r| r.recipient_id == id) {
            recipients.push(Recipient {
                recipient_id: id,
                recipient_type,
            });
        }
    };

    match step {
        ApprovalStep::Criteria | ApprovalStep::SelfEvaluation => {
            // Evaluatee first: when the primary evaluator is the same
            // person, the evaluatee role wins the dedup.
            push(evaluatee, RecipientType::Evaluatee);
            if let Some(primary) = primary_evaluator {
                push(primary, RecipientType::PrimaryEvaluator);
            }
        }
        ApprovalStep::Primary => {
            if let Some(primary) = primary_evaluator {
                push(primary, RecipientType::PrimaryEvaluator);
            }
        }
        ApprovalStep::Secondary => {
            for evaluator in secondary_evaluators {
                push(*evaluator, RecipientType::SecondaryEvaluator);
            }
        }
    }

    recipients
}

/// Recipient set for the per-evaluator secondary operation: exactly the
/// named evaluator.
pub fn resolve_single_secondary(evaluator_id: DbId) -> Vec<Recipient> {
    vec![Recipient {
        recipient_id: evaluator_id,
        recipient_type: RecipientType::SecondaryEvaluator,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_targets_evaluatee_and_primary() {
        let r = resolve_recipients(ApprovalStep::Criteria, 10, Some(20), &[]);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].recipient_id, 10);
        assert_eq!(r[0].recipient_type, RecipientType::Evaluatee);
        assert_eq!(r[1].recipient_id, 20);
        assert_eq!(r[1].recipient_type, RecipientType::PrimaryEvaluator);
    }

    #[test]
    fn self_step_mirrors_criteria() {
        let r = resolve_recipients(ApprovalStep::SelfEvaluation, 10, Some(20), &[]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn evaluatee_doubling_as_primary_collapses_to_one() {
        let r = resolve_recipients(ApprovalStep::Criteria, 10, Some(10), &[]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].recipient_type, RecipientType::Evaluatee);
    }

    #[test]
    fn criteria_without_primary_still_reaches_evaluatee() {
        let r = resolve_recipients(ApprovalStep::Criteria, 10, None, &[]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].recipient_type, RecipientType::Evaluatee);
    }

    #[test]
    fn primary_step_targets_primary_only() {
        let r = resolve_recipients(ApprovalStep::Primary, 10, Some(20), &[30]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].recipient_id, 20);
        assert_eq!(r[0].recipient_type, RecipientType::PrimaryEvaluator);
    }

    #[test]
    fn secondary_step_fans_out_to_all_assigned() {
        let r = resolve_recipients(ApprovalStep::Secondary, 10, Some(20), &[30, 40, 50]);
        assert_eq!(r.len(), 3);
        assert!(r
            .iter()
            .all(|x| x.recipient_type == RecipientType::SecondaryEvaluator));
    }

    #[test]
    fn duplicate_secondary_ids_collapse() {
        let r = resolve_recipients(ApprovalStep::Secondary, 10, None, &[30, 30]);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn single_secondary_path() {
        let r = resolve_single_secondary(42);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].recipient_id, 42);
        assert_eq!(r[0].recipient_type, RecipientType::SecondaryEvaluator);
    }
}
