//! Read-side status aggregation.
//!
//! Rebuilt on every query from the fact tables plus approval state; this
//! module persists nothing. Two projections are produced from the same
//! underlying facts: the approval-aware composite for the administrative
//! dashboard, and the completion-only worklist view for evaluators.

use serde::Serialize;
use sqlx::PgPool;

use evalcycle_core::error::CoreError;
use evalcycle_core::status::{aggregate_secondary, ApprovalAwareStatus, OwnerStatus};
use evalcycle_core::step::{ApprovalStatus, ApprovalStep};
use evalcycle_core::types::DbId;
use evalcycle_db::models::approval::StepApprovalState;
use evalcycle_db::repositories::{ApprovalStateRepo, FactsRepo, MappingRepo};

use crate::error::{WorkflowError, WorkflowResult};

/// Completion counts with an approval-aware status attached.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepProgress {
    pub assigned: i64,
    pub completed: i64,
    pub status: ApprovalAwareStatus,
}

/// Completion counts with a completion-only status attached.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompletionProgress {
    pub assigned: i64,
    pub completed: i64,
    pub status: OwnerStatus,
}

/// Self-evaluation progress: item completion plus the two all-items
/// submission flags.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SelfEvaluationProgress {
    pub assigned: i64,
    pub completed: i64,
    pub status: ApprovalAwareStatus,
    pub submitted_to_evaluator: bool,
    pub submitted_to_manager: bool,
}

/// Evaluation-line completeness: both evaluator roles must be staffed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvaluationLineProgress {
    pub has_primary: bool,
    pub has_secondary: bool,
}

/// One secondary evaluator's approval-aware view.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SecondaryEvaluatorProgress {
    pub evaluator_id: DbId,
    pub assigned: i64,
    pub completed: i64,
    pub status: ApprovalAwareStatus,
}

/// Final-evaluation confirmation state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FinalEvaluationProgress {
    pub graded: bool,
    pub confirmed: bool,
}

/// The composite approval-aware status for one employee in one period,
/// consumed by the administrative dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeePeriodStatus {
    pub period_id: DbId,
    pub employee_id: DbId,
    pub mapping_id: DbId,
    pub is_excluded: bool,
    pub criteria_setup: CompletionProgress,
    pub wbs_criteria: StepProgress,
    pub evaluation_line: EvaluationLineProgress,
    pub performance_input: CompletionProgress,
    pub self_evaluation: SelfEvaluationProgress,
    pub primary_evaluation: StepProgress,
    pub secondary_evaluations: Vec<SecondaryEvaluatorProgress>,
    pub secondary_aggregate: ApprovalAwareStatus,
    pub peer_evaluation: CompletionProgress,
    pub final_evaluation: FinalEvaluationProgress,
}

/// One row of an evaluator's worklist: a target employee with
/// completion-only status.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorTargetStatus {
    pub employee_id: DbId,
    pub evaluator_role: String,
    pub assigned: i64,
    pub completed: i64,
    pub status: OwnerStatus,
}

/// Parsed slot status, or `None` when no state bundle row exists yet
/// (treated as pending by the vocabulary).
fn slot(
    state: Option<&StepApprovalState>,
    step: ApprovalStep,
) -> Result<Option<ApprovalStatus>, CoreError> {
    state.map(|s| s.slot_status(step)).transpose()
}

/// Build the full approval-aware composite for one employee.
pub async fn employee_period_status(
    pool: &PgPool,
    period_id: DbId,
    employee_id: DbId,
) -> WorkflowResult<EmployeePeriodStatus> {
    let mapping = MappingRepo::find_by_period_and_employee(pool, period_id, employee_id)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "PeriodEmployeeMapping",
                id: employee_id,
            })
        })?;

    let state = ApprovalStateRepo::find_by_mapping(pool, mapping.id).await?;

    // Criteria setup: projects broken out into WBS items.
    let criteria = FactsRepo::criteria_setup_counts(pool, period_id, employee_id).await?;
    let criteria_setup = CompletionProgress {
        assigned: criteria.assigned,
        completed: criteria.completed,
        status: OwnerStatus::derive(criteria.assigned, criteria.completed),
    };

    // WBS criteria completeness resolves against the criteria slot.
    let wbs = FactsRepo::wbs_criteria_counts(pool, period_id, employee_id).await?;
    let wbs_criteria = StepProgress {
        assigned: wbs.assigned,
        completed: wbs.completed,
        status: ApprovalAwareStatus::derive(
            wbs.assigned,
            wbs.completed,
            wbs.records > 0,
            slot(state.as_ref(), ApprovalStep::Criteria)?,
        ),
    };

    // Evaluation line staffing.
    let line = FactsRepo::find_line(pool, period_id, employee_id).await?;
    let secondary_ids = match &line {
        Some(line) => FactsRepo::secondary_evaluator_ids(pool, line.id).await?,
        None => Vec::new(),
    };
    let evaluation_line = EvaluationLineProgress {
        has_primary: line
            .as_ref()
            .is_some_and(|l| l.primary_evaluator_id.is_some()),
        has_secondary: !secondary_ids.is_empty(),
    };

    // Performance inputs.
    let perf = FactsRepo::performance_input_counts(pool, period_id, employee_id).await?;
    let performance_input = CompletionProgress {
        assigned: perf.assigned,
        completed: perf.completed,
        status: OwnerStatus::derive(perf.assigned, perf.completed),
    };

    // Self evaluation, with the two all-items submission booleans.
    let selfe = FactsRepo::self_evaluation_facts(pool, period_id, employee_id).await?;
    let self_evaluation = SelfEvaluationProgress {
        assigned: selfe.assigned,
        completed: selfe.completed,
        status: ApprovalAwareStatus::derive(
            selfe.assigned,
            selfe.completed,
            selfe.records > 0,
            slot(state.as_ref(), ApprovalStep::SelfEvaluation)?,
        ),
        submitted_to_evaluator: selfe.all_submitted_to_evaluator,
        submitted_to_manager: selfe.all_submitted_to_manager,
    };

    // Primary (downward) evaluation.
    let primary_evaluator = line.as_ref().and_then(|l| l.primary_evaluator_id);
    let primary_evaluation = match primary_evaluator {
        Some(evaluator_id) => {
            let counts =
                FactsRepo::downward_counts(pool, period_id, employee_id, evaluator_id, "primary")
                    .await?;
            StepProgress {
                assigned: counts.assigned,
                completed: counts.completed,
                status: ApprovalAwareStatus::derive(
                    counts.assigned,
                    counts.completed,
                    counts.records > 0,
                    slot(state.as_ref(), ApprovalStep::Primary)?,
                ),
            }
        }
        None => StepProgress {
            assigned: 0,
            completed: 0,
            status: ApprovalAwareStatus::None,
        },
    };

    // Secondary evaluations: one approval-aware status per assigned
    // evaluator, plus the derived aggregate.
    let secondary_states = ApprovalStateRepo::list_secondary_for_mapping(pool, mapping.id).await?;
    let mut secondary_evaluations = Vec::with_capacity(secondary_ids.len());
    let mut aggregate_inputs = Vec::with_capacity(secondary_ids.len());
    for evaluator_id in &secondary_ids {
        let counts =
            FactsRepo::downward_counts(pool, period_id, employee_id, *evaluator_id, "secondary")
                .await?;
        let approval = secondary_states
            .iter()
            .find(|s| s.evaluator_id == *evaluator_id)
            .map(|s| s.parsed_status())
            .transpose()?;
        aggregate_inputs.push(approval.unwrap_or(ApprovalStatus::Pending));
        secondary_evaluations.push(SecondaryEvaluatorProgress {
            evaluator_id: *evaluator_id,
            assigned: counts.assigned,
            completed: counts.completed,
            status: ApprovalAwareStatus::derive(
                counts.assigned,
                counts.completed,
                counts.records > 0,
                approval,
            ),
        });
    }
    let secondary_aggregate = if secondary_ids.is_empty() {
        ApprovalAwareStatus::None
    } else {
        match aggregate_secondary(&aggregate_inputs) {
            ApprovalStatus::Pending => ApprovalAwareStatus::Pending,
            ApprovalStatus::Approved => ApprovalAwareStatus::Approved,
            ApprovalStatus::RevisionRequested => ApprovalAwareStatus::RevisionRequested,
            ApprovalStatus::RevisionCompleted => ApprovalAwareStatus::RevisionCompleted,
        }
    };

    // Peer evaluation requests.
    let peer = FactsRepo::peer_request_counts(pool, period_id, employee_id).await?;
    let peer_evaluation = CompletionProgress {
        assigned: peer.assigned,
        completed: peer.completed,
        status: OwnerStatus::derive(peer.assigned, peer.completed),
    };

    // Final evaluation confirmation.
    let final_row = FactsRepo::find_final_evaluation(pool, period_id, employee_id).await?;
    let final_evaluation = FinalEvaluationProgress {
        graded: final_row.as_ref().is_some_and(|f| f.grade.is_some()),
        confirmed: final_row.as_ref().is_some_and(|f| f.is_confirmed),
    };

    Ok(EmployeePeriodStatus {
        period_id,
        employee_id,
        mapping_id: mapping.id,
        is_excluded: mapping.is_excluded,
        criteria_setup,
        wbs_criteria,
        evaluation_line,
        performance_input,
        self_evaluation,
        primary_evaluation,
        secondary_evaluations,
        secondary_aggregate,
        peer_evaluation,
        final_evaluation,
    })
}

/// Build an evaluator's worklist: every employee they review in the
/// period, with completion-only status per target. No approval semantics
/// leak into this view.
pub async fn evaluator_targets_status(
    pool: &PgPool,
    period_id: DbId,
    evaluator_id: DbId,
) -> WorkflowResult<Vec<EvaluatorTargetStatus>> {
    let assignments = FactsRepo::evaluator_assignments(pool, period_id, evaluator_id).await?;

    let mut targets = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let counts = FactsRepo::downward_counts(
            pool,
            period_id,
            assignment.employee_id,
            evaluator_id,
            &assignment.evaluator_role,
        )
        .await?;
        targets.push(EvaluatorTargetStatus {
            employee_id: assignment.employee_id,
            evaluator_role: assignment.evaluator_role,
            assigned: counts.assigned,
            completed: counts.completed,
            status: OwnerStatus::derive(counts.assigned, counts.completed),
        });
    }

    Ok(targets)
}
