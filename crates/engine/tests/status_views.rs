//! Integration tests for the read-side status aggregator: vocabulary
//! boundaries, approval overlays, and the evaluator worklist view.

mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;

use common::{
    enroll, seed_line, seed_period, seed_wbs, EMPLOYEE, MANAGER, PRIMARY, SECONDARY_A, SECONDARY_B,
};
use evalcycle_core::error::CoreError;
use evalcycle_core::status::{ApprovalAwareStatus, OwnerStatus};
use evalcycle_core::step::{ApprovalStatus, ApprovalStep};
use evalcycle_db::repositories::FactsRepo;
use evalcycle_engine::error::WorkflowError;
use evalcycle_engine::status::{employee_period_status, evaluator_targets_status};
use evalcycle_engine::approval;

#[sqlx::test(migrations = "../../migrations")]
async fn empty_enrollment_reports_none_everywhere(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();

    assert_eq!(view.criteria_setup.status, OwnerStatus::None);
    assert_eq!(view.wbs_criteria.status, ApprovalAwareStatus::None);
    assert_eq!(view.performance_input.status, OwnerStatus::None);
    assert_eq!(view.self_evaluation.status, ApprovalAwareStatus::None);
    assert_eq!(view.primary_evaluation.status, ApprovalAwareStatus::None);
    assert!(view.secondary_evaluations.is_empty());
    assert_eq!(view.secondary_aggregate, ApprovalAwareStatus::None);
    assert_eq!(view.peer_evaluation.status, OwnerStatus::None);
    assert!(!view.evaluation_line.has_primary);
    assert!(!view.final_evaluation.graded);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rerecorded_performance_input_counts_the_item_once(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    let items = seed_wbs(&pool, period.id, 1).await;

    // The second recording replaces the first instead of adding a row.
    FactsRepo::record_performance_input(&pool, items[0], EMPLOYEE, Some("Draft"))
        .await
        .unwrap();
    FactsRepo::record_performance_input(&pool, items[0], EMPLOYEE, Some("Final write-up"))
        .await
        .unwrap();

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.performance_input.assigned, 1);
    assert_eq!(view.performance_input.completed, 1);
    assert_eq!(view.performance_input.status, OwnerStatus::Complete);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unenrolled_employee_reports_not_found(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;

    let err = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn criteria_setup_counts_items_per_project(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;

    // One project broken out, one not.
    seed_wbs(&pool, period.id, 2).await;
    FactsRepo::create_project_assignment(&pool, period.id, EMPLOYEE, "Tooling")
        .await
        .unwrap();

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.criteria_setup.assigned, 2);
    assert_eq!(view.criteria_setup.completed, 1);
    assert_eq!(view.criteria_setup.status, OwnerStatus::InProgress);
}

#[sqlx::test(migrations = "../../migrations")]
async fn wbs_criteria_resolve_through_the_criteria_slot(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    seed_line(&pool, period.id).await;
    let items = seed_wbs(&pool, period.id, 2).await;

    // Assigned but nothing recorded yet: none.
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.wbs_criteria.assigned, 2);
    assert_eq!(view.wbs_criteria.status, ApprovalAwareStatus::None);

    // First record flips to in_progress even with zero completions left.
    FactsRepo::create_wbs_criterion(&pool, items[0], "Ship the migration")
        .await
        .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.wbs_criteria.status, ApprovalAwareStatus::InProgress);

    // All items covered but no approval decision: pending.
    FactsRepo::create_wbs_criterion(&pool, items[1], "Cut support tickets")
        .await
        .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.wbs_criteria.status, ApprovalAwareStatus::Pending);

    // The approval slot overlays the completed counts.
    approval::set_step_status(
        &pool,
        period.id,
        EMPLOYEE,
        ApprovalStep::Criteria,
        ApprovalStatus::Approved,
        MANAGER,
        None,
    )
    .await
    .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.wbs_criteria.status, ApprovalAwareStatus::Approved);
}

#[sqlx::test(migrations = "../../migrations")]
async fn self_evaluation_exposes_submission_flags(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    let items = seed_wbs(&pool, period.id, 2).await;

    FactsRepo::record_self_evaluation(&pool, period.id, EMPLOYEE, items[0], Some(4), true, false)
        .await
        .unwrap();

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.self_evaluation.assigned, 2);
    assert_eq!(view.self_evaluation.completed, 1);
    assert_eq!(view.self_evaluation.status, ApprovalAwareStatus::InProgress);
    // One of two items submitted: not all-submitted yet.
    assert!(!view.self_evaluation.submitted_to_evaluator);
    assert!(!view.self_evaluation.submitted_to_manager);

    FactsRepo::record_self_evaluation(&pool, period.id, EMPLOYEE, items[1], Some(5), true, false)
        .await
        .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.self_evaluation.status, ApprovalAwareStatus::Pending);
    assert!(view.self_evaluation.submitted_to_evaluator);
    assert!(!view.self_evaluation.submitted_to_manager);
}

#[sqlx::test(migrations = "../../migrations")]
async fn secondary_views_are_per_evaluator_with_derived_aggregate(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    seed_line(&pool, period.id).await;
    let items = seed_wbs(&pool, period.id, 1).await;

    // Evaluator A has scored; B has not.
    FactsRepo::record_downward_evaluation(
        &pool,
        period.id,
        EMPLOYEE,
        SECONDARY_A,
        "secondary",
        items[0],
        Some(3),
    )
    .await
    .unwrap();
    approval::set_secondary_evaluator_status(
        &pool,
        period.id,
        EMPLOYEE,
        SECONDARY_A,
        ApprovalStatus::Approved,
        MANAGER,
        None,
    )
    .await
    .unwrap();

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(view.secondary_evaluations.len(), 2);

    let a = view
        .secondary_evaluations
        .iter()
        .find(|s| s.evaluator_id == SECONDARY_A)
        .unwrap();
    assert_eq!(a.status, ApprovalAwareStatus::Approved);

    let b = view
        .secondary_evaluations
        .iter()
        .find(|s| s.evaluator_id == SECONDARY_B)
        .unwrap();
    assert_eq!(b.status, ApprovalAwareStatus::None);

    // Aggregate waits on B.
    assert_eq!(view.secondary_aggregate, ApprovalAwareStatus::Pending);
}

#[sqlx::test(migrations = "../../migrations")]
async fn revision_requested_dominates_the_aggregate(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    seed_line(&pool, period.id).await;

    approval::set_secondary_evaluator_status(
        &pool,
        period.id,
        EMPLOYEE,
        SECONDARY_A,
        ApprovalStatus::Approved,
        MANAGER,
        None,
    )
    .await
    .unwrap();
    approval::set_secondary_evaluator_status(
        &pool,
        period.id,
        EMPLOYEE,
        SECONDARY_B,
        ApprovalStatus::RevisionRequested,
        MANAGER,
        Some("Rescore against the rubric"),
    )
    .await
    .unwrap();

    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert_eq!(
        view.secondary_aggregate,
        ApprovalAwareStatus::RevisionRequested
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn final_evaluation_flags_track_grade_and_confirmation(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;

    FactsRepo::upsert_final_evaluation(&pool, period.id, EMPLOYEE, Some("A"))
        .await
        .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert!(view.final_evaluation.graded);
    assert!(!view.final_evaluation.confirmed);

    FactsRepo::confirm_final_evaluation(&pool, period.id, EMPLOYEE, MANAGER)
        .await
        .unwrap()
        .unwrap();
    let view = employee_period_status(&pool, period.id, EMPLOYEE)
        .await
        .unwrap();
    assert!(view.final_evaluation.confirmed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn evaluator_worklist_uses_completion_vocabulary(pool: PgPool) {
    let period = seed_period(&pool, [None, None, None, None]).await;
    enroll(&pool, period.id).await;
    seed_line(&pool, period.id).await;
    let items = seed_wbs(&pool, period.id, 2).await;

    // The primary evaluator has scored one of two items.
    FactsRepo::record_downward_evaluation(
        &pool,
        period.id,
        EMPLOYEE,
        PRIMARY,
        "primary",
        items[0],
        Some(4),
    )
    .await
    .unwrap();

    let targets = evaluator_targets_status(&pool, period.id, PRIMARY)
        .await
        .unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].employee_id, EMPLOYEE);
    assert_eq!(targets[0].evaluator_role, "primary");
    assert_eq!(targets[0].assigned, 2);
    assert_eq!(targets[0].completed, 1);
    assert_eq!(targets[0].status, OwnerStatus::InProgress);

    // A secondary evaluator with nothing scored sits at in_progress once
    // items exist, none before.
    let targets = evaluator_targets_status(&pool, period.id, SECONDARY_A)
        .await
        .unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].evaluator_role, "secondary");
    assert_eq!(targets[0].status, OwnerStatus::InProgress);

    // No assignments at all: empty worklist.
    let targets = evaluator_targets_status(&pool, period.id, 555)
        .await
        .unwrap();
    assert!(targets.is_empty());
}
