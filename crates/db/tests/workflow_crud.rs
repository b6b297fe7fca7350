//! Integration tests for the repository layer:
//! - Period CRUD and deadline columns
//! - Enrollment with its default approval state bundle
//! - Unique constraint violations
//! - Revision recipient read/complete idempotence

use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use evalcycle_core::phase::{DeadlineField, EvaluationPhase, PeriodStatus};
use evalcycle_core::step::{ApprovalStatus, ApprovalStep};
use evalcycle_core::types::Timestamp;
use evalcycle_db::models::facts::CreateEvaluationLine;
use evalcycle_db::models::mapping::CreateMapping;
use evalcycle_db::models::period::CreatePeriod;
use evalcycle_db::models::revision::CreateRevisionRequest;
use evalcycle_db::repositories::{
    ApprovalStateRepo, FactsRepo, MappingRepo, PeriodRepo, RevisionRepo,
};

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn new_period(name: &str) -> CreatePeriod {
    CreatePeriod {
        name: name.to_string(),
        starts_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        evaluation_setup_deadline: Some(ts(2026, 2, 1)),
        performance_deadline: None,
        self_evaluation_deadline: None,
        peer_evaluation_deadline: None,
    }
}

fn new_mapping(period_id: i64, employee_id: i64) -> CreateMapping {
    CreateMapping {
        period_id,
        employee_id,
        is_excluded: None,
        exclusion_reason: None,
    }
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_period_create_and_find(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("2026 H1")).await.unwrap();
    assert_eq!(period.name, "2026 H1");
    assert_eq!(period.phase().unwrap(), EvaluationPhase::EvaluationSetup);
    assert_eq!(period.lifecycle().unwrap(), PeriodStatus::Waiting);
    assert_eq!(period.evaluation_setup_deadline, Some(ts(2026, 2, 1)));

    let found = PeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
    assert_eq!(found.id, period.id);

    assert!(PeriodRepo::find_by_id(&pool, 9999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_in_progress_filters_by_status(pool: PgPool) {
    let waiting = PeriodRepo::create(&pool, &new_period("Waiting")).await.unwrap();
    let active = PeriodRepo::create(&pool, &new_period("Active")).await.unwrap();
    PeriodRepo::update_status(&pool, active.id, PeriodStatus::InProgress)
        .await
        .unwrap();

    let listed = PeriodRepo::list_in_progress(&pool).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, active.id);
    assert_ne!(listed[0].id, waiting.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_deadline_column(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("Deadlines")).await.unwrap();

    let updated =
        PeriodRepo::update_deadline(&pool, period.id, DeadlineField::Performance, Some(ts(2026, 3, 1)))
            .await
            .unwrap()
            .unwrap();
    assert_eq!(updated.performance_deadline, Some(ts(2026, 3, 1)));

    let cleared =
        PeriodRepo::update_deadline(&pool, period.id, DeadlineField::Performance, None)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(cleared.performance_deadline, None);
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_enrollment_seeds_approval_state_bundle(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("Enroll")).await.unwrap();
    let mapping = MappingRepo::create(&pool, &new_mapping(period.id, 42)).await.unwrap();
    assert_eq!(mapping.employee_id, 42);
    assert!(!mapping.is_excluded);

    let state = ApprovalStateRepo::find_by_mapping(&pool, mapping.id)
        .await
        .unwrap()
        .unwrap();
    for step in [
        ApprovalStep::Criteria,
        ApprovalStep::SelfEvaluation,
        ApprovalStep::Primary,
        ApprovalStep::Secondary,
    ] {
        assert_eq!(state.slot_status(step).unwrap(), ApprovalStatus::Pending);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_enrollment_rejected(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("Dup")).await.unwrap();
    MappingRepo::create(&pool, &new_mapping(period.id, 42)).await.unwrap();

    let err = MappingRepo::create(&pool, &new_mapping(period.id, 42))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("expected database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_exclusion_toggle(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("Exclude")).await.unwrap();
    let mapping = MappingRepo::create(&pool, &new_mapping(period.id, 42)).await.unwrap();

    let excluded = MappingRepo::set_exclusion(&pool, mapping.id, true, Some("On leave"))
        .await
        .unwrap()
        .unwrap();
    assert!(excluded.is_excluded);
    assert_eq!(excluded.exclusion_reason.as_deref(), Some("On leave"));

    let restored = MappingRepo::set_exclusion(&pool, mapping.id, false, None)
        .await
        .unwrap()
        .unwrap();
    assert!(!restored.is_excluded);
    assert_eq!(restored.exclusion_reason, None);
}

// ---------------------------------------------------------------------------
// Evaluation lines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_line_with_secondaries(pool: PgPool) {
    let period = PeriodRepo::create(&pool, &new_period("Lines")).await.unwrap();
    let line = FactsRepo::create_line(
        &pool,
        &CreateEvaluationLine {
            period_id: period.id,
            employee_id: 42,
            primary_evaluator_id: Some(7),
            secondary_evaluator_ids: vec![8, 9],
        },
    )
    .await
    .unwrap();
    assert_eq!(line.primary_evaluator_id, Some(7));

    let secondaries = FactsRepo::secondary_evaluator_ids(&pool, line.id).await.unwrap();
    assert_eq!(secondaries, vec![8, 9]);

    let found = FactsRepo::find_line(&pool, period.id, 42).await.unwrap().unwrap();
    assert_eq!(found.id, line.id);
}

// ---------------------------------------------------------------------------
// Revision recipients
// ---------------------------------------------------------------------------

async fn seed_recipient(pool: &PgPool) -> i64 {
    let period = PeriodRepo::create(pool, &new_period("Revisions")).await.unwrap();
    let request = RevisionRepo::create(
        pool,
        &CreateRevisionRequest {
            period_id: period.id,
            employee_id: 42,
            step: "criteria".to_string(),
            comment: "Tighten the targets".to_string(),
            requested_by: 7,
            recipient_id: 42,
            recipient_type: "evaluatee".to_string(),
        },
    )
    .await
    .unwrap();
    let recipients = RevisionRepo::list_recipients_for_request(pool, request.id)
        .await
        .unwrap();
    recipients[0].id
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_mark_read_is_idempotent(pool: PgPool) {
    let recipient_id = seed_recipient(&pool).await;

    let first = RevisionRepo::mark_read(&pool, recipient_id).await.unwrap().unwrap();
    assert!(first.is_read);
    let first_read_at = first.read_at.unwrap();

    let second = RevisionRepo::mark_read(&pool, recipient_id).await.unwrap().unwrap();
    assert_eq!(second.read_at, Some(first_read_at));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_complete_implies_read_and_keeps_comment(pool: PgPool) {
    let recipient_id = seed_recipient(&pool).await;

    let done = RevisionRepo::complete(&pool, recipient_id, Some("Targets revised"))
        .await
        .unwrap()
        .unwrap();
    assert!(done.is_completed);
    assert!(done.is_read);
    assert_eq!(done.response_comment.as_deref(), Some("Targets revised"));

    // A later completion without a comment keeps the original.
    let again = RevisionRepo::complete(&pool, recipient_id, None).await.unwrap().unwrap();
    assert_eq!(again.response_comment.as_deref(), Some("Targets revised"));
}
