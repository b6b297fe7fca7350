//! Shared fixtures for the workflow engine integration tests.

use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use evalcycle_core::phase::PeriodStatus;
use evalcycle_core::types::{DbId, Timestamp};
use evalcycle_db::models::facts::CreateEvaluationLine;
use evalcycle_db::models::mapping::CreateMapping;
use evalcycle_db::models::period::{CreatePeriod, EvaluationPeriod};
use evalcycle_db::repositories::{FactsRepo, MappingRepo, PeriodRepo};

pub const EMPLOYEE: DbId = 100;
pub const PRIMARY: DbId = 200;
pub const SECONDARY_A: DbId = 300;
pub const SECONDARY_B: DbId = 301;
pub const MANAGER: DbId = 900;

pub fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create an in-progress period starting 2026-01-01 with the given
/// deadline chain.
pub async fn seed_period(pool: &PgPool, deadlines: [Option<Timestamp>; 4]) -> EvaluationPeriod {
    let period = PeriodRepo::create(
        pool,
        &CreatePeriod {
            name: "2026 H1".to_string(),
            starts_on: date(2026, 1, 1),
            evaluation_setup_deadline: deadlines[0],
            performance_deadline: deadlines[1],
            self_evaluation_deadline: deadlines[2],
            peer_evaluation_deadline: deadlines[3],
        },
    )
    .await
    .unwrap();
    PeriodRepo::update_status(pool, period.id, PeriodStatus::InProgress)
        .await
        .unwrap()
        .unwrap()
}

/// Enroll EMPLOYEE into the period and return the mapping id.
pub async fn enroll(pool: &PgPool, period_id: DbId) -> DbId {
    MappingRepo::create(
        pool,
        &CreateMapping {
            period_id,
            employee_id: EMPLOYEE,
            is_excluded: None,
            exclusion_reason: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Staff the evaluation line: PRIMARY plus both secondary evaluators.
pub async fn seed_line(pool: &PgPool, period_id: DbId) -> DbId {
    FactsRepo::create_line(
        pool,
        &CreateEvaluationLine {
            period_id,
            employee_id: EMPLOYEE,
            primary_evaluator_id: Some(PRIMARY),
            secondary_evaluator_ids: vec![SECONDARY_A, SECONDARY_B],
        },
    )
    .await
    .unwrap()
    .id
}

/// A project assignment with `items` WBS items, returning the item ids.
pub async fn seed_wbs(pool: &PgPool, period_id: DbId, items: usize) -> Vec<DbId> {
    let assignment = FactsRepo::create_project_assignment(pool, period_id, EMPLOYEE, "Platform")
        .await
        .unwrap();
    let mut ids = Vec::with_capacity(items);
    for i in 0..items {
        let id = FactsRepo::create_wbs_item(pool, assignment, &format!("Item {i}"))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}
