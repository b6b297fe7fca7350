//! Phase scheduling: deadline-driven auto-advancement plus the manual
//! phase and deadline operations.
//!
//! A period advances out of its current phase when that phase's governing
//! deadline is configured and has elapsed. A phase with no configured
//! deadline never auto-advances; the period freezes there until a manual
//! override. Advancement is idempotent: re-running with no elapsed time
//! is a no-op.

use sqlx::PgPool;

use evalcycle_core::error::CoreError;
use evalcycle_core::phase::{validate_deadline_chain, DeadlineField, EvaluationPhase, PeriodStatus};
use evalcycle_core::types::{DbId, Timestamp};
use evalcycle_db::models::period::EvaluationPeriod;
use evalcycle_db::repositories::PeriodRepo;

use crate::error::{WorkflowError, WorkflowResult};

/// Compute the phase a period should be in at `now`, walking forward from
/// its current phase while governing deadlines have elapsed.
fn due_phase(period: &EvaluationPeriod, now: Timestamp) -> Result<EvaluationPhase, CoreError> {
    let mut phase = period.phase()?;
    while let Some(field) = phase.governing_deadline() {
        match period.deadline(field) {
            Some(deadline) if deadline <= now => {
                // governing_deadline() is None only for Closure, so
                // next() is always present here.
                match phase.next() {
                    Some(next) => phase = next,
                    None => break,
                }
            }
            _ => break,
        }
    }
    Ok(phase)
}

/// Advance every in-progress period whose deadlines have elapsed.
///
/// Returns the number of periods that transitioned. Safe to invoke
/// concurrently or repeatedly; each period is a single-row UPDATE and
/// distinct periods never block on one another.
pub async fn advance_due_periods(pool: &PgPool, now: Timestamp) -> WorkflowResult<u64> {
    let periods = PeriodRepo::list_in_progress(pool).await?;

    let mut transitioned = 0u64;
    for period in periods {
        let current = period.phase()?;
        let target = due_phase(&period, now)?;
        if target == current {
            continue;
        }

        // Compare-and-set against the phase we computed from, so a
        // concurrent invocation advancing the same period counts it only
        // once.
        let result = sqlx::query(
            "UPDATE evaluation_periods SET current_phase = $2 \
             WHERE id = $1 AND current_phase = $3 AND status = 'in_progress'",
        )
        .bind(period.id)
        .bind(target.as_str())
        .bind(current.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            transitioned += 1;
            tracing::info!(
                period_id = period.id,
                from = current.as_str(),
                to = target.as_str(),
                "Period phase advanced on deadline"
            );
        }
    }

    Ok(transitioned)
}

/// Load a period or fail with a not-found error.
async fn load_period(pool: &PgPool, period_id: DbId) -> WorkflowResult<EvaluationPeriod> {
    PeriodRepo::find_by_id(pool, period_id)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "EvaluationPeriod",
                id: period_id,
            })
        })
}

/// Reject mutations on completed periods.
fn ensure_mutable(period: &EvaluationPeriod) -> WorkflowResult<()> {
    if period.lifecycle()? == PeriodStatus::Completed {
        return Err(WorkflowError::Core(CoreError::Conflict(format!(
            "Period {} is completed and can no longer be modified",
            period.id
        ))));
    }
    Ok(())
}

/// Administrative phase override: moves a period to `target` with no
/// deadline check. Phases still only move forward, and a completed
/// period rejects the change.
pub async fn change_phase(
    pool: &PgPool,
    period_id: DbId,
    target: EvaluationPhase,
) -> WorkflowResult<EvaluationPeriod> {
    let period = load_period(pool, period_id).await?;
    ensure_mutable(&period)?;

    let current = period.phase()?;
    if target <= current {
        return Err(WorkflowError::Core(CoreError::Validation(format!(
            "Phase may only move forward: {} -> {} is not allowed",
            current.as_str(),
            target.as_str()
        ))));
    }

    let updated = PeriodRepo::update_phase(pool, period_id, target)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "EvaluationPeriod",
                id: period_id,
            })
        })?;

    tracing::info!(
        period_id,
        from = current.as_str(),
        to = target.as_str(),
        "Period phase changed manually"
    );
    Ok(updated)
}

/// Set or clear one of a period's phase deadlines.
///
/// The resulting chain `starts_on < setup < performance < self < peer`
/// must stay strictly increasing across configured values; a violation
/// fails with a validation error naming the offending adjacent pair.
pub async fn set_deadline(
    pool: &PgPool,
    period_id: DbId,
    field: DeadlineField,
    value: Option<Timestamp>,
) -> WorkflowResult<EvaluationPeriod> {
    let period = load_period(pool, period_id).await?;
    ensure_mutable(&period)?;

    // Substitute the candidate value into the chain before validating.
    let mut chain = period.deadline_chain();
    for entry in chain.iter_mut().filter(|(f, _)| *f == field) {
        entry.1 = value;
    }
    validate_deadline_chain(period.starts_on, &chain)?;

    let updated = PeriodRepo::update_deadline(pool, period_id, field, value)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "EvaluationPeriod",
                id: period_id,
            })
        })?;

    tracing::info!(
        period_id,
        field = field.label(),
        value = ?value,
        "Period deadline updated"
    );
    Ok(updated)
}
