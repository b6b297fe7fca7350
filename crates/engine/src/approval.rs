//! The step-approval state machine: slot transitions, revision
//! fan-out/fan-in, and the per-evaluator secondary variant.
//!
//! Every mutating operation here is a single transaction: reading
//! current state, validating the transition, writing the new state and
//! appending the fan-out ledger rows are all-or-nothing. The four step
//! slots on a state bundle are mutually independent; the legacy
//! aggregate secondary slot is recomputed from the per-evaluator rows
//! after every mutation and never authored directly.

use sqlx::{PgConnection, PgPool};

use evalcycle_core::error::CoreError;
use evalcycle_core::revision::{resolve_recipients, resolve_single_secondary, Recipient};
use evalcycle_core::status::aggregate_secondary;
use evalcycle_core::step::{require_revision_comment, ApprovalStatus, ApprovalStep};
use evalcycle_core::types::DbId;
use evalcycle_db::models::revision::RevisionRequestRecipient;
use evalcycle_db::repositories::RevisionRepo;

use crate::error::{WorkflowError, WorkflowResult};

/// Mapping id plus the evaluation-line facts needed for fan-out.
struct MappingContext {
    mapping_id: DbId,
    primary_evaluator: Option<DbId>,
    secondary_evaluators: Vec<DbId>,
}

/// Lock the mapping row and load the evaluation line for fan-out
/// resolution. Fails with a not-found error when the employee is not
/// enrolled in the period.
async fn load_mapping_context(
    conn: &mut PgConnection,
    period_id: DbId,
    employee_id: DbId,
) -> WorkflowResult<MappingContext> {
    let mapping: Option<(DbId,)> = sqlx::query_as(
        "SELECT id FROM period_employee_mappings \
         WHERE period_id = $1 AND employee_id = $2 FOR UPDATE",
    )
    .bind(period_id)
    .bind(employee_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((mapping_id,)) = mapping else {
        return Err(WorkflowError::Core(CoreError::NotFound {
            entity: "PeriodEmployeeMapping",
            id: employee_id,
        }));
    };

    let line: Option<(DbId, Option<DbId>)> = sqlx::query_as(
        "SELECT id, primary_evaluator_id FROM evaluation_lines \
         WHERE period_id = $1 AND employee_id = $2",
    )
    .bind(period_id)
    .bind(employee_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (primary_evaluator, secondary_evaluators) = match line {
        Some((line_id, primary)) => {
            let rows: Vec<(DbId,)> = sqlx::query_as(
                "SELECT evaluator_id FROM evaluation_line_secondaries \
                 WHERE line_id = $1 ORDER BY evaluator_id ASC",
            )
            .bind(line_id)
            .fetch_all(&mut *conn)
            .await?;
            (primary, rows.into_iter().map(|(id,)| id).collect())
        }
        None => (None, Vec::new()),
    };

    Ok(MappingContext {
        mapping_id,
        primary_evaluator,
        secondary_evaluators,
    })
}

/// Make sure the state bundle row exists (mappings created before the
/// bundle table was introduced have none yet).
async fn ensure_state_row(conn: &mut PgConnection, mapping_id: DbId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO step_approval_states (mapping_id) VALUES ($1) \
         ON CONFLICT (mapping_id) DO NOTHING",
    )
    .bind(mapping_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Append one ledger request + recipient pair per resolved recipient.
/// Returns the created request ids, in recipient order.
async fn fan_out(
    conn: &mut PgConnection,
    period_id: DbId,
    employee_id: DbId,
    step: ApprovalStep,
    comment: &str,
    requested_by: DbId,
    recipients: &[Recipient],
) -> Result<Vec<DbId>, sqlx::Error> {
    let mut request_ids = Vec::with_capacity(recipients.len());

    for recipient in recipients {
        let (request_id,): (DbId,) = sqlx::query_as(
            "INSERT INTO revision_requests \
                (period_id, employee_id, step, comment, requested_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(step.as_str())
        .bind(comment)
        .bind(requested_by)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO revision_request_recipients \
                (revision_request_id, recipient_id, recipient_type) \
             VALUES ($1, $2, $3)",
        )
        .bind(request_id)
        .bind(recipient.recipient_id)
        .bind(recipient.recipient_type.as_str())
        .execute(&mut *conn)
        .await?;

        request_ids.push(request_id);
    }

    Ok(request_ids)
}

/// Write one step slot. `approved_by`/`approved_at` are populated only
/// for `approved`; the revision linkage is cleared on `approved` and
/// `pending` and replaced on `revision_requested`.
async fn write_slot(
    conn: &mut PgConnection,
    mapping_id: DbId,
    step: ApprovalStep,
    status: ApprovalStatus,
    actor: DbId,
    revision_request_id: Option<DbId>,
) -> Result<(), sqlx::Error> {
    let prefix = step.column_prefix();
    match status {
        ApprovalStatus::Approved => {
            let query = format!(
                "UPDATE step_approval_states SET \
                    {prefix}_status = 'approved', \
                    {prefix}_approved_by = $2, \
                    {prefix}_approved_at = now(), \
                    {prefix}_revision_request_id = NULL \
                 WHERE mapping_id = $1"
            );
            sqlx::query(&query).bind(mapping_id).bind(actor).execute(conn).await?;
        }
        ApprovalStatus::Pending => {
            let query = format!(
                "UPDATE step_approval_states SET \
                    {prefix}_status = 'pending', \
                    {prefix}_approved_by = NULL, \
                    {prefix}_approved_at = NULL, \
                    {prefix}_revision_request_id = NULL \
                 WHERE mapping_id = $1"
            );
            sqlx::query(&query).bind(mapping_id).execute(conn).await?;
        }
        ApprovalStatus::RevisionRequested => {
            let query = format!(
                "UPDATE step_approval_states SET \
                    {prefix}_status = 'revision_requested', \
                    {prefix}_approved_by = NULL, \
                    {prefix}_approved_at = NULL, \
                    {prefix}_revision_request_id = $2 \
                 WHERE mapping_id = $1"
            );
            sqlx::query(&query)
                .bind(mapping_id)
                .bind(revision_request_id)
                .execute(conn)
                .await?;
        }
        // Revision completed: approver fields stay cleared, the ledger
        // linkage is kept for traceability.
        ApprovalStatus::RevisionCompleted => {
            let query = format!(
                "UPDATE step_approval_states SET \
                    {prefix}_status = 'revision_completed', \
                    {prefix}_approved_by = NULL, \
                    {prefix}_approved_at = NULL \
                 WHERE mapping_id = $1"
            );
            sqlx::query(&query).bind(mapping_id).execute(conn).await?;
        }
    }
    Ok(())
}

/// Upsert one secondary evaluator's approval row.
async fn write_secondary_row(
    conn: &mut PgConnection,
    mapping_id: DbId,
    evaluator_id: DbId,
    status: ApprovalStatus,
    actor: DbId,
    revision_request_id: Option<DbId>,
) -> Result<(), sqlx::Error> {
    let (approved_by, linkage) = match status {
        ApprovalStatus::Approved => (Some(actor), None),
        ApprovalStatus::Pending => (None, None),
        ApprovalStatus::RevisionRequested => (None, revision_request_id),
        ApprovalStatus::RevisionCompleted => (None, revision_request_id),
    };

    sqlx::query(
        "INSERT INTO secondary_evaluator_approval_states \
            (mapping_id, evaluator_id, status, approved_by, approved_at, revision_request_id) \
         VALUES ($1, $2, $3, $4, CASE WHEN $3 = 'approved' THEN now() END, $5) \
         ON CONFLICT (mapping_id, evaluator_id) DO UPDATE SET \
            status = EXCLUDED.status, \
            approved_by = EXCLUDED.approved_by, \
            approved_at = EXCLUDED.approved_at, \
            revision_request_id = CASE \
                WHEN EXCLUDED.status IN ('approved', 'pending') THEN NULL \
                WHEN EXCLUDED.revision_request_id IS NOT NULL THEN EXCLUDED.revision_request_id \
                ELSE secondary_evaluator_approval_states.revision_request_id \
            END",
    )
    .bind(mapping_id)
    .bind(evaluator_id)
    .bind(status.as_str())
    .bind(approved_by)
    .bind(linkage)
    .execute(conn)
    .await?;
    Ok(())
}

/// Recompute the legacy aggregate secondary slot from the per-evaluator
/// rows of the assigned evaluators. Assigned evaluators without a row
/// yet count as pending.
async fn recompute_secondary_aggregate(
    conn: &mut PgConnection,
    mapping_id: DbId,
    assigned_evaluators: &[DbId],
    actor: DbId,
) -> WorkflowResult<()> {
    let rows: Vec<(DbId, String)> = sqlx::query_as(
        "SELECT evaluator_id, status FROM secondary_evaluator_approval_states \
         WHERE mapping_id = $1",
    )
    .bind(mapping_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut statuses = Vec::with_capacity(assigned_evaluators.len());
    for evaluator in assigned_evaluators {
        let status = rows
            .iter()
            .find(|(id, _)| id == evaluator)
            .map(|(_, s)| ApprovalStatus::from_str_value(s))
            .transpose()?
            .unwrap_or(ApprovalStatus::Pending);
        statuses.push(status);
    }

    let aggregate = aggregate_secondary(&statuses);
    write_slot(
        conn,
        mapping_id,
        ApprovalStep::Secondary,
        aggregate,
        actor,
        None,
    )
    .await?;
    Ok(())
}

/// Apply a status transition to one step slot for an employee in a
/// period, fanning a revision request out to the step's recipients when
/// the target status is `revision_requested`.
///
/// For the secondary step the transition is applied to every assigned
/// evaluator's row and the legacy aggregate is recomputed from them, so
/// the aggregate is never authored directly. A secondary transition on a
/// mapping with no assigned evaluators fails with a domain conflict.
pub async fn set_step_status(
    pool: &PgPool,
    period_id: DbId,
    employee_id: DbId,
    step: ApprovalStep,
    status: ApprovalStatus,
    actor: DbId,
    comment: Option<&str>,
) -> WorkflowResult<()> {
    let comment = require_revision_comment(status, comment)?;

    let mut tx = pool.begin().await?;
    let ctx = load_mapping_context(&mut tx, period_id, employee_id).await?;
    ensure_state_row(&mut tx, ctx.mapping_id).await?;

    // A secondary transition with nobody assigned would write no
    // evaluator rows and no ledger entries; refuse it instead of
    // discarding the directive.
    if step == ApprovalStep::Secondary && ctx.secondary_evaluators.is_empty() {
        return Err(WorkflowError::Core(CoreError::Conflict(format!(
            "Employee {employee_id} in period {period_id} has no assigned \
             secondary evaluators"
        ))));
    }

    if status == ApprovalStatus::RevisionRequested {
        let recipients = resolve_recipients(
            step,
            employee_id,
            ctx.primary_evaluator,
            &ctx.secondary_evaluators,
        );
        // The comment is present here by the validation above.
        let comment = comment.unwrap_or_default();
        let request_ids = fan_out(
            &mut tx,
            period_id,
            employee_id,
            step,
            comment,
            actor,
            &recipients,
        )
        .await?;

        if step == ApprovalStep::Secondary {
            // Step-wide revision: every assigned evaluator's row flips,
            // each linked to the request addressed to them.
            for recipient in recipients.iter().zip(request_ids.iter()) {
                let (r, request_id) = recipient;
                write_secondary_row(
                    &mut tx,
                    ctx.mapping_id,
                    r.recipient_id,
                    ApprovalStatus::RevisionRequested,
                    actor,
                    Some(*request_id),
                )
                .await?;
            }
            recompute_secondary_aggregate(&mut tx, ctx.mapping_id, &ctx.secondary_evaluators, actor)
                .await?;
        } else {
            write_slot(
                &mut tx,
                ctx.mapping_id,
                step,
                status,
                actor,
                request_ids.first().copied(),
            )
            .await?;
        }
    } else if step == ApprovalStep::Secondary {
        // Non-revision transitions on the secondary step cascade to all
        // assigned evaluators; the aggregate then follows.
        for evaluator in &ctx.secondary_evaluators {
            write_secondary_row(&mut tx, ctx.mapping_id, *evaluator, status, actor, None).await?;
        }
        recompute_secondary_aggregate(&mut tx, ctx.mapping_id, &ctx.secondary_evaluators, actor)
            .await?;
    } else {
        write_slot(&mut tx, ctx.mapping_id, step, status, actor, None).await?;
    }

    tx.commit().await?;

    tracing::info!(
        period_id,
        employee_id,
        step = step.as_str(),
        status = status.as_str(),
        actor,
        "Step approval status changed"
    );
    Ok(())
}

/// Apply a status transition to a single secondary evaluator's approval
/// row, then recompute the legacy aggregate.
///
/// Fails with a domain conflict when the named evaluator is not one of
/// the mapping's assigned secondary evaluators. On `revision_requested`
/// the fan-out targets exactly that evaluator.
pub async fn set_secondary_evaluator_status(
    pool: &PgPool,
    period_id: DbId,
    employee_id: DbId,
    evaluator_id: DbId,
    status: ApprovalStatus,
    actor: DbId,
    comment: Option<&str>,
) -> WorkflowResult<()> {
    let comment = require_revision_comment(status, comment)?;

    let mut tx = pool.begin().await?;
    let ctx = load_mapping_context(&mut tx, period_id, employee_id).await?;
    ensure_state_row(&mut tx, ctx.mapping_id).await?;

    if !ctx.secondary_evaluators.contains(&evaluator_id) {
        return Err(WorkflowError::Core(CoreError::Conflict(format!(
            "Evaluator {evaluator_id} is not an assigned secondary evaluator \
             for employee {employee_id} in period {period_id}"
        ))));
    }

    let request_id = if status == ApprovalStatus::RevisionRequested {
        let recipients = resolve_single_secondary(evaluator_id);
        let comment = comment.unwrap_or_default();
        let ids = fan_out(
            &mut tx,
            period_id,
            employee_id,
            ApprovalStep::Secondary,
            comment,
            actor,
            &recipients,
        )
        .await?;
        ids.first().copied()
    } else {
        None
    };

    write_secondary_row(&mut tx, ctx.mapping_id, evaluator_id, status, actor, request_id).await?;
    recompute_secondary_aggregate(&mut tx, ctx.mapping_id, &ctx.secondary_evaluators, actor)
        .await?;

    tx.commit().await?;

    tracing::info!(
        period_id,
        employee_id,
        evaluator_id,
        status = status.as_str(),
        actor,
        "Secondary evaluator approval status changed"
    );
    Ok(())
}

/// Mark a revision-request recipient row as read.
pub async fn mark_revision_read(
    pool: &PgPool,
    recipient_row_id: DbId,
) -> WorkflowResult<RevisionRequestRecipient> {
    RevisionRepo::mark_read(pool, recipient_row_id)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "RevisionRequestRecipient",
                id: recipient_row_id,
            })
        })
}

/// Fan-in: the targeted recipient acknowledges completion of their
/// revision. Sibling recipients are untouched and the step slot does not
/// flip; an explicit `revision_completed` (or `approved`) transition by
/// the approver is still required.
pub async fn complete_revision(
    pool: &PgPool,
    recipient_row_id: DbId,
    response_comment: Option<&str>,
) -> WorkflowResult<RevisionRequestRecipient> {
    RevisionRepo::complete(pool, recipient_row_id, response_comment)
        .await?
        .ok_or_else(|| {
            WorkflowError::Core(CoreError::NotFound {
                entity: "RevisionRequestRecipient",
                id: recipient_row_id,
            })
        })
}
