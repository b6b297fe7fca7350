//! Read access to the collaborator fact tables, plus the write helpers
//! the content layer (and the integration tests) use to record facts.
//!
//! The aggregate count queries all produce `(assigned, records,
//! completed)` rows that the status vocabularies in `evalcycle-core`
//! consume. The workflow engine itself never writes these tables.

use sqlx::PgPool;

use evalcycle_core::types::DbId;

use crate::models::facts::{
    CompletionCounts, CreateEvaluationLine, EvaluationLine, EvaluatorAssignment, FinalEvaluation,
    RecordCompletionCounts, SelfEvaluationFacts,
};

/// Column list for evaluation_lines queries.
const LINE_COLUMNS: &str =
    "id, period_id, employee_id, primary_evaluator_id, created_at, updated_at";

/// Column list for final_evaluations queries.
const FINAL_COLUMNS: &str = "id, period_id, employee_id, grade, is_confirmed, \
    confirmed_by, confirmed_at, created_at, updated_at";

/// Read-side queries over assignment and completion facts.
pub struct FactsRepo;

impl FactsRepo {
    // -----------------------------------------------------------------------
    // Evaluation lines
    // -----------------------------------------------------------------------

    /// Find the evaluation line for an employee in a period.
    pub async fn find_line(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<Option<EvaluationLine>, sqlx::Error> {
        let query = format!(
            "SELECT {LINE_COLUMNS} FROM evaluation_lines \
             WHERE period_id = $1 AND employee_id = $2"
        );
        sqlx::query_as::<_, EvaluationLine>(&query)
            .bind(period_id)
            .bind(employee_id)
            .fetch_optional(pool)
            .await
    }

    /// The secondary evaluators assigned on a line, ordered by id.
    pub async fn secondary_evaluator_ids(
        pool: &PgPool,
        line_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT evaluator_id FROM evaluation_line_secondaries \
             WHERE line_id = $1 ORDER BY evaluator_id ASC",
        )
        .bind(line_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Create an evaluation line together with its secondary evaluator
    /// assignments.
    pub async fn create_line(
        pool: &PgPool,
        input: &CreateEvaluationLine,
    ) -> Result<EvaluationLine, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO evaluation_lines (period_id, employee_id, primary_evaluator_id) \
             VALUES ($1, $2, $3) RETURNING {LINE_COLUMNS}"
        );
        let line = sqlx::query_as::<_, EvaluationLine>(&query)
            .bind(input.period_id)
            .bind(input.employee_id)
            .bind(input.primary_evaluator_id)
            .fetch_one(&mut *tx)
            .await?;

        for evaluator_id in &input.secondary_evaluator_ids {
            sqlx::query(
                "INSERT INTO evaluation_line_secondaries (line_id, evaluator_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(line.id)
            .bind(evaluator_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(line)
    }

    /// Every employee an evaluator reviews in a period, with the role
    /// held for each.
    pub async fn evaluator_assignments(
        pool: &PgPool,
        period_id: DbId,
        evaluator_id: DbId,
    ) -> Result<Vec<EvaluatorAssignment>, sqlx::Error> {
        sqlx::query_as::<_, EvaluatorAssignment>(
            "SELECT employee_id, 'primary' AS evaluator_role
             FROM evaluation_lines
             WHERE period_id = $1 AND primary_evaluator_id = $2
             UNION ALL
             SELECT l.employee_id, 'secondary' AS evaluator_role
             FROM evaluation_lines l
             JOIN evaluation_line_secondaries s ON s.line_id = l.id
             WHERE l.period_id = $1 AND s.evaluator_id = $2
             ORDER BY employee_id ASC",
        )
        .bind(period_id)
        .bind(evaluator_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Aggregate counts
    // -----------------------------------------------------------------------

    /// Criteria-setup completeness: assigned projects vs. projects that
    /// have at least one WBS item broken out.
    pub async fn criteria_setup_counts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<RecordCompletionCounts, sqlx::Error> {
        sqlx::query_as::<_, RecordCompletionCounts>(
            "SELECT
                COUNT(*) AS assigned,
                (SELECT COUNT(*) FROM wbs_items w
                 JOIN project_assignments p ON p.id = w.project_assignment_id
                 WHERE p.period_id = $1 AND p.employee_id = $2) AS records,
                COUNT(*) FILTER (WHERE EXISTS (
                    SELECT 1 FROM wbs_items w WHERE w.project_assignment_id = pa.id
                )) AS completed
             FROM project_assignments pa
             WHERE pa.period_id = $1 AND pa.employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .fetch_one(pool)
        .await
    }

    /// WBS-criteria completeness: assigned WBS items vs. items carrying
    /// at least one evaluation criterion.
    pub async fn wbs_criteria_counts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<RecordCompletionCounts, sqlx::Error> {
        sqlx::query_as::<_, RecordCompletionCounts>(
            "SELECT
                COUNT(*) AS assigned,
                (SELECT COUNT(*) FROM wbs_criteria c
                 JOIN wbs_items w2 ON w2.id = c.wbs_item_id
                 JOIN project_assignments p ON p.id = w2.project_assignment_id
                 WHERE p.period_id = $1 AND p.employee_id = $2) AS records,
                COUNT(*) FILTER (WHERE EXISTS (
                    SELECT 1 FROM wbs_criteria c WHERE c.wbs_item_id = w.id
                )) AS completed
             FROM wbs_items w
             JOIN project_assignments pa ON pa.id = w.project_assignment_id
             WHERE pa.period_id = $1 AND pa.employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .fetch_one(pool)
        .await
    }

    /// Performance-input completeness: assigned WBS items vs. items with
    /// a non-empty performance input recorded.
    pub async fn performance_input_counts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<RecordCompletionCounts, sqlx::Error> {
        sqlx::query_as::<_, RecordCompletionCounts>(
            "SELECT
                COUNT(*) AS assigned,
                COUNT(pi.id) AS records,
                COUNT(pi.id) FILTER (WHERE pi.content IS NOT NULL AND pi.content <> '')
                    AS completed
             FROM wbs_items w
             JOIN project_assignments pa ON pa.id = w.project_assignment_id
             LEFT JOIN performance_inputs pi
                ON pi.wbs_item_id = w.id AND pi.employee_id = pa.employee_id
             WHERE pa.period_id = $1 AND pa.employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .fetch_one(pool)
        .await
    }

    /// Self-evaluation facts: item completion plus the two submission
    /// booleans, each true only when every assigned item carries the
    /// corresponding flag.
    pub async fn self_evaluation_facts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<SelfEvaluationFacts, sqlx::Error> {
        sqlx::query_as::<_, SelfEvaluationFacts>(
            "SELECT
                COUNT(*) AS assigned,
                COUNT(se.id) AS records,
                COUNT(se.id) FILTER (WHERE se.score IS NOT NULL) AS completed,
                (COUNT(*) > 0 AND
                 COUNT(*) FILTER (WHERE se.submitted_to_evaluator) = COUNT(*))
                    AS all_submitted_to_evaluator,
                (COUNT(*) > 0 AND
                 COUNT(*) FILTER (WHERE se.submitted_to_manager) = COUNT(*))
                    AS all_submitted_to_manager
             FROM wbs_items w
             JOIN project_assignments pa ON pa.id = w.project_assignment_id
             LEFT JOIN self_evaluations se
                ON se.wbs_item_id = w.id
               AND se.period_id = pa.period_id
               AND se.employee_id = pa.employee_id
             WHERE pa.period_id = $1 AND pa.employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .fetch_one(pool)
        .await
    }

    /// Downward-evaluation facts for one evaluator over one employee:
    /// assigned WBS items vs. records and scored records by that
    /// evaluator in the given role.
    pub async fn downward_counts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        evaluator_id: DbId,
        evaluator_role: &str,
    ) -> Result<RecordCompletionCounts, sqlx::Error> {
        sqlx::query_as::<_, RecordCompletionCounts>(
            "SELECT
                COUNT(*) AS assigned,
                COUNT(de.id) AS records,
                COUNT(de.id) FILTER (WHERE de.score IS NOT NULL) AS completed
             FROM wbs_items w
             JOIN project_assignments pa ON pa.id = w.project_assignment_id
             LEFT JOIN downward_evaluations de
                ON de.wbs_item_id = w.id
               AND de.period_id = pa.period_id
               AND de.employee_id = pa.employee_id
               AND de.evaluator_id = $3
               AND de.evaluator_role = $4
             WHERE pa.period_id = $1 AND pa.employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(evaluator_id)
        .bind(evaluator_role)
        .fetch_one(pool)
        .await
    }

    /// Peer-evaluation request completeness: requested vs. answered.
    pub async fn peer_request_counts(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<CompletionCounts, sqlx::Error> {
        sqlx::query_as::<_, CompletionCounts>(
            "SELECT
                COUNT(*) AS assigned,
                COUNT(*) FILTER (WHERE answered_at IS NOT NULL) AS completed
             FROM peer_evaluation_requests
             WHERE period_id = $1 AND employee_id = $2",
        )
        .bind(period_id)
        .bind(employee_id)
        .fetch_one(pool)
        .await
    }

    /// Find the final evaluation row for an employee in a period.
    pub async fn find_final_evaluation(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
    ) -> Result<Option<FinalEvaluation>, sqlx::Error> {
        let query = format!(
            "SELECT {FINAL_COLUMNS} FROM final_evaluations \
             WHERE period_id = $1 AND employee_id = $2"
        );
        sqlx::query_as::<_, FinalEvaluation>(&query)
            .bind(period_id)
            .bind(employee_id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Write helpers for the content layer / tests
    // -----------------------------------------------------------------------

    /// Assign a project to an employee for a period.
    pub async fn create_project_assignment(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO project_assignments (period_id, employee_id, name) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(name)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Break a WBS item out of a project assignment.
    pub async fn create_wbs_item(
        pool: &PgPool,
        project_assignment_id: DbId,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO wbs_items (project_assignment_id, name) \
             VALUES ($1, $2) RETURNING id",
        )
        .bind(project_assignment_id)
        .bind(name)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Attach an evaluation criterion to a WBS item.
    pub async fn create_wbs_criterion(
        pool: &PgPool,
        wbs_item_id: DbId,
        description: &str,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO wbs_criteria (wbs_item_id, description) \
             VALUES ($1, $2) RETURNING id",
        )
        .bind(wbs_item_id)
        .bind(description)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Record or update the performance input for one WBS item. One row
    /// per item and employee; re-recording replaces the content.
    pub async fn record_performance_input(
        pool: &PgPool,
        wbs_item_id: DbId,
        employee_id: DbId,
        content: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO performance_inputs (wbs_item_id, employee_id, content) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_performance_input DO UPDATE \
             SET content = EXCLUDED.content \
             RETURNING id",
        )
        .bind(wbs_item_id)
        .bind(employee_id)
        .bind(content)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Record or update a self-evaluation for one WBS item.
    pub async fn record_self_evaluation(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        wbs_item_id: DbId,
        score: Option<i16>,
        submitted_to_evaluator: bool,
        submitted_to_manager: bool,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO self_evaluations
                (period_id, employee_id, wbs_item_id, score,
                 submitted_to_evaluator, submitted_to_manager)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_self_evaluation_item DO UPDATE
             SET score = EXCLUDED.score,
                 submitted_to_evaluator = EXCLUDED.submitted_to_evaluator,
                 submitted_to_manager = EXCLUDED.submitted_to_manager
             RETURNING id",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(wbs_item_id)
        .bind(score)
        .bind(submitted_to_evaluator)
        .bind(submitted_to_manager)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Record or update a downward evaluation for one WBS item.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_downward_evaluation(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        evaluator_id: DbId,
        evaluator_role: &str,
        wbs_item_id: DbId,
        score: Option<i16>,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO downward_evaluations
                (period_id, employee_id, evaluator_id, evaluator_role, wbs_item_id, score)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_downward_evaluation DO UPDATE
             SET score = EXCLUDED.score, evaluator_role = EXCLUDED.evaluator_role
             RETURNING id",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(evaluator_id)
        .bind(evaluator_role)
        .bind(wbs_item_id)
        .bind(score)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Request a peer evaluation.
    pub async fn create_peer_request(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        peer_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO peer_evaluation_requests (period_id, employee_id, peer_id) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(period_id)
        .bind(employee_id)
        .bind(peer_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Mark a peer evaluation request as answered.
    pub async fn answer_peer_request(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE peer_evaluation_requests \
             SET answered_at = COALESCE(answered_at, now()) WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record or update an employee's final evaluation grade.
    pub async fn upsert_final_evaluation(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        grade: Option<&str>,
    ) -> Result<FinalEvaluation, sqlx::Error> {
        let query = format!(
            "INSERT INTO final_evaluations (period_id, employee_id, grade) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_final_evaluation DO UPDATE \
             SET grade = EXCLUDED.grade \
             RETURNING {FINAL_COLUMNS}"
        );
        sqlx::query_as::<_, FinalEvaluation>(&query)
            .bind(period_id)
            .bind(employee_id)
            .bind(grade)
            .fetch_one(pool)
            .await
    }

    /// Confirm an employee's final evaluation.
    pub async fn confirm_final_evaluation(
        pool: &PgPool,
        period_id: DbId,
        employee_id: DbId,
        confirmed_by: DbId,
    ) -> Result<Option<FinalEvaluation>, sqlx::Error> {
        let query = format!(
            "UPDATE final_evaluations \
             SET is_confirmed = true, confirmed_by = $3, confirmed_at = now() \
             WHERE period_id = $1 AND employee_id = $2 \
             RETURNING {FINAL_COLUMNS}"
        );
        sqlx::query_as::<_, FinalEvaluation>(&query)
            .bind(period_id)
            .bind(employee_id)
            .bind(confirmed_by)
            .fetch_optional(pool)
            .await
    }
}
