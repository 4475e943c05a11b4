use chrono::NaiveDateTime;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    Repo,
    error::{RepoError, handle_sql_error},
};
use common::QueryParams;
use data::issue::Issue;
use data::report::Fingerprint;

pub struct IssueRepo {}

impl IssueRepo {
    /// Find-or-create by fingerprint and fold one occurrence into the
    /// aggregates, as a single statement. The unique index on the
    /// fingerprint columns makes concurrent first-seen ingestion converge
    /// on one row; `total`, `uptime_count`, `avg_uptime` and `last_seen`
    /// are updated against the stored row, never read-modify-write.
    ///
    /// The average is an incremental mean over uptime-bearing reports
    /// only; `uptime_count` is its denominator and moves independently of
    /// `total`.
    pub async fn upsert_occurrence(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        fingerprint: &Fingerprint,
        process_uptime: Option<i32>,
        seen_at: NaiveDateTime,
        reopen: bool,
    ) -> Result<Issue, RepoError> {
        sqlx::query_as::<_, Issue>(
            r#"
                INSERT INTO faultline.issues
                  (
                    product,
                    platform,
                    version,
                    reason,
                    location,
                    total,
                    uptime_count,
                    avg_uptime,
                    last_seen,
                    status
                  )
                VALUES ($1, $2, $3, $4, $5,
                        1,
                        CASE WHEN $6::integer IS NULL THEN 0 ELSE 1 END,
                        COALESCE($6::integer, 0)::double precision,
                        $7,
                        'open')
                ON CONFLICT (product, platform, version, reason, location)
                DO UPDATE SET
                    total = issues.total + 1,
                    uptime_count = issues.uptime_count
                        + CASE WHEN $6::integer IS NULL THEN 0 ELSE 1 END,
                    avg_uptime = CASE
                        WHEN $6::integer IS NULL THEN issues.avg_uptime
                        ELSE issues.avg_uptime
                            + ($6::integer - issues.avg_uptime) / (issues.uptime_count + 1)
                    END,
                    last_seen = GREATEST(issues.last_seen, $7),
                    status = CASE
                        WHEN $8 AND issues.status = 'resolved' THEN 'open'
                        ELSE issues.status
                    END,
                    updated_at = current_timestamp
                RETURNING *
            "#,
        )
        .bind(&fingerprint.product)
        .bind(&fingerprint.platform)
        .bind(&fingerprint.version)
        .bind(&fingerprint.reason)
        .bind(&fingerprint.location)
        .bind(process_uptime)
        .bind(seen_at)
        .bind(reopen)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<Option<Issue>, RepoError> {
        sqlx::query_as::<_, Issue>(
            r#"
                SELECT *
                FROM faultline.issues
                WHERE faultline.issues.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_fingerprint(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Issue>, RepoError> {
        sqlx::query_as::<_, Issue>(
            r#"
                SELECT *
                FROM faultline.issues
                WHERE product = $1
                  AND platform = $2
                  AND version = $3
                  AND reason = $4
                  AND location = $5
            "#,
        )
        .bind(&fingerprint.product)
        .bind(&fingerprint.platform)
        .bind(&fingerprint.version)
        .bind(&fingerprint.reason)
        .bind(&fingerprint.location)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn top_for_product(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: &str,
        limit: i64,
        include_resolved: bool,
    ) -> Result<Vec<Issue>, RepoError> {
        sqlx::query_as::<_, Issue>(
            r#"
                SELECT *
                FROM faultline.issues
                WHERE product = $1
                  AND ($3 OR status = 'open')
                ORDER BY total DESC, last_seen DESC
                LIMIT $2
            "#,
        )
        .bind(product)
        .bind(limit)
        .bind(include_resolved)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Idempotent: resolving an already-resolved issue still matches and
    /// returns its id. `None` means no such issue.
    pub async fn resolve(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<Option<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
                UPDATE faultline.issues
                SET status = 'resolved', updated_at = current_timestamp
                WHERE id = $1
                RETURNING id
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Best-effort bulk resolve. Unknown ids match nothing and are
    /// skipped; returns the number of issues touched.
    pub async fn resolve_many(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        ids: &[Uuid],
    ) -> Result<u64, RepoError> {
        sqlx::query(
            r#"
                UPDATE faultline.issues
                SET status = 'resolved', updated_at = current_timestamp
                WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|result| result.rows_affected())
    }

    pub async fn get_all(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        params: QueryParams,
    ) -> Result<Vec<Issue>, RepoError> {
        let mut builder = QueryBuilder::new("SELECT * from faultline.issues");
        Repo::build_query(
            &mut builder,
            &params,
            &[
                "id",
                "product",
                "platform",
                "version",
                "reason",
                "location",
                "total",
                "last_seen",
                "status",
                "created_at",
                "updated_at",
            ],
            &["product", "platform", "reason", "location"],
        )?;

        let query = builder.build_query_as();

        query.fetch_all(executor).await.map_err(handle_sql_error)
    }

    pub async fn count(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COUNT(*)
                FROM faultline.issues
            "#,
        )
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
