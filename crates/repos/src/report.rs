use chrono::NaiveDateTime;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    Repo,
    error::{RepoError, handle_sql_error},
};
use common::QueryParams;
use data::report::{CrashReport, Fingerprint, NewCrashReport};

pub struct CrashReportRepo {}

#[derive(sqlx::FromRow)]
struct MonthCount {
    month: NaiveDateTime,
    total: i64,
}

impl CrashReportRepo {
    /// Insert a crash report. Returns `None` when the caller-supplied id
    /// already exists; the stored row is left untouched in that case.
    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        report: NewCrashReport,
    ) -> Result<Option<CrashReport>, RepoError> {
        sqlx::query_as::<_, CrashReport>(
            r#"
                INSERT INTO faultline.reports
                  (
                    id,
                    product,
                    version,
                    platform,
                    crash_reason,
                    crash_location,
                    process_uptime,
                    minidump
                  )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO NOTHING
                RETURNING *
            "#,
        )
        .bind(report.id.unwrap_or_else(Uuid::new_v4))
        .bind(&report.product)
        .bind(&report.version)
        .bind(&report.platform)
        .bind(&report.crash_reason)
        .bind(&report.crash_location)
        .bind(report.process_uptime)
        .bind(report.minidump)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn assign_issue(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        report_id: Uuid,
        issue_id: Uuid,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE faultline.reports
                SET issue_id = $2
                WHERE id = $1
            "#,
        )
        .bind(report_id)
        .bind(issue_id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }

    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<Option<CrashReport>, RepoError> {
        sqlx::query_as::<_, CrashReport>(
            r#"
                SELECT *
                FROM faultline.reports
                WHERE faultline.reports.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_issue(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        issue_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CrashReport>, RepoError> {
        sqlx::query_as::<_, CrashReport>(
            r#"
                SELECT *
                FROM faultline.reports
                WHERE issue_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
            "#,
        )
        .bind(issue_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_fingerprint(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        fingerprint: &Fingerprint,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CrashReport>, RepoError> {
        sqlx::query_as::<_, CrashReport>(
            r#"
                SELECT *
                FROM faultline.reports
                WHERE product = $1
                  AND platform = $2
                  AND version = $3
                  AND crash_reason = $4
                  AND crash_location = $5
                ORDER BY created_at DESC
                LIMIT $6 OFFSET $7
            "#,
        )
        .bind(&fingerprint.product)
        .bind(&fingerprint.platform)
        .bind(&fingerprint.version)
        .bind(&fingerprint.reason)
        .bind(&fingerprint.location)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Occurrence counts grouped by calendar month of `created_at`, for
    /// reports at or after `since`. Months without reports yield no row;
    /// the caller zero-fills. A `None` version aggregates all versions.
    pub async fn monthly_counts(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: &str,
        platform: &str,
        version: Option<&str>,
        since: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, i64)>, RepoError> {
        sqlx::query_as::<_, MonthCount>(
            r#"
                SELECT date_trunc('month', created_at) AS month, COUNT(*) AS total
                FROM faultline.reports
                WHERE product = $1
                  AND platform = $2
                  AND ($3::text IS NULL OR version = $3)
                  AND created_at >= $4
                GROUP BY month
            "#,
        )
        .bind(product)
        .bind(platform)
        .bind(version)
        .bind(since)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
        .map(|rows| rows.into_iter().map(|row| (row.month, row.total)).collect())
    }

    pub async fn distinct_versions(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: &str,
    ) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
                SELECT DISTINCT version
                FROM faultline.reports
                WHERE product = $1
            "#,
        )
        .bind(product)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn latest_for_product(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: &str,
        limit: i64,
    ) -> Result<Vec<CrashReport>, RepoError> {
        sqlx::query_as::<_, CrashReport>(
            r#"
                SELECT *
                FROM faultline.reports
                WHERE product = $1
                ORDER BY created_at DESC
                LIMIT $2
            "#,
        )
        .bind(product)
        .bind(limit)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        params: QueryParams,
    ) -> Result<Vec<CrashReport>, RepoError> {
        let mut builder = QueryBuilder::new("SELECT * from faultline.reports");
        Repo::build_query(
            &mut builder,
            &params,
            &[
                "id",
                "product",
                "version",
                "platform",
                "crash_reason",
                "crash_location",
                "created_at",
            ],
            &["product", "version", "platform", "crash_reason", "crash_location"],
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
                FROM faultline.reports
            "#,
        )
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
