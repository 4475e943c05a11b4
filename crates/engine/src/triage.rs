use tracing::info;
use uuid::Uuid;

use data::issue::Issue;
use data::report::CrashReport;
use repos::issue::IssueRepo;
use repos::report::CrashReportRepo;

use crate::{CrashEngine, error::EngineError};

impl CrashEngine {
    /// Issues for a product ranked for triage: by volume, then by most
    /// recent activity. Resolved issues are hidden unless asked for.
    pub async fn top_issues(
        &self,
        product: &str,
        n: u32,
        include_resolved: bool,
    ) -> Result<Vec<Issue>, EngineError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.repo.acquire().await?;
        IssueRepo::top_for_product(&mut *conn, product, i64::from(n), include_resolved)
            .await
            .map_err(EngineError::from)
    }

    /// Idempotent; a second resolve of the same issue is a no-op.
    pub async fn resolve(&self, issue_id: Uuid) -> Result<(), EngineError> {
        let mut conn = self.repo.acquire().await?;
        IssueRepo::resolve(&mut *conn, issue_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        info!(issue = %issue_id, "Issue resolved");
        Ok(())
    }

    /// Best-effort bulk resolve for admin actions: unknown ids are
    /// skipped, the batch never aborts. Returns the number of issues
    /// touched.
    pub async fn resolve_many(&self, issue_ids: &[Uuid]) -> Result<u64, EngineError> {
        if issue_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.repo.acquire().await?;
        let resolved = IssueRepo::resolve_many(&mut *conn, issue_ids).await?;
        info!(requested = issue_ids.len(), resolved, "Resolved issues in bulk");
        Ok(resolved)
    }

    /// One page of the reports clustered into an issue, newest first.
    /// `page` is 1-based; a page past the end is empty, not an error.
    pub async fn reports_for_issue(
        &self,
        issue_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<CrashReport>, EngineError> {
        let mut conn = self.repo.acquire().await?;
        IssueRepo::get_by_id(&mut *conn, issue_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(page_size);
        CrashReportRepo::get_by_issue(&mut *conn, issue_id, i64::from(page_size), offset)
            .await
            .map_err(EngineError::from)
    }

    /// Distinct versions observed in a product's crash reports, natural
    /// order ("0.10" after "0.9").
    pub async fn versions_for_product(&self, product: &str) -> Result<Vec<String>, EngineError> {
        let mut conn = self.repo.acquire().await?;
        let mut versions = CrashReportRepo::distinct_versions(&mut *conn, product).await?;
        versions.sort_by(|a, b| natord::compare(a, b));
        Ok(versions)
    }

    /// Most recent crash reports for a product overview page.
    pub async fn latest_reports(
        &self,
        product: &str,
        n: u32,
    ) -> Result<Vec<CrashReport>, EngineError> {
        let mut conn = self.repo.acquire().await?;
        CrashReportRepo::latest_for_product(&mut *conn, product, i64::from(n))
            .await
            .map_err(EngineError::from)
    }
}
