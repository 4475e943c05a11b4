use std::cmp::Ordering;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use data::issue::Issue;
use data::product::Product;
use data::report::NewCrashReport;
use repos::issue::IssueRepo;
use repos::product::ProductRepo;
use repos::report::CrashReportRepo;

use crate::{CrashEngine, error::EngineError};

impl CrashEngine {
    /// Cluster an incoming crash report into its issue. The report is
    /// stored as evidence, the issue is found or created by fingerprint,
    /// and the running aggregates are folded forward, all in one
    /// transaction so the report and the issue observe the same store
    /// timestamp.
    ///
    /// A replayed report id returns the issue the report already belongs
    /// to without counting it again.
    #[instrument(skip(self, report), fields(product = %report.product, platform = %report.platform))]
    pub async fn ingest(&self, report: NewCrashReport) -> Result<Issue, EngineError> {
        validate_required(&report)?;

        let report_id = report.id.unwrap_or_else(Uuid::new_v4);
        let report = NewCrashReport {
            id: Some(report_id),
            ..report
        };

        let mut tx = self.repo.begin().await?;

        let product = ProductRepo::get_by_name(&mut *tx, &report.product)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidReport(format!("unknown product {}", report.product))
            })?;
        validate_against_product(&report, &product)?;

        let issue = match CrashReportRepo::create(&mut *tx, report).await? {
            Some(stored) => {
                let issue = IssueRepo::upsert_occurrence(
                    &mut *tx,
                    &stored.fingerprint(),
                    stored.process_uptime,
                    stored.created_at,
                    self.reopen_on_new_report,
                )
                .await?;
                CrashReportRepo::assign_issue(&mut *tx, stored.id, issue.id).await?;
                info!(issue = %issue.id, total = issue.total, "Clustered crash report");
                issue
            }
            None => {
                let existing = CrashReportRepo::get_by_id(&mut *tx, report_id)
                    .await?
                    .ok_or(EngineError::NotFound)?;
                let issue_id = existing.issue_id.ok_or(EngineError::NotFound)?;
                let issue = IssueRepo::get_by_id(&mut *tx, issue_id)
                    .await?
                    .ok_or(EngineError::NotFound)?;
                warn!(report = %report_id, "Replayed crash report id, returning existing issue");
                issue
            }
        };

        self.repo.end(tx).await?;
        Ok(issue)
    }
}

fn validate_required(report: &NewCrashReport) -> Result<(), EngineError> {
    for (field, value) in [
        ("product", &report.product),
        ("version", &report.version),
        ("platform", &report.platform),
    ] {
        if value.trim().is_empty() {
            return Err(EngineError::InvalidReport(format!("missing required field {field}")));
        }
    }
    Ok(())
}

fn validate_against_product(report: &NewCrashReport, product: &Product) -> Result<(), EngineError> {
    if !product.allowed_platforms.iter().any(|p| p == &report.platform) {
        return Err(EngineError::InvalidReport(format!(
            "platform {} is not allowed for {}",
            report.platform, product.name
        )));
    }

    if let Some(min_version) = &product.min_version
        && natord::compare(&report.version, min_version) == Ordering::Less
    {
        return Err(EngineError::InvalidReport(format!(
            "version {} is below the minimum {}",
            report.version, min_version
        )));
    }

    Ok(())
}
