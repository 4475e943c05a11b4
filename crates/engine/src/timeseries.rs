use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use repos::product::ProductRepo;
use repos::report::CrashReportRepo;

use crate::{CrashEngine, error::EngineError};

/// Buckets in a rolling window, current month last.
pub const MONTHS: usize = 12;

/// Version sentinel meaning "aggregate across all versions".
pub const ALL_VERSIONS: &str = "all";

impl CrashEngine {
    /// Occurrence counts per calendar month for the trailing 12 months
    /// including the current one, oldest first. Always 12 entries;
    /// months without reports count zero. Buckets follow the local
    /// calendar, not sliding 30-day windows.
    pub async fn monthly_counts(
        &self,
        product: &str,
        platform: &str,
        version: Option<&str>,
    ) -> Result<Vec<i64>, EngineError> {
        self.monthly_counts_from(product, platform, version, Local::now().date_naive())
            .await
    }

    pub async fn monthly_counts_from(
        &self,
        product: &str,
        platform: &str,
        version: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<i64>, EngineError> {
        let version = normalize_version(version);
        let months = trailing_months(today);
        let since = months[0].and_hms_opt(0, 0, 0).expect("midnight is a valid time");

        let mut conn = self.repo.acquire().await?;
        let rows =
            CrashReportRepo::monthly_counts(&mut *conn, product, platform, version, since).await?;

        Ok(fill_buckets(&months, &rows))
    }

    /// One 12-month series per platform configured for the product, in
    /// configured order, for multi-series charts.
    pub async fn per_platform_monthly_counts(
        &self,
        product: &str,
        version: Option<&str>,
    ) -> Result<IndexMap<String, Vec<i64>>, EngineError> {
        self.per_platform_monthly_counts_from(product, version, Local::now().date_naive())
            .await
    }

    pub async fn per_platform_monthly_counts_from(
        &self,
        product: &str,
        version: Option<&str>,
        today: NaiveDate,
    ) -> Result<IndexMap<String, Vec<i64>>, EngineError> {
        let product = {
            let mut conn = self.repo.acquire().await?;
            ProductRepo::get_by_name(&mut *conn, product)
                .await?
                .ok_or(EngineError::NotFound)?
        };

        let mut series = IndexMap::new();
        for platform in &product.allowed_platforms {
            let counts = self
                .monthly_counts_from(&product.name, platform, version, today)
                .await?;
            series.insert(platform.clone(), counts);
        }
        Ok(series)
    }

    /// Month names aligned with the count buckets, oldest first.
    pub fn month_labels() -> Vec<String> {
        month_labels_from(Local::now().date_naive())
    }
}

pub fn month_labels_from(today: NaiveDate) -> Vec<String> {
    trailing_months(today)
        .iter()
        .map(|month| month.format("%B").to_string())
        .collect()
}

fn normalize_version(version: Option<&str>) -> Option<&str> {
    version.filter(|v| !v.eq_ignore_ascii_case(ALL_VERSIONS))
}

/// First day of each of the trailing 12 months, oldest first.
fn trailing_months(today: NaiveDate) -> Vec<NaiveDate> {
    (0..MONTHS).rev().map(|back| month_start_back(today, back)).collect()
}

fn month_start_back(today: NaiveDate, back: usize) -> NaiveDate {
    let months = today.year() * 12 + today.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)
        .expect("first of month is a valid date")
}

fn fill_buckets(months: &[NaiveDate], rows: &[(NaiveDateTime, i64)]) -> Vec<i64> {
    months
        .iter()
        .map(|month| {
            rows.iter()
                .find(|(bucket, _)| {
                    bucket.year() == month.year() && bucket.month() == month.month()
                })
                .map(|(_, count)| *count)
                .unwrap_or(0)
        })
        .collect()
}
