pub mod setup;

use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

use data::issue::{Issue, IssueStatus};
use data::product::{NewProduct, Product};
use data::report::{CrashReport, Fingerprint, NewCrashReport};
use repos::product::ProductRepo;
use repos::report::CrashReportRepo;

/// Create a test product with a random name accepting the usual
/// platforms and any version.
pub async fn create_test_product(pool: &PgPool) -> Product {
    create_test_product_with_details(
        pool,
        &format!("TestProduct_{}", Uuid::new_v4()),
        None,
        &["linux", "macos", "windows"],
    )
    .await
}

pub async fn create_test_product_with_details(
    pool: &PgPool,
    name: &str,
    min_version: Option<&str>,
    allowed_platforms: &[&str],
) -> Product {
    let new_product = NewProduct {
        name: name.to_string(),
        min_version: min_version.map(str::to_string),
        allowed_platforms: allowed_platforms.iter().map(|p| p.to_string()).collect(),
    };

    let product_id = ProductRepo::create(pool, new_product)
        .await
        .expect("Failed to insert test product");

    ProductRepo::get_by_id(pool, product_id)
        .await
        .expect("Failed to retrieve created product")
        .expect("Created product not found")
}

/// Report builder with a plausible default signature.
pub fn test_report(product: &str, version: &str, platform: &str) -> NewCrashReport {
    test_report_with_signature(product, version, platform, "SIGSEGV", "app::main")
}

pub fn test_report_with_signature(
    product: &str,
    version: &str,
    platform: &str,
    reason: &str,
    location: &str,
) -> NewCrashReport {
    NewCrashReport {
        id: None,
        product: product.to_string(),
        version: version.to_string(),
        platform: platform.to_string(),
        crash_reason: reason.to_string(),
        crash_location: location.to_string(),
        process_uptime: None,
        minidump: None,
    }
}

/// Insert a crash report directly, bypassing the clustering path.
pub async fn insert_test_report(pool: &PgPool, report: NewCrashReport) -> CrashReport {
    CrashReportRepo::create(pool, report)
        .await
        .expect("Failed to insert test report")
        .expect("Test report id already taken")
}

/// Seed an issue row with given aggregates, for ranking tests that
/// would otherwise need dozens of ingestions.
pub async fn seed_issue(
    pool: &PgPool,
    fingerprint: &Fingerprint,
    total: i64,
    last_seen: NaiveDateTime,
    status: IssueStatus,
) -> Issue {
    sqlx::query_as::<_, Issue>(
        r#"
            INSERT INTO faultline.issues
              (product, platform, version, reason, location,
               total, uptime_count, avg_uptime, last_seen, status)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $8)
            RETURNING *
        "#,
    )
    .bind(&fingerprint.product)
    .bind(&fingerprint.platform)
    .bind(&fingerprint.version)
    .bind(&fingerprint.reason)
    .bind(&fingerprint.location)
    .bind(total)
    .bind(last_seen)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("Failed to seed test issue")
}

/// Rewrite a report's store timestamp, for calendar-bucket tests.
pub async fn backdate_report(pool: &PgPool, report_id: Uuid, created_at: NaiveDateTime) {
    sqlx::query("UPDATE faultline.reports SET created_at = $2 WHERE id = $1")
        .bind(report_id)
        .bind(created_at)
        .execute(pool)
        .await
        .expect("Failed to backdate test report");
}
