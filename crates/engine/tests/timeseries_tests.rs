#![cfg(test)]

use chrono::{Datelike, Local, NaiveDate};
use sqlx::PgPool;

use common::settings::Engine as EngineSettings;
use engine::{CrashEngine, error::EngineError, timeseries::MONTHS};
use repos::Repo;
use testware::{backdate_report, create_test_product, insert_test_report, test_report};

fn test_engine(pool: &PgPool) -> CrashEngine {
    CrashEngine::new(Repo::new(pool.clone()), &EngineSettings::default())
}

/// First of the month `back` months before `today`.
fn month_start_back(today: NaiveDate, back: i32) -> NaiveDate {
    let months = today.year() * 12 + today.month0() as i32 - back;
    NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1).unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_monthly_counts_for_unknown_product_are_all_zero(pool: PgPool) {
    let engine = test_engine(&pool);

    let counts = engine
        .monthly_counts("no-such-product", "linux", None)
        .await
        .expect("Failed to compute monthly counts");

    assert_eq!(counts, vec![0; MONTHS]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_monthly_counts_bucket_by_calendar_month(pool: PgPool) {
    let engine = test_engine(&pool);
    let today = Local::now().date_naive();

    insert_test_report(&pool, test_report("app", "1.0", "linux")).await;
    let two_months_ago = insert_test_report(&pool, test_report("app", "1.0", "linux")).await;
    let same_month_again = insert_test_report(&pool, test_report("app", "1.0", "linux")).await;
    let too_old = insert_test_report(&pool, test_report("app", "1.0", "linux")).await;

    // day 1 and day 2 of the same month share a bucket
    let old_month = month_start_back(today, 2);
    backdate_report(&pool, two_months_ago.id, old_month.and_hms_opt(8, 0, 0).unwrap()).await;
    backdate_report(
        &pool,
        same_month_again.id,
        old_month.succ_opt().unwrap().and_hms_opt(23, 0, 0).unwrap(),
    )
    .await;
    // 13 months back falls outside the rolling window
    backdate_report(
        &pool,
        too_old.id,
        month_start_back(today, 13).and_hms_opt(12, 0, 0).unwrap(),
    )
    .await;

    let counts = engine
        .monthly_counts_from("app", "linux", None, today)
        .await
        .expect("Failed to compute monthly counts");

    assert_eq!(counts.len(), MONTHS);
    assert_eq!(counts.iter().sum::<i64>(), 3);
    assert_eq!(counts[MONTHS - 1], 1);
    assert_eq!(counts[MONTHS - 3], 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_monthly_counts_version_filter_and_sentinel(pool: PgPool) {
    let engine = test_engine(&pool);

    insert_test_report(&pool, test_report("app", "1.0", "linux")).await;
    insert_test_report(&pool, test_report("app", "1.0", "linux")).await;
    insert_test_report(&pool, test_report("app", "2.0", "linux")).await;
    insert_test_report(&pool, test_report("app", "2.0", "windows")).await;

    let only_v1 = engine
        .monthly_counts("app", "linux", Some("1.0"))
        .await
        .expect("Failed to compute monthly counts");
    assert_eq!(only_v1.iter().sum::<i64>(), 2);

    let sentinel = engine
        .monthly_counts("app", "linux", Some("All"))
        .await
        .expect("Failed to compute monthly counts");
    assert_eq!(sentinel.iter().sum::<i64>(), 3);

    let omitted = engine
        .monthly_counts("app", "linux", None)
        .await
        .expect("Failed to compute monthly counts");
    assert_eq!(omitted.iter().sum::<i64>(), 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_per_platform_counts_fan_out_over_configured_platforms(pool: PgPool) {
    let product = create_test_product(&pool).await;
    let engine = test_engine(&pool);

    insert_test_report(&pool, test_report(&product.name, "1.0", "linux")).await;
    insert_test_report(&pool, test_report(&product.name, "1.0", "linux")).await;
    insert_test_report(&pool, test_report(&product.name, "1.0", "macos")).await;

    let series = engine
        .per_platform_monthly_counts(&product.name, None)
        .await
        .expect("Failed to compute per-platform counts");

    let platforms: Vec<_> = series.keys().cloned().collect();
    assert_eq!(platforms, product.allowed_platforms);

    assert_eq!(series["linux"].iter().sum::<i64>(), 2);
    assert_eq!(series["macos"].iter().sum::<i64>(), 1);
    assert_eq!(series["windows"], vec![0; MONTHS]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_per_platform_counts_for_unknown_product(pool: PgPool) {
    let engine = test_engine(&pool);

    let err = engine
        .per_platform_monthly_counts("no-such-product", None)
        .await
        .expect_err("Expected missing product error");
    assert!(matches!(err, EngineError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_month_labels_cover_the_window(pool: PgPool) {
    let _ = pool;

    let labels = CrashEngine::month_labels();
    assert_eq!(labels.len(), MONTHS);
    assert_eq!(labels[MONTHS - 1], Local::now().format("%B").to_string());
}
