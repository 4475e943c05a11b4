#![cfg(test)]

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use common::QueryParams;
use repos::issue::IssueRepo;
use repos::report::CrashReportRepo;

use testcommon::{backdate_report, fingerprint, insert_test_report, new_report};

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_assigns_defaults(pool: PgPool) {
    let stored = insert_test_report(&pool, new_report("app", "1.0", "linux")).await;

    assert_eq!(stored.product, "app");
    assert_eq!(stored.crash_reason, "SIGSEGV");
    assert!(stored.issue_id.is_none());
    assert!(stored.process_uptime.is_none());

    let found = CrashReportRepo::get_by_id(&pool, stored.id)
        .await
        .expect("Failed to get report by id")
        .expect("Report not found");
    assert_eq!(found.id, stored.id);
    assert_eq!(found.created_at, stored.created_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_keeps_caller_id_and_rejects_replay(pool: PgPool) {
    let id = Uuid::new_v4();
    let mut report = new_report("app", "1.0", "linux");
    report.id = Some(id);

    let stored = CrashReportRepo::create(&pool, report.clone())
        .await
        .expect("Failed to create report");
    assert_eq!(stored.expect("Report not stored").id, id);

    let replayed = CrashReportRepo::create(&pool, report)
        .await
        .expect("Failed to run replayed create");
    assert!(replayed.is_none());

    let count = CrashReportRepo::count(&pool).await.expect("Failed to count reports");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_assign_issue_and_page_by_issue(pool: PgPool) {
    let now = Utc::now().naive_utc();
    let issue = IssueRepo::upsert_occurrence(&pool, &fingerprint("app", "SIGSEGV"), None, now, true)
        .await
        .expect("Failed to upsert issue");

    let mut ids = Vec::new();
    for hours_ago in [3, 2, 1] {
        let stored = insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
        CrashReportRepo::assign_issue(&pool, stored.id, issue.id)
            .await
            .expect("Failed to assign issue");
        backdate_report(&pool, stored.id, now - Duration::hours(hours_ago)).await;
        ids.push(stored.id);
    }

    let newest_two = CrashReportRepo::get_by_issue(&pool, issue.id, 2, 0)
        .await
        .expect("Failed to page reports");
    assert_eq!(newest_two.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

    let rest = CrashReportRepo::get_by_issue(&pool, issue.id, 2, 2)
        .await
        .expect("Failed to page reports");
    assert_eq!(rest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[0]]);

    let past_the_end = CrashReportRepo::get_by_issue(&pool, issue.id, 2, 4)
        .await
        .expect("Failed to page reports");
    assert!(past_the_end.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_fingerprint(pool: PgPool) {
    insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
    insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
    // same signature, different platform
    insert_test_report(&pool, new_report("app", "1.0", "windows")).await;

    let matching = CrashReportRepo::get_by_fingerprint(&pool, &fingerprint("app", "SIGSEGV"), 10, 0)
        .await
        .expect("Failed to query by fingerprint");
    assert_eq!(matching.len(), 2);
    assert!(matching.iter().all(|r| r.platform == "linux"));

    let none = CrashReportRepo::get_by_fingerprint(&pool, &fingerprint("app", "SIGABRT"), 10, 0)
        .await
        .expect("Failed to query by fingerprint");
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_monthly_counts_group_by_calendar_month(pool: PgPool) {
    let now = Utc::now().naive_utc();

    insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
    let last_year = insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
    backdate_report(&pool, last_year.id, now - Duration::days(200)).await;

    // different platform and version stay out of the series
    insert_test_report(&pool, new_report("app", "1.0", "windows")).await;
    insert_test_report(&pool, new_report("app", "2.0", "linux")).await;

    let since = now - Duration::days(365);
    let rows = CrashReportRepo::monthly_counts(&pool, "app", "linux", Some("1.0"), since)
        .await
        .expect("Failed to count by month");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().map(|(_, count)| count).sum::<i64>(), 2);

    let all_versions = CrashReportRepo::monthly_counts(&pool, "app", "linux", None, since)
        .await
        .expect("Failed to count by month");
    assert_eq!(all_versions.iter().map(|(_, count)| count).sum::<i64>(), 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_distinct_versions(pool: PgPool) {
    for version in ["1.0", "1.0", "2.0"] {
        insert_test_report(&pool, new_report("app", version, "linux")).await;
    }
    insert_test_report(&pool, new_report("other", "9.9", "linux")).await;

    let mut versions = CrashReportRepo::distinct_versions(&pool, "app")
        .await
        .expect("Failed to list versions");
    versions.sort();
    assert_eq!(versions, vec!["1.0", "2.0"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_latest_for_product(pool: PgPool) {
    let now = Utc::now().naive_utc();

    let mut ids = Vec::new();
    for hours_ago in [2, 1] {
        let stored = insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
        backdate_report(&pool, stored.id, now - Duration::hours(hours_ago)).await;
        ids.push(stored.id);
    }

    let latest = CrashReportRepo::latest_for_product(&pool, "app", 1)
        .await
        .expect("Failed to list latest reports");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, ids[1]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_all_filter(pool: PgPool) {
    insert_test_report(&pool, new_report("app", "1.0", "linux")).await;
    insert_test_report(&pool, new_report("other", "1.0", "linux")).await;

    let params = QueryParams {
        filter: Some("other".to_string()),
        ..QueryParams::default()
    };
    let filtered = CrashReportRepo::get_all(&pool, params).await.expect("Failed to filter reports");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].product, "other");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_error(pool: PgPool) {
    pool.close().await;

    let result = CrashReportRepo::create(&pool, new_report("app", "1.0", "linux")).await;
    assert!(result.is_err(), "Expected an error with a closed pool");
}
