use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A deduplicated cluster of crash reports believed to share one root
/// cause. Aggregates are updated in place on every matching report.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct Issue {
    pub id: uuid::Uuid,
    pub product: String,
    pub platform: String,
    pub version: String,
    pub reason: String,
    pub location: String,
    /// Count of crash reports clustered into this issue.
    pub total: i64,
    /// Count of clustered reports that carried an uptime. Separate from
    /// `total`: reports without uptime never touch the average.
    pub uptime_count: i64,
    pub avg_uptime: f64,
    pub last_seen: NaiveDateTime,
    pub status: IssueStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, Display, Default, PartialEq, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum IssueStatus {
    #[default]
    #[strum(serialize = "open")]
    Open,
    #[strum(serialize = "resolved")]
    Resolved,
}
