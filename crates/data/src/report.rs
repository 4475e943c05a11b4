use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single reported crash event. Append-only evidence for an issue;
/// never mutated after creation apart from the issue assignment made
/// during ingestion.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct CrashReport {
    pub id: uuid::Uuid,
    pub product: String,
    pub version: String,
    pub platform: String,
    pub crash_reason: String,
    pub crash_location: String,
    /// Seconds the process ran before crashing, when the client reported it.
    pub process_uptime: Option<i32>,
    /// Opaque reference to the raw minidump blob in external storage.
    pub minidump: Option<uuid::Uuid>,
    pub issue_id: Option<uuid::Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewCrashReport {
    /// Caller-supplied idempotency key. A replayed id is not re-counted.
    pub id: Option<uuid::Uuid>,
    pub product: String,
    pub version: String,
    pub platform: String,
    pub crash_reason: String,
    pub crash_location: String,
    pub process_uptime: Option<i32>,
    pub minidump: Option<uuid::Uuid>,
}

/// Grouping key that clusters crash reports into one issue. Exactly one
/// live issue exists per distinct fingerprint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub product: String,
    pub platform: String,
    pub version: String,
    pub reason: String,
    pub location: String,
}

impl CrashReport {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            product: self.product.clone(),
            platform: self.platform.clone(),
            version: self.version.clone(),
            reason: self.crash_reason.clone(),
            location: self.crash_location.clone(),
        }
    }
}

impl NewCrashReport {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            product: self.product.clone(),
            platform: self.platform.clone(),
            version: self.version.clone(),
            reason: self.crash_reason.clone(),
            location: self.crash_location.clone(),
        }
    }
}
