pub mod error;
pub mod ingest;
pub mod timeseries;
pub mod triage;

use repos::Repo;

use common::settings::Engine as EngineSettings;

/// Crash clustering and analytics engine. Holds nothing but the store
/// handle and its settings; every call is an independent unit of work
/// bounded by store latency.
#[derive(Debug, Clone)]
pub struct CrashEngine {
    repo: Repo,
    reopen_on_new_report: bool,
}

impl CrashEngine {
    pub fn new(repo: Repo, settings: &EngineSettings) -> Self {
        Self {
            repo,
            reopen_on_new_report: settings.reopen_on_new_report,
        }
    }
}
