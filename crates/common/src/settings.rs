use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Default)]
pub struct Logger {
    pub directory: String,
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub uri: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost/faultline".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    /// Whether a resolved issue goes back to open when a new matching
    /// crash report arrives. The report is counted either way.
    pub reopen_on_new_report: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            reopen_on_new_report: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    pub logger: Logger,
    pub database: Database,
    #[serde(default)]
    pub engine: Engine,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::default().separator("__"));

        builder.build()?.try_deserialize()
    }
}
