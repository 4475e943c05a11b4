use tracing_subscriber::EnvFilter;

use crate::settings::Logger;

/// Install the global subscriber from the logger settings. `RUST_LOG`
/// overrides the configured level; an empty directory logs to stdout.
pub fn init_logging(logger: &Logger) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.level.clone()));

    if logger.directory.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
    } else {
        let appender = tracing_appender::rolling::daily(&logger.directory, "faultline.log");
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(appender)
            .with_ansi(false)
            .init();
    }
}
