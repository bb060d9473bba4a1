use tracing_appender::{non_blocking::WorkerGuard, rolling::Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{ConfigError, LoggingConfig};

pub fn init_tracing_log(config: &LoggingConfig) -> Result<WorkerGuard, ConfigError> {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_thread_ids(false)
        .with_target(true)
        .compact();

    let log_level = log_level_from_env(std::env::var("RUST_LOG").ok().as_deref())?;

    match config {
        LoggingConfig::Console => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            let layer = tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .with_filter(get_crate_filter(log_level));

            tracing_subscriber::registry().with(layer).init();
            Ok(guard)
        }

        LoggingConfig::File { dir_path, file_name } => {
            let file_appender = tracing_appender::rolling::Builder::new()
                .filename_prefix(file_name)
                .max_log_files(14)
                .rotation(Rotation::DAILY)
                .build(dir_path)
                .map_err(|err| ConfigError::Logging(err.to_string()))?;

            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .with_filter(get_crate_filter(log_level));

            tracing_subscriber::registry().with(layer).init();
            Ok(guard)
        }
    }
}

fn log_level_from_env(rust_log: Option<&str>) -> Result<tracing::Level, ConfigError> {
    match rust_log {
        Some(level) => level
            .parse()
            .map_err(|_| ConfigError::Logging(format!("invalid RUST_LOG {level}, change to eg 'info'"))),
        None => Ok(tracing::Level::INFO),
    }
}

const CRATES: &[&str] = &["beacon", "common", "database", "execution", "types", "verifier"];

fn get_crate_filter(crates_level: tracing::Level) -> EnvFilter {
    let mut env_filter = EnvFilter::new("info");

    for directive in CRATES
        .iter()
        .map(|crate_name| format!("payloadscan_{crate_name}={crates_level}"))
        .chain(std::iter::once(format!("payloadscan={crates_level}")))
    {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    env_filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_env() {
        assert_eq!(log_level_from_env(None).unwrap(), tracing::Level::INFO);
        assert_eq!(log_level_from_env(Some("debug")).unwrap(), tracing::Level::DEBUG);
        assert!(matches!(log_level_from_env(Some("chatty")), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_crate_filter() {
        let filter = get_crate_filter(tracing::Level::DEBUG).to_string().to_lowercase();
        assert!(filter.contains("payloadscan_verifier=debug"));
        assert!(filter.contains("payloadscan=debug"));
    }
}
