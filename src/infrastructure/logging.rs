use std::{io, path::Path};

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::env::LoggingConfig;

const LOG_FILE_PREFIX: &str = "spam-sieve.log";
const DEFAULT_DIRECTIVE: &str = "info";

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Console output goes to stderr; stdout carries the classification results.
/// The file layer rolls daily under `logs_dir`.
pub fn init_tracing(logging: &LoggingConfig, logs_dir: &Path) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let (env_filter, rejected) = build_filter(std::env::var("RUST_LOG").ok(), &logging.level);

        let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = GUARD.set(guard);

        let console_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_ansi(true);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        if let Some(directive) = rejected {
            tracing::warn!(target: "logging", %directive, fallback = DEFAULT_DIRECTIVE, "ignoring invalid log filter");
        }
        tracing::info!(target: "logging", logs = %logs_dir.display(), file = LOG_FILE_PREFIX, "tracing initialized");
        Ok(())
    })?;
    Ok(())
}

/// `RUST_LOG` wins over `LOG_LEVEL`. Returns the first directive that failed
/// to parse, so it can be reported once the subscriber is up.
fn build_filter(rust_log: Option<String>, level: &str) -> (EnvFilter, Option<String>) {
    let mut rejected = None;
    for directive in rust_log.iter().map(String::as_str).chain([level]) {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return (filter, rejected),
            Err(_) => {
                rejected.get_or_insert_with(|| directive.to_string());
            }
        }
    }
    (EnvFilter::new(DEFAULT_DIRECTIVE), rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_configured_level() {
        let (filter, rejected) = build_filter(Some("debug".into()), "warn");
        assert_eq!(filter.to_string(), "debug");
        assert_eq!(rejected, None);
    }

    #[test]
    fn configured_level_applies_without_rust_log() {
        let (filter, rejected) = build_filter(None, "table=debug,info");
        assert!(filter.to_string().contains("table=debug"));
        assert_eq!(rejected, None);
    }

    #[test]
    fn invalid_directives_fall_back_and_are_reported() {
        let (filter, rejected) = build_filter(Some("app=loud".into()), "table=noisy");
        assert_eq!(filter.to_string(), DEFAULT_DIRECTIVE);
        assert_eq!(rejected.as_deref(), Some("app=loud"));
    }
}
