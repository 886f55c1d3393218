//! Tracing setup for the worker process.
//!
//! Everything goes to stderr; stdout is never written, and the protocol
//! descriptors carry frames only.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, LogFormat};

/// Filter directive for a [`LogConfig`]: `RUST_LOG` wins outright, otherwise
/// the configured level applies to this workspace's crates only.
pub fn filter_directive(config: &LogConfig) -> String {
    match &config.rust_log {
        Some(directive) => directive.clone(),
        None => format!(
            "warn,datesift={level},datesift_search={level},datesift_worker={level}",
            level = config.level
        ),
    }
}

/// Initialize tracing. A second call is a no-op.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_new(filter_directive(config)).unwrap_or_else(|e| {
        eprintln!("invalid log filter ({e}), falling back to info");
        EnvFilter::new("info")
    });

    match config.format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr));
            let _ = subscriber.try_init();
        }
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr));
            let _ = subscriber.try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_applies_to_workspace_crates() {
        let config = LogConfig {
            level: "debug",
            ..LogConfig::default()
        };
        assert_eq!(
            filter_directive(&config),
            "warn,datesift=debug,datesift_search=debug,datesift_worker=debug"
        );
    }

    #[test]
    fn rust_log_overrides_level() {
        let config = LogConfig {
            level: "error",
            rust_log: Some("trace".into()),
            format: LogFormat::Json,
        };
        assert_eq!(filter_directive(&config), "trace");
    }
}
