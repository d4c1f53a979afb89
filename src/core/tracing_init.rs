use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Whether the pretty console layer is used instead of JSON lines
pub fn wants_console(config: &LoggingConfig) -> bool {
    config.console || config.format == "console"
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    if wants_console(config) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_line_number(true)
                    .with_thread_names(true)
            )
            .try_init()
            .context("Failed to install console tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
            )
            .try_init()
            .context("Failed to install JSON tracing subscriber")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_selection() {
        let mut config = LoggingConfig::default();
        assert!(!wants_console(&config));

        config.format = "console".to_string();
        assert!(wants_console(&config));

        config.format = "json".to_string();
        config.console = true;
        assert!(wants_console(&config));
    }
}
