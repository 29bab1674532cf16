//! Logging setup for the bot
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and everything else logs at `info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogFormat;

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(log_level: &str) -> String {
    format!("collicasa_bot={},info", log_level)
}

/// Install the global tracing subscriber.
pub fn init(log_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(log_level).into());

    let fmt_layer = match format {
        LogFormat::Pretty => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .json()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_parses() {
        let directive = default_directive("debug");
        assert_eq!(directive, "collicasa_bot=debug,info");
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
