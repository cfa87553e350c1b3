//! Logging utilities for the PayBridge service.
//!
//! Every crate logs through the `tracing` macros; this module owns the one
//! place where the subscriber is installed.

use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured; `level` is added for the PayBridge
/// crates and for `tower_http` request spans. Calling this more than once is
/// harmless: only the first subscriber is installed.
///
/// # Examples
///
/// ```
/// use paybridge_common::logging;
/// use tracing::Level;
///
/// logging::init_with_level(Level::INFO);
/// ```
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    for target in ["paybridge", "tower_http"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Parses a level name from configuration, falling back to INFO.
pub fn parse_level(name: &str) -> Level {
    match name.parse::<Level>() {
        Ok(level) => level,
        Err(_) => {
            warn!("Unknown log level '{}', using info", name);
            Level::INFO
        }
    }
}
