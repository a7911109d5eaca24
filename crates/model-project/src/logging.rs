//! Tracing setup for embedders and tests

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a compact `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Thread names are included since every project logs from its own serial
/// worker. Fails if a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_with_default("info")
}

/// Like [`init`], with `default_directive` used when `RUST_LOG` is unset.
pub fn init_with_default(default_directive: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info};

    #[test]
    fn test_logging_init() {
        // Only the first init in a process succeeds
        let _ = init_with_default("debug");
        assert!(init().is_err());

        info!(project = "/work/app", "Loaded project models");
        debug!("Coalesced load request");
    }
}
