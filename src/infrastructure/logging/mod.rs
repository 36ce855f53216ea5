// Logging module - Server console output
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Default filter, `verbose` raises the crate level to debug
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sockshell=debug,warn")
        } else {
            EnvFilter::new("sockshell=info,warn")
        }
    })
}

/// Initialize logging system
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_line_number(verbose)
        )
        .try_init()?;

    tracing::debug!("SockShell logging system initialized");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init() {
        // A second call must not panic, only report the existing subscriber
        let _ = init_logging(false);
        assert!(init_logging(true).is_err());
        tracing::info!("logging still works");
    }
}
