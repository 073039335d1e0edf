//! Tracing subscriber setup for the CLI

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging; `RUST_LOG` overrides the default level
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "salesforge=debug" } else { "salesforge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_keeps_first_subscriber() {
        init_logging(false);
        init_logging(true);
        tracing::info!("still logging");
    }
}
