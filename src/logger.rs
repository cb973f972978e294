//! Log setup for the version-gate binary and embedding hosts.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered at `level` ("error", "warn", "info", "debug", "trace").
///
/// `RUST_LOG` takes precedence when set. Calling this twice is harmless: the
/// second install fails quietly and the first subscriber stays active.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("version_gate={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init("debug");
        init("info");
        tracing::info!("logger initialised");
    }
}
