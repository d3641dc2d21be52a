// src/logging.rs
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(default_level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
