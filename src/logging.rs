use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a global fmt subscriber for the crate's diagnostics.
///
/// The core only emits `tracing` events and never writes to stdout itself.
/// Binaries and tests that want the events rendered call this once at
/// startup; `RUST_LOG` controls the filter and defaults to `info`.
pub fn setup_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
