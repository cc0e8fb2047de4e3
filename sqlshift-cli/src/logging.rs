//! Log output for migration binaries.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` when set, otherwise `default_directive`
/// (for example `"info"` or `"sqlshift=debug,info"`).
pub fn init(default_directive: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
}
