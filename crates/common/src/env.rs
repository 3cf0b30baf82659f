//! Environment/runtime helpers
//!
//! Sanity checks to ensure the data directory exists at startup.

use std::path::Path;

use tracing::warn;

/// Create the data directory if needed; warn when the static language file is absent.
pub async fn ensure_env(data_dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    let lang = data_dir.join("lang.json");
    if tokio::fs::metadata(&lang).await.is_err() {
        warn!(path = %lang.display(), "language file not found; /api/lang will serve an empty object");
    }
    Ok(())
}
