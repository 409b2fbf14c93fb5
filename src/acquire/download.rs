use std::path::Path;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Download `url` to `dest`, streaming the body to disk chunk by chunk so
/// large archives never sit fully in memory.
pub async fn download_to_file(url: &str, dest: &Path) -> Result<()> {
    let client = Client::new();
    let mut resp = client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("download failed: HTTP {}", status.as_u16()));
    }

    let content_length = resp.content_length().unwrap_or(0);
    debug!(
        "downloading {} ({} bytes) to {}",
        url,
        content_length,
        dest.display()
    );

    let mut file = File::create(dest).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if content_length > 0 && written != content_length {
        return Err(anyhow!(
            "download truncated: got {} of {} bytes",
            written,
            content_length
        ));
    }

    debug!("downloaded {} bytes to {}", written, dest.display());
    Ok(())
}
