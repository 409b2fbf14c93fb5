// Dataset acquisition — idempotent first-run download, extraction, and cleanup.

mod archive;
mod download;

use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::config::ARCHIVE_TMP_NAME;
use crate::error::{AcquireStage, AppError};

pub use download::download_to_file;

/// Ensure the dataset file exists at `target_path`, downloading and
/// extracting the archive on first run only.
///
/// Idempotent and safe to invoke on every process start: when the file is
/// already present this returns immediately without touching the network.
/// Any failure is fatal for startup; rerunning the process re-evaluates the
/// existence check, so a container restart is the retry mechanism.
pub async fn ensure_dataset(url: &str, target_path: &Path) -> Result<(), AppError> {
    if target_path.is_file() {
        info!("dataset already present at {}", target_path.display());
        return Ok(());
    }

    let target_dir = target_path.parent().ok_or_else(|| {
        AppError::acquisition(
            AcquireStage::Download,
            format!("dataset path {} has no parent directory", target_path.display()),
        )
    })?;

    fs::create_dir_all(target_dir)
        .await
        .map_err(|e| AppError::acquisition(AcquireStage::Download, e))?;

    let archive_path = target_dir.join(ARCHIVE_TMP_NAME);
    info!(
        "dataset missing, downloading {} to {}",
        url,
        archive_path.display()
    );

    if let Err(e) = download_to_file(url, &archive_path).await {
        // Leave no partial archive behind on a failed download.
        let _ = fs::remove_file(&archive_path).await;
        return Err(AppError::acquisition(AcquireStage::Download, e));
    }

    let extract_result = {
        let archive = archive_path.clone();
        let dir = target_dir.to_path_buf();
        tokio::task::spawn_blocking(move || archive::extract_all(&archive, &dir))
            .await
            .map_err(|e| AppError::acquisition(AcquireStage::Extract, e))?
    };

    // The archive is transient regardless of how extraction went.
    if let Err(e) = fs::remove_file(&archive_path).await {
        warn!("failed to remove archive {}: {}", archive_path.display(), e);
    }

    extract_result.map_err(|e| AppError::acquisition(AcquireStage::Extract, e))?;

    // The archive layout is outside our control; confirm it actually produced
    // the file the engine will look for, otherwise every restart would
    // re-download and fail the same way.
    if !target_path.is_file() {
        return Err(AppError::acquisition(
            AcquireStage::Verify,
            format!(
                "archive extracted but expected dataset file {} was not produced",
                target_path.display()
            ),
        ));
    }

    let size = fs::metadata(target_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    info!(
        "dataset acquired: {} ({} bytes)",
        target_path.display(),
        size
    );

    Ok(())
}
