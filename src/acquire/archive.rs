use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use zip::ZipArchive;

/// Extract every entry of the zip at `archive_path` into `target_dir`.
///
/// Blocking; callers run this on a blocking task. A truncated or corrupt
/// archive fails here (the zip central directory lives at the end of the
/// file, so a short download cannot open cleanly).
pub fn extract_all(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("open archive {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("read archive {}", archive_path.display()))?;

    let entries = archive.len();
    archive
        .extract(target_dir)
        .with_context(|| format!("extract into {}", target_dir.display()))?;

    info!(
        "extracted {} entries from {} into {}",
        entries,
        archive_path.display(),
        target_dir.display()
    );
    Ok(())
}
