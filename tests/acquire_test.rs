// Integration tests for first-run dataset acquisition.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tokio::net::TcpListener;

use product_analytics::acquire::ensure_dataset;
use product_analytics::{AcquireStage, AppError};

const DATASET_NAME: &str = "products.csv";
const DATASET_BODY: &[u8] = b"asin,stars,categoryName\nB001,4.5,Alpha\n";

/// Build a zip archive in memory containing a single file.
fn build_zip(entry_name: &str, content: &[u8]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file(entry_name, options).unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// Fake dataset provider: serves `body` at /archive.zip and counts requests.
async fn spawn_upstream(body: Vec<u8>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    async fn serve(State((body, hits)): State<(Vec<u8>, Arc<AtomicUsize>)>) -> Vec<u8> {
        hits.fetch_add(1, Ordering::SeqCst);
        body
    }

    let app = Router::new()
        .route("/archive.zip", get(serve))
        .with_state((body, hits.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}/archive.zip", addr), hits)
}

#[tokio::test]
async fn test_first_run_then_idempotent() {
    let (url, hits) = spawn_upstream(build_zip(DATASET_NAME, DATASET_BODY)).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("data").join(DATASET_NAME);

    // First run downloads and extracts.
    ensure_dataset(&url, &target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), DATASET_BODY);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // No residual archive next to the dataset.
    assert!(!dir.path().join("data").join("dataset_download.zip").exists());

    // Second run is a pure existence check: zero network access, file
    // byte-identical.
    ensure_dataset(&url, &target).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(&target).unwrap(), DATASET_BODY);
}

#[tokio::test]
async fn test_unreachable_url_is_fatal_download_error() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("data").join(DATASET_NAME);

    // Port 1 on loopback: connection refused.
    let err = ensure_dataset("http://127.0.0.1:1/archive.zip", &target)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Acquisition {
            stage: AcquireStage::Download,
            ..
        }
    ));
    assert!(err.is_fatal());

    // No partial dataset left that a later run could mistake for complete.
    assert!(!target.exists());
}

#[tokio::test]
async fn test_corrupt_archive_fails_extract_and_cleans_up() {
    let (url, _hits) = spawn_upstream(b"this is not a zip archive".to_vec()).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("data").join(DATASET_NAME);

    let err = ensure_dataset(&url, &target).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Acquisition {
            stage: AcquireStage::Extract,
            ..
        }
    ));

    // The archive is deleted even when extraction fails.
    assert!(!dir.path().join("data").join("dataset_download.zip").exists());
    assert!(!target.exists());
}

#[tokio::test]
async fn test_archive_layout_mismatch_fails_verify() {
    // Archive extracts fine but produces a differently named file.
    let (url, _hits) = spawn_upstream(build_zip("unexpected.csv", DATASET_BODY)).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("data").join(DATASET_NAME);

    let err = ensure_dataset(&url, &target).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Acquisition {
            stage: AcquireStage::Verify,
            ..
        }
    ));

    // Extraction happened, cleanup happened, but the expected file is absent.
    assert!(dir.path().join("data").join("unexpected.csv").exists());
    assert!(!dir.path().join("data").join("dataset_download.zip").exists());
    assert!(!target.exists());
}
