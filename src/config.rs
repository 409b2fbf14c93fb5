use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;

/// Name of the DuckDB table the dataset CSV is registered under.
pub const DATASET_TABLE: &str = "products";

/// Default filesystem location of the dataset CSV.
pub const DEFAULT_DATA_PATH: &str = "data/amz_uk_processed_data.csv";

/// Default archive URL (public Kaggle download endpoint for the dataset).
pub const DEFAULT_DATASET_URL: &str =
    "https://www.kaggle.com/api/v1/datasets/download/asaniczka/amazon-uk-products-dataset-2023";

/// Default listen address and port.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0";
pub const DEFAULT_LISTEN_PORT: u16 = 8501;

/// File name for the in-flight archive download, colocated with the dataset.
pub const ARCHIVE_TMP_NAME: &str = "dataset_download.zip";

/// Top-level application configuration, supplied via environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Absolute or working-dir-relative path of the dataset CSV.
    pub data_path: PathBuf,
    /// HTTPS URL of the zip archive containing the dataset.
    pub dataset_url: String,
    /// Address the HTTP server binds to.
    pub listen_addr: IpAddr,
    /// Port the HTTP server binds to.
    pub listen_port: u16,
}

impl AppConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `DATA_FILE_PATH`, `DATASET_URL`, `LISTEN_ADDR`,
    /// `LISTEN_PORT`.
    pub fn from_env() -> Result<Self, AppError> {
        let data_path = std::env::var("DATA_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        let dataset_url =
            std::env::var("DATASET_URL").unwrap_or_else(|_| DEFAULT_DATASET_URL.to_string());

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse::<IpAddr>()
                .map_err(|e| AppError::Config(format!("LISTEN_ADDR {raw:?}: {e}")))?,
            Err(_) => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(|e| AppError::Config(format!("default listen addr: {e}")))?,
        };

        let listen_port = match std::env::var("LISTEN_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("LISTEN_PORT {raw:?}: {e}")))?,
            Err(_) => DEFAULT_LISTEN_PORT,
        };

        Ok(Self {
            data_path,
            dataset_url,
            listen_addr,
            listen_port,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_LISTEN_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.listen_port, DEFAULT_LISTEN_PORT);
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(cfg.socket_addr().port(), DEFAULT_LISTEN_PORT);
    }
}
