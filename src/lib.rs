// Analytics server over a static product dataset: idempotent first-run
// acquisition, one shared embedded DuckDB session, memoized reports, and a
// free-form SQL explorer.

pub mod acquire;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod server;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AcquireStage, AppError};
