// Analytical engine — shared DuckDB handle, result tables, and memoization.

pub mod handle;
pub mod memo;
pub mod table;

pub use handle::Engine;
pub use memo::{CacheStats, QueryCache};
pub use table::{CellValue, QueryParam, Table};
