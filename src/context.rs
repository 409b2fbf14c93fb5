// Application context — the process-wide engine handle and query cache,
// constructed once and passed explicitly to every request path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::engine::{Engine, QueryCache, QueryParam, Table};
use crate::error::AppError;

type QueryKey = (String, Vec<QueryParam>);

pub struct AppContext {
    config: AppConfig,
    engine: OnceCell<Arc<Engine>>,
    cache: QueryCache<QueryKey, Table>,
    engine_inits: AtomicUsize,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            engine: OnceCell::new(),
            cache: QueryCache::new(),
            engine_inits: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The shared engine handle, constructed on first call.
    ///
    /// Concurrent first-time callers observe exactly one construction and
    /// all receive the same `Arc`; `OnceCell` guards the initialization.
    /// A failed construction is not sticky, so the next caller retries —
    /// in practice startup invokes this once and aborts on error.
    pub fn engine_handle(&self) -> Result<Arc<Engine>, AppError> {
        self.engine
            .get_or_try_init(|| {
                let engine = Engine::open(&self.config.data_path)?;
                let inits = self.engine_inits.fetch_add(1, Ordering::Relaxed) + 1;
                info!("engine handle constructed (init #{inits})");
                Ok(Arc::new(engine))
            })
            .cloned()
    }

    /// How many times the engine session has been constructed. Stays at 1
    /// for the process lifetime once initialization succeeds.
    pub fn engine_init_count(&self) -> usize {
        self.engine_inits.load(Ordering::Relaxed)
    }

    pub fn engine_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Execute a deterministic SQL template through the memoizing gate.
    ///
    /// Results are keyed by `(sql, params)`; a repeat call with the same key
    /// returns the stored table without touching the engine. Failures are
    /// never cached.
    pub async fn cached_query(
        &self,
        sql: &str,
        params: &[QueryParam],
    ) -> Result<Arc<Table>, AppError> {
        let engine = self.engine_handle()?;
        let key = (sql.to_string(), params.to_vec());
        let sql = sql.to_string();
        let params = params.to_vec();
        self.cache
            .get_or_compute(key, || async move {
                tokio::task::spawn_blocking(move || engine.query(&sql, &params))
                    .await
                    .map_err(|e| AppError::Internal(format!("query task failed: {e}")))?
            })
            .await
    }

    /// Execute SQL directly, bypassing the cache. Used by the free-form
    /// explorer, whose key space is unbounded user input.
    pub async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<Table, AppError> {
        let engine = self.engine_handle()?;
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || engine.query(&sql, &params))
            .await
            .map_err(|e| AppError::Internal(format!("query task failed: {e}")))?
    }

    pub fn cache_stats(&self) -> crate::engine::CacheStats {
        self.cache.stats()
    }
}
