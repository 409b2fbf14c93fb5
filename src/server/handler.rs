// Axum request handlers — reports, SQL explorer, and operational endpoints
// over the shared application context.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, error};

use super::reports;
use crate::context::AppContext;
use crate::engine::{CacheStats, QueryParam, Table};
use crate::error::AppError;

pub struct AppServer {
    addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl AppServer {
    /// Bind `bind_addr` and start serving in a background task.
    pub async fn start(ctx: Arc<AppContext>, bind_addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = router(ctx);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down the server gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(health_handler))
        .route("/api/reports", get(list_reports_handler))
        .route("/api/reports/{name}", get(run_report_handler))
        .route("/api/query", post(explorer_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(ctx)
}

#[derive(Debug, Serialize)]
struct TableResponse {
    columns: Vec<String>,
    rows: Vec<Vec<crate::engine::CellValue>>,
    row_count: usize,
    elapsed_ms: u128,
}

impl TableResponse {
    fn from_table(table: &Table, elapsed_ms: u128) -> Self {
        Self {
            columns: table.columns.clone(),
            rows: table.rows.clone(),
            row_count: table.row_count(),
            elapsed_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Map an application error to a response scoped to the failing request.
/// Query failures are the caller's problem (400); unavailable or corrupt
/// data means the whole process is degraded (503).
fn error_response(err: &AppError) -> Response {
    let status = match err {
        AppError::Query(_) => StatusCode::BAD_REQUEST,
        AppError::DataUnavailable { .. } | AppError::DataCorrupt { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AppError::Acquisition { .. } | AppError::Config(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("request failed: {err}");
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn list_reports_handler() -> Json<&'static [reports::ReportDef]> {
    Json(reports::REPORTS)
}

/// GET /api/reports/{name} — execute one canned report through the cache.
async fn run_report_handler(
    State(ctx): State<Arc<AppContext>>,
    Path(name): Path<String>,
) -> Response {
    let Some(report) = reports::find(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("unknown report: {name}"),
            }),
        )
            .into_response();
    };

    let t0 = Instant::now();
    match ctx.cached_query(report.sql, &[]).await {
        Ok(table) => {
            let elapsed = t0.elapsed().as_millis();
            debug!(
                "report {} served, {} rows, elapsed_ms={}",
                name,
                table.row_count(),
                elapsed
            );
            Json(TableResponse::from_table(&table, elapsed)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    sql: String,
    #[serde(default)]
    params: Vec<QueryParam>,
}

/// POST /api/query — free-form SQL explorer. Uncached: the key space is
/// arbitrary user input.
async fn explorer_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<QueryRequest>,
) -> Response {
    if req.sql.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "empty SQL query".to_string(),
            }),
        )
            .into_response();
    }

    let t0 = Instant::now();
    match ctx.query(&req.sql, &req.params).await {
        Ok(table) => {
            let elapsed = t0.elapsed().as_millis();
            debug!(
                "explorer query served, {} rows, elapsed_ms={}",
                table.row_count(),
                elapsed
            );
            Json(TableResponse::from_table(&table, elapsed)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    cache: CacheStats,
    engine_ready: bool,
    dataset_path: String,
}

async fn stats_handler(State(ctx): State<Arc<AppContext>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: ctx.cache_stats(),
        engine_ready: ctx.engine_ready(),
        dataset_path: ctx.config().data_path.display().to_string(),
    })
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Amazon UK Product Analysis</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; padding: 0 1rem; }
h1 { font-size: 1.4rem; }
textarea { width: 100%; height: 8rem; font-family: monospace; }
table { border-collapse: collapse; margin-top: 1rem; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.5rem; font-size: 0.85rem; text-align: left; }
th { background: #f0f0f0; }
.error { color: #b00020; margin-top: 1rem; }
button, select { margin-top: 0.5rem; padding: 0.3rem 0.8rem; }
section { margin-bottom: 2rem; }
</style>
</head>
<body>
<h1>Amazon UK Product Data Analysis</h1>

<section>
<h2>Pre-built Reports</h2>
<select id="report"><option value="">Select a report</option></select>
<button onclick="runReport()">Run</button>
<div id="report-out"></div>
</section>

<section>
<h2>SQL Explorer</h2>
<p>The dataset is loaded into a table named <code>products</code>.</p>
<textarea id="sql">SELECT * FROM products LIMIT 10;</textarea><br>
<button onclick="runQuery()">Execute Query</button>
<div id="query-out"></div>
</section>

<script>
async function loadReports() {
  const reports = await (await fetch('/api/reports')).json();
  const sel = document.getElementById('report');
  for (const r of reports) {
    const opt = document.createElement('option');
    opt.value = r.name;
    opt.textContent = r.title;
    sel.appendChild(opt);
  }
}
function renderTable(el, data) {
  if (data.error) { el.innerHTML = '<p class="error">' + data.error + '</p>'; return; }
  let html = '<p>' + data.row_count + ' rows (' + data.elapsed_ms + ' ms)</p><table><tr>';
  for (const c of data.columns) html += '<th>' + c + '</th>';
  html += '</tr>';
  for (const row of data.rows.slice(0, 200)) {
    html += '<tr>' + row.map(v => '<td>' + (v === null ? '' : v) + '</td>').join('') + '</tr>';
  }
  el.innerHTML = html + '</table>';
}
async function runReport() {
  const name = document.getElementById('report').value;
  if (!name) return;
  const resp = await fetch('/api/reports/' + name);
  renderTable(document.getElementById('report-out'), await resp.json());
}
async function runQuery() {
  const sql = document.getElementById('sql').value;
  const resp = await fetch('/api/query', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({sql})
  });
  renderTable(document.getElementById('query-out'), await resp.json());
}
loadReports();
</script>
</body>
</html>
"#;
