//! singbox-exporter: HTTP surface of the sing-box Prometheus exporter.
//!
//! Every request to the metrics path runs one scrape against the stats
//! API and renders the result. Upstream failures never turn into HTTP
//! errors; they show up as `singbox_exporter_scrape_success 0`.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the metrics path |
//! | GET | `/metrics` (configurable) | Prometheus exposition |

pub mod config;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use tracing::trace;

use singbox_metrics::{CONTENT_TYPE, ScrapeCollector, render_prometheus};
use singbox_stats::StatsSource;

pub use config::{Args, ExporterConfig, LogFormat, QueryMode};

/// Shared state for the HTTP handlers.
pub struct AppState<S> {
    pub collector: ScrapeCollector<S>,
    pub metrics_path: Arc<str>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            metrics_path: Arc::clone(&self.metrics_path),
        }
    }
}

/// Build the exporter router.
///
/// `metrics_path` must start with `/` and must not be `/` itself;
/// [`ExporterConfig::validate`] checks both.
pub fn build_router<S: StatsSource>(collector: ScrapeCollector<S>, metrics_path: &str) -> Router {
    let state = AppState {
        collector,
        metrics_path: Arc::from(metrics_path),
    };

    Router::new()
        .route("/", get(landing_page::<S>))
        .route(metrics_path, get(prometheus_metrics::<S>))
        .with_state(state)
}

/// GET /metrics
pub async fn prometheus_metrics<S: StatsSource>(State(state): State<AppState<S>>) -> impl IntoResponse {
    trace!("scrape requested");
    let samples = state.collector.collect().await;
    (
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_prometheus(&samples),
    )
}

/// GET /
pub async fn landing_page<S: StatsSource>(State(state): State<AppState<S>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Sing-box Exporter</title></head>\n\
         <body>\n\
         <h1>Sing-box Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.metrics_path
    ))
}
