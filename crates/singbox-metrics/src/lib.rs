//! singbox-metrics: scrape collection for the sing-box exporter.
//!
//! Turns sing-box traffic counters into Prometheus metrics. Each scrape is
//! a fresh, stateless collection cycle against a [`StatsSource`].
//!
//! # Architecture
//!
//! ```text
//! ScrapeCollector
//!   ├── Strategy::Enumerate → fetch_all() → parse → EntityFilter → samples
//!   ├── Strategy::Targeted  → fetch_by_key() per identifier (JoinSet fan-out)
//!   └── always appends scrape_duration_seconds + scrape_success
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the metrics endpoint
//! ```
//!
//! [`StatsSource`]: singbox_stats::StatsSource

pub mod collector;
pub mod filter;
pub mod prometheus;
pub mod sample;

pub use collector::{ScrapeCollector, Strategy, map_stats};
pub use filter::EntityFilter;
pub use prometheus::{CONTENT_TYPE, render_prometheus};
pub use sample::{Descriptor, MetricKind, MetricSample};
