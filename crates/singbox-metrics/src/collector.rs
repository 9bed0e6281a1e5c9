//! Scrape collector: runs one collection cycle per exposition request.
//!
//! Nothing is carried over between scrapes: every call to
//! [`ScrapeCollector::collect`] queries the upstream afresh, maps what it
//! finds to metric samples, and appends the two meta-metrics.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use singbox_stats::{Direction, EntityKey, EntityKind, StatSample, StatsSource};

use crate::filter::EntityFilter;
use crate::sample::{Descriptor, MetricSample};

/// How counters are obtained from the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One `QueryStats` call, then parse and filter every returned name.
    Enumerate,
    /// One `GetStats` call per configured identifier and direction.
    Targeted,
}

impl Strategy {
    /// Enumerate when no allow-list is configured, target otherwise.
    pub fn auto(filter: &EntityFilter) -> Self {
        if filter.is_unrestricted() {
            Self::Enumerate
        } else {
            Self::Targeted
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enumerate => "enumerate",
            Self::Targeted => "targeted",
        }
    }
}

/// Collects traffic counters from a [`StatsSource`].
pub struct ScrapeCollector<S> {
    source: Arc<S>,
    filter: Arc<EntityFilter>,
    strategy: Strategy,
}

impl<S> Clone for ScrapeCollector<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            filter: Arc::clone(&self.filter),
            strategy: self.strategy,
        }
    }
}

/// What one targeted fetch task produced.
#[derive(Debug, Default)]
struct TargetOutcome {
    samples: Vec<MetricSample>,
    queries: usize,
    failures: usize,
}

impl<S: StatsSource> ScrapeCollector<S> {
    /// Create a new collector.
    pub fn new(source: Arc<S>, filter: EntityFilter, strategy: Strategy) -> Self {
        Self {
            source,
            filter: Arc::new(filter),
            strategy,
        }
    }

    /// Run one full scrape.
    ///
    /// Never fails: upstream problems are logged and reflected in the
    /// `scrape_success` gauge. The returned set always ends with exactly one
    /// duration sample and one success sample; the order of the traffic
    /// samples before them is unspecified.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let start = Instant::now();
        let mut samples = Vec::new();

        let success = match self.strategy {
            Strategy::Enumerate => self.collect_enumerated(&mut samples).await,
            Strategy::Targeted => self.collect_targeted(&mut samples).await,
        };

        let duration = start.elapsed();
        debug!(
            strategy = self.strategy.as_str(),
            samples = samples.len(),
            success,
            duration_ms = duration.as_millis() as u64,
            "scrape completed"
        );

        samples.push(MetricSample::gauge(
            Descriptor::ScrapeDuration,
            duration.as_secs_f64(),
        ));
        samples.push(MetricSample::gauge(
            Descriptor::ScrapeSuccess,
            if success { 1.0 } else { 0.0 },
        ));
        samples
    }

    async fn collect_enumerated(&self, out: &mut Vec<MetricSample>) -> bool {
        match self.source.fetch_all().await {
            Ok(stats) => {
                out.extend(map_stats(&stats, &self.filter));
                true
            }
            Err(e) => {
                error!(error = %e, "failed to query stats from sing-box");
                false
            }
        }
    }

    /// Fan out one task per configured identifier and wait for all of them.
    async fn collect_targeted(&self, out: &mut Vec<MetricSample>) -> bool {
        let mut tasks = JoinSet::new();
        for kind in [EntityKind::Inbound, EntityKind::User] {
            for identifier in self.filter.allowed(kind) {
                let source = Arc::clone(&self.source);
                let identifier = identifier.clone();
                tasks.spawn(async move { fetch_entity(source.as_ref(), kind, &identifier).await });
            }
        }

        let mut complete = true;
        let mut queries = 0;
        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    queries += outcome.queries;
                    failures += outcome.failures;
                    out.extend(outcome.samples);
                }
                Err(e) => {
                    error!(error = %e, "stat fetch task did not complete");
                    complete = false;
                }
            }
        }

        let upstream_down = queries > 0 && failures == queries;
        if upstream_down {
            warn!(queries, "every stat query failed");
        }
        complete && !upstream_down
    }
}

/// Query both directions for one entity. Errors and missing stats become 0.
async fn fetch_entity<S: StatsSource>(source: &S, kind: EntityKind, identifier: &str) -> TargetOutcome {
    let (uplink, downlink) = tokio::join!(
        source.fetch_by_key(kind, identifier, Direction::Uplink),
        source.fetch_by_key(kind, identifier, Direction::Downlink),
    );

    let mut outcome = TargetOutcome::default();
    for (direction, result) in [(Direction::Uplink, uplink), (Direction::Downlink, downlink)] {
        outcome.queries += 1;
        let bytes = match result {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%kind, %identifier, %direction, "no traffic recorded yet");
                0
            }
            Err(e) => {
                warn!(%kind, %identifier, %direction, error = %e, "stat query failed");
                outcome.failures += 1;
                0
            }
        };
        outcome
            .samples
            .push(MetricSample::traffic(kind, identifier, direction, bytes));
    }
    outcome
}

/// Map enumerated stats to traffic samples.
///
/// Names that do not parse as user/inbound traffic counters, and entities
/// rejected by `filter`, are skipped.
pub fn map_stats(stats: &[StatSample], filter: &EntityFilter) -> Vec<MetricSample> {
    stats
        .iter()
        .filter_map(|stat| {
            let Some(key) = EntityKey::parse(&stat.name) else {
                trace!(name = %stat.name, "skipping unrecognised stat");
                return None;
            };
            if !filter.accepts(key.kind, &key.identifier) {
                return None;
            }
            Some(MetricSample::traffic(
                key.kind,
                &key.identifier,
                key.direction,
                stat.value,
            ))
        })
        .collect()
}
