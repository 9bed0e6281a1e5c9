//! Stats client: the exporter's view of the upstream stats API.
//!
//! `StatsSource` is the capability the scrape collector depends on.
//! `GrpcStatsClient` implements it against sing-box's V2Ray-compatible
//! `StatsService` over a single long-lived tonic channel.

use std::future::Future;
use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, info};

use crate::error::{StatsError, StatsResult};
use crate::key::{self, Direction, EntityKind};
use crate::proto;
use crate::proto::stats_service_client::StatsServiceClient;

/// Default bound for connection setup and for each call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A raw counter as returned by the upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSample {
    pub name: String,
    pub value: i64,
}

impl StatSample {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl From<proto::Stat> for StatSample {
    fn from(stat: proto::Stat) -> Self {
        Self {
            name: stat.name,
            value: stat.value,
        }
    }
}

/// Source of traffic counters.
///
/// Implementations must be safe to call concurrently from many tasks.
pub trait StatsSource: Send + Sync + 'static {
    /// Look up one counter by its exact key.
    ///
    /// Returns `Ok(None)` when the upstream has no such counter yet.
    fn fetch_by_key(
        &self,
        kind: EntityKind,
        identifier: &str,
        direction: Direction,
    ) -> impl Future<Output = StatsResult<Option<i64>>> + Send;

    /// Enumerate every counter the upstream currently tracks.
    fn fetch_all(&self) -> impl Future<Output = StatsResult<Vec<StatSample>>> + Send;
}

/// gRPC-backed stats client.
#[derive(Debug, Clone)]
pub struct GrpcStatsClient {
    client: StatsServiceClient<Channel>,
    timeout: Duration,
}

impl GrpcStatsClient {
    /// Connect to the stats API at `addr` (`host:port` or a full URI).
    ///
    /// Connection setup is bounded by `timeout`, which also bounds every
    /// subsequent call.
    pub async fn connect(addr: &str, timeout: Duration) -> StatsResult<Self> {
        let uri = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let connection_error = |reason: String| StatsError::Connection {
            addr: addr.to_string(),
            reason,
        };

        let endpoint = Endpoint::from_shared(uri)
            .map_err(|e| connection_error(format!("invalid endpoint: {e}")))?
            .connect_timeout(timeout)
            .timeout(timeout);

        let channel = tokio::time::timeout(timeout, endpoint.connect())
            .await
            .map_err(|_| connection_error(format!("timed out after {timeout:?}")))?
            .map_err(|e| connection_error(e.to_string()))?;

        info!(%addr, ?timeout, "connected to stats api");
        Ok(Self::from_channel(channel, timeout))
    }

    /// Wrap an already established channel.
    pub fn from_channel(channel: Channel, timeout: Duration) -> Self {
        Self {
            client: StatsServiceClient::new(channel),
            timeout,
        }
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.timeout);
        request
    }
}

impl StatsSource for GrpcStatsClient {
    async fn fetch_by_key(
        &self,
        kind: EntityKind,
        identifier: &str,
        direction: Direction,
    ) -> StatsResult<Option<i64>> {
        let name = key::stat_name(kind, identifier, direction);
        let request = self.request(proto::GetStatsRequest {
            name: name.clone(),
            reset: false,
        });

        // Channel clones share the underlying connection.
        let mut client = self.client.clone();
        let result = tokio::time::timeout(self.timeout, client.get_stats(request))
            .await
            .map_err(|_| {
                StatsError::unavailable(format!("GetStats {name}"), "deadline exceeded")
            })?;

        match result {
            Ok(response) => Ok(response.into_inner().stat.map(|s| s.value)),
            Err(status) if is_not_found(&status) => {
                debug!(%name, "stat not present upstream");
                Ok(None)
            }
            Err(status) => Err(StatsError::unavailable(format!("GetStats {name}"), status)),
        }
    }

    async fn fetch_all(&self) -> StatsResult<Vec<StatSample>> {
        let request = self.request(proto::QueryStatsRequest {
            pattern: String::new(),
            reset: false,
            patterns: Vec::new(),
            regexp: false,
        });

        let mut client = self.client.clone();
        let response = tokio::time::timeout(self.timeout, client.query_stats(request))
            .await
            .map_err(|_| StatsError::unavailable("QueryStats", "deadline exceeded"))?
            .map_err(|status| StatsError::unavailable("QueryStats", status))?;

        let stats: Vec<StatSample> = response
            .into_inner()
            .stat
            .into_iter()
            .map(StatSample::from)
            .collect();
        debug!(count = stats.len(), "fetched stats from upstream");
        Ok(stats)
    }
}

/// sing-box and v2ray report a missing counter as a plain error whose
/// message ends in "not found".
fn is_not_found(status: &Status) -> bool {
    status.code() == Code::NotFound || status.message().contains("not found")
}
