//! GrpcStatsClient against an in-process StatsService.
//!
//! The server is the generated `stats_service_server` mounted on a tonic
//! transport bound to an ephemeral loopback port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::server::NamedService;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use singbox_stats::proto::stats_service_server::{StatsService, StatsServiceServer};
use singbox_stats::proto::{
    GetStatsRequest, GetStatsResponse, QueryStatsRequest, QueryStatsResponse, Stat,
};
use singbox_stats::{Direction, EntityKind, GrpcStatsClient, StatSample, StatsError, StatsSource};

/// Calls seen by the server: `(method, reset)`.
type CallLog = Arc<Mutex<Vec<(&'static str, bool)>>>;

struct FakeStatsService {
    stats: HashMap<String, i64>,
    delay: Duration,
    calls: CallLog,
}

impl FakeStatsService {
    fn new(stats: &[(&str, i64)]) -> (Self, CallLog) {
        let calls = CallLog::default();
        let service = Self {
            stats: stats.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            delay: Duration::ZERO,
            calls: Arc::clone(&calls),
        };
        (service, calls)
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn record(&self, method: &'static str, reset: bool) {
        self.calls.lock().unwrap().push((method, reset));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[tonic::async_trait]
impl StatsService for FakeStatsService {
    async fn get_stats(
        &self,
        request: Request<GetStatsRequest>,
    ) -> Result<Response<GetStatsResponse>, Status> {
        let req = request.into_inner();
        self.record("GetStats", req.reset).await;

        // sing-box answers a missing counter with a plain error.
        let value = self
            .stats
            .get(&req.name)
            .ok_or_else(|| Status::unknown(format!("{} not found.", req.name)))?;
        Ok(Response::new(GetStatsResponse {
            stat: Some(Stat {
                name: req.name,
                value: *value,
            }),
        }))
    }

    async fn query_stats(
        &self,
        request: Request<QueryStatsRequest>,
    ) -> Result<Response<QueryStatsResponse>, Status> {
        let req = request.into_inner();
        self.record("QueryStats", req.reset).await;

        if !req.pattern.is_empty() || !req.patterns.is_empty() {
            return Err(Status::invalid_argument("expected an empty pattern"));
        }
        let stat = self
            .stats
            .iter()
            .map(|(name, value)| Stat {
                name: name.clone(),
                value: *value,
            })
            .collect();
        Ok(Response::new(QueryStatsResponse { stat }))
    }
}

async fn serve(service: FakeStatsService) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        Server::builder()
            .add_service(StatsServiceServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    addr.to_string()
}

const STATS: &[(&str, i64)] = &[
    ("user>>>alice>>>traffic>>>uplink", 100),
    ("user>>>alice>>>traffic>>>downlink", 2048),
    ("inbound>>>main>>>traffic>>>uplink", 7),
];

#[test]
fn service_name_matches_v2ray_api() {
    assert_eq!(
        <StatsServiceServer<FakeStatsService> as NamedService>::NAME,
        "v2ray.core.app.stats.command.StatsService"
    );
}

#[tokio::test]
async fn fetch_by_key_hit_and_miss() {
    let (service, calls) = FakeStatsService::new(STATS);
    let addr = serve(service).await;
    let client = GrpcStatsClient::connect(&addr, Duration::from_secs(5))
        .await
        .unwrap();

    let hit = client
        .fetch_by_key(EntityKind::User, "alice", Direction::Uplink)
        .await
        .unwrap();
    assert_eq!(hit, Some(100));

    let miss = client
        .fetch_by_key(EntityKind::Inbound, "relay", Direction::Downlink)
        .await
        .unwrap();
    assert_eq!(miss, None);

    assert_eq!(
        *calls.lock().unwrap(),
        vec![("GetStats", false), ("GetStats", false)]
    );
}

#[tokio::test]
async fn fetch_all_enumerates_every_counter() {
    let (service, calls) = FakeStatsService::new(STATS);
    let addr = serve(service).await;
    let client = GrpcStatsClient::connect(&addr, Duration::from_secs(5))
        .await
        .unwrap();

    let mut all = client.fetch_all().await.unwrap();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(
        all,
        vec![
            StatSample::new("inbound>>>main>>>traffic>>>uplink", 7),
            StatSample::new("user>>>alice>>>traffic>>>downlink", 2048),
            StatSample::new("user>>>alice>>>traffic>>>uplink", 100),
        ]
    );
    assert_eq!(*calls.lock().unwrap(), vec![("QueryStats", false)]);
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let (service, calls) = FakeStatsService::new(STATS);
    let addr = serve(service).await;
    let client = GrpcStatsClient::connect(&addr, Duration::from_secs(5))
        .await
        .unwrap();

    let (up, down, all) = tokio::join!(
        client.fetch_by_key(EntityKind::User, "alice", Direction::Uplink),
        client.fetch_by_key(EntityKind::User, "alice", Direction::Downlink),
        client.fetch_all(),
    );
    assert_eq!(up.unwrap(), Some(100));
    assert_eq!(down.unwrap(), Some(2048));
    assert_eq!(all.unwrap().len(), 3);
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn slow_upstream_hits_the_call_deadline() {
    let (service, _calls) = FakeStatsService::new(STATS);
    let addr = serve(service.slow(Duration::from_secs(10))).await;
    let timeout = Duration::from_millis(500);
    let client = GrpcStatsClient::connect(&addr, timeout).await.unwrap();

    let start = Instant::now();
    let err = client.fetch_all().await.unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
    assert!(matches!(err, StatsError::Unavailable { ref call, .. } if call == "QueryStats"));

    let err = client
        .fetch_by_key(EntityKind::User, "alice", Direction::Uplink)
        .await
        .unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
    assert!(start.elapsed() < Duration::from_secs(5));
}
