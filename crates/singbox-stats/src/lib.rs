//! singbox-stats: client for sing-box's V2Ray-compatible stats API.
//!
//! Provides the gRPC client used to read traffic counters from a running
//! sing-box instance, along with the codec for its stat names.
//!
//! # Architecture
//!
//! ```text
//! StatsSource (trait)
//!   ├── fetch_by_key() → GetStats for one exact stat name
//!   └── fetch_all()    → QueryStats with an empty pattern
//!
//! GrpcStatsClient: StatsSource
//!   └── one tonic Channel, shared by every concurrent call
//!
//! EntityKey
//!   ├── parse()     → "user>>>alice>>>traffic>>>uplink" → (User, "alice", Uplink)
//!   └── stat_name() → the reverse
//! ```

pub mod client;
pub mod error;
pub mod key;
pub mod proto;

pub use client::{DEFAULT_TIMEOUT, GrpcStatsClient, StatSample, StatsSource};
pub use error::{StatsError, StatsResult};
pub use key::{Direction, EntityKey, EntityKind};
