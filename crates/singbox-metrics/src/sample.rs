//! Metric descriptors and samples produced by a scrape.

use std::collections::BTreeMap;

use singbox_stats::{Direction, EntityKind};

/// Prefix for every exported metric name.
pub const NAMESPACE: &str = "singbox";

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        }
    }
}

/// The fixed set of metric families the exporter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Descriptor {
    InboundUplink,
    InboundDownlink,
    UserUplink,
    UserDownlink,
    ScrapeDuration,
    ScrapeSuccess,
}

impl Descriptor {
    /// All descriptors in exposition order.
    pub const ALL: [Descriptor; 6] = [
        Descriptor::InboundUplink,
        Descriptor::InboundDownlink,
        Descriptor::UserUplink,
        Descriptor::UserDownlink,
        Descriptor::ScrapeDuration,
        Descriptor::ScrapeSuccess,
    ];

    /// Traffic descriptor for a parsed stat key.
    pub fn traffic(kind: EntityKind, direction: Direction) -> Self {
        match (kind, direction) {
            (EntityKind::Inbound, Direction::Uplink) => Self::InboundUplink,
            (EntityKind::Inbound, Direction::Downlink) => Self::InboundDownlink,
            (EntityKind::User, Direction::Uplink) => Self::UserUplink,
            (EntityKind::User, Direction::Downlink) => Self::UserDownlink,
        }
    }

    /// Fully qualified metric name.
    pub fn name(self) -> &'static str {
        match self {
            Self::InboundUplink => "singbox_inbound_traffic_uplink_bytes",
            Self::InboundDownlink => "singbox_inbound_traffic_downlink_bytes",
            Self::UserUplink => "singbox_user_traffic_uplink_bytes",
            Self::UserDownlink => "singbox_user_traffic_downlink_bytes",
            Self::ScrapeDuration => "singbox_exporter_scrape_duration_seconds",
            Self::ScrapeSuccess => "singbox_exporter_scrape_success",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::InboundUplink => "Uplink traffic for an inbound",
            Self::InboundDownlink => "Downlink traffic for an inbound",
            Self::UserUplink => "Uplink traffic for a user",
            Self::UserDownlink => "Downlink traffic for a user",
            Self::ScrapeDuration => "Duration of the scrape",
            Self::ScrapeSuccess => "Whether the scrape was successful",
        }
    }

    pub fn kind(self) -> MetricKind {
        match self {
            Self::ScrapeDuration | Self::ScrapeSuccess => MetricKind::Gauge,
            _ => MetricKind::Counter,
        }
    }

    /// The single label a traffic counter carries, if any.
    pub fn label_key(self) -> Option<&'static str> {
        match self {
            Self::InboundUplink | Self::InboundDownlink => Some(EntityKind::Inbound.as_str()),
            Self::UserUplink | Self::UserDownlink => Some(EntityKind::User.as_str()),
            Self::ScrapeDuration | Self::ScrapeSuccess => None,
        }
    }
}

/// One exported value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub descriptor: Descriptor,
    pub labels: BTreeMap<&'static str, String>,
    pub value: f64,
}

impl MetricSample {
    /// A traffic counter for one entity and direction.
    pub fn traffic(kind: EntityKind, identifier: &str, direction: Direction, bytes: i64) -> Self {
        let descriptor = Descriptor::traffic(kind, direction);
        let mut labels = BTreeMap::new();
        labels.insert(kind.as_str(), identifier.to_string());
        Self {
            descriptor,
            labels,
            value: bytes as f64,
        }
    }

    /// An unlabelled gauge.
    pub fn gauge(descriptor: Descriptor, value: f64) -> Self {
        Self {
            descriptor,
            labels: BTreeMap::new(),
            value,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind()
    }

    /// Value of this sample's identifying label (`user` or `inbound`).
    pub fn label(&self) -> Option<&str> {
        self.descriptor
            .label_key()
            .and_then(|k| self.labels.get(k))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_namespaced() {
        for d in Descriptor::ALL {
            assert!(d.name().starts_with(NAMESPACE), "{}", d.name());
        }
    }

    #[test]
    fn traffic_sample_carries_kind_label() {
        let s = MetricSample::traffic(EntityKind::User, "alice", Direction::Downlink, 100);
        assert_eq!(s.descriptor, Descriptor::UserDownlink);
        assert_eq!(s.kind(), MetricKind::Counter);
        assert_eq!(s.labels.get("user").map(String::as_str), Some("alice"));
        assert_eq!(s.label(), Some("alice"));
        assert_eq!(s.value, 100.0);
    }

    #[test]
    fn meta_samples_are_unlabelled_gauges() {
        let s = MetricSample::gauge(Descriptor::ScrapeSuccess, 1.0);
        assert_eq!(s.kind(), MetricKind::Gauge);
        assert!(s.labels.is_empty());
        assert_eq!(s.label(), None);
    }
}
