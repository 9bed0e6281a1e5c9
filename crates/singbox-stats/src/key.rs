//! Stat name codec.
//!
//! sing-box exposes traffic counters under names of the form
//! `<kind>>>><identifier>>>>traffic>>>><direction>`, for example
//! `user>>>alice>>>traffic>>>uplink`.

use std::fmt;

/// Separator between the fields of a stat name.
pub const DELIMITER: &str = ">>>";

/// The only metric literal the exporter understands.
pub const TRAFFIC: &str = "traffic";

/// Which kind of entity a counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Inbound,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Inbound => "inbound",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "inbound" => Some(Self::Inbound),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic direction relative to the proxied client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Client to server.
    Uplink,
    /// Server to client.
    Downlink,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Uplink, Direction::Downlink];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uplink => "uplink",
            Self::Downlink => "downlink",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "uplink" => Some(Self::Uplink),
            "downlink" => Some(Self::Downlink),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of a traffic stat name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub identifier: String,
    pub direction: Direction,
}

impl EntityKey {
    pub fn new(kind: EntityKind, identifier: impl Into<String>, direction: Direction) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            direction,
        }
    }

    /// Parse a stat name into its four fields.
    ///
    /// The kind is taken up to the first delimiter and the metric and
    /// direction from the last two, so an identifier containing the
    /// delimiter survives intact. Returns `None` for anything that is not a
    /// user or inbound traffic counter.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = name.split_once(DELIMITER)?;
        let (rest, direction) = rest.rsplit_once(DELIMITER)?;
        let (identifier, metric) = rest.rsplit_once(DELIMITER)?;

        if metric != TRAFFIC {
            return None;
        }

        Some(Self {
            kind: EntityKind::parse(kind)?,
            identifier: identifier.to_string(),
            direction: Direction::parse(direction)?,
        })
    }

    /// Canonical stat name for this key.
    pub fn stat_name(&self) -> String {
        stat_name(self.kind, &self.identifier, self.direction)
    }
}

/// Build the canonical stat name without allocating an `EntityKey`.
pub fn stat_name(kind: EntityKind, identifier: &str, direction: Direction) -> String {
    format!("{kind}{DELIMITER}{identifier}{DELIMITER}{TRAFFIC}{DELIMITER}{direction}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_uplink() {
        let key = EntityKey::parse("user>>>alice>>>traffic>>>uplink").unwrap();
        assert_eq!(key, EntityKey::new(EntityKind::User, "alice", Direction::Uplink));
    }

    #[test]
    fn parse_inbound_downlink() {
        let key = EntityKey::parse("inbound>>>main>>>traffic>>>downlink").unwrap();
        assert_eq!(key.kind, EntityKind::Inbound);
        assert_eq!(key.identifier, "main");
        assert_eq!(key.direction, Direction::Downlink);
    }

    #[test]
    fn parse_rejects_short_names() {
        assert!(EntityKey::parse("bogus").is_none());
        assert!(EntityKey::parse("").is_none());
        assert!(EntityKey::parse("user>>>alice>>>traffic").is_none());
        assert!(EntityKey::parse("user>>>alice").is_none());
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        // sing-box also reports outbound counters; they are not exported.
        assert!(EntityKey::parse("outbound>>>direct>>>traffic>>>uplink").is_none());
        assert!(EntityKey::parse("user>>>alice>>>traffic>>>sideways").is_none());
        assert!(EntityKey::parse("user>>>alice>>>packets>>>uplink").is_none());
        assert!(EntityKey::parse("USER>>>alice>>>traffic>>>uplink").is_none());
    }

    #[test]
    fn parse_keeps_delimiter_inside_identifier() {
        let key = EntityKey::parse("user>>>a>>>b>>>traffic>>>downlink").unwrap();
        assert_eq!(key.identifier, "a>>>b");
        assert_eq!(key.direction, Direction::Downlink);
    }

    #[test]
    fn parse_allows_empty_identifier() {
        let key = EntityKey::parse("inbound>>>>>>traffic>>>uplink").unwrap();
        assert_eq!(key.identifier, "");
    }

    #[test]
    fn stat_name_format() {
        assert_eq!(
            stat_name(EntityKind::Inbound, "relay", Direction::Downlink),
            "inbound>>>relay>>>traffic>>>downlink"
        );
        let key = EntityKey::new(EntityKind::User, "bob@example.com", Direction::Uplink);
        assert_eq!(key.stat_name(), "user>>>bob@example.com>>>traffic>>>uplink");
        assert_eq!(EntityKey::parse(&key.stat_name()), Some(key));
    }
}
