//! Entity filter: which users and inbounds get reported.

use std::collections::BTreeSet;

use singbox_stats::EntityKind;

/// Allow-lists of user identifiers and inbound tags.
///
/// An empty list accepts every identifier of that kind; a non-empty list
/// accepts exact matches only. Built once at startup and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    users: BTreeSet<String>,
    inbounds: BTreeSet<String>,
}

impl EntityFilter {
    /// A filter that accepts everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build a filter from configured lists. Entries are trimmed and blank
    /// entries dropped.
    pub fn new<U, I>(users: U, inbounds: I) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            users: clean(users),
            inbounds: clean(inbounds),
        }
    }

    /// Whether `identifier` of the given kind should be reported.
    pub fn accepts(&self, kind: EntityKind, identifier: &str) -> bool {
        let allowed = self.allowed(kind);
        allowed.is_empty() || allowed.contains(identifier)
    }

    /// Configured identifiers for `kind`, in sorted order.
    pub fn allowed(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Inbound => &self.inbounds,
        }
    }

    /// True when neither list restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        self.users.is_empty() && self.inbounds.is_empty()
    }
}

fn clean<T>(items: T) -> BTreeSet<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
