use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::CoreWatchError;

/// Kind of a [`DomainEvent`], used by subscribers to filter the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventKind {
    /// Manually installed hardware packages changed.
    CoreChanged,
}

impl EventKind {
    /// Every kind the hub can currently emit.
    pub const ALL: &'static [EventKind] = &[EventKind::CoreChanged];

    /// Name used on the streaming interface.
    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::CoreChanged => "NOTIFICATION_CORE_CHANGED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for EventKind {
    type Err = CoreWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core_changed" | "core-changed" | "notification_core_changed" => {
                Ok(EventKind::CoreChanged)
            }
            other => Err(CoreWatchError::UnknownEventKind(other.to_string())),
        }
    }
}

/// Set of event kinds a subscriber wants. Empty accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    kinds: BTreeSet<EventKind>,
}

impl EventFilter {
    /// Filter accepting every kind.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        kinds.into_iter().collect()
    }

    /// Parse kind names such as `core_changed`, rejecting unknown ones.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, CoreWatchError> {
        names.iter().map(|n| n.as_ref().parse::<EventKind>()).collect()
    }

    pub fn accepts(&self, kind: EventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    pub fn is_accept_all(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl FromIterator<EventKind> for EventFilter {
    fn from_iter<T: IntoIterator<Item = EventKind>>(iter: T) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}

/// Semantic notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DomainEvent {
    CoreChanged,
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::CoreChanged => EventKind::CoreChanged,
        }
    }
}

/// A domain event stamped with the hub's emission sequence number.
///
/// Sequence numbers start at 1 and increase by one per broadcast, so a
/// subscriber that sees a gap knows events were dropped from its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub sequence: u64,
    pub event: DomainEvent,
}

impl Notification {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Identifier of one package-index instance held by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Identifier the hub assigns to each subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
