// src/watch/raw.rs

//! Backend-neutral filesystem operations.
//!
//! `notify` reports a rich, platform-flavoured `EventKind`. Everything past the
//! watcher only ever sees [`RawOp`], so the backend can change per target
//! without touching the hub or the sessions.

use std::fmt;

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// Filesystem change kind as reported by the watch backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawOp {
    Create,
    Write,
    Remove,
    Rename,
    /// Attribute, permission, access and unclassified events.
    Other,
}

impl RawOp {
    /// Map a `notify` event kind onto a raw operation.
    ///
    /// A rename surfaces as separate `From` and `To` halves on every backend
    /// we support; the combined `Both` event repeats them, so it maps to
    /// `Other`.
    pub fn from_event_kind(kind: &EventKind) -> RawOp {
        match kind {
            EventKind::Create(_) => RawOp::Create,
            EventKind::Remove(_) => RawOp::Remove,
            EventKind::Modify(modify) => match modify {
                ModifyKind::Data(_) | ModifyKind::Any => RawOp::Write,
                ModifyKind::Name(RenameMode::Both) => RawOp::Other,
                ModifyKind::Name(_) => RawOp::Rename,
                ModifyKind::Metadata(_) | ModifyKind::Other => RawOp::Other,
            },
            EventKind::Access(_) | EventKind::Any | EventKind::Other => RawOp::Other,
        }
    }

    /// Whether this operation is ever forwarded out of the watcher.
    pub fn is_significant(self) -> bool {
        !matches!(self, RawOp::Other)
    }
}

impl fmt::Display for RawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RawOp::Create => "create",
            RawOp::Write => "write",
            RawOp::Remove => "remove",
            RawOp::Rename => "rename",
            RawOp::Other => "other",
        };
        f.write_str(name)
    }
}
