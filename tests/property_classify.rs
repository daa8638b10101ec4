use notify::EventKind;
use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
    RenameMode,
};
use proptest::prelude::*;

use corewatch::hub::{HubCore, PushOutcome, event_queue};
use corewatch::types::{DomainEvent, EventFilter, Notification};
use corewatch::watch::RawOp;

// Backend events that never describe a content change.
fn noise_kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Any),
        Just(EventKind::Other),
        Just(EventKind::Access(AccessKind::Any)),
        Just(EventKind::Access(AccessKind::Read)),
        Just(EventKind::Access(AccessKind::Open(AccessMode::Any))),
        Just(EventKind::Access(AccessKind::Close(AccessMode::Write))),
        Just(EventKind::Access(AccessKind::Close(AccessMode::Read))),
        Just(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
        Just(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
        Just(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))),
        Just(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Ownership))),
        Just(EventKind::Modify(ModifyKind::Other)),
        Just(EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
    ]
}

fn content_kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Create(CreateKind::File)),
        Just(EventKind::Create(CreateKind::Folder)),
        Just(EventKind::Remove(RemoveKind::Any)),
        Just(EventKind::Remove(RemoveKind::File)),
        Just(EventKind::Modify(ModifyKind::Any)),
        Just(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
        Just(EventKind::Modify(ModifyKind::Data(DataChange::Size))),
        Just(EventKind::Modify(ModifyKind::Name(RenameMode::From))),
        Just(EventKind::Modify(ModifyKind::Name(RenameMode::To))),
    ]
}

fn raw_op_strategy() -> impl Strategy<Value = RawOp> {
    prop_oneof![
        Just(RawOp::Create),
        Just(RawOp::Write),
        Just(RawOp::Remove),
        Just(RawOp::Rename),
        Just(RawOp::Other),
    ]
}

#[test]
fn test_raw_op_mapping_table() {
    let cases = [
        (EventKind::Create(CreateKind::Any), RawOp::Create),
        (EventKind::Remove(RemoveKind::Folder), RawOp::Remove),
        (EventKind::Modify(ModifyKind::Data(DataChange::Any)), RawOp::Write),
        (EventKind::Modify(ModifyKind::Any), RawOp::Write),
        (EventKind::Modify(ModifyKind::Name(RenameMode::From)), RawOp::Rename),
        (EventKind::Modify(ModifyKind::Name(RenameMode::Any)), RawOp::Rename),
        (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), RawOp::Other),
        (EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), RawOp::Other),
        (EventKind::Access(AccessKind::Close(AccessMode::Write)), RawOp::Other),
    ];
    for (kind, expected) in cases {
        assert_eq!(RawOp::from_event_kind(&kind), expected, "{kind:?}");
    }
}

proptest! {
    #[test]
    fn test_noise_events_never_become_notifications(kind in noise_kind_strategy()) {
        let op = RawOp::from_event_kind(&kind);
        prop_assert_eq!(op, RawOp::Other);
        prop_assert!(!op.is_significant());
        prop_assert_eq!(HubCore::classify(op), None);
    }

    #[test]
    fn test_content_events_become_core_changed(kind in content_kind_strategy()) {
        let op = RawOp::from_event_kind(&kind);
        prop_assert!(op.is_significant());
        prop_assert_eq!(HubCore::classify(op), Some(DomainEvent::CoreChanged));
    }

    #[test]
    fn test_one_notification_per_significant_op(
        ops in proptest::collection::vec(raw_op_strategy(), 0..64),
    ) {
        let mut core = HubCore::new(ops.len().max(1));
        let (_id, mut rx) = core.subscribe(EventFilter::all());

        for op in &ops {
            if let Some(event) = HubCore::classify(*op) {
                core.broadcast(event);
            }
        }

        let expected = ops.iter().filter(|op| op.is_significant()).count() as u64;
        prop_assert_eq!(core.events_emitted(), expected);

        let mut sequences = Vec::new();
        while let Some(n) = rx.try_recv() {
            sequences.push(n.sequence);
        }
        prop_assert_eq!(sequences, (1..=expected).collect::<Vec<_>>());
    }

    #[test]
    fn test_queue_keeps_newest_up_to_capacity(capacity in 1usize..16, pushed in 0u64..48) {
        let (tx, mut rx) = event_queue(capacity);
        let mut evicted = 0;
        for sequence in 1..=pushed {
            let outcome = tx.push(Notification { sequence, event: DomainEvent::CoreChanged });
            prop_assert_ne!(outcome, PushOutcome::Closed);
            if outcome == PushOutcome::DroppedOldest {
                evicted += 1;
            }
        }

        let kept = pushed.min(capacity as u64);
        prop_assert_eq!(rx.len() as u64, kept);
        prop_assert_eq!(rx.dropped(), pushed - kept);
        prop_assert_eq!(evicted, pushed - kept);

        let mut sequences = Vec::new();
        while let Some(n) = rx.try_recv() {
            sequences.push(n.sequence);
        }
        prop_assert_eq!(sequences, ((pushed - kept + 1)..=pushed).collect::<Vec<_>>());
    }
}
