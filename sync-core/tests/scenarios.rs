//! End-to-end behaviour of the model as seen by an ingestion loop and its readers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use syncwatch_core::{ApplyOutcome, ListenerError, ModelConfig, ModelReconstructor};
use syncwatch_types::{
    parse_batch, DeviceConnected, DeviceId, EventId, EventPayload, EventRecord, FolderCompletion,
    FolderId, FolderState, FolderStateChanged,
};

fn abc() -> DeviceId {
    DeviceId::new("ABC")
}

fn f1() -> FolderId {
    FolderId::new("f1")
}

fn scenario_events() -> Vec<EventRecord> {
    vec![
        EventRecord::new(1, DeviceConnected::new("ABC")),
        EventRecord::new(2, FolderCompletion::new("ABC", "f1", 50.0).unwrap()),
        EventRecord::new(3, FolderStateChanged::new("f1", "syncing")),
    ]
}

#[test]
fn connect_complete_and_change_state() {
    let model = ModelReconstructor::default();
    for event in scenario_events() {
        model.apply(event);
    }

    let snapshot = model.snapshot();
    assert!(snapshot.is_connected(&abc()));
    assert_eq!(snapshot.folder_completion(&abc(), &f1()).value(), 50.0);
    assert_eq!(snapshot.folder_state(&f1()), Some(&FolderState::Syncing));
    assert_eq!(snapshot.folder_state(&f1()).map(|s| s.as_str()), Some("syncing"));
    assert_eq!(snapshot.device_completion(&abc()), 50.0);
    assert!(model.is_valid());
}

#[test]
fn repeated_id_invalidates_and_freezes_tables() {
    let model = ModelReconstructor::default();
    for event in scenario_events() {
        model.apply(event);
    }
    let before = model.snapshot();

    let outcome = model.apply(EventRecord::new(
        2,
        FolderCompletion::new("ABC", "f1", 90.0).unwrap(),
    ));

    assert!(matches!(outcome, ApplyOutcome::Invalidated(_)));
    assert!(!model.is_valid());
    let after = model.snapshot();
    assert!(!after.is_valid());
    assert_eq!(after.completion(), before.completion());
    assert_eq!(after.folder_states(), before.folder_states());
    assert_eq!(after.connections(), before.connections());
}

#[test]
fn zero_folder_device_completion_is_100() {
    // Averaging over zero folders is defined as "nothing pending".
    let model = ModelReconstructor::default();
    model.apply(EventRecord::new(1, DeviceConnected::new("ABC")));

    let completion = model.snapshot().device_completion(&abc());
    assert!(completion.is_finite());
    assert_eq!(completion, 100.0);
}

#[test]
fn unrecognized_event_changes_only_the_cursor() {
    let model = ModelReconstructor::default();
    for event in scenario_events() {
        model.apply(event);
    }
    let before = model.snapshot();

    model.apply(EventRecord::new(4, EventPayload::other("RemoteIndexUpdated")));

    let after = model.snapshot();
    assert!(after.same_tables(&before));
    assert_eq!(before.last_applied_id(), Some(EventId::new(3)));
    assert_eq!(after.last_applied_id(), Some(EventId::new(4)));
}

#[test]
fn strictly_increasing_ids_keep_model_valid() {
    let model = ModelReconstructor::default();
    let mut id = 0;
    for step in 1..=200u64 {
        id += step % 7 + 1;
        model.apply(EventRecord::new(
            id,
            FolderStateChanged::new(format!("f{}", step % 5), "idle"),
        ));
        assert!(model.is_valid());
        assert_eq!(model.last_applied_id(), Some(EventId::new(id)));
    }
}

#[test]
fn resync_after_daemon_restart() {
    let model = ModelReconstructor::default();
    for event in scenario_events() {
        model.apply(event);
    }

    // The daemon restarted and numbers from 1 again.
    model.apply(EventRecord::new(1, DeviceConnected::new("XYZ")));
    assert!(!model.is_valid());

    model.reset();
    assert!(model.is_valid());
    assert!(model.is_initializing());
    assert!(model.snapshot().connections().is_empty());

    model.apply(EventRecord::new(1, DeviceConnected::new("XYZ")));
    assert!(model.is_valid());
    assert!(model.snapshot().is_connected(&DeviceId::new("XYZ")));
}

#[test]
fn replay_parsed_daemon_batch() {
    let batch = br#"[
        {"id": 1, "type": "Starting", "data": {"home": "/data"}},
        {"id": 2, "type": "DeviceConnected", "data": {"id": "ABC", "deviceName": "laptop", "addr": "10.0.0.2:22000", "type": "tcp-client"}},
        {"id": 3, "type": "FolderCompletion", "data": {"device": "ABC", "folder": "f1", "completion": 25}},
        {"id": 4, "type": "FolderCompletion", "data": {"device": "ABC", "folder": "f2"}},
        {"id": 5, "type": "FolderCompletion", "data": {"device": "ABC", "folder": "f2", "completion": 76}},
        {"id": 6, "type": "StateChanged", "data": {"folder": "f1", "from": "idle", "to": "sync-preparing"}}
    ]"#;

    let model = ModelReconstructor::default();
    let outcome = model.apply_batch(parse_batch(batch).unwrap());

    assert_eq!(outcome.applied, 6);
    assert_eq!(outcome.changed, 4);
    assert!(outcome.violation.is_none());

    let snapshot = model.snapshot();
    assert_eq!(snapshot.connection(&abc()).unwrap().display_name, "laptop");
    assert_eq!(snapshot.completion().len(), 2);
    // floor((25 + 76) / 2)
    assert_eq!(snapshot.device_completion(&abc()), 50.0);
    assert_eq!(snapshot.folder_state(&f1()), Some(&FolderState::SyncPreparing));
    assert_eq!(snapshot.last_applied_id(), Some(EventId::new(6)));
}

#[test]
fn concurrent_readers_see_consistent_snapshots() {
    let model = Arc::new(ModelReconstructor::new(ModelConfig::default()));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0usize;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = model.snapshot();
                    // Every connect is paired with a completion row in the same batch.
                    assert_eq!(snapshot.connections().len(), snapshot.completion().len());
                    assert!(snapshot.is_valid());
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    let writer = {
        let model = Arc::clone(&model);
        thread::spawn(move || {
            for n in 0..500u64 {
                let device = format!("DEV{}", n);
                model.apply_batch(vec![
                    EventRecord::new(n * 2 + 1, DeviceConnected::new(device.as_str())),
                    EventRecord::new(
                        n * 2 + 2,
                        FolderCompletion::new(device.as_str(), "f1", (n % 100) as f64).unwrap(),
                    ),
                ]);
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    let snapshot = model.snapshot();
    assert!(model.is_valid());
    assert_eq!(snapshot.connections().len(), 500);
    assert_eq!(snapshot.last_applied_id(), Some(EventId::new(1000)));
}

#[test]
fn listener_running_on_ingestion_thread_can_read_model() {
    let model = Arc::new(ModelReconstructor::default());
    let notified = Arc::new(AtomicUsize::new(0));
    let last_seen = Arc::new(AtomicUsize::new(0));

    {
        let notified = Arc::clone(&notified);
        let last_seen = Arc::clone(&last_seen);
        model.add_listener(Arc::new(
            move |m: &ModelReconstructor| -> Result<(), ListenerError> {
                notified.fetch_add(1, Ordering::SeqCst);
                last_seen.store(m.snapshot().connections().len(), Ordering::SeqCst);
                Ok(())
            },
        ));
    }

    let ingest = {
        let model = Arc::clone(&model);
        thread::spawn(move || {
            for n in 1..=10u64 {
                model.apply(EventRecord::new(n, DeviceConnected::new(format!("D{}", n))));
            }
        })
    };
    ingest.join().unwrap();

    assert_eq!(notified.load(Ordering::SeqCst), 10);
    assert_eq!(last_seen.load(Ordering::SeqCst), 10);
}
