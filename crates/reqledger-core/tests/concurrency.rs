//! Concurrent writers racing on shared ids through a pooled file database.

use reqledger_core::config::{AppendConfig, DatabaseConfig, LedgerConfig};
use reqledger_core::ledger::merge::merge;
use reqledger_core::{Cancel, MakeRequest, Patch, RequestLedger, UpdateRequest};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

const WRITERS: usize = 8;

fn shared_ledger(dir: &tempfile::TempDir) -> Arc<RequestLedger> {
    let config = LedgerConfig {
        database: DatabaseConfig {
            path: dir.path().join("contended.db"),
            pool_size: WRITERS,
            ..DatabaseConfig::default()
        },
        append: AppendConfig {
            max_attempts: u32::try_from(WRITERS * 2).expect("small"),
            ..AppendConfig::default()
        },
    };
    Arc::new(RequestLedger::open(&config).expect("open ledger"))
}

fn note_update(writer: usize) -> UpdateRequest {
    UpdateRequest {
        notes: Patch::Set(format!("writer-{writer}")),
        ..UpdateRequest::default()
    }
}

#[test]
fn racing_appends_produce_dense_versions_without_lost_updates() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ledger = shared_ledger(&dir);
    let created = ledger
        .insert(
            MakeRequest::new("H1", "Towels", "one-time", "pending", "high"),
            &Cancel::new(),
        )
        .expect("create");
    let id = created.id;

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ledger
                    .update(id, &note_update(writer), &Cancel::new())
                    .expect("append within retry budget")
            })
        })
        .collect();

    let mut returned: Vec<u64> = handles
        .into_iter()
        .map(|handle| handle.join().expect("writer thread").version.get())
        .collect();
    returned.sort_unstable();
    let expected: Vec<u64> = (2..=u64::try_from(WRITERS + 1).expect("small")).collect();
    assert_eq!(returned, expected);

    let history = ledger.history(id, &Cancel::new()).expect("history");
    let versions: Vec<u64> = history.iter().map(|r| r.version.get()).collect();
    let all: Vec<u64> = (1..=u64::try_from(WRITERS + 1).expect("small")).collect();
    assert_eq!(versions, all);

    // every later row is exactly one writer's update applied to its predecessor
    let mut writers_seen = BTreeSet::new();
    for pair in history.windows(2) {
        let note = pair[1].snapshot.notes.clone().expect("note written");
        let writer: usize = note
            .strip_prefix("writer-")
            .and_then(|n| n.parse().ok())
            .expect("writer note");
        assert_eq!(
            merge(&pair[0].snapshot, &note_update(writer)).expect("valid merge"),
            pair[1].snapshot
        );
        writers_seen.insert(writer);
    }
    assert_eq!(writers_seen.len(), WRITERS);

    let latest = ledger.get(id, &Cancel::new()).expect("latest");
    assert_eq!(latest.version.get(), u64::try_from(WRITERS + 1).expect("small"));
}

#[test]
fn writers_on_different_ids_do_not_interfere() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ledger = shared_ledger(&dir);

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let cancel = Cancel::new();
                let created = ledger
                    .insert(
                        MakeRequest::new(
                            format!("H{writer}"),
                            "Late checkout",
                            "one-time",
                            "pending",
                            "normal",
                        ),
                        &cancel,
                    )
                    .expect("create");
                for _ in 0..3 {
                    ledger
                        .update(created.id, &note_update(writer), &cancel)
                        .expect("append");
                }
                created.id
            })
        })
        .collect();

    let ids: BTreeSet<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("writer thread"))
        .collect();
    assert_eq!(ids.len(), WRITERS);

    let listed = ledger.list(&Cancel::new()).expect("list");
    assert_eq!(listed.len(), WRITERS);
    assert!(listed.iter().all(|r| r.version.get() == 4));
    assert!(listed.windows(2).all(|w| w[0].id < w[1].id));
}
