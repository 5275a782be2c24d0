//! Cancellation through the public ledger API.

use reqledger_core::config::{DatabaseConfig, LedgerConfig};
use reqledger_core::{
    Cancel, ErrorCode, LedgerError, MakeRequest, Patch, RequestLedger, UpdateRequest,
};
use rusqlite::Connection;
use std::time::{Duration, Instant};

fn towels() -> MakeRequest {
    MakeRequest::new("H1", "Towels", "one-time", "pending", "high")
}

#[test]
fn cancelled_token_refuses_every_operation() {
    let ledger = RequestLedger::open_in_memory().expect("open ledger");
    let created = ledger.insert(towels(), &Cancel::new()).expect("create");

    let cancel = Cancel::new();
    cancel.cancel();

    let results = [
        ledger.insert(towels(), &cancel).map(|_| ()),
        ledger.get(created.id, &cancel).map(|_| ()),
        ledger
            .update(created.id, &UpdateRequest::default(), &cancel)
            .map(|_| ()),
        ledger.history(created.id, &cancel).map(|_| ()),
        ledger.list(&cancel).map(|_| ()),
    ];
    for result in results {
        let err = result.expect_err("cancelled");
        assert!(matches!(err, LedgerError::Cancelled));
        assert_eq!(err.code(), ErrorCode::Cancelled);
    }

    assert_eq!(ledger.list(&Cancel::new()).expect("list").len(), 1);
}

#[test]
fn expired_deadline_is_cancelled() {
    let ledger = RequestLedger::open_in_memory().expect("open ledger");
    let cancel = Cancel::with_deadline(Instant::now());
    assert!(matches!(
        ledger.insert(towels(), &cancel),
        Err(LedgerError::Cancelled)
    ));
}

#[test]
fn deadline_while_waiting_for_the_write_lock_leaves_no_row() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("locked.db");
    let config = LedgerConfig {
        database: DatabaseConfig {
            path: path.clone(),
            ..DatabaseConfig::default()
        },
        ..LedgerConfig::default()
    };
    let ledger = RequestLedger::open(&config).expect("open ledger");
    let created = ledger.insert(towels(), &Cancel::new()).expect("create");

    let holder = Connection::open(&path).expect("second connection");
    holder
        .execute_batch("BEGIN IMMEDIATE")
        .expect("hold write lock");

    let started = Instant::now();
    let err = ledger
        .update(
            created.id,
            &UpdateRequest {
                status: Patch::Set("completed".to_string()),
                ..UpdateRequest::default()
            },
            &Cancel::with_timeout(Duration::from_millis(100)),
        )
        .expect_err("lock held past the deadline");
    assert!(matches!(err, LedgerError::Cancelled));
    // the configured 5s busy timeout was cut short by the deadline
    assert!(started.elapsed() < Duration::from_secs(3));

    holder.execute_batch("ROLLBACK").expect("release lock");
    let latest = ledger.get(created.id, &Cancel::new()).expect("latest");
    assert_eq!(latest.version.get(), 1);
    assert_eq!(latest.snapshot.status, "pending");
}
