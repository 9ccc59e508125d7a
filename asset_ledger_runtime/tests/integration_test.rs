//! Integration tests for asset_ledger_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use asset_ledger_kernel::domain::Address;
use asset_ledger_kernel::error::LedgerError;
use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_kernel::requests::{IssueToken, Request, RequestEnvelope};

use asset_ledger_runtime::config::{CodecKind, RuntimeConfig};
use asset_ledger_runtime::drift::{compare_states, verify_determinism};
use asset_ledger_runtime::error::RuntimeError;
use asset_ledger_runtime::proto_bridge::{kernel_to_proto, proto_to_kernel};
use asset_ledger_runtime::replay;
use asset_ledger_runtime::request_log::RequestLog;
use asset_ledger_runtime::session::{Session, SharedSession};
use asset_ledger_runtime::snapshot;

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("asset_ledger_kernel")
        .join("tests")
        .join("golden")
}

/// Golden requests from the kernel's test fixtures.
fn load_golden_requests() -> Vec<RequestEnvelope> {
    replay::load_requests_file(&golden_dir().join("requests.json"))
        .expect("Failed to load golden requests.json")
}

fn golden_hash() -> String {
    fs::read_to_string(golden_dir().join("expected_hash.txt"))
        .expect("Failed to read expected_hash.txt")
        .trim()
        .to_string()
}

/// Create a temp directory for a test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("asset_ledger_runtime_tests")
        .join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn config_in(dir: &PathBuf, snapshot_interval: u64) -> RuntimeConfig {
    RuntimeConfig {
        data_dir: dir.clone(),
        snapshot_interval,
        ..RuntimeConfig::default()
    }
}

fn issue(owner: &str) -> Request {
    Request::IssueToken(IssueToken::new(Address::from(owner), "Zap", "ZAP", "10", true))
}

// ─────────────────────────────────────────────────────────────
// Replay
// ─────────────────────────────────────────────────────────────

#[test]
fn replay_matches_golden_hash() {
    let requests = load_golden_requests();
    let hash = replay::rebuild_hash(&RuntimeConfig::default(), &GenesisState::default(), &requests)
        .expect("replay");
    assert_eq!(hash, golden_hash(), "Runtime replay hash does not match golden hash");
}

#[test]
fn record_codecs_agree_on_hash() {
    let requests = load_golden_requests();
    let hash_of = |codec: CodecKind| {
        let config = RuntimeConfig {
            codec,
            ..RuntimeConfig::default()
        };
        replay::rebuild_hash(&config, &GenesisState::default(), &requests).expect("replay")
    };
    assert_eq!(hash_of(CodecKind::Proto), hash_of(CodecKind::Json));
}

#[test]
fn append_and_replay_is_deterministic() {
    let dir = temp_dir("append_deterministic");
    let requests = load_golden_requests();

    let log_path = dir.join("requests.log");
    {
        let mut log = RequestLog::open(&log_path).expect("open log");
        for env in &requests {
            log.append(&kernel_to_proto(env)).expect("append request");
        }
    }

    let log = RequestLog::open(&log_path).expect("reopen log");
    assert_eq!(log.last_sequence(), requests.len() as u64);
    let loaded: Vec<RequestEnvelope> = log
        .load_all()
        .expect("load requests")
        .iter()
        .map(|p| proto_to_kernel(p).expect("decode"))
        .collect();
    assert_eq!(loaded, requests, "Proto round-trip must preserve every envelope");

    let hash = verify_determinism(&RuntimeConfig::default(), &GenesisState::default(), &loaded)
        .expect("determinism");
    assert_eq!(hash, golden_hash(), "Replay through proto round-trip doesn't match golden");
}

// ─────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_sessions_isolated() {
    let dir = temp_dir("concurrent_sessions");
    let config = config_in(&dir, 0);
    let requests = load_golden_requests();

    let mut session_a =
        Session::create(&config, "session_a", &GenesisState::default()).expect("create session_a");
    let mut session_b =
        Session::create(&config, "session_b", &GenesisState::default()).expect("create session_b");

    for env in &requests {
        session_a.apply(env).expect("apply to a");
    }
    for env in &requests[..5] {
        session_b.apply(env).expect("apply to b");
    }

    let hash_a = session_a.current_hash().unwrap();
    assert_eq!(hash_a, golden_hash(), "Session A hash doesn't match golden");
    assert_ne!(hash_a, session_b.current_hash().unwrap());
    assert_eq!(session_b.current_sequence(), 5);
    assert_eq!(session_a.current_sequence(), requests.len() as u64);
}

#[test]
fn creating_an_existing_session_fails() {
    let dir = temp_dir("create_twice");
    let config = config_in(&dir, 0);
    Session::create(&config, "s", &GenesisState::default()).expect("first create");
    assert!(matches!(
        Session::create(&config, "s", &GenesisState::default()),
        Err(RuntimeError::Io(_))
    ));
}

#[test]
fn rejected_requests_are_logged_fatal_ones_are_not() {
    let dir = temp_dir("persist_rules");
    let config = config_in(&dir, 0);
    let requests = load_golden_requests();
    let mut session =
        Session::create(&config, "rules", &GenesisState::default()).expect("create session");

    for env in &requests[..4] {
        session.apply(env).expect("apply");
    }
    // #4 is an unauthorized mint: rejected, yet it consumed its sequence.
    let log = RequestLog::open(&session.session_dir().join("requests.log")).unwrap();
    assert_eq!(log.last_sequence(), 4);

    let mut bad = requests[4].clone();
    bad.schema_version = 99;
    let err = session.apply(&bad).unwrap_err();
    assert!(matches!(err, RuntimeError::Ledger(LedgerError::SchemaVersion { got: 99, .. })));
    assert_eq!(session.current_sequence(), 4);
    let log = RequestLog::open(&session.session_dir().join("requests.log")).unwrap();
    assert_eq!(log.last_sequence(), 4);

    let outcome = session.apply(&requests[4]).expect("apply after fatal");
    assert!(outcome.is_ok());
}

#[test]
fn failed_log_append_leaves_session_usable() {
    let dir = temp_dir("append_failure");
    let config = config_in(&dir, 0);
    let requests = load_golden_requests();
    let mut session =
        Session::create(&config, "s", &GenesisState::default()).expect("create session");
    session.apply(&requests[0]).expect("apply first");
    let hash = session.current_hash().unwrap();
    let nonce = session.engine().symbol_nonce();

    let log_path = session.session_dir().join("requests.log");
    let saved = fs::read(&log_path).unwrap();
    fs::remove_file(&log_path).unwrap();
    fs::create_dir(&log_path).unwrap();

    assert!(matches!(session.apply(&requests[1]), Err(RuntimeError::Io(_))));
    assert_eq!(session.current_sequence(), 1);
    assert_eq!(session.current_hash().unwrap(), hash);
    assert_eq!(session.engine().symbol_nonce(), nonce);

    fs::remove_dir(&log_path).unwrap();
    fs::write(&log_path, &saved).unwrap();
    for env in &requests[1..] {
        session.apply(env).expect("apply after recovery");
    }
    assert_eq!(session.current_hash().unwrap(), golden_hash());

    let reopened = Session::open(&config, "s").expect("reopen");
    assert_eq!(reopened.current_hash().unwrap(), golden_hash());
}

#[test]
fn reopen_restores_from_snapshot_with_nonce() {
    let dir = temp_dir("reopen_snapshot");
    let config = config_in(&dir, 5);
    let requests = load_golden_requests();

    {
        let mut session =
            Session::create(&config, "s", &GenesisState::default()).expect("create session");
        for env in &requests {
            session.apply(env).expect("apply");
        }
        let snaps = snapshot::list_snapshots(&session.session_dir().join("snapshots")).unwrap();
        assert_eq!(snaps, vec![5, 10]);
    }

    let mut reopened = Session::open(&config, "s").expect("reopen");
    assert_eq!(reopened.current_sequence(), 12);
    assert_eq!(reopened.current_hash().unwrap(), golden_hash());
    assert_eq!(reopened.engine().symbol_nonce(), 3);

    // The next issuance must match what a full replay would derive.
    let receipt = reopened.submit(issue("dave")).unwrap().unwrap();
    let after_snapshot = reopened.current_hash().unwrap();
    let full = reopened.replay_full().unwrap();
    assert_eq!(after_snapshot, full);
    assert!(receipt.symbol.starts_with("ZAP-"));
}

#[test]
fn corrupt_snapshot_falls_back_to_full_replay() {
    let dir = temp_dir("corrupt_snapshot");
    let config = config_in(&dir, 5);
    let requests = load_golden_requests();

    let snap_dir = {
        let mut session =
            Session::create(&config, "s", &GenesisState::default()).expect("create session");
        for env in &requests {
            session.apply(env).expect("apply");
        }
        session.session_dir().join("snapshots")
    };

    fs::write(snap_dir.join("snapshot_000010.json"), b"{ not a snapshot").unwrap();

    let reopened = Session::open(&config, "s").expect("reopen");
    assert_eq!(reopened.current_hash().unwrap(), golden_hash());
    assert_eq!(reopened.engine().symbol_nonce(), 3);
}

#[test]
fn shared_session_serializes_writers() {
    let dir = temp_dir("shared_session");
    let config = config_in(&dir, 0);
    let session = Session::create(&config, "shared", &GenesisState::default()).unwrap();
    let shared = Arc::new(SharedSession::new(session));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..5 {
                    let outcome = shared.submit(issue(&format!("owner{}", i))).unwrap();
                    assert!(outcome.is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shared.current_sequence().unwrap(), 20);
    let symbols: Vec<String> =
        serde_json::from_slice(&shared.query(&["symbols"]).unwrap()).unwrap();
    assert_eq!(symbols.len(), 20);
}

// ─────────────────────────────────────────────────────────────
// Corruption
// ─────────────────────────────────────────────────────────────

#[test]
fn truncated_log_is_detected() {
    let dir = temp_dir("truncated_log");
    let requests = load_golden_requests();

    let log_path = dir.join("requests.log");
    {
        let mut log = RequestLog::open(&log_path).expect("open log");
        for env in &requests[..5] {
            log.append(&kernel_to_proto(env)).expect("append");
        }
    }

    let data = fs::read(&log_path).expect("read log");
    fs::write(&log_path, &data[..data.len() - 10]).expect("truncate");

    assert!(matches!(
        RequestLog::open(&log_path),
        Err(RuntimeError::LogCorruption { .. })
    ));
}

#[test]
fn trailing_garbage_is_detected() {
    let dir = temp_dir("garbage_log");
    let config = config_in(&dir, 0);
    let requests = load_golden_requests();

    let log_path = {
        let mut session = Session::create(&config, "s", &GenesisState::default()).unwrap();
        for env in &requests[..3] {
            session.apply(env).unwrap();
        }
        session.session_dir().join("requests.log")
    };

    let mut data = fs::read(&log_path).unwrap();
    data.extend_from_slice(&[0xFF, 0x01]);
    fs::write(&log_path, &data).unwrap();

    match Session::open(&config, "s") {
        Err(RuntimeError::LogCorruption { offset, .. }) => assert!(offset > 0),
        Err(other) => panic!("Expected LogCorruption, got: {}", other),
        Ok(_) => panic!("Corrupted log must not open"),
    }
}

#[test]
fn out_of_order_append_is_refused() {
    let dir = temp_dir("append_order");
    let requests = load_golden_requests();
    let mut log = RequestLog::open(&dir.join("requests.log")).unwrap();
    assert!(matches!(
        log.append(&kernel_to_proto(&requests[1])),
        Err(RuntimeError::LogSequence { expected: 1, got: 2 })
    ));
}

// ─────────────────────────────────────────────────────────────
// Snapshots and drift
// ─────────────────────────────────────────────────────────────

#[test]
fn snapshot_replay_parity() {
    let dir = temp_dir("snapshot_parity");
    let requests = load_golden_requests();

    let (engine, _, hash) =
        replay::rebuild(&RuntimeConfig::default(), &GenesisState::default(), &requests).unwrap();
    let state = engine.export_genesis().unwrap();

    let snap_dir = dir.join("snapshots");
    snapshot::save_snapshot(&snap_dir, 12, engine.symbol_nonce(), &state).expect("save snapshot");

    let loaded = snapshot::load_snapshot(&snap_dir, 12)
        .expect("load snapshot")
        .expect("snapshot should exist");
    assert_eq!(loaded.hash, hash, "Snapshot hash should match replay hash");
    assert!(snapshot::verify_snapshot_hash(&loaded));
    assert_eq!(loaded.state().unwrap(), state);
}

#[test]
fn drift_against_empty_genesis() {
    let requests = load_golden_requests();
    let (engine, _, _) =
        replay::rebuild(&RuntimeConfig::default(), &GenesisState::default(), &requests).unwrap();
    let report = compare_states(&GenesisState::default(), &engine.export_genesis().unwrap());

    assert_eq!(report.added_tokens, vec!["FTM-6DA", "ZAP-960", "ZAP-AE7"]);
    assert_eq!(report.token_count_delta, 3);
    assert_eq!(report.changed_accounts, vec!["alice", "bob"]);
    assert!(report.supply_changes.is_empty());
}
