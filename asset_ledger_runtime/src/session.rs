//! Session manager: isolated ledgers with persist-after-apply semantics.
//!
//! Each session gets its own directory:
//!   <data_dir>/<session_id>/genesis.json
//!   <data_dir>/<session_id>/requests.log
//!   <data_dir>/<session_id>/snapshots/
//!
//! Apply order:
//!   1. engine stages the request; a fatal error stops here, nothing is written
//!   2. request_log.append(envelope), for successes and rejections alike
//!   3. engine commits the staged writes, only if step 2 succeeded
//!   4. snapshot if the interval is reached
//!
//! Concurrency: `SharedSession` serializes writers behind a Mutex.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use asset_ledger_kernel::engine::LedgerEngine;
use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_kernel::requests::{Request, RequestEnvelope};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel};
use crate::replay::{self, RequestOutcome};
use crate::request_log::RequestLog;
use crate::snapshot;
use crate::snapshot_codec::{export_snapshot_to_file, import_snapshot_from_file};

const GENESIS_FILE: &str = "genesis.json";
const LOG_FILE: &str = "requests.log";
const SNAPSHOT_DIR: &str = "snapshots";

/// An isolated ledger session with its own request log and snapshots.
pub struct Session {
    session_id: String,
    session_dir: PathBuf,
    config: RuntimeConfig,
    genesis: GenesisState,
    engine: LedgerEngine,
    request_log: RequestLog,
}

impl Session {
    /// Create a new session under `config.data_dir` seeded with `genesis`.
    /// Fails if the session already exists.
    pub fn create(config: &RuntimeConfig, session_id: &str, genesis: &GenesisState) -> Result<Self> {
        let session_dir = config.data_dir.join(session_id);
        let genesis_path = session_dir.join(GENESIS_FILE);
        if genesis_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("session {} already exists", session_id),
            )
            .into());
        }

        let mut engine = config.build_engine();
        engine.init_genesis(genesis)?;
        export_snapshot_to_file(genesis, &genesis_path)?;
        let request_log = RequestLog::open(&session_dir.join(LOG_FILE))?;

        info!(session = session_id, "session created");
        Ok(Self {
            session_id: session_id.to_string(),
            session_dir,
            config: config.clone(),
            genesis: genesis.clone(),
            engine,
            request_log,
        })
    }

    /// Reopen an existing session.
    ///
    /// Restores from the latest snapshot whose hash verifies and replays
    /// the log entries after it. Any snapshot problem falls back to a full
    /// replay from genesis.
    pub fn open(config: &RuntimeConfig, session_id: &str) -> Result<Self> {
        let session_dir = config.data_dir.join(session_id);
        let genesis = import_snapshot_from_file(&session_dir.join(GENESIS_FILE))?;
        let request_log = RequestLog::open(&session_dir.join(LOG_FILE))?;
        let envelopes = load_envelopes(&request_log)?;

        let snap_dir = session_dir.join(SNAPSHOT_DIR);
        let engine = match restore_from_snapshot(config, &snap_dir, &envelopes) {
            Ok(Some(engine)) => engine,
            Ok(None) => replay::rebuild(config, &genesis, &envelopes)?.0,
            Err(e) => {
                warn!(session = session_id, error = %e, "snapshot restore failed, replaying from genesis");
                replay::rebuild(config, &genesis, &envelopes)?.0
            }
        };

        if engine.last_sequence() != request_log.last_sequence() {
            return Err(RuntimeError::LogSequence {
                expected: request_log.last_sequence(),
                got: engine.last_sequence(),
            });
        }

        info!(session = session_id, sequence = engine.last_sequence(), "session opened");
        Ok(Self {
            session_id: session_id.to_string(),
            session_dir,
            config: config.clone(),
            genesis,
            engine,
            request_log,
        })
    }

    /// Deliver one envelope, then persist it.
    ///
    /// A rejected request is returned as `Ok(Err(_))` and is logged, since
    /// it consumed its sequence number. A fatal ledger error is returned
    /// as `Err` and nothing is written.
    ///
    /// The engine commits only after the log append succeeds. If the
    /// append fails, the ledger and the log both stay at the previous
    /// sequence and the session remains usable.
    pub fn apply(&mut self, envelope: &RequestEnvelope) -> Result<RequestOutcome> {
        let request_log = &mut self.request_log;
        let delivered = self
            .engine
            .deliver_then(envelope, |_| request_log.append(&kernel_to_proto(envelope)));
        let outcome = match delivered {
            Err(e) => {
                warn!(session = %self.session_id, sequence = envelope.sequence, error = %e, "request log append failed");
                return Err(e);
            }
            Ok(Err(err)) if err.is_fatal() => return Err(err.into()),
            Ok(outcome) => outcome,
        };

        let interval = self.config.snapshot_interval;
        if interval > 0 && envelope.sequence % interval == 0 {
            self.snapshot()?;
        }

        Ok(outcome)
    }

    /// Deliver `request` at the next sequence number.
    pub fn submit(&mut self, request: Request) -> Result<RequestOutcome> {
        let envelope = RequestEnvelope::new(self.engine.last_sequence() + 1, request);
        self.apply(&envelope)
    }

    /// Write a snapshot of the committed state at the current sequence.
    pub fn snapshot(&self) -> Result<PathBuf> {
        snapshot::save_snapshot(
            &self.session_dir.join(SNAPSHOT_DIR),
            self.engine.last_sequence(),
            self.engine.symbol_nonce(),
            &self.engine.export_genesis()?,
        )
    }

    /// Rebuild the engine from genesis and the full log, ignoring snapshots.
    pub fn replay_full(&mut self) -> Result<String> {
        let envelopes = load_envelopes(&self.request_log)?;
        let (engine, _, hash) = replay::rebuild(&self.config, &self.genesis, &envelopes)?;
        self.engine = engine;
        Ok(hash)
    }

    pub fn query(&self, path: &[&str]) -> Result<Vec<u8>> {
        Ok(self.engine.query(path)?)
    }

    pub fn export(&self) -> Result<GenesisState> {
        Ok(self.engine.export_genesis()?)
    }

    pub fn current_hash(&self) -> Result<String> {
        Ok(self.engine.state_hash()?)
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }
}

fn load_envelopes(log: &RequestLog) -> Result<Vec<RequestEnvelope>> {
    log.load_all()?
        .iter()
        .map(|p| proto_to_kernel(p).map_err(RuntimeError::from))
        .collect()
}

/// Engine at the latest usable snapshot, caught up with the log tail.
/// `Ok(None)` when there is no snapshot within the log.
fn restore_from_snapshot(
    config: &RuntimeConfig,
    snap_dir: &Path,
    envelopes: &[RequestEnvelope],
) -> Result<Option<LedgerEngine>> {
    let last_logged = envelopes.last().map(|e| e.sequence).unwrap_or(0);
    let snap = match snapshot::load_latest_snapshot(snap_dir)? {
        Some(snap) if snap.sequence <= last_logged => snap,
        _ => return Ok(None),
    };

    let state = snap.state()?;
    let mut engine = config.build_engine();
    engine.restore(&state, snap.sequence, snap.symbol_nonce)?;

    let tail: Vec<RequestEnvelope> = envelopes
        .iter()
        .filter(|e| e.sequence > snap.sequence)
        .cloned()
        .collect();
    engine.deliver_all(&tail)?;
    Ok(Some(engine))
}

/// Thread-safe session handle.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)
    }

    pub fn apply(&self, envelope: &RequestEnvelope) -> Result<RequestOutcome> {
        self.lock()?.apply(envelope)
    }

    pub fn submit(&self, request: Request) -> Result<RequestOutcome> {
        self.lock()?.submit(request)
    }

    pub fn query(&self, path: &[&str]) -> Result<Vec<u8>> {
        self.lock()?.query(path)
    }

    pub fn current_hash(&self) -> Result<String> {
        self.lock()?.current_hash()
    }

    pub fn current_sequence(&self) -> Result<u64> {
        Ok(self.lock()?.current_sequence())
    }
}
