//! Snapshot layer: deterministic ledger snapshots.
//!
//! A snapshot carries the canonical JSON of the exported state, its hash,
//! the sequence it was taken at and the symbol generator nonce, so that a
//! restored ledger issues the same symbols as a full replay.
//! No timestamps in snapshot content.
//!
//! If a snapshot hash doesn't verify, the session falls back to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_kernel::hashing::sha256_hex;
use asset_ledger_kernel::LEDGER_VERSION;

use crate::error::Result;
use crate::snapshot_codec::{decode_snapshot, encode_snapshot, SnapshotError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Sequence number at which this snapshot was taken.
    pub sequence: u64,
    /// Symbol generator nonce after `sequence` was applied.
    pub symbol_nonce: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub ledger_version: u32,
}

impl Snapshot {
    pub fn new(sequence: u64, symbol_nonce: u64, state: &GenesisState) -> Result<Self> {
        let canonical_json = encode_snapshot(state)?;
        let hash = sha256_hex(canonical_json.as_bytes());
        Ok(Self {
            sequence,
            symbol_nonce,
            canonical_json,
            hash,
            ledger_version: LEDGER_VERSION,
        })
    }

    /// Decode the embedded state after checking version and hash.
    pub fn state(&self) -> Result<GenesisState> {
        if self.ledger_version != LEDGER_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: LEDGER_VERSION,
                got: u64::from(self.ledger_version),
            }
            .into());
        }
        if !verify_snapshot_hash(self) {
            return Err(SnapshotError::HashMismatch {
                recorded: self.hash.clone(),
                computed: sha256_hex(self.canonical_json.as_bytes()),
            }
            .into());
        }
        Ok(decode_snapshot(&self.canonical_json)?)
    }
}

fn snapshot_file(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

/// Save a deterministic snapshot of the given state.
pub fn save_snapshot(
    dir: &Path,
    sequence: u64,
    symbol_nonce: u64,
    state: &GenesisState,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let snap = Snapshot::new(sequence, symbol_nonce, state)?;
    let content = serde_json::to_string(&snap)
        .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;

    let path = snapshot_file(dir, sequence);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    debug!(sequence, hash = %snap.hash, "snapshot saved");
    Ok(path)
}

/// Load the snapshot taken at `sequence`, if any.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>> {
    let path = snapshot_file(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap: Snapshot = serde_json::from_str(&content)
        .map_err(|e| SnapshotError::DeserializationError(format!("bad snapshot: {}", e)))?;
    Ok(Some(snap))
}

/// Sequence numbers of every snapshot file in `dir`, ascending.
pub fn list_snapshots(dir: &Path) -> Result<Vec<u64>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sequences = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if let Some(seq) = name
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok())
        {
            sequences.push(seq);
        }
    }
    sequences.sort_unstable();
    Ok(sequences)
}

/// Load the snapshot with the highest sequence in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>> {
    match list_snapshots(dir)?.last() {
        Some(&seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// True if the recorded hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    sha256_hex(snap.canonical_json.as_bytes()) == snap.hash
}
