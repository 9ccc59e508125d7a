#![forbid(unsafe_code)]

//! Asset Ledger Runtime
//!
//! Wraps the ledger kernel with configuration, logging, a protobuf
//! request log, replay, snapshots, session management, and drift
//! detection.
//!
//! No domain logic lives here. All transitions and invariants are
//! delegated to the kernel.

pub mod config;
pub mod drift;
pub mod error;
pub mod logging;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod request_log;
pub mod session;
pub mod snapshot;
pub mod snapshot_codec;
