//! Append-only request log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no reordering
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append and on load)
//!   - Rejected requests are logged too; they consumed a sequence number

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::proto_types::ProtoRequestEnvelope;

/// Largest accepted frame.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub struct RequestLog {
    path: PathBuf,
    last_sequence: u64,
}

impl RequestLog {
    /// Open or create a log at the given path.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let envelopes = Self::read_all_from_file(path)?;
            envelopes.last().map(|e| e.sequence).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append one envelope. Writes a length-prefixed frame and fsyncs.
    pub fn append(&mut self, envelope: &ProtoRequestEnvelope) -> Result<()> {
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(RuntimeError::LogSequence {
                expected,
                got: envelope.sequence,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = envelope.encode_to_vec();
        let len = u32::try_from(buf.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;

        let start = file.metadata()?.len();
        if let Err(e) = write_frame(&mut file, len, &buf) {
            // No partial frame may remain after a failed write.
            let _ = file.set_len(start);
            return Err(e.into());
        }

        debug!(sequence = envelope.sequence, bytes = buf.len(), "request appended");
        self.last_sequence = envelope.sequence;
        Ok(())
    }

    /// Load every envelope in sequence order.
    pub fn load_all(&self) -> Result<Vec<ProtoRequestEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all frames, validating framing, decoding and sequence order.
    fn read_all_from_file(path: &Path) -> Result<Vec<ProtoRequestEnvelope>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut envelopes: Vec<ProtoRequestEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];
        let mut offset: u64 = 0;

        loop {
            match read_prefix(&mut reader, &mut len_buf) {
                Ok(0) => break,
                Ok(4) => {}
                Ok(n) => {
                    return Err(RuntimeError::LogCorruption {
                        offset,
                        reason: format!("truncated length prefix ({} of 4 bytes)", n),
                    })
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(RuntimeError::LogCorruption {
                    offset,
                    reason: format!("invalid frame length {}", len),
                });
            }

            let mut frame = vec![0u8; len];
            reader.read_exact(&mut frame).map_err(|e| RuntimeError::LogCorruption {
                offset,
                reason: format!("truncated frame: {}", e),
            })?;

            let envelope = ProtoRequestEnvelope::decode(frame.as_slice()).map_err(|e| {
                RuntimeError::LogCorruption {
                    offset,
                    reason: format!("protobuf decode error: {}", e),
                }
            })?;

            let expected = envelopes.last().map(|e| e.sequence).unwrap_or(0) + 1;
            if envelope.sequence != expected {
                return Err(RuntimeError::LogCorruption {
                    offset,
                    reason: format!("sequence {} where {} was expected", envelope.sequence, expected),
                });
            }

            envelopes.push(envelope);
            offset += 4 + len as u64;
        }

        Ok(envelopes)
    }
}

fn write_frame(file: &mut File, len: u32, buf: &[u8]) -> io::Result<()> {
    {
        let mut writer = BufWriter::new(&mut *file);
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(buf)?;
        writer.flush()?;
    }
    file.sync_all()
}

/// Fill `buf` from `reader`, returning how many bytes were read before EOF.
fn read_prefix(reader: &mut impl Read, buf: &mut [u8; 4]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
