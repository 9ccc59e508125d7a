//! Asset Ledger: Record Codec
//!
//! Stored values are opaque bytes. The codec is chosen once during
//! process setup and handed to the keepers; nothing registers itself
//! globally. The kernel ships a JSON codec; the runtime adds protobuf.

use crate::account::CustomAccount;
use crate::domain::Token;
use crate::error::LedgerError;

/// Encoding of registry and account records.
pub trait RecordCodec: Send + Sync {
    /// Short identifier, e.g. for logs and config.
    fn name(&self) -> &'static str;

    fn encode_token(&self, token: &Token) -> Result<Vec<u8>, LedgerError>;

    fn decode_token(&self, bytes: &[u8]) -> Result<Token, LedgerError>;

    fn encode_account(&self, account: &CustomAccount) -> Result<Vec<u8>, LedgerError>;

    fn decode_account(&self, bytes: &[u8]) -> Result<CustomAccount, LedgerError>;
}

/// Compact serde_json encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_token(&self, token: &Token) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(token)?)
    }

    fn decode_token(&self, bytes: &[u8]) -> Result<Token, LedgerError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode_account(&self, account: &CustomAccount) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(account)?)
    }

    fn decode_account(&self, bytes: &[u8]) -> Result<CustomAccount, LedgerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
