//! Asset Ledger: Request Definitions
//!
//! Requests are pure data plus stateless validation. They contain no
//! transition logic. The request set is closed; an unknown request can
//! only appear at the decoding boundary, where it is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arithmetic::{parse_amount, parse_positive_amount};
use crate::domain::Address;
use crate::error::LedgerError;
use crate::hashing::sorted_json;

/// Route of every request handled by this ledger.
pub const ROUTE: &str = "assetmanagement";

/// Schema version of request envelopes. Anything else is rejected.
pub const SCHEMA_VERSION: u32 = 1;

/// Wire tags, in declaration order of `Request`.
pub const REQUEST_TAGS: [&str; 5] = [
    "assetmanagement/IssueToken",
    "assetmanagement/MintCoins",
    "assetmanagement/BurnCoins",
    "assetmanagement/FreezeCoins",
    "assetmanagement/UnfreezeCoins",
];

// ── Payloads ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueToken {
    pub source_address: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: String,
    pub mintable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MintCoins {
    pub amount: String,
    pub symbol: String,
    pub minter: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BurnCoins {
    pub amount: String,
    pub symbol: String,
    pub source: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FreezeCoins {
    pub amount: String,
    pub symbol: String,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnfreezeCoins {
    pub amount: String,
    pub symbol: String,
    pub owner: Address,
}

impl IssueToken {
    pub fn new(source_address: Address, name: &str, symbol: &str, total_supply: &str, mintable: bool) -> Self {
        Self {
            source_address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            total_supply: total_supply.to_string(),
            mintable,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        if self.source_address.is_empty() {
            return Err(LedgerError::InvalidRequest("source address cannot be empty".into()));
        }
        if self.name.is_empty() || self.symbol.is_empty() || self.total_supply.is_empty() {
            return Err(LedgerError::InvalidRequest(
                "name, symbol and/or total supply cannot be empty".into(),
            ));
        }
        parse_amount(&self.total_supply)?;
        Ok(())
    }
}

impl MintCoins {
    pub fn new(amount: &str, symbol: &str, minter: Address) -> Self {
        Self {
            amount: amount.to_string(),
            symbol: symbol.to_string(),
            minter,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        if self.minter.is_empty() {
            return Err(LedgerError::InvalidRequest("minter address cannot be empty".into()));
        }
        validate_signed_amount(&self.symbol, &self.amount)
    }
}

impl BurnCoins {
    pub fn new(amount: &str, symbol: &str, source: Address) -> Self {
        Self {
            amount: amount.to_string(),
            symbol: symbol.to_string(),
            source,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        if self.source.is_empty() {
            return Err(LedgerError::InvalidRequest("source address cannot be empty".into()));
        }
        validate_signed_amount(&self.symbol, &self.amount)
    }
}

impl FreezeCoins {
    pub fn new(amount: &str, symbol: &str, owner: Address) -> Self {
        Self {
            amount: amount.to_string(),
            symbol: symbol.to_string(),
            owner,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        validate_partition_move(&self.owner, &self.symbol, &self.amount)
    }
}

impl UnfreezeCoins {
    pub fn new(amount: &str, symbol: &str, owner: Address) -> Self {
        Self {
            amount: amount.to_string(),
            symbol: symbol.to_string(),
            owner,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        validate_partition_move(&self.owner, &self.symbol, &self.amount)
    }
}

/// Mint / burn: syntactic checks only. Parsing happens in the handler.
fn validate_signed_amount(symbol: &str, amount: &str) -> Result<(), LedgerError> {
    if symbol.is_empty() || amount.is_empty() {
        return Err(LedgerError::InvalidRequest("symbol and/or amount cannot be empty".into()));
    }
    if amount.contains('-') {
        return Err(LedgerError::InvalidRequest("amount cannot be negative".into()));
    }
    Ok(())
}

fn validate_partition_move(owner: &Address, symbol: &str, amount: &str) -> Result<(), LedgerError> {
    parse_positive_amount(amount)?;
    if symbol.is_empty() {
        return Err(LedgerError::InvalidRequest("symbol cannot be empty".into()));
    }
    if owner.is_empty() {
        return Err(LedgerError::InvalidRequest("owner address cannot be empty".into()));
    }
    Ok(())
}

// ── Request ────────────────────────────────────────────────────────

/// One state-transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Request {
    #[serde(rename = "assetmanagement/IssueToken")]
    IssueToken(IssueToken),
    #[serde(rename = "assetmanagement/MintCoins")]
    MintCoins(MintCoins),
    #[serde(rename = "assetmanagement/BurnCoins")]
    BurnCoins(BurnCoins),
    #[serde(rename = "assetmanagement/FreezeCoins")]
    FreezeCoins(FreezeCoins),
    #[serde(rename = "assetmanagement/UnfreezeCoins")]
    UnfreezeCoins(UnfreezeCoins),
}

impl Request {
    pub fn route(&self) -> &'static str {
        ROUTE
    }

    /// Action name, e.g. `issue_token`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Request::IssueToken(_) => "issue_token",
            Request::MintCoins(_) => "mint_coins",
            Request::BurnCoins(_) => "burn_coins",
            Request::FreezeCoins(_) => "freeze_coins",
            Request::UnfreezeCoins(_) => "unfreeze_coins",
        }
    }

    /// Stateless checks, run before any state is touched.
    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        match self {
            Request::IssueToken(msg) => msg.validate_basic(),
            Request::MintCoins(msg) => msg.validate_basic(),
            Request::BurnCoins(msg) => msg.validate_basic(),
            Request::FreezeCoins(msg) => msg.validate_basic(),
            Request::UnfreezeCoins(msg) => msg.validate_basic(),
        }
    }

    /// Addresses whose signature authorizes the request.
    pub fn signers(&self) -> Vec<Address> {
        let signer = match self {
            Request::IssueToken(msg) => &msg.source_address,
            Request::MintCoins(msg) => &msg.minter,
            Request::BurnCoins(msg) => &msg.source,
            Request::FreezeCoins(msg) => &msg.owner,
            Request::UnfreezeCoins(msg) => &msg.owner,
        };
        vec![signer.clone()]
    }

    /// Sorted-key JSON of the tagged request, the bytes a signer signs.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let value = sorted_json(serde_json::to_value(self)?);
        Ok(serde_json::to_vec(&value)?)
    }

    /// Decode a tagged JSON request. Unknown tags are `UnknownRequest`;
    /// malformed bodies are `InvalidRequest`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, LedgerError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::InvalidRequest(format!("malformed request: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, LedgerError> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::UnknownRequest("missing request type".into()))?;
        if !REQUEST_TAGS.contains(&tag) {
            return Err(LedgerError::UnknownRequest(tag.to_string()));
        }
        serde_json::from_value(value).map_err(|e| LedgerError::InvalidRequest(e.to_string()))
    }
}

// ── Envelope ───────────────────────────────────────────────────────

/// A request as delivered by the ordering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub sequence: u64,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub request: Request,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RequestEnvelope {
    pub fn new(sequence: u64, request: Request) -> Self {
        Self {
            sequence,
            schema_version: SCHEMA_VERSION,
            request,
        }
    }

    /// Parse an envelope from JSON (fixtures, harness input).
    pub fn from_value(value: &Value) -> Result<Self, LedgerError> {
        let sequence = value
            .get("sequence")
            .and_then(Value::as_u64)
            .ok_or_else(|| LedgerError::InvalidRequest("envelope missing sequence".into()))?;
        let schema_version = match value.get("schema_version") {
            None => SCHEMA_VERSION,
            Some(raw) => raw
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    LedgerError::InvalidRequest(format!("schema_version {} is not a u32", raw))
                })?,
        };
        let request = Request::from_value(value.get("request").cloned().unwrap_or(Value::Null))?;
        Ok(Self {
            sequence,
            schema_version,
            request,
        })
    }
}
