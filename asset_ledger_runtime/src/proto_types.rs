//! Hand-written protobuf types for ledger records and request envelopes.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the persisted format; never renumber.

use prost::Message;

// ── Records ────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCoin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(uint64, tag = "2")]
    pub amount: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoToken {
    #[prost(string, tag = "1")]
    pub owner: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub symbol: String,
    #[prost(string, tag = "4")]
    pub original_symbol: String,
    #[prost(message, repeated, tag = "5")]
    pub total_supply: Vec<ProtoCoin>,
    #[prost(bool, tag = "6")]
    pub mintable: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoAccount {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(message, repeated, tag = "2")]
    pub coins: Vec<ProtoCoin>,
    #[prost(message, repeated, tag = "3")]
    pub frozen_coins: Vec<ProtoCoin>,
}

// ── Request Envelope ───────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoRequestEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint32, tag = "2")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "3")]
    pub request: Option<ProtoRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoRequest {
    #[prost(oneof = "RequestKind", tags = "1, 2, 3, 4, 5")]
    pub kind: Option<RequestKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum RequestKind {
    #[prost(message, tag = "1")]
    IssueToken(ProtoIssueToken),
    #[prost(message, tag = "2")]
    MintCoins(ProtoMintCoins),
    #[prost(message, tag = "3")]
    BurnCoins(ProtoBurnCoins),
    #[prost(message, tag = "4")]
    FreezeCoins(ProtoFreezeCoins),
    #[prost(message, tag = "5")]
    UnfreezeCoins(ProtoUnfreezeCoins),
}

// ── Request Types ──────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoIssueToken {
    #[prost(string, tag = "1")]
    pub source_address: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub symbol: String,
    #[prost(string, tag = "4")]
    pub total_supply: String,
    #[prost(bool, tag = "5")]
    pub mintable: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoMintCoins {
    #[prost(string, tag = "1")]
    pub amount: String,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(string, tag = "3")]
    pub minter: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoBurnCoins {
    #[prost(string, tag = "1")]
    pub amount: String,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(string, tag = "3")]
    pub source: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoFreezeCoins {
    #[prost(string, tag = "1")]
    pub amount: String,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(string, tag = "3")]
    pub owner: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoUnfreezeCoins {
    #[prost(string, tag = "1")]
    pub amount: String,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(string, tag = "3")]
    pub owner: String,
}
