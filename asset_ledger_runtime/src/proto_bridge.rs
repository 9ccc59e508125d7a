//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between protobuf wire types (proto_types.rs) and the
//! kernel's records and request envelopes, and provides `ProtoCodec`,
//! the protobuf record codec registered with the keepers.
//!
//! Decoding is strict: a request envelope without a request kind is an
//! unknown request; malformed record bytes are a serialization failure.

use asset_ledger_kernel::account::CustomAccount;
use asset_ledger_kernel::codec::RecordCodec;
use asset_ledger_kernel::domain::{Address, Coins, Token};
use asset_ledger_kernel::error::LedgerError;
use asset_ledger_kernel::requests::{
    BurnCoins, FreezeCoins, IssueToken, MintCoins, Request, RequestEnvelope, UnfreezeCoins,
};
use prost::Message;

use crate::proto_types::*;

// ── Coins ──────────────────────────────────────────────────────

fn coins_to_proto(coins: &Coins) -> Vec<ProtoCoin> {
    coins
        .iter()
        .map(|(denom, amount)| ProtoCoin {
            denom: denom.clone(),
            amount: *amount,
        })
        .collect()
}

fn proto_to_coins(coins: &[ProtoCoin]) -> Result<Coins, LedgerError> {
    let decoded: Coins = coins.iter().map(|c| (c.denom.clone(), c.amount)).collect();
    if decoded.len() != coins.len() {
        return Err(LedgerError::SerializationFailure(
            "duplicate denomination in coin list".into(),
        ));
    }
    Ok(decoded)
}

// ── Records ────────────────────────────────────────────────────

pub fn token_to_proto(token: &Token) -> ProtoToken {
    ProtoToken {
        owner: token.owner.to_string(),
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        original_symbol: token.original_symbol.clone(),
        total_supply: coins_to_proto(&token.total_supply),
        mintable: token.mintable,
    }
}

pub fn proto_to_token(proto: &ProtoToken) -> Result<Token, LedgerError> {
    Ok(Token {
        owner: Address::new(proto.owner.clone()),
        name: proto.name.clone(),
        symbol: proto.symbol.clone(),
        original_symbol: proto.original_symbol.clone(),
        total_supply: proto_to_coins(&proto.total_supply)?,
        mintable: proto.mintable,
    })
}

pub fn account_to_proto(account: &CustomAccount) -> ProtoAccount {
    ProtoAccount {
        address: account.address().to_string(),
        coins: coins_to_proto(&account.base.coins),
        frozen_coins: coins_to_proto(&account.frozen.coins),
    }
}

pub fn proto_to_account(proto: &ProtoAccount) -> Result<CustomAccount, LedgerError> {
    Ok(CustomAccount::with_balances(
        Address::new(proto.address.clone()),
        proto_to_coins(&proto.coins)?,
        proto_to_coins(&proto.frozen_coins)?,
    ))
}

/// Protobuf encoding of stored records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoCodec;

impl RecordCodec for ProtoCodec {
    fn name(&self) -> &'static str {
        "proto"
    }

    fn encode_token(&self, token: &Token) -> Result<Vec<u8>, LedgerError> {
        Ok(token_to_proto(token).encode_to_vec())
    }

    fn decode_token(&self, bytes: &[u8]) -> Result<Token, LedgerError> {
        let proto = ProtoToken::decode(bytes)
            .map_err(|e| LedgerError::SerializationFailure(format!("token record: {}", e)))?;
        proto_to_token(&proto)
    }

    fn encode_account(&self, account: &CustomAccount) -> Result<Vec<u8>, LedgerError> {
        Ok(account_to_proto(account).encode_to_vec())
    }

    fn decode_account(&self, bytes: &[u8]) -> Result<CustomAccount, LedgerError> {
        let proto = ProtoAccount::decode(bytes)
            .map_err(|e| LedgerError::SerializationFailure(format!("account record: {}", e)))?;
        proto_to_account(&proto)
    }
}

// ── Request Envelopes ──────────────────────────────────────────

/// Convert a kernel envelope to its protobuf form.
pub fn kernel_to_proto(envelope: &RequestEnvelope) -> ProtoRequestEnvelope {
    let kind = match &envelope.request {
        Request::IssueToken(msg) => RequestKind::IssueToken(ProtoIssueToken {
            source_address: msg.source_address.to_string(),
            name: msg.name.clone(),
            symbol: msg.symbol.clone(),
            total_supply: msg.total_supply.clone(),
            mintable: msg.mintable,
        }),
        Request::MintCoins(msg) => RequestKind::MintCoins(ProtoMintCoins {
            amount: msg.amount.clone(),
            symbol: msg.symbol.clone(),
            minter: msg.minter.to_string(),
        }),
        Request::BurnCoins(msg) => RequestKind::BurnCoins(ProtoBurnCoins {
            amount: msg.amount.clone(),
            symbol: msg.symbol.clone(),
            source: msg.source.to_string(),
        }),
        Request::FreezeCoins(msg) => RequestKind::FreezeCoins(ProtoFreezeCoins {
            amount: msg.amount.clone(),
            symbol: msg.symbol.clone(),
            owner: msg.owner.to_string(),
        }),
        Request::UnfreezeCoins(msg) => RequestKind::UnfreezeCoins(ProtoUnfreezeCoins {
            amount: msg.amount.clone(),
            symbol: msg.symbol.clone(),
            owner: msg.owner.to_string(),
        }),
    };

    ProtoRequestEnvelope {
        sequence: envelope.sequence,
        schema_version: envelope.schema_version,
        request: Some(ProtoRequest { kind: Some(kind) }),
    }
}

/// Convert a protobuf envelope to the kernel's envelope.
///
/// A missing request, or a request whose oneof is unset (for instance a
/// kind added by a newer writer), is `UnknownRequest`.
pub fn proto_to_kernel(proto: &ProtoRequestEnvelope) -> Result<RequestEnvelope, LedgerError> {
    let kind = proto
        .request
        .as_ref()
        .and_then(|r| r.kind.as_ref())
        .ok_or_else(|| {
            LedgerError::UnknownRequest(format!("envelope {} carries no request kind", proto.sequence))
        })?;

    let request = match kind {
        RequestKind::IssueToken(m) => Request::IssueToken(IssueToken {
            source_address: Address::new(m.source_address.clone()),
            name: m.name.clone(),
            symbol: m.symbol.clone(),
            total_supply: m.total_supply.clone(),
            mintable: m.mintable,
        }),
        RequestKind::MintCoins(m) => Request::MintCoins(MintCoins {
            amount: m.amount.clone(),
            symbol: m.symbol.clone(),
            minter: Address::new(m.minter.clone()),
        }),
        RequestKind::BurnCoins(m) => Request::BurnCoins(BurnCoins {
            amount: m.amount.clone(),
            symbol: m.symbol.clone(),
            source: Address::new(m.source.clone()),
        }),
        RequestKind::FreezeCoins(m) => Request::FreezeCoins(FreezeCoins {
            amount: m.amount.clone(),
            symbol: m.symbol.clone(),
            owner: Address::new(m.owner.clone()),
        }),
        RequestKind::UnfreezeCoins(m) => Request::UnfreezeCoins(UnfreezeCoins {
            amount: m.amount.clone(),
            symbol: m.symbol.clone(),
            owner: Address::new(m.owner.clone()),
        }),
    };

    Ok(RequestEnvelope {
        sequence: proto.sequence,
        schema_version: proto.schema_version,
        request,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_supply_entry_survives_proto() {
        let token = Token::new("Zap", "ZAP-001", "ZAP", 0, Address::from("me"), false);
        let bytes = ProtoCodec.encode_token(&token).unwrap();
        let back = ProtoCodec.decode_token(&bytes).unwrap();
        assert_eq!(back, token);
        assert!(back.total_supply.contains("ZAP-001"));
    }

    #[test]
    fn garbage_is_a_serialization_failure() {
        let err = ProtoCodec.decode_account(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, LedgerError::SerializationFailure(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn duplicate_denominations_are_rejected() {
        let proto = ProtoAccount {
            address: "me".into(),
            coins: vec![
                ProtoCoin { denom: "ZAP-001".into(), amount: 1 },
                ProtoCoin { denom: "ZAP-001".into(), amount: 2 },
            ],
            frozen_coins: vec![],
        };
        assert!(proto_to_account(&proto).is_err());
    }

    #[test]
    fn empty_oneof_is_unknown_request() {
        let proto = ProtoRequestEnvelope {
            sequence: 3,
            schema_version: 1,
            request: Some(ProtoRequest { kind: None }),
        };
        assert!(matches!(proto_to_kernel(&proto), Err(LedgerError::UnknownRequest(_))));
        let missing = ProtoRequestEnvelope { request: None, ..proto };
        assert!(matches!(proto_to_kernel(&missing), Err(LedgerError::UnknownRequest(_))));
    }

    #[test]
    fn envelope_survives_proto() {
        let env = RequestEnvelope::new(
            9,
            Request::UnfreezeCoins(UnfreezeCoins::new("4", "ZAP-001", Address::from("me"))),
        );
        let bytes = kernel_to_proto(&env).encode_to_vec();
        let decoded = ProtoRequestEnvelope::decode(bytes.as_slice()).unwrap();
        assert_eq!(proto_to_kernel(&decoded).unwrap(), env);
    }
}
