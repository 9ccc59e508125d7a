//! Asset Ledger: Core Domain Types
//!
//! Pure data. No transition logic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{checked_add, Amount};
use crate::error::LedgerError;

// ── Address ────────────────────────────────────────────────────────

/// Account identifier. Signature and bech32 checks happen upstream;
/// the ledger only requires it to be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// ── Coins ──────────────────────────────────────────────────────────

/// Denomination → amount, ordered by denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(BTreeMap<String, Amount>);

impl Coins {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A single-denomination entry. Zero amounts are kept, so a token
    /// whose supply has been burned to zero still names its denomination.
    pub fn single(denom: &str, amount: Amount) -> Self {
        let mut map = BTreeMap::new();
        map.insert(denom.to_string(), amount);
        Self(map)
    }

    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn contains(&self, denom: &str) -> bool {
        self.0.contains_key(denom)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Amount)> {
        self.0.iter()
    }

    /// Overwrite one denomination. Zero removes the entry.
    pub fn set_amount(&mut self, denom: &str, amount: Amount) {
        if amount == 0 {
            self.0.remove(denom);
        } else {
            self.0.insert(denom.to_string(), amount);
        }
    }

    /// Add to one denomination, returning the new amount.
    pub fn add_amount(&mut self, denom: &str, amount: Amount) -> Result<Amount, LedgerError> {
        let next = checked_add(self.amount_of(denom), amount)?;
        self.set_amount(denom, next);
        Ok(next)
    }

    /// True if any stored entry is zero. Only `single` can produce one.
    pub fn has_zero_entry(&self) -> bool {
        self.0.values().any(|a| *a == 0)
    }
}

impl FromIterator<(String, Amount)> for Coins {
    fn from_iter<I: IntoIterator<Item = (String, Amount)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(d, a)| format!("{}{}", a, d)).collect();
        f.write_str(&parts.join(","))
    }
}

// ── Token ──────────────────────────────────────────────────────────

/// Registry record for one issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Token {
    pub owner: Address,
    /// Display name, e.g. "Fantom Chain Token".
    pub name: String,
    /// Unique derived symbol, e.g. "FTM-0A3".
    pub symbol: String,
    /// Symbol as requested at issuance, e.g. "FTM".
    pub original_symbol: String,
    /// Aggregate issued supply, denominated in `symbol`.
    pub total_supply: Coins,
    pub mintable: bool,
}

impl Token {
    pub fn new(
        name: &str,
        symbol: &str,
        original_symbol: &str,
        total_supply: Amount,
        owner: Address,
        mintable: bool,
    ) -> Self {
        Self {
            owner,
            name: name.to_string(),
            symbol: symbol.to_string(),
            original_symbol: original_symbol.to_string(),
            total_supply: Coins::single(symbol, total_supply),
            mintable,
        }
    }

    /// Supply in the token's own denomination.
    pub fn supply(&self) -> Amount {
        self.total_supply.amount_of(&self.symbol)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Owner: {}\nName: {}\nSymbol: {}\nOriginal Symbol: {}\nTotal Supply: {}\nMintable: {}",
            self.owner, self.name, self.symbol, self.original_symbol, self.total_supply, self.mintable
        )
    }
}

// ── Parameters ─────────────────────────────────────────────────────

/// Tunables injected once at engine construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerParams {
    /// Hex digits appended to a requested symbol.
    pub symbol_suffix_len: usize,
    /// Generator calls per issuance before giving up on a collision.
    pub max_symbol_attempts: u32,
    /// Opt-in: reject mint requests against tokens issued with `mintable = false`.
    /// Off by default; the owner may always mint.
    pub enforce_mintable: bool,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            symbol_suffix_len: 3,
            max_symbol_attempts: 8,
            enforce_mintable: false,
        }
    }
}

// ── Receipt ────────────────────────────────────────────────────────

/// Structured outcome of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub request_type: String,
    /// Symbol acted on. For issuance, the derived symbol.
    pub symbol: String,
    pub address: Address,
    pub amount: Amount,
    /// Token supply after the transition, for issue / mint / burn.
    pub total_supply: Option<Amount>,
    /// Account buckets after the transition, for freeze / unfreeze.
    pub unfrozen: Option<Amount>,
    pub frozen: Option<Amount>,
}

impl Receipt {
    pub fn new(request_type: &str, symbol: &str, address: &Address, amount: Amount) -> Self {
        Self {
            request_type: request_type.to_string(),
            symbol: symbol.to_string(),
            address: address.clone(),
            amount,
            total_supply: None,
            unfrozen: None,
            frozen: None,
        }
    }
}
