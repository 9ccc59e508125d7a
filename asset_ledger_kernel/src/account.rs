//! Asset Ledger: Account Partition
//!
//! An account is a base balance plus a frozen-balance capability.
//! Freezing moves an amount from the unfrozen bucket to the frozen one;
//! unfreezing moves it back. Both moves preserve
//! `unfrozen(symbol) + frozen(symbol)`.

use serde::{Deserialize, Serialize};

use crate::arithmetic::Amount;
use crate::domain::{Address, Coins};
use crate::error::{AmountIssue, LedgerError};

/// Spendable coins of one address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseAccount {
    pub address: Address,
    pub coins: Coins,
}

/// Coins excluded from transacting until explicitly unfrozen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrozenBalance {
    pub coins: Coins,
}

/// Base account combined with its frozen balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomAccount {
    pub base: BaseAccount,
    pub frozen: FrozenBalance,
}

impl CustomAccount {
    pub fn new(address: Address) -> Self {
        Self {
            base: BaseAccount {
                address,
                coins: Coins::new(),
            },
            frozen: FrozenBalance::default(),
        }
    }

    pub fn with_balances(address: Address, coins: Coins, frozen_coins: Coins) -> Self {
        Self {
            base: BaseAccount { address, coins },
            frozen: FrozenBalance {
                coins: frozen_coins,
            },
        }
    }

    pub fn address(&self) -> &Address {
        &self.base.address
    }

    pub fn unfrozen(&self, symbol: &str) -> Amount {
        self.base.coins.amount_of(symbol)
    }

    pub fn frozen(&self, symbol: &str) -> Amount {
        self.frozen.coins.amount_of(symbol)
    }

    pub fn set_unfrozen(&mut self, symbol: &str, amount: Amount) {
        self.base.coins.set_amount(symbol, amount);
    }

    pub fn set_frozen(&mut self, symbol: &str, amount: Amount) {
        self.frozen.coins.set_amount(symbol, amount);
    }

    /// True when both buckets are empty; such accounts are not stored.
    pub fn is_empty(&self) -> bool {
        self.base.coins.is_empty() && self.frozen.coins.is_empty()
    }

    /// Move `amount` of `symbol` from unfrozen to frozen.
    ///
    /// On error the account is unchanged.
    pub fn freeze(&mut self, symbol: &str, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(AmountIssue::Zero));
        }
        let available = self.unfrozen(symbol);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: self.address().to_string(),
                symbol: symbol.to_string(),
                available,
                requested: amount,
            });
        }
        // Credit first so an overflow leaves both buckets untouched.
        let mut frozen = self.frozen.coins.clone();
        frozen.add_amount(symbol, amount)?;
        self.set_unfrozen(symbol, available - amount);
        self.frozen.coins = frozen;
        Ok(())
    }

    /// Move `amount` of `symbol` from frozen back to unfrozen.
    pub fn unfreeze(&mut self, symbol: &str, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(AmountIssue::Zero));
        }
        let available = self.frozen(symbol);
        if available < amount {
            return Err(LedgerError::InsufficientFrozenBalance {
                address: self.address().to_string(),
                symbol: symbol.to_string(),
                available,
                requested: amount,
            });
        }
        let mut coins = self.base.coins.clone();
        coins.add_amount(symbol, amount)?;
        self.set_frozen(symbol, available - amount);
        self.base.coins = coins;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZAP: &str = "ZAP-001";

    fn funded(amount: Amount) -> CustomAccount {
        CustomAccount::with_balances(Address::from("alice"), Coins::single(ZAP, amount), Coins::new())
    }

    #[test]
    fn freeze_moves_between_buckets() {
        let mut acc = funded(10);
        acc.freeze(ZAP, 4).unwrap();
        assert_eq!(acc.unfrozen(ZAP), 6);
        assert_eq!(acc.frozen(ZAP), 4);
    }

    #[test]
    fn freeze_then_unfreeze_restores_buckets() {
        let original = funded(10);
        for amount in 1..=10 {
            let mut acc = original.clone();
            acc.freeze(ZAP, amount).unwrap();
            acc.unfreeze(ZAP, amount).unwrap();
            assert_eq!(acc, original, "round trip of {} changed the account", amount);
        }
    }

    #[test]
    fn freeze_over_request_fails_and_changes_nothing() {
        let mut acc = funded(5);
        let err = acc.freeze(ZAP, 10).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { available: 5, requested: 10, .. }
        ));
        assert_eq!(acc, funded(5));
    }

    #[test]
    fn unfreeze_over_request_fails() {
        let mut acc = funded(5);
        acc.freeze(ZAP, 2).unwrap();
        let err = acc.unfreeze(ZAP, 3).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFrozenBalance { available: 2, .. }));
        assert_eq!(acc.unfrozen(ZAP), 3);
        assert_eq!(acc.frozen(ZAP), 2);
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut acc = funded(5);
        assert_eq!(acc.freeze(ZAP, 0), Err(LedgerError::InvalidAmount(AmountIssue::Zero)));
        assert_eq!(acc.unfreeze(ZAP, 0), Err(LedgerError::InvalidAmount(AmountIssue::Zero)));
    }

    #[test]
    fn sum_is_conserved_across_sequences() {
        let mut acc = funded(100);
        let steps: [(bool, Amount); 6] = [(true, 30), (true, 50), (false, 20), (true, 40), (false, 100), (true, 7)];
        for (freeze, amount) in steps {
            let _ = if freeze { acc.freeze(ZAP, amount) } else { acc.unfreeze(ZAP, amount) };
            assert_eq!(acc.unfrozen(ZAP) + acc.frozen(ZAP), 100);
        }
    }
}
