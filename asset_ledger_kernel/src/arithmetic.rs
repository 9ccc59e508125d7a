//! Asset Ledger: Amount Arithmetic
//!
//! All amounts are unsigned 64-bit integers. No float, no wrapping.
//! Every operation that can overflow or underflow returns an error instead.

use crate::error::{AmountIssue, LedgerError};

/// Token amount in the smallest indivisible unit of its symbol.
pub type Amount = u64;

/// Checked amount addition. Fails with `InvalidAmount(Overflow)`.
pub fn checked_add(a: Amount, b: Amount) -> Result<Amount, LedgerError> {
    a.checked_add(b)
        .ok_or(LedgerError::InvalidAmount(AmountIssue::Overflow))
}

/// Checked amount subtraction. Returns `None` when `b > a`; callers map
/// that to the balance error appropriate for the bucket being debited.
pub fn checked_sub(a: Amount, b: Amount) -> Option<Amount> {
    a.checked_sub(b)
}

/// Parse a base-10 amount string as carried on the wire.
///
/// Leading `+`, whitespace, decimal points and exponents are rejected.
/// Anything containing `-` is reported as negative rather than unparseable.
pub fn parse_amount(raw: &str) -> Result<Amount, LedgerError> {
    if raw.contains('-') {
        return Err(LedgerError::InvalidAmount(AmountIssue::Negative));
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidAmount(AmountIssue::Unparseable(
            raw.to_string(),
        )));
    }
    raw.parse::<Amount>()
        .map_err(|_| LedgerError::InvalidAmount(AmountIssue::Overflow))
}

/// Parse an amount that must be strictly positive (freeze / unfreeze).
pub fn parse_positive_amount(raw: &str) -> Result<Amount, LedgerError> {
    match parse_amount(raw)? {
        0 => Err(LedgerError::InvalidAmount(AmountIssue::Zero)),
        n => Ok(n),
    }
}
