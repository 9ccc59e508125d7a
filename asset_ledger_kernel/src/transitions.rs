//! Asset Ledger: Centralized Transition Logic
//!
//! ALL state-mutation logic lives here. One handler per request type,
//! each running against the request's scoped writes. Handlers may leave
//! partial writes behind on error; the caller discards the scope.
//! All math is checked integer arithmetic.

use tracing::info;

use crate::arithmetic::{checked_add, checked_sub, parse_amount};
use crate::bank::AccountKeeper;
use crate::domain::{Address, Coins, LedgerParams, Receipt, Token};
use crate::error::LedgerError;
use crate::registry::TokenRegistry;
use crate::requests::{BurnCoins, FreezeCoins, IssueToken, MintCoins, Request, UnfreezeCoins};
use crate::store::{KvStore, ScopedWrites};
use crate::symbol::SymbolGenerator;

/// Keepers and parameters shared by every handler.
#[derive(Clone)]
pub struct Keepers {
    pub registry: TokenRegistry,
    pub accounts: AccountKeeper,
    pub params: LedgerParams,
}

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `request` to `scope`. The request must already have passed
/// `validate_basic`.
pub fn apply_request(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    generator: &mut dyn SymbolGenerator,
    request: &Request,
) -> Result<Receipt, LedgerError> {
    match request {
        Request::IssueToken(msg) => issue_token(keepers, scope, generator, msg),
        Request::MintCoins(msg) => mint_coins(keepers, scope, msg),
        Request::BurnCoins(msg) => burn_coins(keepers, scope, msg),
        Request::FreezeCoins(msg) => freeze_coins(keepers, scope, msg),
        Request::UnfreezeCoins(msg) => unfreeze_coins(keepers, scope, msg),
    }
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn issue_token(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    generator: &mut dyn SymbolGenerator,
    msg: &IssueToken,
) -> Result<Receipt, LedgerError> {
    let supply = parse_amount(&msg.total_supply)?;
    let symbol = derive_symbol(keepers, &scope.tokens, generator, &msg.symbol)?;

    keepers
        .accounts
        .credit(&mut scope.accounts, &msg.source_address, &symbol, supply)?;
    let token = Token::new(
        &msg.name,
        &symbol,
        &msg.symbol,
        supply,
        msg.source_address.clone(),
        msg.mintable,
    );
    keepers.registry.set(&mut scope.tokens, &symbol, &token)?;

    info!(
        symbol = %symbol,
        original_symbol = %msg.symbol,
        owner = %msg.source_address,
        supply,
        "token issued"
    );
    let mut receipt = Receipt::new("issue_token", &symbol, &msg.source_address, supply);
    receipt.total_supply = Some(supply);
    Ok(receipt)
}

/// Ask the generator until it yields a symbol not yet in the registry.
fn derive_symbol(
    keepers: &Keepers,
    tokens: &dyn KvStore,
    generator: &mut dyn SymbolGenerator,
    requested: &str,
) -> Result<String, LedgerError> {
    let attempts = keepers.params.max_symbol_attempts.max(1);
    for _ in 0..attempts {
        let candidate = generator.generate(requested);
        if !candidate.is_empty() && !keepers.registry.exists(tokens, &candidate) {
            return Ok(candidate);
        }
    }
    Err(LedgerError::DuplicateOrFailedSymbolGeneration {
        requested: requested.to_string(),
        attempts,
    })
}

/// Registry entry of `symbol` if `signer` owns it.
fn owned_token(
    keepers: &Keepers,
    tokens: &dyn KvStore,
    symbol: &str,
    signer: &Address,
) -> Result<Token, LedgerError> {
    let token = keepers.registry.get(tokens, symbol)?;
    if *signer != token.owner {
        return Err(LedgerError::Unauthorized {
            expected_owner: token.owner.to_string(),
            actual_signer: signer.to_string(),
        });
    }
    Ok(token)
}

fn mint_coins(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    msg: &MintCoins,
) -> Result<Receipt, LedgerError> {
    let token = owned_token(keepers, &scope.tokens, &msg.symbol, &msg.minter)?;
    if keepers.params.enforce_mintable && !token.mintable {
        return Err(LedgerError::NotMintable(msg.symbol.clone()));
    }
    let amount = parse_amount(&msg.amount)?;

    let balance = keepers
        .accounts
        .credit(&mut scope.accounts, &token.owner, &msg.symbol, amount)?;
    let supply = checked_add(token.supply(), amount)?;
    keepers
        .registry
        .set_total_supply(&mut scope.tokens, &msg.symbol, Coins::single(&msg.symbol, supply))?;

    info!(symbol = %msg.symbol, owner = %token.owner, amount, balance, supply, "coins minted");
    let mut receipt = Receipt::new("mint_coins", &msg.symbol, &token.owner, amount);
    receipt.total_supply = Some(supply);
    Ok(receipt)
}

fn burn_coins(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    msg: &BurnCoins,
) -> Result<Receipt, LedgerError> {
    let token = owned_token(keepers, &scope.tokens, &msg.symbol, &msg.source)?;
    let amount = parse_amount(&msg.amount)?;

    let balance = keepers
        .accounts
        .debit(&mut scope.accounts, &token.owner, &msg.symbol, amount)?;
    // The owner held `amount`, so aggregate supply covers it unless
    // coins of this symbol came from outside issuance (genesis accounts).
    let supply = checked_sub(token.supply(), amount).ok_or_else(|| LedgerError::InsufficientBalance {
        address: token.owner.to_string(),
        symbol: msg.symbol.clone(),
        available: token.supply(),
        requested: amount,
    })?;
    keepers
        .registry
        .set_total_supply(&mut scope.tokens, &msg.symbol, Coins::single(&msg.symbol, supply))?;

    info!(symbol = %msg.symbol, owner = %token.owner, amount, balance, supply, "coins burned");
    let mut receipt = Receipt::new("burn_coins", &msg.symbol, &token.owner, amount);
    receipt.total_supply = Some(supply);
    Ok(receipt)
}

fn freeze_coins(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    msg: &FreezeCoins,
) -> Result<Receipt, LedgerError> {
    let amount = parse_amount(&msg.amount)?;
    let (unfrozen, frozen) = keepers
        .accounts
        .freeze(&mut scope.accounts, &msg.owner, &msg.symbol, amount)?;

    info!(symbol = %msg.symbol, owner = %msg.owner, amount, unfrozen, frozen, "coins frozen");
    let mut receipt = Receipt::new("freeze_coins", &msg.symbol, &msg.owner, amount);
    receipt.unfrozen = Some(unfrozen);
    receipt.frozen = Some(frozen);
    Ok(receipt)
}

fn unfreeze_coins(
    keepers: &Keepers,
    scope: &mut ScopedWrites<'_>,
    msg: &UnfreezeCoins,
) -> Result<Receipt, LedgerError> {
    let amount = parse_amount(&msg.amount)?;
    let (unfrozen, frozen) = keepers
        .accounts
        .unfreeze(&mut scope.accounts, &msg.owner, &msg.symbol, amount)?;

    info!(symbol = %msg.symbol, owner = %msg.owner, amount, unfrozen, frozen, "coins unfrozen");
    let mut receipt = Receipt::new("unfreeze_coins", &msg.symbol, &msg.owner, amount);
    receipt.unfrozen = Some(unfrozen);
    receipt.frozen = Some(frozen);
    Ok(receipt)
}
