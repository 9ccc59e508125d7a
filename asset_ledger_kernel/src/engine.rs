//! Asset Ledger: Engine
//!
//! Top-level orchestrator. Delegates mutation to transitions, validates
//! via invariants, and owns the only mutable handle to the store.
//!
//! Strict sequence enforcement, genesis-first.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bank::AccountKeeper;
use crate::codec::{JsonCodec, RecordCodec};
use crate::domain::{LedgerParams, Receipt};
use crate::error::LedgerError;
use crate::genesis::{export_genesis, init_genesis, GenesisState};
use crate::hashing::canonical_hash;
use crate::invariants::validate_invariants;
use crate::querier;
use crate::registry::TokenRegistry;
use crate::requests::{RequestEnvelope, SCHEMA_VERSION};
use crate::store::LedgerStore;
use crate::symbol::{DigestSymbolGenerator, SymbolGenerator};
use crate::transitions::{apply_request, Keepers};

/// Stateful engine wrapping the transition layer.
pub struct LedgerEngine {
    store: LedgerStore,
    keepers: Keepers,
    codec_name: &'static str,
    generator: Box<dyn SymbolGenerator>,
    last_sequence: u64,
    genesis_initialized: bool,
}

impl LedgerEngine {
    /// Create an engine with an explicitly registered record codec.
    pub fn new(
        codec: Arc<dyn RecordCodec>,
        generator: Box<dyn SymbolGenerator>,
        params: LedgerParams,
    ) -> Self {
        let codec_name = codec.name();
        Self {
            store: LedgerStore::new(),
            keepers: Keepers {
                registry: TokenRegistry::new(codec.clone()),
                accounts: AccountKeeper::new(codec),
                params,
            },
            codec_name,
            generator,
            last_sequence: 0,
            genesis_initialized: false,
        }
    }

    /// JSON records and the digest symbol generator seeded with `seed`.
    pub fn with_seed(seed: u64, params: LedgerParams) -> Self {
        let generator = DigestSymbolGenerator::new(seed, params.symbol_suffix_len);
        Self::new(Arc::new(JsonCodec), Box::new(generator), params)
    }

    pub fn keepers(&self) -> &Keepers {
        &self.keepers
    }

    pub fn params(&self) -> &LedgerParams {
        &self.keepers.params
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec_name
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn is_initialized(&self) -> bool {
        self.genesis_initialized
    }

    pub fn symbol_nonce(&self) -> u64 {
        self.generator.nonce()
    }

    /// Load genesis. Allowed exactly once, before the first request.
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<(), LedgerError> {
        if self.genesis_initialized {
            error!("genesis delivered twice");
            return Err(LedgerError::InvalidGenesis {
                tag: "engine".to_string(),
                field: "uninitialized ledger (genesis already loaded)".to_string(),
            });
        }
        init_genesis(&self.keepers.registry, &self.keepers.accounts, &mut self.store, genesis)?;
        validate_invariants(
            &self.keepers.registry,
            &self.keepers.accounts,
            &self.store.tokens,
            &self.store.accounts,
        )?;
        self.genesis_initialized = true;
        Ok(())
    }

    /// Resume from a snapshot: load `genesis` as the current state, then
    /// continue at `sequence` with the generator at `symbol_nonce`.
    pub fn restore(
        &mut self,
        genesis: &GenesisState,
        sequence: u64,
        symbol_nonce: u64,
    ) -> Result<(), LedgerError> {
        self.init_genesis(genesis)?;
        self.last_sequence = sequence;
        self.generator.resume(symbol_nonce);
        info!(sequence, symbol_nonce, "ledger restored");
        Ok(())
    }

    /// Apply a single request envelope:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Require genesis
    ///   4. Stateless validation
    ///   5. Dispatch into a write scope, then check invariants
    ///   6. Commit on success, discard on any error
    ///
    /// Errors from steps 4 to 6 consume the sequence number unless fatal.
    pub fn deliver(&mut self, envelope: &RequestEnvelope) -> Result<Receipt, LedgerError> {
        match self.deliver_then(envelope, |_| Ok::<(), Infallible>(())) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Like `deliver`, but calls `persist` with every non-fatal outcome
    /// before anything becomes visible. If `persist` fails, the writes are
    /// discarded, the sequence and symbol nonce stay where they were, and
    /// its error is returned. Fatal outcomes never reach `persist`.
    pub fn deliver_then<E>(
        &mut self,
        envelope: &RequestEnvelope,
        persist: impl FnOnce(&Result<Receipt, LedgerError>) -> Result<(), E>,
    ) -> Result<Result<Receipt, LedgerError>, E> {
        if let Err(err) = self.check_envelope(envelope) {
            error!(error = %err, "rejecting envelope");
            return Ok(Err(err));
        }

        let request = &envelope.request;
        let nonce_before = self.generator.nonce();
        let mut scope = self.store.begin();
        let outcome = request.validate_basic().and_then(|()| {
            let receipt = apply_request(&self.keepers, &mut scope, self.generator.as_mut(), request)?;
            validate_invariants(
                &self.keepers.registry,
                &self.keepers.accounts,
                &scope.tokens,
                &scope.accounts,
            )?;
            Ok(receipt)
        });

        if let Err(err) = &outcome {
            if err.is_fatal() {
                scope.discard();
                self.generator.resume(nonce_before);
                error!(
                    sequence = envelope.sequence,
                    request = request.type_name(),
                    code = err.code(),
                    error = %err,
                    "fatal error while applying request"
                );
                return Ok(outcome);
            }
        }

        if let Err(persist_err) = persist(&outcome) {
            scope.discard();
            self.generator.resume(nonce_before);
            warn!(sequence = envelope.sequence, "persist failed, request not applied");
            return Err(persist_err);
        }

        match &outcome {
            Ok(_) => scope.commit(),
            Err(err) => {
                scope.discard();
                self.generator.resume(nonce_before);
                warn!(
                    sequence = envelope.sequence,
                    request = request.type_name(),
                    code = err.code(),
                    error = %err,
                    "request rejected"
                );
            }
        }
        self.last_sequence = envelope.sequence;
        Ok(outcome)
    }

    fn check_envelope(&self, envelope: &RequestEnvelope) -> Result<(), LedgerError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(LedgerError::SchemaVersion {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(LedgerError::SequenceViolation {
                expected,
                got: envelope.sequence,
            });
        }
        if !self.genesis_initialized {
            return Err(LedgerError::NotInitialized(
                "genesis must be loaded before the first request".into(),
            ));
        }
        Ok(())
    }

    /// Apply envelopes in order, collecting one outcome each. Stops at
    /// the first fatal error and returns it.
    pub fn deliver_all(
        &mut self,
        envelopes: &[RequestEnvelope],
    ) -> Result<Vec<Result<Receipt, LedgerError>>, LedgerError> {
        let mut outcomes = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            match self.deliver(envelope) {
                Err(err) if err.is_fatal() => return Err(err),
                outcome => outcomes.push(outcome),
            }
        }
        Ok(outcomes)
    }

    /// Route a read-only query over the committed registry.
    pub fn query(&self, path: &[&str]) -> Result<Vec<u8>, LedgerError> {
        querier::query(&self.keepers.registry, &self.store.tokens, path)
    }

    pub fn export_genesis(&self) -> Result<GenesisState, LedgerError> {
        export_genesis(&self.keepers.registry, &self.keepers.accounts, &self.store)
    }

    /// Canonical hash of the committed state.
    pub fn state_hash(&self) -> Result<String, LedgerError> {
        canonical_hash(&self.export_genesis()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use crate::requests::{FreezeCoins, IssueToken, Request};

    fn engine() -> LedgerEngine {
        let mut engine = LedgerEngine::with_seed(0, LedgerParams::default());
        engine.init_genesis(&GenesisState::default()).unwrap();
        engine
    }

    fn issue(seq: u64) -> RequestEnvelope {
        RequestEnvelope::new(
            seq,
            Request::IssueToken(IssueToken::new(Address::from("me"), "Zap", "ZAP", "10", false)),
        )
    }

    #[test]
    fn requests_before_genesis_are_refused() {
        let mut engine = LedgerEngine::with_seed(0, LedgerParams::default());
        let err = engine.deliver(&issue(1)).unwrap_err();
        assert!(matches!(err, LedgerError::NotInitialized(_)));
        assert_eq!(engine.last_sequence(), 0);
    }

    #[test]
    fn genesis_is_loaded_once() {
        let mut engine = engine();
        assert!(engine.init_genesis(&GenesisState::default()).unwrap_err().is_fatal());
    }

    #[test]
    fn sequence_gaps_and_wrong_schema_are_fatal() {
        let mut engine = engine();
        let err = engine.deliver(&issue(2)).unwrap_err();
        assert_eq!(err, LedgerError::SequenceViolation { expected: 1, got: 2 });

        let mut env = issue(1);
        env.schema_version = 2;
        assert!(matches!(engine.deliver(&env), Err(LedgerError::SchemaVersion { got: 2, .. })));
        assert_eq!(engine.last_sequence(), 0);
    }

    #[test]
    fn rejected_request_consumes_sequence_and_keeps_state() {
        let mut engine = engine();
        engine.deliver(&issue(1)).unwrap();
        let hash = engine.state_hash().unwrap();
        let nonce = engine.symbol_nonce();

        let over = RequestEnvelope::new(
            2,
            Request::FreezeCoins(FreezeCoins::new("11", "ZAP-000", Address::from("me"))),
        );
        assert!(engine.deliver(&over).is_err());
        assert_eq!(engine.last_sequence(), 2);
        assert_eq!(engine.state_hash().unwrap(), hash);
        assert_eq!(engine.symbol_nonce(), nonce);
    }

    #[test]
    fn failed_persist_leaves_engine_untouched() {
        let mut engine = engine();
        engine.deliver(&issue(1)).unwrap();
        let hash = engine.state_hash().unwrap();
        let nonce = engine.symbol_nonce();

        let err = engine.deliver_then(&issue(2), |_| Err("disk full")).unwrap_err();
        assert_eq!(err, "disk full");
        assert_eq!(engine.last_sequence(), 1);
        assert_eq!(engine.state_hash().unwrap(), hash);
        assert_eq!(engine.symbol_nonce(), nonce);

        let mut seen = None;
        let outcome = engine
            .deliver_then(&issue(2), |o| {
                seen = Some(o.is_ok());
                Ok::<(), &str>(())
            })
            .unwrap();
        assert!(outcome.is_ok());
        assert_eq!(seen, Some(true));
        assert_eq!(engine.last_sequence(), 2);
    }

    #[test]
    fn fatal_outcomes_skip_persist() {
        let mut engine = engine();
        let outcome = engine
            .deliver_then(&issue(3), |_| Err::<(), &str>("must not be called"))
            .unwrap();
        assert!(matches!(outcome, Err(LedgerError::SequenceViolation { expected: 1, got: 3 })));
    }

    #[test]
    fn deliver_all_stops_on_fatal() {
        let mut engine = engine();
        let outcomes = engine.deliver_all(&[issue(1), issue(2)]).unwrap();
        assert!(outcomes.iter().all(|o| o.is_ok()));
        let err = engine.deliver_all(&[issue(3), issue(5), issue(6)]).unwrap_err();
        assert!(matches!(err, LedgerError::SequenceViolation { expected: 4, got: 5 }));
        assert_eq!(engine.last_sequence(), 3);
    }
}
