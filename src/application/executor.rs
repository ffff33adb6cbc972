use crate::application::matcher::OfferMatcher;
use crate::application::path_payment::PathPaymentEngine;
use crate::config::EngineConfig;
use crate::domain::amount::validate_amount;
use crate::domain::ledger::Ledger;
use crate::domain::operation::{
    OpaqueDataEntry, Operation, OperationResult, Payment, Transaction, TransactionResult,
};
use crate::error::{EngineError, LedgerError, Result};

const MAX_DATA_KEY_LEN: usize = 64;

/// Applies ordered operation batches all-or-nothing.
pub struct TransactionExecutor {
    paths: PathPaymentEngine,
}

impl TransactionExecutor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            paths: PathPaymentEngine::new(config.max_path_hops),
        }
    }

    /// Applies `tx` to `ledger`. On error the ledger is exactly as it was.
    pub fn apply(&self, ledger: &mut Ledger, tx: &Transaction) -> Result<TransactionResult> {
        ledger.atomically(|working| self.apply_in_place(working, tx))
    }

    /// Applies `tx` to an owned working copy and hands it back only on success.
    pub fn apply_owned(
        &self,
        mut working: Ledger,
        tx: &Transaction,
    ) -> Result<(Ledger, TransactionResult)> {
        let result = self.apply_in_place(&mut working, tx)?;
        Ok((working, result))
    }

    fn apply_in_place(&self, ledger: &mut Ledger, tx: &Transaction) -> Result<TransactionResult> {
        if tx.operations.is_empty() {
            return Err(EngineError::Rejected(LedgerError::validation(
                "transaction has no operations",
            )));
        }
        ledger
            .trust
            .require_account(&tx.source)
            .map_err(EngineError::Rejected)?;

        let mut results = Vec::with_capacity(tx.operations.len());
        for (index, operation) in tx.operations.iter().enumerate() {
            let result = self
                .dispatch(ledger, operation)
                .map_err(|source| EngineError::OperationFailed { index, source })?;
            results.push(result);
        }
        let sequence = ledger
            .trust
            .bump_sequence(&tx.source)
            .map_err(EngineError::Rejected)?;

        Ok(TransactionResult {
            results,
            memo: tx.memo.clone(),
            sequence,
        })
    }

    fn dispatch(
        &self,
        ledger: &mut Ledger,
        operation: &Operation,
    ) -> std::result::Result<OperationResult, LedgerError> {
        match operation {
            Operation::EstablishTrust(op) => {
                ledger.trust.establish_trust(&op.account, &op.asset, op.limit)?;
                Ok(OperationResult::EstablishTrust)
            }
            Operation::Payment(op) => {
                pay(ledger, op)?;
                Ok(OperationResult::Payment { amount: op.amount })
            }
            Operation::PlaceOffer(op) => {
                OfferMatcher::apply(ledger, op).map(OperationResult::PlaceOffer)
            }
            Operation::PathPaymentStrictSend(op) => self
                .paths
                .apply_strict_send(ledger, op)
                .map(OperationResult::PathPaymentStrictSend),
            Operation::PathPaymentStrictReceive(op) => self
                .paths
                .apply_strict_receive(ledger, op)
                .map(OperationResult::PathPaymentStrictReceive),
            Operation::OpaqueDataEntry(op) => {
                record_data(ledger, op)?;
                Ok(OperationResult::OpaqueDataEntry {
                    key: op.key.clone(),
                })
            }
        }
    }
}

fn pay(ledger: &mut Ledger, op: &Payment) -> std::result::Result<(), LedgerError> {
    validate_amount("payment amount", op.amount, false)?;
    ledger.trust.require_account(&op.destination)?;
    ledger.trust.debit(&op.source, &op.asset, op.amount)?;
    ledger.trust.credit(&op.destination, &op.asset, op.amount)
}

/// Data entries do not touch balances; only their shape is checked.
fn record_data(ledger: &Ledger, op: &OpaqueDataEntry) -> std::result::Result<(), LedgerError> {
    ledger.trust.require_account(&op.source)?;
    if op.key.is_empty() || op.key.len() > MAX_DATA_KEY_LEN {
        return Err(LedgerError::validation(format!(
            "data key must be 1 to {MAX_DATA_KEY_LEN} bytes"
        )));
    }
    Ok(())
}
