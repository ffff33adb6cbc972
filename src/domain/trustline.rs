use crate::domain::amount::{MAX_AMOUNT, validate_amount};
use crate::domain::asset::{AccountId, Asset};
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A ledger account. Balances live on its trustlines, including the native one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Number of transactions this account has successfully sourced.
    pub sequence: u64,
}

/// Holding and ceiling of one account for one asset.
///
/// Invariants, always:
/// * `balance >= 0`
/// * `balance + buying_liabilities <= limit`
/// * `balance - selling_liabilities >= 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    pub account: AccountId,
    pub asset: Asset,
    pub balance: Decimal,
    pub limit: Decimal,
    pub selling_liabilities: Decimal,
    pub buying_liabilities: Decimal,
}

impl TrustLine {
    pub fn new(account: AccountId, asset: Asset, limit: Decimal) -> Self {
        Self {
            account,
            asset,
            balance: Decimal::ZERO,
            limit,
            selling_liabilities: Decimal::ZERO,
            buying_liabilities: Decimal::ZERO,
        }
    }

    /// Balance not held by resting sell offers.
    pub fn spendable(&self) -> Decimal {
        self.balance - self.selling_liabilities
    }

    /// Room left before the limit, counting what resting buy offers may bring in.
    pub fn headroom(&self) -> Decimal {
        self.limit - self.balance - self.buying_liabilities
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_zero()
            && self.selling_liabilities.is_zero()
            && self.buying_liabilities.is_zero()
    }

    fn is_consistent(&self) -> bool {
        self.balance >= Decimal::ZERO
            && self.selling_liabilities >= Decimal::ZERO
            && self.buying_liabilities >= Decimal::ZERO
            && self.spendable() >= Decimal::ZERO
            && self.headroom() >= Decimal::ZERO
    }
}

/// Who is on the other end of a balance mutation.
enum Holder<'a> {
    /// The asset's own issuer: unlimited in both directions, nothing is tracked.
    Issuer,
    Line(&'a mut TrustLine),
}

/// Owns accounts and their per-asset trustlines.
///
/// Every mutation checks before it writes, so a failed call leaves the line untouched.
#[derive(Debug, Clone, Default)]
pub struct TrustLedger {
    accounts: BTreeMap<AccountId, Account>,
    lines: BTreeMap<(AccountId, Asset), TrustLine>,
}

impl TrustLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account holding `native_balance` of the native asset.
    pub fn create_account(
        &mut self,
        id: AccountId,
        native_balance: Decimal,
    ) -> Result<(), LedgerError> {
        validate_amount("native balance", native_balance, true)?;
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::validation(format!("account {id} already exists")));
        }
        let mut native = TrustLine::new(id.clone(), Asset::Native, MAX_AMOUNT);
        native.balance = native_balance;
        self.lines.insert((id.clone(), Asset::Native), native);
        self.accounts.insert(id.clone(), Account { id, sequence: 0 });
        Ok(())
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn require_account(&self, id: &AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id)
            .ok_or_else(|| LedgerError::NoAccount(id.clone()))
    }

    pub fn bump_sequence(&mut self, id: &AccountId) -> Result<u64, LedgerError> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::NoAccount(id.clone()))?;
        account.sequence += 1;
        Ok(account.sequence)
    }

    pub fn trustline(&self, account: &AccountId, asset: &Asset) -> Option<&TrustLine> {
        self.lines.get(&(account.clone(), asset.clone()))
    }

    /// All lines in `(account, asset)` order.
    pub fn trustlines(&self) -> impl Iterator<Item = &TrustLine> {
        self.lines.values()
    }

    /// Creates or updates the limit of a line. A zero limit removes it.
    pub fn establish_trust(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        limit: Decimal,
    ) -> Result<(), LedgerError> {
        validate_amount("limit", limit, true)?;
        if asset.is_native() {
            return Err(LedgerError::validation("native asset needs no trustline"));
        }
        if asset.is_issued_by(account) {
            return Err(LedgerError::validation("issuer cannot trust its own asset"));
        }
        self.require_account(account)?;

        let key = (account.clone(), asset.clone());
        match self.lines.get_mut(&key) {
            Some(line) if limit.is_zero() => {
                if !line.is_empty() {
                    return Err(LedgerError::TrustLineNotEmpty {
                        account: account.clone(),
                        asset: asset.clone(),
                    });
                }
                self.lines.remove(&key);
            }
            Some(line) => {
                if limit < line.balance + line.buying_liabilities {
                    return Err(LedgerError::InsufficientTrust {
                        account: account.clone(),
                        asset: asset.clone(),
                    });
                }
                line.limit = limit;
            }
            None if limit.is_zero() => {}
            None => {
                self.lines
                    .insert(key, TrustLine::new(account.clone(), asset.clone(), limit));
            }
        }
        tracing::trace!(%account, %asset, %limit, "trust established");
        Ok(())
    }

    /// Balance of `account` in `asset`. The issuer reports [`MAX_AMOUNT`].
    pub fn get_balance(&self, account: &AccountId, asset: &Asset) -> Result<Decimal, LedgerError> {
        self.require_account(account)?;
        if asset.is_issued_by(account) {
            return Ok(MAX_AMOUNT);
        }
        self.trustline(account, asset)
            .map(|line| line.balance)
            .ok_or_else(|| LedgerError::NoTrustline {
                account: account.clone(),
                asset: asset.clone(),
            })
    }

    /// How much more of `asset` the account can take in. The issuer is unlimited.
    pub fn buying_capacity(&self, account: &AccountId, asset: &Asset) -> Result<Decimal, LedgerError> {
        self.require_account(account)?;
        if asset.is_issued_by(account) {
            return Ok(MAX_AMOUNT);
        }
        self.trustline(account, asset)
            .map(TrustLine::headroom)
            .ok_or_else(|| LedgerError::NoTrustline {
                account: account.clone(),
                asset: asset.clone(),
            })
    }

    /// Sum of every non-issuer balance of `asset`.
    pub fn circulating_supply(&self, asset: &Asset) -> Decimal {
        self.lines
            .values()
            .filter(|line| &line.asset == asset)
            .map(|line| line.balance)
            .sum()
    }

    pub fn credit(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.headroom() < amount {
                return Err(LedgerError::LineFull {
                    account: account.clone(),
                    asset: asset.clone(),
                });
            }
            line.balance += amount;
        }
        Ok(())
    }

    pub fn debit(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.spendable() < amount {
                return Err(LedgerError::InsufficientBalance {
                    account: account.clone(),
                    asset: asset.clone(),
                });
            }
            line.balance -= amount;
        }
        Ok(())
    }

    pub fn reserve_selling(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.spendable() < amount {
                return Err(LedgerError::InsufficientBalance {
                    account: account.clone(),
                    asset: asset.clone(),
                });
            }
            line.selling_liabilities += amount;
            tracing::trace!(%account, %asset, %amount, "selling liability reserved");
        }
        Ok(())
    }

    pub fn release_selling(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.selling_liabilities < amount {
                return Err(LedgerError::validation(format!(
                    "releasing more selling liability than reserved on {asset}"
                )));
            }
            line.selling_liabilities -= amount;
            tracing::trace!(%account, %asset, %amount, "selling liability released");
        }
        Ok(())
    }

    pub fn reserve_buying(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.headroom() < amount {
                return Err(LedgerError::LineFull {
                    account: account.clone(),
                    asset: asset.clone(),
                });
            }
            line.buying_liabilities += amount;
            tracing::trace!(%account, %asset, %amount, "buying liability reserved");
        }
        Ok(())
    }

    pub fn release_buying(
        &mut self,
        account: &AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if let Holder::Line(line) = self.holder(account, asset)? {
            if line.buying_liabilities < amount {
                return Err(LedgerError::validation(format!(
                    "releasing more buying liability than reserved on {asset}"
                )));
            }
            line.buying_liabilities -= amount;
            tracing::trace!(%account, %asset, %amount, "buying liability released");
        }
        Ok(())
    }

    /// Lines violating the balance/liability invariants. Empty on a healthy ledger.
    pub fn inconsistent_lines(&self) -> Vec<&TrustLine> {
        self.lines
            .values()
            .filter(|line| !line.is_consistent())
            .collect()
    }

    pub(crate) fn restore(accounts: Vec<Account>, lines: Vec<TrustLine>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
            lines: lines
                .into_iter()
                .map(|l| ((l.account.clone(), l.asset.clone()), l))
                .collect(),
        }
    }

    fn holder(&mut self, account: &AccountId, asset: &Asset) -> Result<Holder<'_>, LedgerError> {
        self.require_account(account)?;
        if asset.is_issued_by(account) {
            return Ok(Holder::Issuer);
        }
        self.lines
            .get_mut(&(account.clone(), asset.clone()))
            .map(Holder::Line)
            .ok_or_else(|| LedgerError::NoTrustline {
                account: account.clone(),
                asset: asset.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setup() -> (TrustLedger, AccountId, AccountId, Asset) {
        let mut ledger = TrustLedger::new();
        let bank = AccountId::new("bank").unwrap();
        let alice = AccountId::new("alice").unwrap();
        ledger.create_account(bank.clone(), dec!(100)).unwrap();
        ledger.create_account(alice.clone(), dec!(100)).unwrap();
        let usd = Asset::issued("USD", bank.clone()).unwrap();
        (ledger, bank, alice, usd)
    }

    #[test]
    fn test_establish_and_credit() {
        let (mut ledger, _bank, alice, usd) = setup();
        ledger.establish_trust(&alice, &usd, dec!(1000)).unwrap();
        ledger.credit(&alice, &usd, dec!(500)).unwrap();
        assert_eq!(ledger.get_balance(&alice, &usd).unwrap(), dec!(500));
    }

    #[test]
    fn test_credit_without_line() {
        let (mut ledger, _bank, alice, usd) = setup();
        let result = ledger.credit(&alice, &usd, dec!(1));
        assert!(matches!(result, Err(LedgerError::NoTrustline { .. })));
        assert!(matches!(
            ledger.get_balance(&alice, &usd),
            Err(LedgerError::NoTrustline { .. })
        ));
    }

    #[test]
    fn test_credit_line_full_leaves_line_untouched() {
        let (mut ledger, _bank, alice, usd) = setup();
        ledger.establish_trust(&alice, &usd, dec!(100)).unwrap();
        ledger.credit(&alice, &usd, dec!(60)).unwrap();
        ledger.reserve_buying(&alice, &usd, dec!(30)).unwrap();

        let result = ledger.credit(&alice, &usd, dec!(11));
        assert!(matches!(result, Err(LedgerError::LineFull { .. })));
        let line = ledger.trustline(&alice, &usd).unwrap();
        assert_eq!(line.balance, dec!(60));
        assert_eq!(line.buying_liabilities, dec!(30));

        ledger.credit(&alice, &usd, dec!(10)).unwrap();
    }

    #[test]
    fn test_debit_respects_selling_liabilities() {
        let (mut ledger, _bank, alice, usd) = setup();
        ledger.establish_trust(&alice, &usd, dec!(100)).unwrap();
        ledger.credit(&alice, &usd, dec!(50)).unwrap();
        ledger.reserve_selling(&alice, &usd, dec!(40)).unwrap();

        assert!(matches!(
            ledger.debit(&alice, &usd, dec!(11)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        ledger.debit(&alice, &usd, dec!(10)).unwrap();
        assert_eq!(ledger.get_balance(&alice, &usd).unwrap(), dec!(40));
    }

    #[test]
    fn test_issuer_is_unlimited() {
        let (mut ledger, bank, _alice, usd) = setup();
        ledger.debit(&bank, &usd, dec!(1000000)).unwrap();
        ledger.credit(&bank, &usd, dec!(5)).unwrap();
        ledger.reserve_selling(&bank, &usd, dec!(1000000)).unwrap();
        assert_eq!(ledger.get_balance(&bank, &usd).unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn test_limit_cannot_shrink_below_exposure() {
        let (mut ledger, _bank, alice, usd) = setup();
        ledger.establish_trust(&alice, &usd, dec!(100)).unwrap();
        ledger.credit(&alice, &usd, dec!(40)).unwrap();
        ledger.reserve_buying(&alice, &usd, dec!(20)).unwrap();

        assert!(matches!(
            ledger.establish_trust(&alice, &usd, dec!(59)),
            Err(LedgerError::InsufficientTrust { .. })
        ));
        ledger.establish_trust(&alice, &usd, dec!(60)).unwrap();
        assert_eq!(ledger.trustline(&alice, &usd).unwrap().limit, dec!(60));
    }

    #[test]
    fn test_zero_limit_removes_only_empty_lines() {
        let (mut ledger, _bank, alice, usd) = setup();
        ledger.establish_trust(&alice, &usd, dec!(100)).unwrap();
        ledger.credit(&alice, &usd, dec!(1)).unwrap();
        assert!(matches!(
            ledger.establish_trust(&alice, &usd, dec!(0)),
            Err(LedgerError::TrustLineNotEmpty { .. })
        ));

        ledger.debit(&alice, &usd, dec!(1)).unwrap();
        ledger.establish_trust(&alice, &usd, dec!(0)).unwrap();
        assert!(ledger.trustline(&alice, &usd).is_none());
    }

    #[test]
    fn test_trust_validation() {
        let (mut ledger, bank, alice, usd) = setup();
        assert!(matches!(
            ledger.establish_trust(&alice, &Asset::Native, dec!(1)),
            Err(LedgerError::ValidationError(_))
        ));
        assert!(matches!(
            ledger.establish_trust(&bank, &usd, dec!(1)),
            Err(LedgerError::ValidationError(_))
        ));
        let ghost = AccountId::new("ghost").unwrap();
        assert!(matches!(
            ledger.establish_trust(&ghost, &usd, dec!(1)),
            Err(LedgerError::NoAccount(_))
        ));
    }

    #[test]
    fn test_native_liabilities() {
        let (mut ledger, _bank, alice, _usd) = setup();
        ledger.reserve_selling(&alice, &Asset::Native, dec!(80)).unwrap();
        assert!(matches!(
            ledger.debit(&alice, &Asset::Native, dec!(21)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        ledger.release_selling(&alice, &Asset::Native, dec!(80)).unwrap();
        ledger.debit(&alice, &Asset::Native, dec!(21)).unwrap();
        assert!(ledger.inconsistent_lines().is_empty());
    }

    #[test]
    fn test_duplicate_account() {
        let (mut ledger, bank, _alice, _usd) = setup();
        assert!(ledger.create_account(bank, dec!(1)).is_err());
    }
}
