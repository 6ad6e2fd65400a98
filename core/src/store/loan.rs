use super::EntityStore;
use crate::{
    error::CacheResult,
    types::{owned_copy, LoanId},
};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;

/// Borrowed loan description handed to `add_preferred_loan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanInfo<'a> {
    pub id:           LoanId,
    pub name:         &'a str,
    pub loan_use:     &'a str,
    pub country_code: &'a str,
    pub funded_amt:   u32,
    pub loan_amt:     u32,
}

/// A preferred loan as owned by the store.
///
/// `funded_amt <= loan_amt` is expected but not enforced. `country_code`
/// need not exist in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id:           LoanId,
    pub name:         String,
    #[serde(rename = "use")]
    pub loan_use:     String,
    pub country_code: String,
    pub funded_amt:   u32,
    pub loan_amt:     u32,
}

impl LoanRecord {
    fn from_info(info: &LoanInfo<'_>) -> CacheResult<Self> {
        Ok(Self {
            id:           info.id,
            name:         owned_copy(info.name)?,
            loan_use:     owned_copy(info.loan_use)?,
            country_code: owned_copy(info.country_code)?,
            funded_amt:   info.funded_amt,
            loan_amt:     info.loan_amt,
        })
    }

    /// Amount still needed to fully fund the loan.
    pub fn remaining_amt(&self) -> u32 {
        self.loan_amt.saturating_sub(self.funded_amt)
    }
}

/// One step of a preferred-loan walk: the loan and its position.
#[derive(Debug, Clone, Copy)]
pub struct PrefLoanView<'a> {
    pub idx:  usize,
    pub data: &'a LoanRecord,
}

/// One-shot walk over the preferred loans, ascending by loan id.
/// Call `EntityStore::preferred_loans` again to start over.
pub struct PreferredLoans<'a> {
    inner: btree_map::Values<'a, LoanId, LoanRecord>,
    idx:   usize,
}

impl<'a> Iterator for PreferredLoans<'a> {
    type Item = PrefLoanView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.inner.next()?;
        let view = PrefLoanView { idx: self.idx, data };
        self.idx += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for PreferredLoans<'_> {}

impl EntityStore {
    // ── Preferred loans ──────────────────────────────────────────

    /// Insert or fully replace the preferred loan keyed by `info.id`.
    pub fn add_preferred_loan(&mut self, info: LoanInfo<'_>) -> CacheResult<()> {
        let record = LoanRecord::from_info(&info)?;
        if self.loans.insert(record.id, record).is_some() {
            log::debug!("Replaced preferred loan {}", info.id);
        } else {
            log::debug!("Added preferred loan {}", info.id);
        }
        self.mark(|m| m.preferred_loan_qty = true);
        Ok(())
    }

    pub fn clear_preferred_loans(&mut self) {
        log::debug!("Clearing {} preferred loans", self.loans.len());
        self.loans.clear();
        self.mark(|m| m.preferred_loan_qty = true);
    }

    /// Number of preferred loans. Clears the `preferred_loan_qty` flag.
    pub fn preferred_loan_qty(&self) -> usize {
        self.mark(|m| m.preferred_loan_qty = false);
        self.loans.len()
    }

    pub fn preferred_loan(&self, id: LoanId) -> Option<&LoanRecord> {
        self.loans.get(&id)
    }

    pub fn preferred_loans(&self) -> PreferredLoans<'_> {
        PreferredLoans {
            inner: self.loans.values(),
            idx:   0,
        }
    }
}
