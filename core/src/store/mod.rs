//! In-memory entity store: lender profile, country catalog, preferred loans.
//!
//! RULE: Only the store mutates entities.
//! The protocol adapter and the record decoder call store methods; they
//! never reach into the maps directly.
//!
//! Every string handed to a mutation is copied. Read accessors hand out
//! borrows, except `lender_country_codes`, which builds a new owned string.
//!
//! Change tracking: each observable aggregate has a dirty flag. Mutations
//! set it, the matching quantity read clears it. Reads take `&self`, so
//! the flags live in a `Cell`.

mod country;
mod lender;
mod loan;

pub use country::CountryRecord;
pub use lender::LenderProfile;
pub use loan::{LoanInfo, LoanRecord, PrefLoanView, PreferredLoans};

use crate::{
    config::{CacheConfig, LenderIdRules},
    error::CacheResult,
    types::{owned_copy, CountryCode, LoanId},
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;

/// One flag per observable aggregate. `true` means changed since last read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyFlags {
    pub kiva_country_qty:   bool,
    pub lender_country_qty: bool,
    pub lender_loan_qty:    bool,
    pub preferred_loan_qty: bool,
}

impl DirtyFlags {
    pub fn any(&self) -> bool {
        self.kiva_country_qty || self.lender_country_qty || self.lender_loan_qty || self.preferred_loan_qty
    }
}

pub struct EntityStore {
    lender:         LenderProfile,
    countries:      BTreeMap<CountryCode, CountryRecord>,
    loans:          BTreeMap<LoanId, LoanRecord>,
    mods:           Cell<DirtyFlags>,
    id_rules:       LenderIdRules,
    code_separator: String,
}

impl EntityStore {
    /// New store for `lender_id` with default settings.
    ///
    /// The initial id is not validated: an empty id stands for "no lender
    /// configured yet".
    pub fn create(lender_id: &str) -> CacheResult<Self> {
        Self::create_with(lender_id, &CacheConfig::default())
    }

    pub fn create_with(lender_id: &str, config: &CacheConfig) -> CacheResult<Self> {
        log::debug!("Creating entity store [{lender_id}]");
        Ok(Self {
            lender:         LenderProfile::new(owned_copy(lender_id)?),
            countries:      BTreeMap::new(),
            loans:          BTreeMap::new(),
            mods:           Cell::new(DirtyFlags::default()),
            id_rules:       config.lender_id.clone(),
            code_separator: owned_copy(&config.code_separator)?,
        })
    }

    /// Release the profile, both maps and all change-tracking state.
    pub fn destroy(self) {
        log::debug!(
            "Destroying entity store [{}]: {} countries, {} preferred loans",
            self.lender.id,
            self.countries.len(),
            self.loans.len()
        );
    }

    /// Current dirty flags, without clearing any of them.
    pub fn modified(&self) -> DirtyFlags {
        self.mods.get()
    }

    fn mark(&self, update: impl FnOnce(&mut DirtyFlags)) {
        let mut flags = self.mods.get();
        update(&mut flags);
        self.mods.set(flags);
    }
}
