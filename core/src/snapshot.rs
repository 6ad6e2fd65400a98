//! Snapshot serialization: the full store state as JSON.
//!
//! A snapshot is a read-only picture for tooling and tests. Taking one
//! does not clear any dirty flag.

use crate::store::{CountryRecord, DirtyFlags, EntityStore, LenderProfile, LoanRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub lender:          LenderProfile,
    pub countries:       Vec<CountryRecord>,
    pub preferred_loans: Vec<LoanRecord>,
    pub modified:        DirtyFlags,
}

impl EntityStore {
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            lender:          self.lender().clone(),
            countries:       self.countries().cloned().collect(),
            preferred_loans: self.preferred_loans().map(|v| v.data.clone()).collect(),
            modified:        self.modified(),
        }
    }
}

impl StoreSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
