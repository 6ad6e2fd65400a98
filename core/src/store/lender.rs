use super::EntityStore;
use crate::{
    error::{CacheError, CacheResult},
    types::owned_copy,
};
use serde::{Deserialize, Serialize};

/// The registered lender. Singleton owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderProfile {
    pub id:       String,
    pub name:     Option<String>,
    pub loc:      Option<String>,
    pub loan_qty: u32,
}

impl LenderProfile {
    pub(crate) fn new(id: String) -> Self {
        Self { id, name: None, loc: None, loan_qty: 0 }
    }
}

impl EntityStore {
    // ── Lender mutations ─────────────────────────────────────────

    /// Switch to lender `id`.
    ///
    /// Same id: nothing happens. Different id: name, location and loan
    /// count are reset and every country loses its lender-supported mark.
    pub fn set_lender_id(&mut self, id: &str) -> CacheResult<()> {
        if id.is_empty() {
            return Err(CacheError::InvalidArgument {
                what:   "lender id",
                reason: "must not be empty".into(),
            });
        }
        if self.lender.id == id {
            return Ok(());
        }
        if !self.id_rules.accepts(id) {
            return Err(CacheError::InvalidArgument {
                what:   "lender id",
                reason: format!(
                    "{id:?} is not {}-{} alphanumeric characters",
                    self.id_rules.min_len, self.id_rules.max_len
                ),
            });
        }

        let new_id = owned_copy(id)?;
        log::debug!("Lender id changed: {:?} -> {new_id:?}", self.lender.id);
        self.lender = LenderProfile::new(new_id);
        for cntry in self.countries.values_mut() {
            cntry.lender_supported = false;
        }
        self.mark(|m| {
            m.lender_loan_qty = true;
            m.lender_country_qty = true;
        });
        Ok(())
    }

    pub fn set_lender_name(&mut self, name: &str) -> CacheResult<()> {
        self.lender.name = Some(owned_copy(name)?);
        Ok(())
    }

    pub fn set_lender_loc(&mut self, loc: &str) -> CacheResult<()> {
        self.lender.loc = Some(owned_copy(loc)?);
        Ok(())
    }

    pub fn set_lender_loan_qty(&mut self, qty: u32) {
        self.lender.loan_qty = qty;
        self.mark(|m| m.lender_loan_qty = true);
    }

    // ── Lender reads ─────────────────────────────────────────────

    pub fn lender(&self) -> &LenderProfile {
        &self.lender
    }

    pub fn lender_id(&self) -> &str {
        &self.lender.id
    }

    pub fn lender_name(&self) -> Option<&str> {
        self.lender.name.as_deref()
    }

    pub fn lender_loc(&self) -> Option<&str> {
        self.lender.loc.as_deref()
    }

    /// Lender's total loan count. Clears the `lender_loan_qty` flag.
    pub fn lender_loan_qty(&self) -> u32 {
        self.mark(|m| m.lender_loan_qty = false);
        self.lender.loan_qty
    }
}
