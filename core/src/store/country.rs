use super::EntityStore;
use crate::{
    error::{CacheError, CacheResult},
    types::{owned_copy, CountryCode},
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub code:             CountryCode,
    pub name:             String,
    pub kiva_active:      bool,
    pub lender_supported: bool,
}

impl CountryRecord {
    fn new(code: &str, name: &str) -> CacheResult<Self> {
        Ok(Self {
            code:             owned_copy(code)?,
            name:             owned_copy(name)?,
            kiva_active:      false,
            lender_supported: false,
        })
    }
}

fn require_code(code: &str) -> CacheResult<()> {
    if code.is_empty() {
        return Err(CacheError::InvalidArgument {
            what:   "country code",
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

impl EntityStore {
    // ── Country mutations ────────────────────────────────────────

    /// Insert or fully replace the catalog entry for `code`, marked active.
    ///
    /// A replaced record loses its lender-supported mark; callers that need
    /// it re-apply it afterwards.
    pub fn add_kiva_country(&mut self, code: &str, name: &str) -> CacheResult<()> {
        require_code(code)?;
        let mut record = CountryRecord::new(code, name)?;
        record.kiva_active = true;

        let replaced = self.countries.insert(record.code.clone(), record);
        let lost_support = replaced.as_ref().is_some_and(|old| old.lender_supported);
        if replaced.is_some() {
            log::debug!("Replaced catalog country {code}");
        } else {
            log::debug!("Added catalog country {code}");
        }
        self.mark(|m| {
            m.kiva_country_qty = true;
            if lost_support {
                m.lender_country_qty = true;
            }
        });
        Ok(())
    }

    /// Mark `code` as supported by the lender.
    ///
    /// An unknown code is first added to the catalog as inactive, named
    /// `name` or, failing that, the code itself. For a known code `name` is
    /// ignored.
    pub fn add_lender_country(&mut self, code: &str, name: Option<&str>) -> CacheResult<()> {
        require_code(code)?;
        if !self.countries.contains_key(code) {
            log::info!(
                "Lender supports a country outside the catalog: {code} -> {}",
                name.unwrap_or(code)
            );
            self.add_kiva_country(code, name.unwrap_or(code))?;
            if let Some(cntry) = self.countries.get_mut(code) {
                cntry.kiva_active = false;
            }
        }
        if let Some(cntry) = self.countries.get_mut(code) {
            cntry.lender_supported = true;
        }
        self.mark(|m| m.lender_country_qty = true);
        Ok(())
    }

    // ── Country reads ────────────────────────────────────────────

    /// Number of countries the platform actively serves.
    /// Clears the `kiva_country_qty` flag.
    pub fn kiva_country_qty(&self) -> usize {
        self.mark(|m| m.kiva_country_qty = false);
        self.countries.values().filter(|c| c.kiva_active).count()
    }

    /// Number of countries the lender has funded loans in.
    /// Clears the `lender_country_qty` flag.
    pub fn lender_country_qty(&self) -> usize {
        self.mark(|m| m.lender_country_qty = false);
        self.countries.values().filter(|c| c.lender_supported).count()
    }

    /// Codes whose lender-supported mark equals `support`, joined with the
    /// configured separator in ascending code order. `None` when no country
    /// matches.
    pub fn lender_country_codes(&self, support: bool) -> CacheResult<Option<String>> {
        let mut matching = self
            .countries
            .values()
            .filter(|c| c.lender_supported == support)
            .peekable();
        if matching.peek().is_none() {
            return Ok(None);
        }

        let mut codes = String::new();
        codes.try_reserve(16)?;
        for (i, cntry) in matching.enumerate() {
            codes.try_reserve(cntry.code.len() + self.code_separator.len())?;
            if i > 0 {
                codes.write_str(&self.code_separator)?;
            }
            write!(codes, "{}", cntry.code)?;
        }
        Ok(Some(codes))
    }

    pub fn kiva_country_name(&self, code: &str) -> Option<&str> {
        self.countries.get(code).map(|c| c.name.as_str())
    }

    pub fn country(&self, code: &str) -> Option<&CountryRecord> {
        self.countries.get(code)
    }

    /// All catalog entries, active or not, in ascending code order.
    pub fn countries(&self) -> impl Iterator<Item = &CountryRecord> {
        self.countries.values()
    }
}
