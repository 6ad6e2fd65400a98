//! Record decoder: fixed-width records packed into one flat string.
//!
//! Country sets are `(code, name)` pairs, preferred-loan sets are
//! `(id, name, use, countryCode, fundedAmt, loanAmt)` sextuples.
//!
//! RULE: One bad record never discards the rest of the set.
//! Field-level failures are logged and the record is skipped. Only
//! `OutOfMemory` stops the loop, and records applied before it stay applied.

use crate::{
    config::{CacheConfig, RecordWidthPolicy},
    error::{CacheError, CacheResult},
    store::{EntityStore, LoanInfo},
    tokenizer::{parse_int, Tokenizer},
};
use serde::{Deserialize, Serialize};

pub const COUNTRY_RECORD_WIDTH: usize = 2;
pub const LOAN_RECORD_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub delimiter: char,
    pub policy:    RecordWidthPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for DecodeOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            policy:    config.record_width_policy,
        }
    }
}

/// Outcome of one decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub applied:         usize,
    pub skipped:         usize,
    /// Trailing fields that did not form a complete record.
    pub leftover_fields: usize,
}

/// Number of complete records in the stream, or an error under `Strict`
/// when the field count is not a multiple of `width`.
fn record_count(tok: &Tokenizer<'_>, width: usize, policy: RecordWidthPolicy) -> CacheResult<(usize, usize)> {
    let fields = tok.count();
    let leftover = fields % width;
    if leftover != 0 {
        match policy {
            RecordWidthPolicy::Strict => {
                return Err(CacheError::RecordWidth { width, fields });
            }
            RecordWidthPolicy::Truncate => {
                log::warn!(
                    "Flat record has {fields} fields, not a multiple of {width}; \
                     ignoring {leftover} trailing field(s)"
                );
            }
        }
    }
    Ok((fields / width, leftover))
}

/// Decode a `(code, name)` pair stream, handing each pair to `on_pair`.
///
/// `on_pair` is typically bound to `EntityStore::add_kiva_country` or
/// `EntityStore::add_lender_country`.
pub fn decode_country_set<F>(flat: &str, opts: DecodeOptions, mut on_pair: F) -> CacheResult<DecodeReport>
where
    F: FnMut(&str, &str) -> CacheResult<()>,
{
    let mut tok = Tokenizer::new(flat, opts.delimiter);
    let (records, leftover) = record_count(&tok, COUNTRY_RECORD_WIDTH, opts.policy)?;
    let mut report = DecodeReport { leftover_fields: leftover, ..Default::default() };

    for _ in 0..records {
        let code = tok.next_string()?;
        let name = tok.next_string()?;
        match on_pair(&code, &name) {
            Ok(()) => report.applied += 1,
            Err(e) if e.is_fatal() => {
                log::error!("Country set decode stopped at {code}: {e}");
                return Err(e);
            }
            Err(e) => {
                log::warn!("Skipping country {code:?}: {e}");
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn to_u32(field: &'static str, raw: &str) -> CacheResult<u32> {
    let value = parse_int(raw, field)?;
    u32::try_from(value).map_err(|_| CacheError::InvalidInteger {
        field,
        value: raw.to_string(),
    })
}

fn parse_loan<'a>(fields: [&'a str; LOAN_RECORD_WIDTH]) -> CacheResult<LoanInfo<'a>> {
    let [id, name, loan_use, country_code, funded_amt, loan_amt] = fields;
    Ok(LoanInfo {
        id: to_u32("id", id)?,
        name,
        loan_use,
        country_code,
        funded_amt: to_u32("fundedAmt", funded_amt)?,
        loan_amt: to_u32("loanAmt", loan_amt)?,
    })
}

/// Replace the preferred-loan set with the sextuples in `flat`.
///
/// The existing set is cleared exactly once, before the first record.
/// Under `Strict`, a width mismatch is rejected before the clear.
pub fn decode_loan_set(store: &mut EntityStore, flat: &str, opts: DecodeOptions) -> CacheResult<DecodeReport> {
    let mut tok = Tokenizer::new(flat, opts.delimiter);
    let (records, leftover) = record_count(&tok, LOAN_RECORD_WIDTH, opts.policy)?;
    let mut report = DecodeReport { leftover_fields: leftover, ..Default::default() };

    store.clear_preferred_loans();
    for _ in 0..records {
        // Pull the whole record first so a bad field keeps the cursor aligned.
        let mut fields = [""; LOAN_RECORD_WIDTH];
        for slot in fields.iter_mut() {
            *slot = tok.next_str()?;
        }
        let info = match parse_loan(fields) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Skipping preferred loan record {fields:?}: {e}");
                report.skipped += 1;
                continue;
            }
        };
        match store.add_preferred_loan(info) {
            Ok(()) => report.applied += 1,
            Err(e) if e.is_fatal() => {
                log::error!("Loan set decode stopped at loan {}: {e}", info.id);
                return Err(e);
            }
            Err(e) => {
                log::warn!("Skipping preferred loan {}: {e}", info.id);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}
