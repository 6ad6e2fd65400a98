//! Tokenizer: an on-demand cursor over a delimiter-separated flat string.
//!
//! RULE: The tokenizer knows nothing about records or entities.
//! It only splits, counts, and hands out fields in order.

use crate::{
    error::{CacheError, CacheResult},
    types::owned_copy,
};
use std::str::Split;

pub struct Tokenizer<'a> {
    fields:   Split<'a, char>,
    total:    usize,
    consumed: usize,
}

impl<'a> Tokenizer<'a> {
    /// Build a cursor over `source`. The field count is computed up front
    /// without consuming anything. An empty source has zero fields.
    pub fn new(source: &'a str, delimiter: char) -> Self {
        let total = if source.is_empty() {
            0
        } else {
            source.matches(delimiter).count() + 1
        };
        Self {
            fields: source.split(delimiter),
            total,
            consumed: 0,
        }
    }

    /// Total number of fields in the source, consumed or not.
    pub fn count(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.consumed
    }

    /// Borrow the next field and advance.
    pub fn next_str(&mut self) -> CacheResult<&'a str> {
        if self.consumed >= self.total {
            return Err(CacheError::TokensExhausted { total: self.total });
        }
        let field = self
            .fields
            .next()
            .ok_or(CacheError::TokensExhausted { total: self.total })?;
        self.consumed += 1;
        Ok(field)
    }

    /// Next field as a newly owned string.
    pub fn next_string(&mut self) -> CacheResult<String> {
        owned_copy(self.next_str()?)
    }

    /// Next field parsed as a signed integer. The cursor advances even when
    /// the field does not parse, so record alignment is kept.
    pub fn next_int(&mut self) -> CacheResult<i64> {
        let field = self.next_str()?;
        parse_int(field, "field")
    }
}

pub(crate) fn parse_int(field: &str, name: &'static str) -> CacheResult<i64> {
    field.trim().parse::<i64>().map_err(|_| CacheError::InvalidInteger {
        field: name,
        value: field.to_string(),
    })
}
