//! Key-tagged tuples exchanged with the companion process.
//!
//! RULE: Key codes are part of the wire contract.
//! Variants are never renumbered or removed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleKey {
    // ── Readiness ──────────────────────────────────
    PebkitReady           = 0,
    PebbleReady           = 1,

    // ── Platform catalogs ──────────────────────────
    KivaCountrySet        = 10,
    KivaSectorSet         = 11,
    KivaActivitySet       = 12,
    KivaFieldPartnerSet   = 13,
    AppAchievementSet     = 20,

    // ── Lender ─────────────────────────────────────
    LenderId              = 30,
    LenderName            = 31,
    LenderLoc             = 32,
    LenderLoanQty         = 33,
    LenderTeamSet         = 34,
    LenderCountrySet      = 35,
    LenderSectorSet       = 36,
    LenderActivitySet     = 37,
    LenderFieldPartnerSet = 38,
    PreferredLoanSet      = 39,
    LenderAchievementSet  = 40,

    // ── Actions ────────────────────────────────────
    PutLoansInBasket      = 100,
}

impl TupleKey {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        use TupleKey::*;
        Some(match code {
            0   => PebkitReady,
            1   => PebbleReady,
            10  => KivaCountrySet,
            11  => KivaSectorSet,
            12  => KivaActivitySet,
            13  => KivaFieldPartnerSet,
            20  => AppAchievementSet,
            30  => LenderId,
            31  => LenderName,
            32  => LenderLoc,
            33  => LenderLoanQty,
            34  => LenderTeamSet,
            35  => LenderCountrySet,
            36  => LenderSectorSet,
            37  => LenderActivitySet,
            38  => LenderFieldPartnerSet,
            39  => PreferredLoanSet,
            40  => LenderAchievementSet,
            100 => PutLoansInBasket,
            _   => return None,
        })
    }
}

/// A tuple value: UTF-8 string or 32-bit integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TupleValue {
    Int(i32),
    Str(String),
}

impl TupleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TupleValue::Str(s) => Some(s),
            TupleValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            TupleValue::Int(n) => Some(*n),
            TupleValue::Str(_) => None,
        }
    }
}

/// One tuple as delivered by the transport. `key` is the raw numeric code
/// so unknown keys survive until the adapter decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    pub key:   u32,
    pub value: TupleValue,
}

impl Tuple {
    pub fn new(key: TupleKey, value: TupleValue) -> Self {
        Self { key: key.code(), value }
    }

    pub fn str(key: TupleKey, value: &str) -> Self {
        Self::new(key, TupleValue::Str(value.to_string()))
    }

    pub fn int(key: TupleKey, value: i32) -> Self {
        Self::new(key, TupleValue::Int(value))
    }
}

/// All tuples of one inbound message, in transport order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub tuples: Vec<Tuple>,
}

impl InboundMessage {
    pub fn new(tuples: Vec<Tuple>) -> Self {
        Self { tuples }
    }
}

/// A request for the companion process: one key, one string payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub key:     TupleKey,
    pub payload: String,
}
