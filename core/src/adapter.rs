//! Protocol adapter: turns inbound tuples into store mutations.
//!
//! PROCESSING ORDER:
//!   1. Tuples are applied in the order the transport presents them.
//!   2. Composite values (`*_set` keys) go through the record decoder.
//!   3. The view is notified once, after the whole message.
//!   4. A readiness tuple flushes queued outbound requests.
//!
//! RULES:
//!   - A failing tuple is logged and skipped; the rest of the message
//!     is still applied.
//!   - The adapter owns the store. There is no global state.
//!   - Nothing is sent before the readiness tuple has been seen.

use crate::{
    collaborator::{DataView, Transport},
    config::CacheConfig,
    decoder::{decode_country_set, decode_loan_set, DecodeOptions, DecodeReport},
    error::{CacheError, CacheResult},
    message::{InboundMessage, OutboundMessage, Tuple, TupleKey, TupleValue},
    store::EntityStore,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-message tally returned by `handle_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReport {
    pub handled: usize,
    pub ignored: usize,
    pub failed:  usize,
    /// Decode reports of the composite tuples, in processing order.
    pub decoded: Vec<(TupleKey, DecodeReport)>,
}

enum Applied {
    Handled,
    Decoded(DecodeReport),
    Ignored,
}

pub struct ProtocolAdapter<T: Transport, V: DataView> {
    store:           EntityStore,
    opts:            DecodeOptions,
    outbox_capacity: usize,
    transport:       T,
    view:            V,
    ready:           bool,
    outbox:          VecDeque<OutboundMessage>,
}

impl<T: Transport, V: DataView> ProtocolAdapter<T, V> {
    pub fn new(store: EntityStore, config: &CacheConfig, transport: T, view: V) -> Self {
        Self {
            store,
            opts: DecodeOptions::from(config),
            outbox_capacity: config.outbox_capacity.max(1),
            transport,
            view,
            ready: false,
            outbox: VecDeque::new(),
        }
    }

    /// Build a store for `lender_id` and wrap it.
    pub fn open(lender_id: &str, config: &CacheConfig, transport: T, view: V) -> CacheResult<Self> {
        let store = EntityStore::create_with(lender_id, config)?;
        Ok(Self::new(store, config, transport, view))
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// True once the companion process has signalled readiness.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_outbound(&self) -> usize {
        self.outbox.len()
    }

    // ── Inbound ──────────────────────────────────────────────────

    /// Apply every tuple of `msg`, then notify the view.
    pub fn handle_message(&mut self, msg: &InboundMessage) -> MessageReport {
        log::info!("Inbound message with {} tuple(s)", msg.tuples.len());
        let mut report = MessageReport::default();
        let was_ready = self.ready;

        for tuple in &msg.tuples {
            match self.apply_tuple(tuple) {
                Ok(Applied::Handled) => report.handled += 1,
                Ok(Applied::Decoded(decoded)) => {
                    report.handled += 1;
                    if let Some(key) = TupleKey::from_code(tuple.key) {
                        report.decoded.push((key, decoded));
                    }
                }
                Ok(Applied::Ignored) => report.ignored += 1,
                Err(e) => {
                    log::warn!("Tuple {} failed: {e}", tuple.key);
                    report.failed += 1;
                }
            }
        }

        if self.ready && !was_ready {
            if let Err(e) = self.flush_outbox() {
                log::warn!("Outbox flush after readiness failed: {e}");
            }
        }

        self.view.data_updated(&self.store);
        report
    }

    fn apply_tuple(&mut self, tuple: &Tuple) -> CacheResult<Applied> {
        let Some(key) = TupleKey::from_code(tuple.key) else {
            log::warn!("Ignoring tuple with unknown key {}", tuple.key);
            return Ok(Applied::Ignored);
        };
        let opts = self.opts;

        match key {
            TupleKey::PebkitReady => {
                log::info!("Companion process ready");
                self.ready = true;
            }
            TupleKey::LenderId => {
                self.store.set_lender_id(expect_str(key, &tuple.value)?)?;
            }
            TupleKey::LenderName => {
                self.store.set_lender_name(expect_str(key, &tuple.value)?)?;
            }
            TupleKey::LenderLoc => {
                self.store.set_lender_loc(expect_str(key, &tuple.value)?)?;
            }
            TupleKey::LenderLoanQty => {
                let raw = expect_int(key, &tuple.value)?;
                let qty = u32::try_from(raw).map_err(|_| CacheError::InvalidArgument {
                    what:   "lender loan quantity",
                    reason: format!("{raw} is negative"),
                })?;
                self.store.set_lender_loan_qty(qty);
            }
            TupleKey::KivaCountrySet => {
                let flat = expect_str(key, &tuple.value)?;
                let store = &mut self.store;
                let report = decode_country_set(flat, opts, |code, name| store.add_kiva_country(code, name))?;
                return Ok(Applied::Decoded(report));
            }
            TupleKey::LenderCountrySet => {
                let flat = expect_str(key, &tuple.value)?;
                let store = &mut self.store;
                let report = decode_country_set(flat, opts, |code, name| {
                    let name = Some(name).filter(|n| !n.is_empty());
                    store.add_lender_country(code, name)
                })?;
                return Ok(Applied::Decoded(report));
            }
            TupleKey::PreferredLoanSet => {
                let flat = expect_str(key, &tuple.value)?;
                let report = decode_loan_set(&mut self.store, flat, opts)?;
                return Ok(Applied::Decoded(report));
            }
            other => {
                log::debug!("No store counterpart for {other:?}; ignoring");
                return Ok(Applied::Ignored);
            }
        }
        Ok(Applied::Handled)
    }

    // ── Outbound ─────────────────────────────────────────────────

    /// Ask the companion process for the lender profile.
    pub fn request_lender_info(&mut self) -> CacheResult<()> {
        let lender_id = self.store.lender_id();
        if lender_id.is_empty() {
            return Err(CacheError::InvalidArgument {
                what:   "lender info request",
                reason: "no lender id configured".into(),
            });
        }
        let msg = OutboundMessage {
            key:     TupleKey::PebbleReady,
            payload: lender_id.to_string(),
        };
        self.enqueue(msg)
    }

    /// Ask for preferred loans in the countries the lender already supports.
    /// Returns `false` when the lender supports no country and nothing was
    /// queued.
    pub fn request_preferred_loans(&mut self) -> CacheResult<bool> {
        let Some(codes) = self.store.lender_country_codes(true)? else {
            log::debug!("No lender countries; skipping preferred loan request");
            return Ok(false);
        };
        self.enqueue(OutboundMessage {
            key:     TupleKey::PreferredLoanSet,
            payload: codes,
        })?;
        Ok(true)
    }

    fn enqueue(&mut self, msg: OutboundMessage) -> CacheResult<()> {
        if self.outbox.len() >= self.outbox_capacity {
            if let Some(dropped) = self.outbox.pop_front() {
                log::warn!("Outbox full; dropping oldest request {:?}", dropped.key);
            }
        }
        self.outbox.push_back(msg);
        if self.ready {
            self.flush_outbox()?;
        } else {
            log::warn!("Companion not ready; {} request(s) queued", self.outbox.len());
        }
        Ok(())
    }

    /// Send queued requests in order. Stops at the first failure, leaving
    /// that request at the head of the queue.
    pub fn flush_outbox(&mut self) -> CacheResult<usize> {
        if !self.ready {
            return Ok(0);
        }
        let mut sent = 0;
        while let Some(msg) = self.outbox.front() {
            self.transport.send(msg)?;
            log::debug!("Sent {:?} ({} bytes)", msg.key, msg.payload.len());
            self.outbox.pop_front();
            sent += 1;
        }
        Ok(sent)
    }
}

fn expect_str(key: TupleKey, value: &TupleValue) -> CacheResult<&str> {
    value.as_str().ok_or_else(|| CacheError::InvalidArgument {
        what:   "tuple value",
        reason: format!("{key:?} expects a string"),
    })
}

fn expect_int(key: TupleKey, value: &TupleValue) -> CacheResult<i32> {
    value.as_int().ok_or_else(|| CacheError::InvalidArgument {
        what:   "tuple value",
        reason: format!("{key:?} expects an integer"),
    })
}
