use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use crate::inference::Verdict;
use crate::models::{Product, StatusRecord, Transition, TransitionEvent};

/// Tracks the last-known availability per product id across poll cycles and
/// turns verdicts into transition events.
///
/// Owned by the poller, process lifetime, never persisted. The transition
/// policy is deliberately asymmetric: a product first seen out of stock is
/// not an event, a product first seen in stock is.
pub struct StatusTracker {
    records: HashMap<String, StatusRecord>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Records the verdict for `product` and returns the transition event
    /// if availability changed relative to the stored record.
    ///
    /// The record is refreshed on every call, event or not, so
    /// `last_checked` always reflects the most recent observation.
    pub fn record_and_diff(
        &mut self,
        product: &Product,
        verdict: Verdict,
    ) -> Option<TransitionEvent> {
        let available = verdict.is_purchasable();
        let previous = self.records.get(&product.id).map(|r| r.available);
        let now = Utc::now();

        self.records.insert(
            product.id.clone(),
            StatusRecord {
                available,
                last_checked: now,
            },
        );

        let transition = match (previous, available) {
            // Cold-start in stock counts as becoming available.
            (None, true) | (Some(false), true) => Some(Transition::BecameAvailable),
            (Some(true), false) => Some(Transition::BecameUnavailable),
            _ => None,
        };

        match transition {
            Some(transition) => Some(TransitionEvent {
                product: product.clone(),
                previous,
                transition,
                at: now,
            }),
            None => {
                debug!(
                    product = %product.id,
                    available,
                    "status unchanged"
                );
                None
            }
        }
    }

    /// Stored record for a product id, if it was ever checked.
    pub fn status_of(&self, product_id: &str) -> Option<&StatusRecord> {
        self.records.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
