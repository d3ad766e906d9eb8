use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::AppError;

/// Tri-state outcome of one stock check.
///
/// Evidence is carried alongside in [`Inference`] and never participates in
/// verdict comparison, so two checks that fired different detectors still
/// compare equal when they agree on availability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    InStock,
    OutOfStock,
    Indeterminate,
}

impl Verdict {
    /// Maps the tri-state onto the boolean the status tracker stores.
    /// Indeterminate counts as not purchasable.
    pub fn is_purchasable(&self) -> bool {
        matches!(self, Verdict::InStock)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::InStock => "in stock",
            Verdict::OutOfStock => "out of stock",
            Verdict::Indeterminate => "indeterminate",
        };
        write!(f, "{}", text)
    }
}

/// One heuristic rule in the ordered inference chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Detector {
    ExplicitStatus,
    PurchaseControl,
    NegativeKeyword,
    PricePresence,
    DeliveryPresence,
    WeakFallback,
}

impl Detector {
    /// Evaluation order. Later entries are weaker heuristics and must not
    /// override earlier ones; the engine stops at the first signal.
    pub const CHAIN: [Detector; 6] = [
        Detector::ExplicitStatus,
        Detector::PurchaseControl,
        Detector::NegativeKeyword,
        Detector::PricePresence,
        Detector::DeliveryPresence,
        Detector::WeakFallback,
    ];
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Detector::ExplicitStatus => "explicit-status",
            Detector::PurchaseControl => "purchase-control",
            Detector::NegativeKeyword => "negative-keyword",
            Detector::PricePresence => "price-presence",
            Detector::DeliveryPresence => "delivery-presence",
            Detector::WeakFallback => "weak-fallback",
        };
        write!(f, "{}", name)
    }
}

/// Which rule fired and what it matched. `detector` is `None` on the
/// conservative failure path and on an inconclusive check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    pub detector: Option<Detector>,
    pub detail: String,
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detector {
            Some(detector) => write!(f, "{}: {}", detector, self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

/// Engine output: the verdict plus the evidence that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inference {
    pub verdict: Verdict,
    pub evidence: Evidence,
}

impl Inference {
    pub fn new(verdict: Verdict, detector: Detector, detail: impl Into<String>) -> Self {
        Self {
            verdict,
            evidence: Evidence {
                detector: Some(detector),
                detail: detail.into(),
            },
        }
    }

    /// No detector produced a definitive signal. Downstream consumers treat
    /// this the same as out of stock.
    pub fn inconclusive() -> Self {
        Self {
            verdict: Verdict::Indeterminate,
            evidence: Evidence {
                detector: None,
                detail: "no detector produced a definitive signal".to_string(),
            },
        }
    }

    /// Conservative fallback when fetching or parsing the page failed: the
    /// product is assumed unavailable and the error becomes the evidence.
    pub fn from_failure(err: &AppError) -> Self {
        Self {
            verdict: Verdict::OutOfStock,
            evidence: Evidence {
                detector: None,
                detail: format!("check failed: {}", err),
            },
        }
    }
}
