use serde::{Deserialize, Serialize};

use crate::domain::offer::{CustomerNr, ProductId};

/// Terms of a proposed offer, as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub customer_nr: CustomerNr,
    pub product_id: ProductId,
    pub quantity: f64,
    pub purchase_price: f64,
    pub exchange_rate: f64,
}

impl OfferTerms {
    pub fn new(customer_nr: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            customer_nr: CustomerNr(customer_nr.into()),
            product_id: ProductId(product_id.into()),
            quantity: 1.0,
            purchase_price: 0.0,
            exchange_rate: 1.0,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_purchase_price(mut self, purchase_price: f64) -> Self {
        self.purchase_price = purchase_price;
        self
    }

    pub fn with_exchange_rate(mut self, exchange_rate: f64) -> Self {
        self.exchange_rate = exchange_rate;
        self
    }
}

/// Reliability sub-factors, each 0-100.
///
/// `fallbacks_used` reports *non-reliance* on fallback history: 100 means the
/// estimate needed no fallback at all.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityFactors {
    pub direct_history: f64,
    pub data_recency: f64,
    pub data_consistency: f64,
    pub fallbacks_used: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
    /// Overall confidence in a probability estimate for this pair, 0-100.
    pub score: f64,
    pub factors: ReliabilityFactors,
}

/// Breakdown of how a suggested markup was assembled. Adjustments are absent
/// when the corresponding rule did not fire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupFactors {
    pub base_markup: f64,
    pub client_history: Option<f64>,
    pub competitive_adjustment: Option<f64>,
    pub volume_discount: Option<f64>,
    pub urgency_factor: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkupSuggestion {
    /// Bounded to [1, 1000], one decimal place.
    pub suggested_markup: f64,
    /// Acceptance probability for the suggested markup, rounded to an integer.
    pub probability: f64,
    /// Number of historical records the suggestion drew on (reporting only).
    pub history_count: usize,
    pub factors: MarkupFactors,
}
