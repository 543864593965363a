use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerNr(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// One historical offer row as read from storage. Immutable once fetched;
/// estimators never write back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalOffer {
    pub offer_id: String,
    pub customer_nr: CustomerNr,
    pub product_id: Option<ProductId>,
    /// Outcome flag: the customer accepted the offer.
    pub accepted: bool,
    pub box_price: f64,
    pub gross_purchase_price: f64,
    pub exchange_rate: f64,
    pub quantity: f64,
    /// Derived markup percentage. `None` when the purchase basis is zero;
    /// a missing markup must never be treated as 0.
    pub markup: Option<f64>,
    /// Offers without an encoding date cannot contribute to recency scoring.
    pub encoded_at: Option<DateTime<Utc>>,
}

impl HistoricalOffer {
    /// Markup value usable in statistics: present and finite.
    pub fn valid_markup(&self) -> Option<f64> {
        self.markup.filter(|value| value.is_finite())
    }
}

/// Markup percentage over the exchange-rate-adjusted purchase basis:
/// `(box_price − basis) / basis × 100` with `basis = gross_purchase_price × rate`.
///
/// A zero or non-finite basis yields `None`.
pub fn markup_from_prices(
    box_price: f64,
    gross_purchase_price: f64,
    exchange_rate: f64,
) -> Option<f64> {
    let basis = gross_purchase_price * exchange_rate;
    if basis == 0.0 || !basis.is_finite() {
        return None;
    }

    let markup = (box_price - basis) / basis * 100.0;
    markup.is_finite().then_some(markup)
}
