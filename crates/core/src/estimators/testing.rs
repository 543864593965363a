//! In-memory `OfferHistory` stub shared by the estimator tests.

use async_trait::async_trait;

use crate::domain::offer::{CustomerNr, HistoricalOffer, ProductId};
use crate::history::{HistoryError, OfferHistory, OutcomeFilter};

#[derive(Default)]
pub(crate) struct StubHistory {
    pub pair: Vec<HistoricalOffer>,
    pub product: Vec<HistoricalOffer>,
    pub customer: Vec<HistoricalOffer>,
    pub fail: bool,
}

fn windowed(
    offers: &[HistoricalOffer],
    filter: OutcomeFilter,
    limit: u32,
) -> Vec<HistoricalOffer> {
    offers
        .iter()
        .filter(|offer| match filter {
            OutcomeFilter::Any => true,
            OutcomeFilter::AcceptedOnly => offer.accepted,
        })
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl OfferHistory for StubHistory {
    async fn pair_history(
        &self,
        _customer: &CustomerNr,
        _product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        if self.fail {
            return Err(HistoryError::QueryFailed { reason: "stub failure".to_string() });
        }
        Ok(windowed(&self.pair, filter, limit))
    }

    async fn product_history(
        &self,
        _product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        if self.fail {
            return Err(HistoryError::QueryFailed { reason: "stub failure".to_string() });
        }
        Ok(windowed(&self.product, filter, limit))
    }

    async fn customer_history(
        &self,
        _customer: &CustomerNr,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        if self.fail {
            return Err(HistoryError::QueryFailed { reason: "stub failure".to_string() });
        }
        Ok(windowed(&self.customer, filter, limit))
    }
}

/// Offer fixture for customer 10042 / product 4711 with sensible price fields.
pub(crate) fn offer(markup: Option<f64>, accepted: bool) -> HistoricalOffer {
    HistoricalOffer {
        offer_id: "off-test".to_string(),
        customer_nr: CustomerNr("10042".to_string()),
        product_id: Some(ProductId("4711".to_string())),
        accepted,
        box_price: 120.0,
        gross_purchase_price: 100.0,
        exchange_rate: 1.0,
        quantity: 10.0,
        markup,
        encoded_at: None,
    }
}
