use async_trait::async_trait;
use thiserror::Error;

use crate::domain::offer::{CustomerNr, HistoricalOffer, ProductId};

/// Restricts a history query to a subset of outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeFilter {
    /// Accepted and rejected offers alike.
    Any,
    /// Only offers the customer accepted.
    AcceptedOnly,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history query failed: {reason}")]
    QueryFailed { reason: String },
}

/// Read-only access to historical offers.
///
/// Implementations return offers newest first, bounded by `limit`, with the
/// `markup` field computed or retrieved by the query itself. A zero purchase
/// basis must surface as a missing markup, never as 0.
#[async_trait]
pub trait OfferHistory: Send + Sync {
    /// Offers for one (customer, product) pair.
    async fn pair_history(
        &self,
        customer: &CustomerNr,
        product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError>;

    /// Offers for a product across all customers.
    async fn product_history(
        &self,
        product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError>;

    /// Offers for a customer across all products.
    async fn customer_history(
        &self,
        customer: &CustomerNr,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError>;
}
