use chrono::Utc;

use crate::domain::estimate::{ReliabilityFactors, ReliabilityReport};
use crate::domain::offer::{CustomerNr, ProductId};
use crate::history::{HistoryError, OfferHistory, OutcomeFilter};

use super::stats;
use super::{CUSTOMER_HISTORY_LIMIT, PAIR_HISTORY_LIMIT, PRODUCT_HISTORY_LIMIT};

/// Weights for the overall reliability score.
const DIRECT_WEIGHT: f64 = 0.7;
const RECENCY_WEIGHT: f64 = 0.2;
const CONSISTENCY_WEIGHT: f64 = 0.1;

/// Score and factors reported when the store cannot be read.
const DEGRADED_SCORE: f64 = 20.0;

/// Scores how much confidence a probability estimate for a (customer, product)
/// pair deserves, decomposed into direct-history weight, data recency, data
/// consistency, and fallback reliance.
///
/// Branches on data availability only, never on a proposed markup.
pub struct ReliabilityEstimator<H> {
    history: H,
}

impl<H: OfferHistory> ReliabilityEstimator<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    /// Reliability report with score and factors in [0,100].
    ///
    /// Never fails: a storage error degrades to a fixed low-confidence result
    /// instead of propagating.
    pub async fn estimate(&self, customer: &CustomerNr, product: &ProductId) -> ReliabilityReport {
        match self.try_estimate(customer, product).await {
            Ok(report) => report,
            Err(_) => degraded_report(),
        }
    }

    async fn try_estimate(
        &self,
        customer: &CustomerNr,
        product: &ProductId,
    ) -> Result<ReliabilityReport, HistoryError> {
        let now = Utc::now();

        let pair = self
            .history
            .pair_history(customer, product, OutcomeFilter::Any, PAIR_HISTORY_LIMIT)
            .await?;
        if !pair.is_empty() {
            let direct = (pair.len() as f64 * 20.0).min(100.0);
            return Ok(report(
                direct,
                stats::recency_score(&pair, now),
                stats::consistency_score(&pair),
                0.0,
            ));
        }

        let product_wide = self
            .history
            .product_history(product, OutcomeFilter::Any, PRODUCT_HISTORY_LIMIT)
            .await?;
        if !product_wide.is_empty() {
            // History for the product with other customers is not direct
            // history for this pair.
            let penalty = (80.0 - product_wide.len() as f64 * 3.0).max(40.0);
            return Ok(report(
                0.0,
                stats::recency_score(&product_wide, now),
                stats::consistency_score(&product_wide),
                penalty,
            ));
        }

        let customer_wide = self
            .history
            .customer_history(customer, OutcomeFilter::Any, CUSTOMER_HISTORY_LIMIT)
            .await?;
        if !customer_wide.is_empty() {
            let jitter = ((stats::char_sum(&customer.0) + stats::char_sum(&product.0)) % 10) as f64;
            return Ok(report(
                0.0,
                0.5 * stats::recency_score(&customer_wide, now),
                0.3 * stats::consistency_score(&customer_wide),
                85.0 - jitter,
            ));
        }

        // No history anywhere: every factor comes from the product identifier
        // so repeated calls stay stable.
        let hash = stats::char_sum(&product.0);
        Ok(report(
            (5 + hash % 15) as f64,
            (10 + hash % 20) as f64,
            (5 + hash % 20) as f64,
            0.0,
        ))
    }
}

fn report(direct: f64, recency: f64, consistency: f64, fallback_penalty: f64) -> ReliabilityReport {
    let score = (DIRECT_WEIGHT * direct + RECENCY_WEIGHT * recency + CONSISTENCY_WEIGHT * consistency)
        .clamp(0.0, 100.0)
        .round();

    ReliabilityReport {
        score,
        factors: ReliabilityFactors {
            direct_history: direct.clamp(0.0, 100.0).round(),
            data_recency: recency.clamp(0.0, 100.0).round(),
            data_consistency: consistency.clamp(0.0, 100.0).round(),
            fallbacks_used: (100.0 - fallback_penalty).clamp(0.0, 100.0).round(),
        },
    }
}

fn degraded_report() -> ReliabilityReport {
    ReliabilityReport {
        score: DEGRADED_SCORE,
        factors: ReliabilityFactors {
            direct_history: DEGRADED_SCORE,
            data_recency: DEGRADED_SCORE,
            data_consistency: DEGRADED_SCORE,
            fallbacks_used: DEGRADED_SCORE,
        },
    }
}
