use crate::domain::estimate::OfferTerms;
use crate::domain::offer::{CustomerNr, HistoricalOffer, ProductId};
use crate::history::{HistoryError, OfferHistory, OutcomeFilter};

use super::stats;
use super::{
    CUSTOMER_HISTORY_LIMIT, DEFAULT_PROBABILITY, FALLBACK_MARKUP_WINDOW, PAIR_HISTORY_LIMIT,
    PRODUCT_HISTORY_LIMIT, SIMILAR_MARKUP_WINDOW,
};

/// Estimates the probability that a proposed markup will be accepted.
///
/// Prefers direct pair history filtered to similar markups, falls back to
/// combined product and customer history, and bottoms out in a stable
/// identifier-derived score so the answer stays repeatable with zero data.
pub struct ProbabilityEstimator<H> {
    history: H,
}

impl<H: OfferHistory> ProbabilityEstimator<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    /// Acceptance probability in [0,100] for `proposed_markup`.
    ///
    /// Never fails: a storage error degrades to the neutral default instead
    /// of propagating.
    pub async fn estimate(&self, terms: &OfferTerms, proposed_markup: f64) -> f64 {
        match try_estimate(&self.history, terms, proposed_markup).await {
            Ok(probability) => probability,
            Err(_) => DEFAULT_PROBABILITY,
        }
    }
}

pub(crate) async fn try_estimate<H: OfferHistory>(
    history: &H,
    terms: &OfferTerms,
    proposed_markup: f64,
) -> Result<f64, HistoryError> {
    let pair = history
        .pair_history(
            &terms.customer_nr,
            &terms.product_id,
            OutcomeFilter::Any,
            PAIR_HISTORY_LIMIT,
        )
        .await?;

    if let Some(probability) = acceptance_share(&pair, proposed_markup, SIMILAR_MARKUP_WINDOW) {
        return Ok(probability);
    }

    try_fallback(history, terms, proposed_markup).await
}

/// Fallback path over combined product and customer history. Entered directly
/// by the markup estimator when it already knows the pair has no history.
pub(crate) async fn try_fallback<H: OfferHistory>(
    history: &H,
    terms: &OfferTerms,
    proposed_markup: f64,
) -> Result<f64, HistoryError> {
    let mut combined = history
        .product_history(&terms.product_id, OutcomeFilter::Any, PRODUCT_HISTORY_LIMIT)
        .await?;
    combined.extend(
        history
            .customer_history(&terms.customer_nr, OutcomeFilter::Any, CUSTOMER_HISTORY_LIMIT)
            .await?,
    );

    if combined.is_empty() {
        return Ok(product_seed_score(&terms.product_id, proposed_markup));
    }

    let near: Vec<&HistoricalOffer> = combined
        .iter()
        .filter(|offer| {
            offer
                .valid_markup()
                .is_some_and(|markup| (markup - proposed_markup).abs() <= FALLBACK_MARKUP_WINDOW)
        })
        .collect();

    if near.len() >= 3 {
        let accepted = near.iter().filter(|offer| offer.accepted).count();
        return Ok(100.0 * accepted as f64 / near.len() as f64);
    }

    // Too few comparable records: lean on the identifier seed, tempered by
    // whatever overall acceptance the combined window shows.
    let pseudo = pair_seed_score(&terms.customer_nr, &terms.product_id, proposed_markup);
    let overall = stats::success_rate(&combined).unwrap_or(0.0) * 100.0;

    Ok((0.7 * pseudo + 0.3 * overall).clamp(0.0, 100.0))
}

/// Share of accepted offers among those with a markup within `window` points
/// of the proposal. `None` when no offer is comparable.
fn acceptance_share(offers: &[HistoricalOffer], proposed_markup: f64, window: f64) -> Option<f64> {
    let similar: Vec<&HistoricalOffer> = offers
        .iter()
        .filter(|offer| {
            offer.valid_markup().is_some_and(|markup| (markup - proposed_markup).abs() <= window)
        })
        .collect();

    if similar.is_empty() {
        return None;
    }

    let accepted = similar.iter().filter(|offer| offer.accepted).count();
    Some(100.0 * accepted as f64 / similar.len() as f64)
}

/// Stable zero-data estimate seeded from the product identifier: 50 plus an
/// offset in [-12,+12], shifted by markup tier, clamped to [15,85].
fn product_seed_score(product: &ProductId, proposed_markup: f64) -> f64 {
    let hash = stats::char_sum(&product.0);
    let base = 50.0 + ((hash % 25) as f64 - 12.0);

    stats::markup_tier_shift(base, proposed_markup, hash).clamp(15.0, 85.0)
}

/// Pair-seeded variant for sparse combined history: offset in [-10,+10] from
/// both identifiers, same tier shifts and clamp.
fn pair_seed_score(customer: &CustomerNr, product: &ProductId, proposed_markup: f64) -> f64 {
    let hash = stats::char_sum(&product.0) + stats::char_sum(&customer.0);
    let base = 50.0 + ((hash % 20) as f64 - 10.0);

    stats::markup_tier_shift(base, proposed_markup, hash).clamp(15.0, 85.0)
}
