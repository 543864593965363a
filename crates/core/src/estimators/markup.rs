use crate::domain::estimate::{MarkupFactors, MarkupSuggestion, OfferTerms};
use crate::domain::offer::{HistoricalOffer, ProductId};
use crate::history::{HistoryError, OfferHistory, OutcomeFilter};

use super::{probability, stats};
use super::{
    ACCEPTED_PAIR_LIMIT, CLIENT_TRACK_RECORD_LIMIT, CUSTOMER_HISTORY_LIMIT, DEFAULT_AVG_QUANTITY,
    DEFAULT_MARKUP, DEFAULT_PROBABILITY, MAX_MARKUP, MIN_MARKUP, PRODUCT_HISTORY_LIMIT,
};

/// Weights for blending product-wide and customer-wide fallback markups.
const PRODUCT_BLEND_WEIGHT: f64 = 0.7;
const CUSTOMER_BLEND_WEIGHT: f64 = 0.3;

/// Suggests a markup for a proposed offer from accepted history, with the
/// acceptance probability of the suggestion attached.
///
/// Prefers the pair's own accepted offers; without any, blends product-wide
/// and customer-wide accepted history; with nothing at all, falls back to a
/// stable identifier-derived markup.
pub struct MarkupEstimator<H> {
    history: H,
}

impl<H: OfferHistory> MarkupEstimator<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    /// Suggested markup in [1,1000] (one decimal place) plus its acceptance
    /// probability and factor breakdown.
    ///
    /// Never fails: a storage error degrades to the fixed default suggestion
    /// instead of propagating.
    pub async fn estimate(&self, terms: &OfferTerms) -> MarkupSuggestion {
        match self.try_estimate(terms).await {
            Ok(suggestion) => suggestion,
            Err(_) => default_suggestion(),
        }
    }

    async fn try_estimate(&self, terms: &OfferTerms) -> Result<MarkupSuggestion, HistoryError> {
        let accepted_pair = self
            .history
            .pair_history(
                &terms.customer_nr,
                &terms.product_id,
                OutcomeFilter::AcceptedOnly,
                ACCEPTED_PAIR_LIMIT,
            )
            .await?;

        if accepted_pair.is_empty() {
            return self.try_fallback_estimate(terms).await;
        }

        let base = stats::weighted_markup(&stats::valid_markups(&accepted_pair))
            .unwrap_or(DEFAULT_MARKUP);

        let track_record = self
            .history
            .customer_history(&terms.customer_nr, OutcomeFilter::Any, CLIENT_TRACK_RECORD_LIMIT)
            .await?;
        let client_adjustment = client_history_adjustment(&track_record);

        let avg_quantity =
            stats::average_quantity(&accepted_pair).unwrap_or(DEFAULT_AVG_QUANTITY);
        let volume_adjustment = volume_adjustment(terms.quantity, avg_quantity);

        let suggested = base + client_adjustment + volume_adjustment;
        let probability = probability::try_estimate(&self.history, terms, suggested).await?;

        Ok(build_suggestion(
            suggested,
            probability,
            accepted_pair.len(),
            MarkupFactors {
                base_markup: base,
                client_history: nonzero(client_adjustment),
                competitive_adjustment: None,
                volume_discount: nonzero(volume_adjustment),
                urgency_factor: None,
            },
        ))
    }

    async fn try_fallback_estimate(
        &self,
        terms: &OfferTerms,
    ) -> Result<MarkupSuggestion, HistoryError> {
        let product_wide = self
            .history
            .product_history(&terms.product_id, OutcomeFilter::AcceptedOnly, PRODUCT_HISTORY_LIMIT)
            .await?;
        let customer_wide = self
            .history
            .customer_history(
                &terms.customer_nr,
                OutcomeFilter::AcceptedOnly,
                CUSTOMER_HISTORY_LIMIT,
            )
            .await?;
        let history_count = product_wide.len() + customer_wide.len();

        let product_markup = stats::weighted_markup(&stats::valid_markups(&product_wide));
        let customer_markup = stats::weighted_markup(&stats::valid_markups(&customer_wide));
        let base = blended_base(product_markup, customer_markup)
            .unwrap_or_else(|| seed_markup(&terms.product_id));

        let combined: Vec<HistoricalOffer> =
            product_wide.into_iter().chain(customer_wide).collect();
        let avg_quantity =
            stats::average_quantity(&combined).unwrap_or(DEFAULT_AVG_QUANTITY);
        let suggested = base * quantity_factor(terms.quantity, avg_quantity);

        let probability = probability::try_fallback(&self.history, terms, suggested).await?;

        Ok(build_suggestion(
            suggested,
            probability,
            history_count,
            MarkupFactors {
                base_markup: base,
                client_history: None,
                competitive_adjustment: None,
                volume_discount: nonzero(suggested - base),
                urgency_factor: None,
            },
        ))
    }
}

/// Adjustment from the customer's overall track record: strong closers earn a
/// small premium, weak ones with enough evidence a small concession.
fn client_history_adjustment(track_record: &[HistoricalOffer]) -> f64 {
    let Some(rate) = stats::success_rate(track_record) else {
        return 0.0;
    };

    if rate > 0.7 {
        (rate * 5.0).round().min(5.0)
    } else if rate < 0.3 && track_record.len() > 3 {
        -2.0
    } else {
        0.0
    }
}

/// Additive volume adjustment against the historical average quantity.
fn volume_adjustment(quantity: f64, avg_quantity: f64) -> f64 {
    if avg_quantity <= 0.0 {
        return 0.0;
    }

    let ratio = quantity / avg_quantity;
    if ratio > 2.0 {
        -5.0
    } else if ratio > 1.5 {
        -3.0
    } else if ratio < 0.5 {
        2.0
    } else {
        0.0
    }
}

/// Multiplicative quantity factor used by the fallback path.
fn quantity_factor(quantity: f64, avg_quantity: f64) -> f64 {
    if avg_quantity <= 0.0 {
        return 1.0;
    }

    let ratio = quantity / avg_quantity;
    if ratio > 2.0 {
        0.9
    } else if ratio < 0.5 {
        1.1
    } else {
        1.0
    }
}

/// Blend of fallback markup sources, normalized over the non-empty ones. An
/// empty source contributes zero weight, not a default value.
fn blended_base(product_markup: Option<f64>, customer_markup: Option<f64>) -> Option<f64> {
    match (product_markup, customer_markup) {
        (Some(product), Some(customer)) => {
            let weight = PRODUCT_BLEND_WEIGHT + CUSTOMER_BLEND_WEIGHT;
            Some((PRODUCT_BLEND_WEIGHT * product + CUSTOMER_BLEND_WEIGHT * customer) / weight)
        }
        (Some(product), None) => Some(product),
        (None, Some(customer)) => Some(customer),
        (None, None) => None,
    }
}

/// Stable zero-data markup seeded from the product identifier: the default
/// markup plus a variation in [-7,+12] and a category adjustment from the
/// numeric tail of the id.
fn seed_markup(product: &ProductId) -> f64 {
    let hash = stats::char_sum(&product.0);
    let variation = (hash % 20) as f64 - 7.0;

    (DEFAULT_MARKUP + variation + category_adjustment(&product.0))
        .clamp(MIN_MARKUP + 2.0, MAX_MARKUP - 5.0)
}

fn category_adjustment(id: &str) -> f64 {
    let chars: Vec<char> = id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();

    match tail.parse::<u32>() {
        Ok(value) if value < 20 => -3.0,
        Ok(value) if value > 80 => 5.0,
        _ => 0.0,
    }
}

fn build_suggestion(
    suggested: f64,
    probability: f64,
    history_count: usize,
    factors: MarkupFactors,
) -> MarkupSuggestion {
    MarkupSuggestion {
        suggested_markup: round_to_tenth(suggested.clamp(MIN_MARKUP, MAX_MARKUP)),
        probability: probability.clamp(0.0, 100.0).round(),
        history_count,
        factors,
    }
}

fn default_suggestion() -> MarkupSuggestion {
    MarkupSuggestion {
        suggested_markup: DEFAULT_MARKUP,
        probability: DEFAULT_PROBABILITY,
        history_count: 0,
        factors: MarkupFactors { base_markup: DEFAULT_MARKUP, ..MarkupFactors::default() },
    }
}

fn nonzero(adjustment: f64) -> Option<f64> {
    (adjustment != 0.0).then_some(adjustment)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use crate::domain::estimate::OfferTerms;
    use crate::domain::offer::ProductId;
    use crate::estimators::testing::{offer, StubHistory};

    use super::{
        blended_base, client_history_adjustment, seed_markup, volume_adjustment, MarkupEstimator,
    };

    fn terms() -> OfferTerms {
        OfferTerms::new("10042", "4711")
    }

    #[tokio::test]
    async fn single_accepted_record_carries_the_bias_and_volume_bump() {
        // Base = 30 + 2 bias; requested quantity 1 vs historical 10 is a
        // small order, +2.
        let history =
            StubHistory { pair: vec![offer(Some(30.0), true)], ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        let suggestion = estimator.estimate(&terms()).await;

        assert_eq!(suggestion.suggested_markup, 34.0);
        assert_eq!(suggestion.history_count, 1);
        assert_eq!(suggestion.factors.base_markup, 32.0);
        assert_eq!(suggestion.factors.client_history, None);
        assert_eq!(suggestion.factors.volume_discount, Some(2.0));
        // The lone record (markup 30) is within ±5 of the suggestion and was
        // accepted.
        assert_eq!(suggestion.probability, 100.0);
    }

    #[tokio::test]
    async fn strong_client_track_record_earns_a_premium() {
        let pair = vec![offer(Some(20.0), true), offer(Some(20.0), true)];
        let customer = vec![
            offer(Some(25.0), true),
            offer(Some(18.0), true),
            offer(Some(30.0), true),
            offer(Some(22.0), true),
            offer(Some(40.0), false),
        ];
        let history = StubHistory { pair, customer, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        // Quantity matches the historical average, so only the client
        // adjustment applies: min(5, round(0.8 * 5)) = 4.
        let suggestion = estimator.estimate(&terms().with_quantity(10.0)).await;

        assert_eq!(suggestion.factors.base_markup, 22.0);
        assert_eq!(suggestion.factors.client_history, Some(4.0));
        assert_eq!(suggestion.factors.volume_discount, None);
        assert_eq!(suggestion.suggested_markup, 26.0);
    }

    #[tokio::test]
    async fn weak_client_track_record_concedes_two_points() {
        let pair = vec![offer(Some(20.0), true)];
        let customer = vec![
            offer(Some(25.0), false),
            offer(Some(18.0), false),
            offer(Some(30.0), true),
            offer(Some(22.0), false),
            offer(Some(40.0), false),
        ];
        let history = StubHistory { pair, customer, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        let suggestion = estimator.estimate(&terms().with_quantity(10.0)).await;

        assert_eq!(suggestion.factors.client_history, Some(-2.0));
        assert_eq!(suggestion.suggested_markup, 20.0);
    }

    #[tokio::test]
    async fn bulk_orders_get_the_volume_discount() {
        let pair = vec![offer(Some(20.0), true), offer(Some(20.0), true)];
        let history = StubHistory { pair, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        // 3x the historical average quantity of 10.
        let suggestion = estimator.estimate(&terms().with_quantity(30.0)).await;

        assert_eq!(suggestion.factors.volume_discount, Some(-5.0));
        assert_eq!(suggestion.suggested_markup, 17.0);
    }

    #[tokio::test]
    async fn fallback_uses_product_history_alone_when_customer_is_new() {
        let product = vec![offer(Some(20.0), true), offer(Some(24.0), true)];
        let history = StubHistory { product, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        let suggestion = estimator.estimate(&terms().with_quantity(10.0)).await;

        // Weighted markup of [20, 24]: max(median 20, mean 22) + 2 = 24; a
        // missing customer source contributes no weight.
        assert_eq!(suggestion.factors.base_markup, 24.0);
        assert_eq!(suggestion.suggested_markup, 24.0);
        assert_eq!(suggestion.history_count, 2);
        assert_eq!(suggestion.factors.volume_discount, None);
    }

    #[tokio::test]
    async fn fallback_blends_product_and_customer_sources() {
        let product = vec![offer(Some(30.0), true)];
        let customer = vec![offer(Some(10.0), true)];
        let history = StubHistory { product, customer, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        let suggestion = estimator.estimate(&terms().with_quantity(10.0)).await;

        // 0.7 * 32 + 0.3 * 12 = 26.0
        assert_eq!(suggestion.factors.base_markup, 26.0);
        assert_eq!(suggestion.history_count, 2);
    }

    #[tokio::test]
    async fn fallback_scales_by_quantity_ratio() {
        let product = vec![offer(Some(20.0), true), offer(Some(20.0), true)];
        let history = StubHistory { product, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        // 30 vs average 10 exceeds the 2x ratio: base 22 scaled by 0.9.
        let suggestion = estimator.estimate(&terms().with_quantity(30.0)).await;

        assert_eq!(suggestion.factors.base_markup, 22.0);
        assert_eq!(suggestion.suggested_markup, 19.8);
        let delta = suggestion.factors.volume_discount.expect("volume delta");
        assert!((delta - (19.8 - 22.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_store_seeds_markup_from_product_id() {
        let estimator = MarkupEstimator::new(StubHistory::default());

        let suggestion = estimator.estimate(&terms()).await;

        // char_sum("4711") = 13: 20 + (13 % 20 - 7) - 3 for the "11" tail.
        assert_eq!(suggestion.factors.base_markup, 23.0);
        assert_eq!(suggestion.history_count, 0);
        // Quantity 1 vs the assumed average of 10 is a small order: x1.1.
        assert_eq!(suggestion.suggested_markup, 25.3);
    }

    #[tokio::test]
    async fn storage_failure_degrades_to_default_suggestion() {
        let estimator = MarkupEstimator::new(StubHistory { fail: true, ..StubHistory::default() });

        let suggestion = estimator.estimate(&terms()).await;

        assert_eq!(suggestion.suggested_markup, 20.0);
        assert_eq!(suggestion.probability, 50.0);
        assert_eq!(suggestion.history_count, 0);
        assert_eq!(suggestion.factors.base_markup, 20.0);
    }

    #[tokio::test]
    async fn suggestion_stays_inside_bounds() {
        let pair = vec![offer(Some(4000.0), true)];
        let history = StubHistory { pair, ..StubHistory::default() };
        let estimator = MarkupEstimator::new(history);

        let suggestion = estimator.estimate(&terms()).await;

        assert!(suggestion.suggested_markup <= 1000.0);
        assert!(suggestion.suggested_markup >= 1.0);
        assert!((0.0..=100.0).contains(&suggestion.probability));
    }

    #[test]
    fn client_adjustment_matches_the_rate_formula() {
        let strong = vec![
            offer(Some(20.0), true),
            offer(Some(20.0), true),
            offer(Some(20.0), true),
            offer(Some(20.0), true),
            offer(Some(20.0), false),
        ];
        assert_eq!(client_history_adjustment(&strong), 4.0);

        // Low rate but too little evidence to penalize.
        let thin = vec![offer(Some(20.0), false), offer(Some(20.0), false)];
        assert_eq!(client_history_adjustment(&thin), 0.0);

        assert_eq!(client_history_adjustment(&[]), 0.0);
    }

    #[test]
    fn volume_adjustment_tiers() {
        assert_eq!(volume_adjustment(30.0, 10.0), -5.0);
        assert_eq!(volume_adjustment(16.0, 10.0), -3.0);
        assert_eq!(volume_adjustment(4.0, 10.0), 2.0);
        assert_eq!(volume_adjustment(10.0, 10.0), 0.0);
    }

    #[test]
    fn blend_normalizes_over_present_sources() {
        assert_eq!(blended_base(Some(30.0), Some(10.0)), Some(24.0));
        assert_eq!(blended_base(Some(30.0), None), Some(30.0));
        assert_eq!(blended_base(None, Some(10.0)), Some(10.0));
        assert_eq!(blended_base(None, None), None);
    }

    #[test]
    fn seed_markup_applies_category_tail() {
        // Ending below 20 subtracts, ending above 80 adds.
        let low_tail = seed_markup(&ProductId("4705".to_string()));
        let high_tail = seed_markup(&ProductId("4799".to_string()));

        // char_sum("4705") = 16 -> 20 + 9 - 3; char_sum("4799") = 29 -> 20 + 2 + 5.
        assert_eq!(low_tail, 26.0);
        assert_eq!(high_tail, 27.0);
    }
}
