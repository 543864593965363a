//! Shared statistics over historical offers.
//!
//! Every estimator goes through these helpers so that "markup", "similar",
//! and "recent" mean the same thing everywhere.

use chrono::{DateTime, Utc};

use crate::domain::offer::HistoricalOffer;

/// Markup values usable in statistics: present and finite, in offer order.
pub fn valid_markups(offers: &[HistoricalOffer]) -> Vec<f64> {
    offers.iter().filter_map(HistoricalOffer::valid_markup).collect()
}

/// Weighted markup over a set of historical markups: the larger of median and
/// mean, plus a 2-point upward bias against undervaluation. The median takes
/// the lower middle element for even counts.
pub fn weighted_markup(markups: &[f64]) -> Option<f64> {
    if markups.is_empty() {
        return None;
    }

    let mut sorted = markups.to_vec();
    sorted.sort_by(|left, right| left.partial_cmp(right).unwrap_or(std::cmp::Ordering::Equal));

    let median = sorted[(sorted.len() - 1) / 2];
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

    Some(median.max(mean) + 2.0)
}

/// Fraction of accepted offers, `None` for an empty history.
pub fn success_rate(offers: &[HistoricalOffer]) -> Option<f64> {
    if offers.is_empty() {
        return None;
    }

    let accepted = offers.iter().filter(|offer| offer.accepted).count();
    Some(accepted as f64 / offers.len() as f64)
}

/// Mean order quantity, `None` for an empty history.
pub fn average_quantity(offers: &[HistoricalOffer]) -> Option<f64> {
    if offers.is_empty() {
        return None;
    }

    Some(offers.iter().map(|offer| offer.quantity).sum::<f64>() / offers.len() as f64)
}

/// Recency score 0-100 from the average age of dated offers.
///
/// Undated offers are excluded; a history with no dates scores 0. The score
/// decays linearly and floors at 0 once the average age reaches a year.
pub fn recency_score(offers: &[HistoricalOffer], now: DateTime<Utc>) -> f64 {
    let ages: Vec<f64> = offers
        .iter()
        .filter_map(|offer| offer.encoded_at)
        .map(|encoded_at| (now - encoded_at).num_days() as f64)
        .collect();

    if ages.is_empty() {
        return 0.0;
    }

    let avg_age_days = ages.iter().sum::<f64>() / ages.len() as f64;
    (100.0 - avg_age_days / 365.0 * 100.0).max(0.0)
}

/// Consistency score 0-100 from the coefficient of variation of valid markups.
///
/// Fewer than two valid markups score 0. Identical markups score 100; the
/// score drops two points per CV percentage point and floors at 0.
pub fn consistency_score(offers: &[HistoricalOffer]) -> f64 {
    let markups = valid_markups(offers);
    if markups.len() < 2 {
        return 0.0;
    }

    let mean = markups.iter().sum::<f64>() / markups.len() as f64;
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }

    let variance =
        markups.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / markups.len() as f64;
    let cv = variance.sqrt() / mean.abs() * 100.0;

    (100.0 - cv * 2.0).max(0.0)
}

/// Stable per-identifier hash: sum of base-36 character values.
///
/// Keeps pseudo-scores repeatable for identical identifiers without any true
/// randomness. Characters outside [0-9a-zA-Z] contribute 0, so `"00"` hashes
/// to 0 and purely numeric identifiers hash to their digit sum.
pub fn char_sum(id: &str) -> u32 {
    id.chars().map(|c| c.to_digit(36).unwrap_or(0)).sum()
}

/// Shift a pseudo-score by the markup tier of the proposal: aggressive markups
/// depress the score, conservative ones lift it. Tiers are mutually exclusive
/// with the tighter bound winning.
pub fn markup_tier_shift(score: f64, proposed_markup: f64, hash: u32) -> f64 {
    let wobble = (hash % 5) as f64;

    if proposed_markup > 35.0 {
        score - (15.0 + wobble)
    } else if proposed_markup > 25.0 {
        score - (5.0 + wobble)
    } else if proposed_markup < 10.0 {
        score + (10.0 + wobble)
    } else if proposed_markup < 15.0 {
        score + (5.0 + wobble)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::offer::{CustomerNr, HistoricalOffer, ProductId};

    use super::{
        average_quantity, char_sum, consistency_score, markup_tier_shift, recency_score,
        success_rate, valid_markups, weighted_markup,
    };

    fn offer(markup: Option<f64>, accepted: bool, age_days: Option<i64>) -> HistoricalOffer {
        HistoricalOffer {
            offer_id: "off-1".to_string(),
            customer_nr: CustomerNr("10042".to_string()),
            product_id: Some(ProductId("4711".to_string())),
            accepted,
            box_price: 120.0,
            gross_purchase_price: 100.0,
            exchange_rate: 1.0,
            quantity: 10.0,
            markup,
            encoded_at: age_days.map(|days| Utc::now() - Duration::days(days)),
        }
    }

    #[test]
    fn weighted_markup_single_record_adds_bias() {
        // median = mean = 30, +2 bias
        assert_eq!(weighted_markup(&[30.0]), Some(32.0));
    }

    #[test]
    fn weighted_markup_takes_lower_middle_for_even_counts() {
        // sorted [10, 20, 30, 40]: median 20, mean 25 -> max 25 + 2
        let result = weighted_markup(&[40.0, 10.0, 30.0, 20.0]).expect("markup");
        assert!((result - 27.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_markup_prefers_median_when_it_exceeds_mean() {
        // sorted [5, 30, 31]: median 30, mean 22 -> 30 + 2
        let result = weighted_markup(&[31.0, 5.0, 30.0]).expect("markup");
        assert!((result - 32.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_markup_of_empty_set_is_none() {
        assert_eq!(weighted_markup(&[]), None);
    }

    #[test]
    fn valid_markups_drop_missing_and_non_finite() {
        let offers = vec![
            offer(Some(30.0), true, None),
            offer(None, true, None),
            offer(Some(f64::NAN), true, None),
        ];

        assert_eq!(valid_markups(&offers), vec![30.0]);
    }

    #[test]
    fn success_rate_counts_accepted_share() {
        let offers = vec![
            offer(Some(20.0), true, None),
            offer(Some(20.0), true, None),
            offer(Some(20.0), false, None),
            offer(Some(20.0), true, None),
        ];

        assert_eq!(success_rate(&offers), Some(0.75));
        assert_eq!(success_rate(&[]), None);
    }

    #[test]
    fn average_quantity_is_mean_over_history() {
        let mut offers = vec![offer(None, true, None), offer(None, true, None)];
        offers[0].quantity = 4.0;
        offers[1].quantity = 8.0;

        assert_eq!(average_quantity(&offers), Some(6.0));
        assert_eq!(average_quantity(&[]), None);
    }

    #[test]
    fn recency_of_year_old_history_floors_at_zero() {
        let offers = vec![offer(Some(20.0), true, Some(365)), offer(Some(20.0), true, Some(365))];
        assert_eq!(recency_score(&offers, Utc::now()), 0.0);
    }

    #[test]
    fn recency_ignores_undated_offers() {
        // One fresh dated offer among undated ones: only the dated one counts.
        let offers = vec![offer(Some(20.0), true, Some(0)), offer(Some(20.0), true, None)];
        let score = recency_score(&offers, Utc::now());
        assert!((score - 100.0).abs() < 1.0, "score = {score}");
    }

    #[test]
    fn recency_without_any_dates_is_zero() {
        let offers = vec![offer(Some(20.0), true, None)];
        assert_eq!(recency_score(&offers, Utc::now()), 0.0);
    }

    #[test]
    fn identical_markups_are_fully_consistent() {
        let offers = vec![
            offer(Some(10.0), true, None),
            offer(Some(10.0), false, None),
            offer(Some(10.0), true, None),
        ];

        assert_eq!(consistency_score(&offers), 100.0);
    }

    #[test]
    fn consistency_needs_two_valid_markups() {
        let offers = vec![offer(Some(10.0), true, None), offer(None, true, None)];
        assert_eq!(consistency_score(&offers), 0.0);
    }

    #[test]
    fn widely_spread_markups_floor_at_zero() {
        let offers = vec![offer(Some(1.0), true, None), offer(Some(200.0), true, None)];
        assert_eq!(consistency_score(&offers), 0.0);
    }

    #[test]
    fn char_sum_uses_base36_character_values() {
        assert_eq!(char_sum("00"), 0);
        assert_eq!(char_sum("19"), 10);
        assert_eq!(char_sum("ab"), 21); // 10 + 11
        assert_eq!(char_sum("AB"), 21); // case-insensitive
        assert_eq!(char_sum("-_."), 0);
    }

    #[test]
    fn tier_shift_is_exclusive_and_bounded() {
        // hash 7 -> wobble 2
        assert_eq!(markup_tier_shift(50.0, 40.0, 7), 33.0); // -(15 + 2)
        assert_eq!(markup_tier_shift(50.0, 30.0, 7), 43.0); // -(5 + 2)
        assert_eq!(markup_tier_shift(50.0, 5.0, 7), 62.0); // +(10 + 2), not cumulative
        assert_eq!(markup_tier_shift(50.0, 12.0, 7), 57.0); // +(5 + 2)
        assert_eq!(markup_tier_shift(50.0, 20.0, 7), 50.0);
    }
}
