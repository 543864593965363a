//! Heuristic estimators for markup acceptance.
//!
//! Three estimators share one historical-data access pattern: bounded,
//! newest-first windows over an [`OfferHistory`](crate::history::OfferHistory)
//! collaborator, filtered for similarity and blended through deterministic
//! fallbacks when direct history is sparse. All outputs are clamped; none of
//! the entry points propagate storage errors.

mod markup;
mod probability;
mod reliability;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use markup::MarkupEstimator;
pub use probability::ProbabilityEstimator;
pub use reliability::ReliabilityEstimator;

/// Window of pair history consulted by probability and reliability.
pub const PAIR_HISTORY_LIMIT: u32 = 20;

/// Window of accepted-only pair history the markup estimator draws on.
pub const ACCEPTED_PAIR_LIMIT: u32 = 10;

/// Window of product-wide fallback history.
pub const PRODUCT_HISTORY_LIMIT: u32 = 30;

/// Window of customer-wide fallback history.
pub const CUSTOMER_HISTORY_LIMIT: u32 = 30;

/// Wider customer window used for the client track-record adjustment.
pub const CLIENT_TRACK_RECORD_LIMIT: u32 = 50;

/// A historical markup within this many points of the proposal counts as similar.
pub const SIMILAR_MARKUP_WINDOW: f64 = 5.0;

/// Fallback histories use double the primary similarity window.
pub const FALLBACK_MARKUP_WINDOW: f64 = 10.0;

/// Bounds for any suggested markup.
pub const MIN_MARKUP: f64 = 1.0;
pub const MAX_MARKUP: f64 = 1000.0;

/// Base markup used when no history source can supply one, and the markup
/// component of every degraded default result.
pub const DEFAULT_MARKUP: f64 = 20.0;

/// Probability reported when the store cannot be read at all.
pub const DEFAULT_PROBABILITY: f64 = 50.0;

/// Assumed average order quantity when no history carries one.
pub const DEFAULT_AVG_QUANTITY: f64 = 10.0;
