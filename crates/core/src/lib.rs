pub mod config;
pub mod domain;
pub mod estimators;
pub mod history;

pub use domain::estimate::{
    MarkupFactors, MarkupSuggestion, OfferTerms, ReliabilityFactors, ReliabilityReport,
};
pub use domain::offer::{markup_from_prices, CustomerNr, HistoricalOffer, ProductId};
pub use estimators::{MarkupEstimator, ProbabilityEstimator, ReliabilityEstimator};
pub use history::{HistoryError, OfferHistory, OutcomeFilter};
