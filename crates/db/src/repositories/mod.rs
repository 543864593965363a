pub mod offer_history;

pub use offer_history::SqlOfferHistory;
