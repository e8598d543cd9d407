use thiserror::Error;

/// Why a demand or supply record was refused at the loader boundary.
///
/// The engine never sees these records; loaders drop them, log the reason and
/// keep going with the rest of the batch.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record has an empty identifier")]
    EmptyIdentifier,

    #[error("{id}: price is missing")]
    MissingPrice { id: String },

    #[error("{id}: {field} is not a finite number")]
    NonFinite { id: String, field: &'static str },

    #[error("{id}: price {price} is negative")]
    NegativePrice { id: String, price: f64 },

    #[error("{id}: rating {rating} is outside 0.0-5.0")]
    RatingOutOfRange { id: String, rating: f64 },

    #[error("{id}: budget_low {low} is negative")]
    NegativeBudget { id: String, low: f64 },

    #[error("{id}: budget_high {high} is below budget_low {low}")]
    InvertedBudget { id: String, low: f64, high: f64 },

    #[error("{id}: keyword is empty")]
    EmptyKeyword { id: String },
}

/// The product API could not be reached or answered with an error after all
/// retries. Kept as its own type so the binary can map it to an exit code.
#[derive(Debug, Error)]
#[error("product API at {url} is unavailable: {reason}")]
pub struct SourceUnavailable {
    pub url: String,
    pub reason: String,
}
