pub mod config;
pub mod evaluator;
pub mod recommender;
pub mod scorer;
pub mod validation;

pub use config::*;
pub use evaluator::{evaluate, Contribution, Evaluator, MetricsReport};
pub use recommender::{recommend, Recommendation, Recommender, ScoredCandidate};
pub use scorer::{score, ScoreBreakdown, ScoreResult, Scorer};
pub use validation::validate_engine;
