use serde::Serialize;
use tracing::debug;

use super::config::{EngineConfig, PRECISION_DEPTH};
use super::recommender::{Recommendation, Recommender};
use crate::demand::{Customer, DEFAULT_CATEGORY};
use crate::supply::Product;

/// How well the ranking serves a cohort. Every rate is a percentage in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    pub category_coverage: f64,
    pub price_accuracy: f64,
    pub precision_at_1_keyword: f64,
    pub precision_at_3_keyword: f64,
    pub precision_at_1_price: f64,
    pub precision_at_3_price: f64,

    /// Size of the whole cohort
    pub customers_total: usize,
    /// Customers with at least one product inside their stated budget
    pub customers_price_matched: usize,
    /// Customers from the sample that contributed to the precision metrics
    pub customers_sampled: usize,
    /// Customers from the sample dropped because they got no recommendations
    pub customers_skipped: usize,
}

/// One customer's share of each precision metric, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub keyword_at_1: f64,
    pub keyword_at_3: f64,
    pub price_at_1: f64,
    pub price_at_3: f64,
}

impl Contribution {
    /// None when there is nothing to judge
    pub fn from_recommendation(customer: &Customer, rec: &Recommendation<'_>) -> Option<Self> {
        let top = rec.top()?;
        let judged = &rec.candidates[..rec.len().min(PRECISION_DEPTH)];
        let denominator = judged.len() as f64;

        let keyword_hits = judged
            .iter()
            .filter(|c| customer.keyword_matches(&c.product.title))
            .count();
        let price_hits = judged
            .iter()
            .filter(|c| customer.in_budget(c.product.price))
            .count();

        Some(Self {
            keyword_at_1: indicator(customer.keyword_matches(&top.product.title)),
            keyword_at_3: keyword_hits as f64 / denominator,
            price_at_1: indicator(customer.in_budget(top.product.price)),
            price_at_3: price_hits as f64 / denominator,
        })
    }
}

fn indicator(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Percentage of `part` in `whole`; 0 for an empty whole
fn percent(part: f64, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part / whole as f64 * 100.0
    }
}

/// Sorted catalog prices for "is anything priced in [low, high]" lookups
struct PriceIndex {
    prices: Vec<f64>,
}

impl PriceIndex {
    fn new(catalog: &[Product]) -> Self {
        let mut prices: Vec<f64> = catalog.iter().map(|p| p.price).collect();
        prices.sort_by(f64::total_cmp);
        Self { prices }
    }

    fn any_between(&self, low: f64, high: f64) -> bool {
        let first_not_below = self.prices.partition_point(|&p| p < low);
        self.prices
            .get(first_not_below)
            .is_some_and(|&p| p <= high)
    }
}

/// Runs the recommender over a cohort and aggregates accuracy metrics.
///
/// Precision metrics use a fixed prefix of the cohort (the first
/// `sample_size` customers), so results are reproducible for the same input.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    pub recommender: Recommender,
    pub category: String,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            recommender: Recommender::default(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl Evaluator {
    pub fn new(recommender: Recommender, category: impl Into<String>) -> Self {
        Self {
            recommender,
            category: category.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Recommender::from_config(config), config.category())
    }

    /// Whether a customer's declared category is the one the catalog serves
    pub fn category_supported(&self, customer: &Customer) -> bool {
        customer.category.trim().eq_ignore_ascii_case(&self.category)
    }

    pub fn evaluate(&self, customers: &[Customer], catalog: &[Product], sample_size: usize) -> MetricsReport {
        let customers_total = customers.len();

        let covered = customers
            .iter()
            .filter(|c| self.category_supported(c))
            .count();

        let index = PriceIndex::new(catalog);
        let customers_price_matched = customers
            .iter()
            .filter(|c| index.any_between(c.budget_low, c.budget_high))
            .count();

        let mut sums = [0.0f64; 4];
        let mut customers_sampled = 0;
        let mut customers_skipped = 0;

        for customer in customers.iter().take(sample_size) {
            let rec = self
                .recommender
                .recommend(customer, catalog, PRECISION_DEPTH);
            match Contribution::from_recommendation(customer, &rec) {
                Some(c) => {
                    sums[0] += c.keyword_at_1;
                    sums[1] += c.keyword_at_3;
                    sums[2] += c.price_at_1;
                    sums[3] += c.price_at_3;
                    customers_sampled += 1;
                }
                None => customers_skipped += 1,
            }
        }

        debug!(
            customers_total,
            customers_sampled, customers_skipped, "evaluation complete"
        );

        MetricsReport {
            category_coverage: percent(covered as f64, customers_total),
            price_accuracy: percent(customers_price_matched as f64, customers_total),
            precision_at_1_keyword: percent(sums[0], customers_sampled),
            precision_at_3_keyword: percent(sums[1], customers_sampled),
            precision_at_1_price: percent(sums[2], customers_sampled),
            precision_at_3_price: percent(sums[3], customers_sampled),
            customers_total,
            customers_price_matched,
            customers_sampled,
            customers_skipped,
        }
    }
}

/// Evaluate with the default engine settings
pub fn evaluate(customers: &[Customer], catalog: &[Product], sample_size: usize) -> MetricsReport {
    Evaluator::default().evaluate(customers, catalog, sample_size)
}
