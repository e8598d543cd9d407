use tracing::debug;

use super::config::{EngineConfig, DEFAULT_PRICE_BUFFER};
use super::scorer::{ScoreResult, Scorer};
use crate::demand::Customer;
use crate::supply::Product;

/// A catalog product with its score for one customer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub product: &'a Product,
    pub position: usize, // index in the catalog it was drawn from
    pub result: ScoreResult,
}

impl ScoredCandidate<'_> {
    pub fn score(&self) -> f64 {
        self.result.score
    }
}

/// Ranked candidates for one customer, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommendation<'a> {
    pub candidates: Vec<ScoredCandidate<'a>>,
    /// True when nothing fell inside the buffered window and the whole
    /// catalog was ranked instead
    pub fallback: bool,
}

impl<'a> Recommendation<'a> {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn top(&self) -> Option<&ScoredCandidate<'a>> {
        self.candidates.first()
    }
}

/// Picks and ranks candidates for a single customer.
///
/// Candidates are the products priced inside the customer's budget widened by
/// `price_buffer` on both ends. When that window holds nothing, the whole
/// catalog becomes the pool so a customer is never left without suggestions.
/// Scoring always uses the customer's stated, unwidened budget.
///
/// Ties keep catalog order: the sort is stable and has no secondary key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommender {
    pub scorer: Scorer,
    pub price_buffer: f64,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            scorer: Scorer::default(),
            price_buffer: DEFAULT_PRICE_BUFFER,
        }
    }
}

impl Recommender {
    pub fn new(scorer: Scorer, price_buffer: f64) -> Self {
        Self {
            scorer,
            price_buffer,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Scorer::new(config.penalty_weight()), config.price_buffer())
    }

    /// Buffered price window used for candidate selection (inclusive)
    pub fn price_window(&self, customer: &Customer) -> (f64, f64) {
        (
            customer.budget_low * (1.0 - self.price_buffer),
            customer.budget_high * (1.0 + self.price_buffer),
        )
    }

    /// Catalog positions making up the pool, and whether the fallback fired
    pub fn candidate_pool(&self, customer: &Customer, catalog: &[Product]) -> (Vec<usize>, bool) {
        let (low, high) = self.price_window(customer);
        let pool: Vec<usize> = catalog
            .iter()
            .enumerate()
            .filter(|(_, p)| p.price >= low && p.price <= high)
            .map(|(i, _)| i)
            .collect();

        if pool.is_empty() && !catalog.is_empty() {
            debug!(
                customer = %customer.id,
                window_low = low,
                window_high = high,
                "no product inside buffered budget window, ranking whole catalog"
            );
            ((0..catalog.len()).collect(), true)
        } else {
            (pool, false)
        }
    }

    /// Top `top_n` products for `customer`, best first.
    ///
    /// Returns fewer when the pool is smaller, and nothing for an empty
    /// catalog or `top_n == 0`.
    pub fn recommend<'a>(
        &self,
        customer: &Customer,
        catalog: &'a [Product],
        top_n: usize,
    ) -> Recommendation<'a> {
        if top_n == 0 || catalog.is_empty() {
            return Recommendation::default();
        }

        let (pool, fallback) = self.candidate_pool(customer, catalog);

        let mut candidates: Vec<ScoredCandidate<'a>> = pool
            .into_iter()
            .map(|position| {
                let product = &catalog[position];
                ScoredCandidate {
                    product,
                    position,
                    result: self.scorer.breakdown(
                        product.price,
                        product.rating,
                        product.rating_count,
                        customer.budget_low,
                        customer.budget_high,
                    ),
                }
            })
            .collect();

        // Stable: equal scores stay in catalog order
        candidates.sort_by(|a, b| b.result.score.total_cmp(&a.result.score));
        candidates.truncate(top_n);

        Recommendation {
            candidates,
            fallback,
        }
    }
}

/// Recommend with the default weight and buffer
pub fn recommend<'a>(customer: &Customer, catalog: &'a [Product], top_n: usize) -> Vec<ScoredCandidate<'a>> {
    Recommender::default()
        .recommend(customer, catalog, top_n)
        .candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn phone_and_laptop() -> Vec<Product> {
        vec![
            Product::new("1", "Phone X", 1000.0, 4.5, 100),
            Product::new("2", "Laptop Y", 50000.0, 4.7, 200),
        ]
    }

    #[test]
    fn test_phone_ranks_first_for_phone_budget() {
        let catalog = phone_and_laptop();
        let customer = Customer::new("U1", 900.0, 1100.0, "phone");

        let rec = recommend(&customer, &catalog, 2);
        assert_eq!(rec[0].product.title, "Phone X");

        // With a window wide enough to hold both, the price penalty still
        // puts the laptop last despite its better rating
        let all = Recommender::new(Scorer::default(), 100.0).recommend(&customer, &catalog, 2);
        assert_eq!(all.len(), 2);
        assert_eq!(all.candidates[0].product.title, "Phone X");
        assert_eq!(all.candidates[1].product.title, "Laptop Y");
        assert!(all.candidates[0].score() > all.candidates[1].score());
    }

    #[test]
    fn test_window_excludes_far_products() {
        let catalog = phone_and_laptop();
        let customer = Customer::new("U1", 900.0, 1100.0, "phone");
        let rec = Recommender::default().recommend(&customer, &catalog, 2);
        assert!(!rec.fallback);
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.candidates[0].product.id, "1");
    }

    #[test]
    fn test_buffer_widens_window_both_ways() {
        let customer = Customer::new("U1", 1000.0, 2000.0, "x");
        let (low, high) = Recommender::default().price_window(&customer);
        assert!((low - 800.0).abs() < 1e-9);
        assert!((high - 2400.0).abs() < 1e-9);

        let catalog = vec![
            Product::new("a", "edge low", 800.0, 4.0, 10),
            Product::new("b", "edge high", 2400.0, 4.0, 10),
            Product::new("c", "too cheap", 799.0, 4.0, 10),
            Product::new("d", "too dear", 2401.0, 4.0, 10),
        ];
        let (pool, fallback) = Recommender::default().candidate_pool(&customer, &catalog);
        assert_eq!(pool, vec![0, 1]);
        assert!(!fallback);
    }

    #[test]
    fn test_fallback_ranks_whole_catalog() {
        let catalog = phone_and_laptop();
        // Nothing between 80 and 240
        let customer = Customer::new("U1", 100.0, 200.0, "phone");
        let rec = Recommender::default().recommend(&customer, &catalog, 5);
        assert!(rec.fallback);
        assert_eq!(rec.len(), 2);
        let mut ids: Vec<&str> = rec.candidates.iter().map(|c| c.product.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_catalog_returns_nothing() {
        let customer = Customer::new("U1", 100.0, 200.0, "phone");
        let rec = Recommender::default().recommend(&customer, &[], 3);
        assert!(rec.is_empty());
        assert!(!rec.fallback);
    }

    #[test]
    fn test_zero_top_n_returns_nothing() {
        let catalog = phone_and_laptop();
        let customer = Customer::new("U1", 900.0, 1100.0, "phone");
        assert!(recommend(&customer, &catalog, 0).is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = vec![
            Product::new("first", "A", 1000.0, 4.0, 10),
            Product::new("second", "B", 1000.0, 4.0, 10),
            Product::new("third", "C", 1000.0, 4.0, 10),
        ];
        let customer = Customer::new("U1", 900.0, 1100.0, "x");
        let ids: Vec<&str> = recommend(&customer, &catalog, 3)
            .iter()
            .map(|c| c.product.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_scores_use_unbuffered_budget() {
        let catalog = vec![Product::new("a", "A", 1000.0, 4.0, 10)];
        let customer = Customer::new("U1", 1000.0, 3000.0, "x");
        let rec = Recommender::default().recommend(&customer, &catalog, 1);
        assert_eq!(rec.candidates[0].result.breakdown.mid_price, 2000.0);
    }

    #[test]
    fn test_position_points_back_into_catalog() {
        let catalog = vec![
            Product::new("cheap", "A", 10.0, 4.0, 10),
            Product::new("fit", "B", 1000.0, 4.0, 10),
        ];
        let customer = Customer::new("U1", 900.0, 1100.0, "x");
        let rec = Recommender::default().recommend(&customer, &catalog, 1);
        assert_eq!(rec.candidates[0].position, 1);
    }

    #[test]
    fn test_same_input_same_output() {
        let catalog = phone_and_laptop();
        let customer = Customer::new("U1", 100.0, 60000.0, "phone");
        let a = recommend(&customer, &catalog, 2);
        let b = recommend(&customer, &catalog, 2);
        assert_eq!(a, b);
    }

    fn arb_catalog() -> impl Strategy<Value = Vec<Product>> {
        prop::collection::vec((0.0f64..100_000.0, 0.0f64..=5.0, 0u64..5_000), 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (price, rating, count))| {
                    Product::new(format!("p{}", i), format!("Product {}", i), price, rating, count)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn never_more_than_top_n_and_always_from_catalog(
            catalog in arb_catalog(),
            low in 0.0f64..50_000.0,
            width in 0.0f64..20_000.0,
            top_n in 0usize..10,
        ) {
            let customer = Customer::new("U", low, low + width, "product");
            let rec = Recommender::default().recommend(&customer, &catalog, top_n);
            prop_assert!(rec.len() <= top_n);
            for c in &rec.candidates {
                prop_assert!(std::ptr::eq(c.product, &catalog[c.position]));
            }
            // Never empty unless the catalog is or nothing was asked for
            if !catalog.is_empty() && top_n > 0 {
                prop_assert!(!rec.is_empty());
            }
        }

        #[test]
        fn ranking_is_descending(
            catalog in arb_catalog(),
            low in 0.0f64..50_000.0,
            width in 0.0f64..20_000.0,
        ) {
            let customer = Customer::new("U", low, low + width, "product");
            let rec = Recommender::default().recommend(&customer, &catalog, catalog.len());
            for pair in rec.candidates.windows(2) {
                prop_assert!(pair[0].score() >= pair[1].score());
            }
        }
    }
}
