use super::config::DEFAULT_PENALTY_WEIGHT;

/// Intermediate terms of one score, kept for the dashboard's breakdown view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub mid_price: f64,
    pub price_distance: f64, // |price - mid| / mid, 0 when mid <= 0
    pub price_penalty: f64,
    pub popularity: f64, // rating * ln(1 + rating_count)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Desirability of a product for a budget window.
///
/// `score = rating * ln(1 + rating_count) - penalty_weight * |price - mid| / mid`
///
/// Scores are relative: only compare them within one candidate pool. There is
/// no floor or normalization, so a far off-budget product scores negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    pub penalty_weight: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
        }
    }
}

impl Scorer {
    pub fn new(penalty_weight: f64) -> Self {
        Self { penalty_weight }
    }

    pub fn score(
        &self,
        price: f64,
        rating: f64,
        rating_count: u64,
        budget_low: f64,
        budget_high: f64,
    ) -> f64 {
        self.breakdown(price, rating, rating_count, budget_low, budget_high)
            .score
    }

    pub fn breakdown(
        &self,
        price: f64,
        rating: f64,
        rating_count: u64,
        budget_low: f64,
        budget_high: f64,
    ) -> ScoreResult {
        let mid_price = (budget_low + budget_high) / 2.0;

        // Zero budget: nothing to be far from
        let price_distance = if mid_price > 0.0 {
            (price - mid_price).abs() / mid_price
        } else {
            0.0
        };

        let price_penalty = price_distance * self.penalty_weight;
        let popularity = rating * (rating_count as f64).ln_1p();

        ScoreResult {
            score: popularity - price_penalty,
            breakdown: ScoreBreakdown {
                mid_price,
                price_distance,
                price_penalty,
                popularity,
            },
        }
    }
}

/// Score with the default penalty weight
pub fn score(price: f64, rating: f64, rating_count: u64, budget_low: f64, budget_high: f64) -> f64 {
    Scorer::default().score(price, rating, rating_count, budget_low, budget_high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_on_mid_price_has_no_penalty() {
        let result = Scorer::default().breakdown(1000.0, 4.0, 0, 900.0, 1100.0);
        assert_eq!(result.breakdown.mid_price, 1000.0);
        assert_eq!(result.breakdown.price_penalty, 0.0);
        // No reviews: ln(1) = 0
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_known_value() {
        // popularity = 4.5 * ln(101), penalty = 2 * 100/1000
        let s = score(1100.0, 4.5, 100, 900.0, 1100.0);
        let expected = 4.5 * 101f64.ln() - 0.2;
        assert!((s - expected).abs() < EPS);
    }

    #[test]
    fn test_zero_budget_is_guarded() {
        let result = Scorer::default().breakdown(5000.0, 4.0, 10, 0.0, 0.0);
        assert_eq!(result.breakdown.price_distance, 0.0);
        assert!(result.score.is_finite());
        assert!((result.score - 4.0 * 11f64.ln()).abs() < EPS);
    }

    #[test]
    fn test_score_can_go_negative() {
        let s = score(50000.0, 1.0, 1, 900.0, 1100.0);
        assert!(s < 0.0);
    }

    #[test]
    fn test_penalty_weight_is_tunable() {
        let gentle = Scorer::new(1.0).score(1500.0, 4.0, 10, 900.0, 1100.0);
        let harsh = Scorer::new(5.0).score(1500.0, 4.0, 10, 900.0, 1100.0);
        assert!(harsh < gentle);
        assert!((gentle - harsh - 4.0 * 0.5).abs() < EPS);
    }

    proptest! {
        #[test]
        fn closer_price_never_scores_lower(
            low in 0.0f64..50_000.0,
            width in 0.0f64..20_000.0,
            p1 in 0.0f64..100_000.0,
            p2 in 0.0f64..100_000.0,
            rating in 0.0f64..=5.0,
            count in 0u64..10_000,
        ) {
            let high = low + width;
            let mid = (low + high) / 2.0;
            let s1 = score(p1, rating, count, low, high);
            let s2 = score(p2, rating, count, low, high);
            if (p1 - mid).abs() < (p2 - mid).abs() {
                prop_assert!(s1 >= s2);
            }
        }

        #[test]
        fn more_reviews_score_higher(
            low in 100.0f64..50_000.0,
            width in 0.0f64..20_000.0,
            price in 0.0f64..100_000.0,
            rating in 0.1f64..=5.0,
            c1 in 0u64..100_000,
            extra in 1u64..100_000,
        ) {
            let high = low + width;
            let c2 = c1 + extra;
            prop_assert!(score(price, rating, c1, low, high) < score(price, rating, c2, low, high));
        }

        #[test]
        fn scoring_is_deterministic(
            price in 0.0f64..100_000.0,
            rating in 0.0f64..=5.0,
            count in 0u64..10_000,
            low in 0.0f64..50_000.0,
        ) {
            let a = score(price, rating, count, low, low * 2.0);
            let b = score(price, rating, count, low, low * 2.0);
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
