//! Synthetic data for demos and for filling out a thin catalog.
//!
//! Everything here is randomized and therefore kept away from the engine. All
//! entry points take the RNG as a parameter so callers choose between a fixed
//! seed (reproducible runs, tests) and entropy.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::demand::{Customer, DEFAULT_CATEGORY};
use crate::supply::types::round_to;
use crate::supply::Product;

pub const DEFAULT_SURVEY_SIZE: usize = 200;

const CITIES: &[&str] = &[
    "Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Kolkata", "Pune", "Ahmedabad",
    "Jaipur", "Surat",
];

const KEYWORDS: &[&str] = &[
    "phone", "smartphone", "charger", "earbuds", "headphones", "laptop", "tablet", "smartwatch",
    "speaker", "powerbank",
];

const NAMES: &[&str] = &[
    "Rajesh Kumar", "Priya Sharma", "Amit Patel", "Sneha Gupta", "Vikram Singh", "Anita Reddy",
    "Rahul Mehta", "Deepa Iyer",
];

const BUDGET_FLOORS: &[f64] = &[1000.0, 2000.0, 5000.0, 10000.0, 15000.0];

/// RNG from a seed, or from entropy when no seed is configured
pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate a synthetic survey cohort with ids USER_0001, USER_0002, ...
pub fn generate_survey<R: Rng>(rng: &mut R, count: usize) -> Vec<Customer> {
    (0..count)
        .map(|i| {
            let budget_low = *BUDGET_FLOORS.choose(rng).unwrap_or(&BUDGET_FLOORS[0]);
            let spread = rng.gen_range(2000..=10000) as f64;
            Customer {
                id: format!("USER_{:04}", i + 1),
                name: NAMES.choose(rng).map(|s| s.to_string()),
                age: Some(rng.gen_range(18..=65)),
                city: CITIES.choose(rng).map(|s| s.to_string()),
                category: DEFAULT_CATEGORY.to_string(),
                budget_low,
                budget_high: budget_low + spread,
                keyword: KEYWORDS.choose(rng).unwrap_or(&KEYWORDS[0]).to_string(),
            }
        })
        .collect()
}

/// Expand each base product into itself followed by `variants` priced and
/// rated variations.
///
/// Variant prices scatter between 70% and 150% of the base price. Variants of
/// a rated product get a fresh rating in 3.5-5.0 and 50-1000 reviews; variants
/// of an unrated product stay unrated.
pub fn expand_variants<R: Rng>(rng: &mut R, base: &[Product], variants: u32) -> Vec<Product> {
    let mut expanded = Vec::with_capacity(base.len() * (variants as usize + 1));
    for product in base {
        expanded.push(product.clone());
        let rated = product.rating > 0.0 || product.rating_count > 0;
        for i in 1..=variants {
            let mut variant = product.clone();
            variant.id = format!("{}_V{}", product.id, i);
            variant.title = format!("{} - Variant {}", product.title, i);
            variant.price = round_to(product.price * rng.gen_range(0.7..1.5), 2);
            if rated {
                variant.rating = round_to(rng.gen_range(3.5..=5.0), 1);
                variant.rating_count = rng.gen_range(50..=1000);
            }
            expanded.push(variant);
        }
    }
    expanded
}
