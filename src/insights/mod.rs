//! Demand-versus-supply analytics over the loaded cohort and catalog.
//!
//! None of this feeds the engine. These are the numbers behind the overview
//! and business pages of the dashboard.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::demand::Customer;
use crate::supply::Product;

/// Budget above which a customer counts as premium
pub const DEFAULT_PREMIUM_THRESHOLD: f64 = 20000.0;
/// Demand above this share of supply raises a stock alert
pub const STOCK_ALERT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketOverview {
    pub customers: usize,
    pub products: usize,
    pub avg_budget_high: f64,
    pub avg_market_price: f64,
    pub unique_cities: usize,
    pub unique_keywords: usize,
    pub age_range: Option<(u32, u32)>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

pub fn overview(customers: &[Customer], catalog: &[Product]) -> MarketOverview {
    let cities: BTreeSet<&str> = customers.iter().filter_map(|c| c.city.as_deref()).collect();
    let keywords: BTreeSet<String> = customers.iter().map(|c| c.keyword.to_lowercase()).collect();
    let ages = customers.iter().filter_map(|c| c.age);
    let age_range = ages.fold(None, |range: Option<(u32, u32)>, age| match range {
        Some((lo, hi)) => Some((lo.min(age), hi.max(age))),
        None => Some((age, age)),
    });

    MarketOverview {
        customers: customers.len(),
        products: catalog.len(),
        avg_budget_high: mean(customers.iter().map(|c| c.budget_high)),
        avg_market_price: mean(catalog.iter().map(|p| p.price)),
        unique_cities: cities.len(),
        unique_keywords: keywords.len(),
        age_range,
    }
}

/// Sort counts descending, ties alphabetical, and keep the first `n`
fn ranked(counts: HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Most requested keywords (lowercased)
pub fn top_keywords(customers: &[Customer], n: usize) -> Vec<(String, usize)> {
    let mut counts = HashMap::new();
    for c in customers {
        *counts.entry(c.keyword.to_lowercase()).or_insert(0) += 1;
    }
    ranked(counts, n)
}

/// Cities with the most customers
pub fn top_cities(customers: &[Customer], n: usize) -> Vec<(String, usize)> {
    let mut counts = HashMap::new();
    for city in customers.iter().filter_map(|c| c.city.as_ref()) {
        *counts.entry(city.clone()).or_insert(0) += 1;
    }
    ranked(counts, n)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

/// Equal-width histogram over [min, max]. The maximum lands in the last bin.
pub fn price_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            low: min + width * i as f64,
            high: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &v in values {
        let slot = if width > 0.0 {
            (((v - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        histogram[slot].count += 1;
    }
    histogram
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    let text = text.to_lowercase();
    terms.iter().any(|t| text.contains(&t.to_lowercase()))
}

/// Customers whose keyword mentions any of `terms`
pub fn interest_count(customers: &[Customer], terms: &[&str]) -> usize {
    customers
        .iter()
        .filter(|c| contains_any(&c.keyword, terms))
        .count()
}

/// Products whose title mentions any of `terms`
pub fn supply_count(catalog: &[Product], terms: &[&str]) -> usize {
    catalog.iter().filter(|p| contains_any(&p.title, terms)).count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BudgetGap {
    pub avg_expected: f64,
    pub avg_market: f64,
    pub gap: f64,
}

/// Interested customers' average budget floor against the average price of
/// matching products
pub fn budget_gap(customers: &[Customer], catalog: &[Product], terms: &[&str]) -> BudgetGap {
    let avg_expected = mean(
        customers
            .iter()
            .filter(|c| contains_any(&c.keyword, terms))
            .map(|c| c.budget_low),
    );
    let avg_market = mean(
        catalog
            .iter()
            .filter(|p| contains_any(&p.title, terms))
            .map(|p| p.price),
    );
    BudgetGap {
        avg_expected,
        avg_market,
        gap: (avg_market - avg_expected).abs(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StockAlert {
    pub demand: usize,
    pub supply: usize,
    pub ratio: f64,
    pub high_demand: bool,
}

pub fn stock_alert(
    customers: &[Customer],
    catalog: &[Product],
    demand_terms: &[&str],
    supply_terms: &[&str],
) -> StockAlert {
    let demand = interest_count(customers, demand_terms);
    let supply = supply_count(catalog, supply_terms);
    StockAlert {
        demand,
        supply,
        ratio: demand as f64 / supply.max(1) as f64,
        high_demand: demand as f64 > supply as f64 * STOCK_ALERT_RATIO,
    }
}

/// Customers whose upper budget exceeds `threshold`
pub fn premium_segment(customers: &[Customer], threshold: f64) -> usize {
    customers.iter().filter(|c| c.budget_high > threshold).count()
}

/// The dashboard's business use cases, computed for one cohort and catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessReport {
    pub overview: MarketOverview,
    /// Customers likely to want a mouse + mousepad bundle
    pub combo_candidates: usize,
    /// Earbuds and headphones budget versus market
    pub audio_gap: BudgetGap,
    /// Customers interested in gaming or laptops (cooling pad cross-sell)
    pub cross_sell_candidates: usize,
    /// Smartphone demand against smartphone listings
    pub smartphone_stock: StockAlert,
    pub premium_customers: usize,
    pub premium_threshold: f64,
    pub trending: Vec<(String, usize)>,
}

pub fn business_report(customers: &[Customer], catalog: &[Product]) -> BusinessReport {
    BusinessReport {
        overview: overview(customers, catalog),
        combo_candidates: interest_count(customers, &["mouse"]),
        audio_gap: budget_gap(customers, catalog, &["earbuds", "headphones"]),
        cross_sell_candidates: interest_count(customers, &["gaming", "laptop"]),
        smartphone_stock: stock_alert(
            customers,
            catalog,
            &["phone", "smartphone", "mobile"],
            &["phone", "smartphone"],
        ),
        premium_customers: premium_segment(customers, DEFAULT_PREMIUM_THRESHOLD),
        premium_threshold: DEFAULT_PREMIUM_THRESHOLD,
        trending: top_keywords(customers, 5),
    }
}
