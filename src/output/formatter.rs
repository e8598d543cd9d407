use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::demand::Customer;
use crate::engine::{MetricsReport, Recommendation, ScoredCandidate};
use crate::insights::BusinessReport;
use crate::supply::Product;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Score with three decimals, enough to separate near ties
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// Price with two decimals and comma-grouped thousands ("12,345.60")
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate title to fit available width, accounting for Unicode
pub fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn flag(hit: bool) -> &'static str {
    if hit {
        "yes"
    } else {
        "no"
    }
}

/// One ranked product as it appears in TSV and JSON output
#[derive(Debug, Serialize)]
pub struct RecommendationRow<'a> {
    pub rank: usize,
    pub score: f64,
    pub id: &'a str,
    pub title: &'a str,
    pub price: f64,
    pub rating: f64,
    pub rating_count: u64,
    pub in_budget: bool,
    pub keyword_match: bool,
}

impl<'a> RecommendationRow<'a> {
    pub fn new(rank: usize, customer: &Customer, candidate: &ScoredCandidate<'a>) -> Self {
        let p = candidate.product;
        Self {
            rank,
            score: candidate.score(),
            id: &p.id,
            title: &p.title,
            price: p.price,
            rating: p.rating,
            rating_count: p.rating_count,
            in_budget: customer.in_budget(p.price),
            keyword_match: customer.keyword_matches(&p.title),
        }
    }
}

fn rows<'a>(customer: &Customer, rec: &Recommendation<'a>) -> Vec<RecommendationRow<'a>> {
    rec.candidates
        .iter()
        .enumerate()
        .map(|(i, c)| RecommendationRow::new(i + 1, customer, c))
        .collect()
}

/// Recommendations under a short customer header.
/// Columns: Index, Score, Price, Rating (reviews), flags, Title
pub fn format_recommendation_table(customer: &Customer, rec: &Recommendation<'_>, use_colors: bool) -> String {
    let header = format!(
        "{}  budget {} - {}  keyword \"{}\"",
        customer.label(),
        format_price(customer.budget_low),
        format_price(customer.budget_high),
        customer.keyword
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    if rec.is_empty() {
        lines.push("No recommendations.".to_string());
        return lines.join("\n");
    }
    if rec.fallback {
        let note = "Nothing priced near this budget; ranked the whole catalog instead.";
        lines.push(if use_colors {
            note.yellow().to_string()
        } else {
            note.to_string()
        });
    }

    // index 3 + score 8 + price 12 + rating 14 + flags 9, plus separators
    let fixed_width = 3 + 1 + 8 + 2 + 12 + 2 + 14 + 2 + 9 + 2;
    let term_width = get_terminal_width();

    for row in rows(customer, rec) {
        let index_str = format!("{:>2}.", row.rank);
        let score_str = format!("{:>8}", format_score(row.score));
        let price_str = format!("{:>12}", format_price(row.price));
        let rating_str = format!("{:>14}", format!("{:.1} ({})", row.rating, row.rating_count));
        let flags = format!(
            "{}{}",
            if row.in_budget { "$" } else { " " },
            if row.keyword_match { "*" } else { " " }
        );
        let flags = format!("{:<9}", flags);

        let title = match term_width {
            Some(width) if width > fixed_width + 10 => truncate_title(row.title, width - fixed_width),
            Some(_) => truncate_title(row.title, 20),
            None => row.title.to_string(),
        };

        lines.push(if use_colors {
            format!(
                "{} {}  {}  {}  {}  {}",
                index_str.dimmed(),
                score_str.bold(),
                price_str.green(),
                rating_str,
                flags.cyan(),
                title
            )
        } else {
            format!(
                "{} {}  {}  {}  {}  {}",
                index_str, score_str, price_str, rating_str, flags, title
            )
        });
    }
    lines.push(String::new());
    lines.push("$ = inside budget, * = keyword match".to_string());
    lines.join("\n")
}

/// Tab-separated values for scripting (no headers, no colors).
/// Columns: rank, score, id, title, price, rating, reviews, in_budget, keyword_match
pub fn format_recommendation_tsv(customer: &Customer, rec: &Recommendation<'_>) -> String {
    rows(customer, rec)
        .iter()
        .map(|r| {
            format!(
                "{}\t{:.6}\t{}\t{}\t{:.2}\t{:.1}\t{}\t{}\t{}",
                r.rank,
                r.score,
                r.id,
                r.title,
                r.price,
                r.rating,
                r.rating_count,
                flag(r.in_budget),
                flag(r.keyword_match)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct RecommendationDocument<'a> {
    customer_id: &'a str,
    budget_low: f64,
    budget_high: f64,
    keyword: &'a str,
    fallback: bool,
    recommendations: Vec<RecommendationRow<'a>>,
}

pub fn format_recommendation_json(customer: &Customer, rec: &Recommendation<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RecommendationDocument {
        customer_id: &customer.id,
        budget_low: customer.budget_low,
        budget_high: customer.budget_high,
        keyword: &customer.keyword,
        fallback: rec.fallback,
        recommendations: rows(customer, rec),
    })
}

fn metric_line(label: &str, value: f64, use_colors: bool) -> String {
    let value = format!("{:>6.1}%", value);
    if use_colors {
        format!("  {:<28}{}", label, value.bold())
    } else {
        format!("  {:<28}{}", label, value)
    }
}

pub fn format_metrics(report: &MetricsReport, use_colors: bool) -> String {
    let title = if use_colors {
        "Recommendation quality".bold().to_string()
    } else {
        "Recommendation quality".to_string()
    };
    let lines = [
        title,
        metric_line("Category coverage", report.category_coverage, use_colors),
        metric_line("Price accuracy", report.price_accuracy, use_colors),
        metric_line("Precision@1 (keyword)", report.precision_at_1_keyword, use_colors),
        metric_line("Precision@3 (keyword)", report.precision_at_3_keyword, use_colors),
        metric_line("Precision@1 (price)", report.precision_at_1_price, use_colors),
        metric_line("Precision@3 (price)", report.precision_at_3_price, use_colors),
        String::new(),
        format!(
            "  {} customers, {} with a product in budget, {} sampled, {} skipped",
            report.customers_total,
            report.customers_price_matched,
            report.customers_sampled,
            report.customers_skipped
        ),
    ];
    lines.join("\n")
}

pub fn format_insights(report: &BusinessReport, use_colors: bool) -> String {
    let heading = |s: &str| {
        if use_colors {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    };
    let o = &report.overview;
    let mut lines = vec![
        heading("Market overview"),
        format!("  Customers            {}", o.customers),
        format!("  Products             {}", o.products),
        format!("  Avg budget (high)    {}", format_price(o.avg_budget_high)),
        format!("  Avg market price     {}", format_price(o.avg_market_price)),
        format!("  Cities / keywords    {} / {}", o.unique_cities, o.unique_keywords),
    ];
    if let Some((lo, hi)) = o.age_range {
        lines.push(format!("  Age range            {}-{}", lo, hi));
    }

    lines.push(String::new());
    lines.push(heading("Opportunities"));
    lines.push(format!(
        "  Mouse + mousepad combo    {} interested customers",
        report.combo_candidates
    ));
    lines.push(format!(
        "  Audio budget gap          expected {} vs market {} (gap {})",
        format_price(report.audio_gap.avg_expected),
        format_price(report.audio_gap.avg_market),
        format_price(report.audio_gap.gap)
    ));
    lines.push(format!(
        "  Cooling pad cross-sell    {} gaming/laptop customers",
        report.cross_sell_candidates
    ));
    let stock = &report.smartphone_stock;
    let alert = if stock.high_demand {
        if use_colors {
            "HIGH DEMAND".red().bold().to_string()
        } else {
            "HIGH DEMAND".to_string()
        }
    } else {
        "ok".to_string()
    };
    lines.push(format!(
        "  Smartphone stock          demand {} / supply {} ({:.2}) {}",
        stock.demand, stock.supply, stock.ratio, alert
    ));
    lines.push(format!(
        "  Premium segment           {} customers above {}",
        report.premium_customers,
        format_price(report.premium_threshold)
    ));

    lines.push(String::new());
    lines.push(heading("Trending keywords"));
    for (i, (keyword, count)) in report.trending.iter().enumerate() {
        lines.push(format!("  {:>2}. {:<16}{}", i + 1, keyword, count));
    }
    lines.join("\n")
}

pub fn format_customer_list(customers: &[Customer], limit: usize) -> String {
    if customers.is_empty() {
        return "No customers found.".to_string();
    }
    let mut lines = vec![format!(
        "{:<10}  {:<16}  {:<10}  {:>12}  {:>12}  {}",
        "ID", "Name", "City", "Budget low", "Budget high", "Keyword"
    )];
    for c in customers.iter().take(limit) {
        lines.push(format!(
            "{:<10}  {:<16}  {:<10}  {:>12}  {:>12}  {}",
            c.id,
            truncate_title(c.name.as_deref().unwrap_or("-"), 16),
            truncate_title(c.city.as_deref().unwrap_or("-"), 10),
            format_price(c.budget_low),
            format_price(c.budget_high),
            c.keyword
        ));
    }
    if customers.len() > limit {
        lines.push(format!("... and {} more", customers.len() - limit));
    }
    lines.join("\n")
}

pub fn format_product_list(products: &[Product], limit: usize) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }
    let title_width = get_terminal_width()
        .map(|w| w.saturating_sub(10 + 12 + 14 + 6).max(20))
        .unwrap_or(60);
    let mut lines = vec![format!(
        "{:<10}  {:>12}  {:>14}  {}",
        "ID", "Price", "Rating", "Title"
    )];
    for p in products.iter().take(limit) {
        lines.push(format!(
            "{:<10}  {:>12}  {:>14}  {}",
            p.id,
            format_price(p.price),
            format!("{:.1} ({})", p.rating, p.rating_count),
            truncate_title(&p.title, title_width)
        ));
    }
    if products.len() > limit {
        lines.push(format!("... and {} more", products.len() - limit));
    }
    lines.join("\n")
}
