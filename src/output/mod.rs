pub mod formatter;

pub use formatter::{
    format_customer_list, format_insights, format_metrics, format_price, format_product_list,
    format_recommendation_json, format_recommendation_table, format_recommendation_tsv,
    format_score, should_use_colors, truncate_title, RecommendationRow,
};
