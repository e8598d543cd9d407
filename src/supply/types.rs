use serde::{Deserialize, Serialize};

use crate::demand::DEFAULT_CATEGORY;
use crate::error::RecordError;

/// A market listing in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u64,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        rating: f64,
        rating_count: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            category: default_category(),
            rating,
            rating_count,
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::EmptyIdentifier);
        }
        if !self.price.is_finite() {
            return Err(RecordError::NonFinite {
                id: self.id.clone(),
                field: "price",
            });
        }
        if self.price < 0.0 {
            return Err(RecordError::NegativePrice {
                id: self.id.clone(),
                price: self.price,
            });
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(RecordError::RatingOutOfRange {
                id: self.id.clone(),
                rating: self.rating,
            });
        }
        Ok(())
    }
}

/// Rating block as served by the product API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRating {
    pub rate: f64,
    pub count: u64,
}

/// Raw product row from the product API.
///
/// Every field but the id and title may be absent upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiProduct {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<ApiRating>,
}

impl ApiProduct {
    /// Identifier as text; the API serves numbers, local files may use strings
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert to a catalog product, applying the currency multiplier.
    ///
    /// A missing price rejects the row. A missing rating block makes the
    /// product unrated (rating 0, no reviews), so it earns no popularity.
    pub fn into_product(self, price_multiplier: f64) -> Result<Product, RecordError> {
        let id = self.id_string();
        let price = self.price.ok_or_else(|| RecordError::MissingPrice { id: id.clone() })?;
        let (rating, rating_count) = match self.rating {
            Some(r) => (r.rate, r.count),
            None => (0.0, 0),
        };
        Ok(Product {
            id,
            title: self.title,
            price: round_to(price * price_multiplier, 2),
            category: self.category.unwrap_or_else(default_category),
            rating,
            rating_count,
        })
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_row(json: &str) -> ApiProduct {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_api_row_converts_with_multiplier() {
        let row = api_row(
            r#"{"id": 9, "title": "WD 2TB Drive", "price": 64.0, "category": "electronics",
                "rating": {"rate": 3.3, "count": 203}}"#,
        );
        let product = row.into_product(83.0).unwrap();
        assert_eq!(product.id, "9");
        assert_eq!(product.price, 5312.0);
        assert_eq!(product.rating, 3.3);
        assert_eq!(product.rating_count, 203);
    }

    #[test]
    fn test_api_row_without_rating_is_unrated() {
        let row = api_row(r#"{"id": "x1", "title": "Cable", "price": 2.5}"#);
        let product = row.into_product(1.0).unwrap();
        assert_eq!(product.id, "x1");
        assert_eq!(product.rating, 0.0);
        assert_eq!(product.rating_count, 0);
        assert_eq!(product.category, "electronics");
    }

    #[test]
    fn test_api_row_without_price_is_rejected() {
        let row = api_row(r#"{"id": 3, "title": "Mystery"}"#);
        let err = row.into_product(83.0).unwrap_err();
        assert_eq!(err, RecordError::MissingPrice { id: "3".to_string() });
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let p = Product::new("p1", "Bad", -5.0, 4.0, 10);
        assert!(matches!(p.validate(), Err(RecordError::NegativePrice { .. })));
    }

    #[test]
    fn test_validate_rejects_rating_above_five() {
        let p = Product::new("p1", "Too good", 5.0, 5.5, 10);
        assert!(matches!(p.validate(), Err(RecordError::RatingOutOfRange { .. })));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.005 * 1000.0, 2), 1005.0);
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(4.26, 1), 4.3);
    }
}
