use serde::{Deserialize, Serialize};

use crate::error::RecordError;

pub const DEFAULT_CATEGORY: &str = "electronics";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// One survey respondent: a budget window and the keyword they search for.
///
/// Serde names follow the survey CSV header so the struct reads and writes the
/// file directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "user_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub age: Option<u32>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(rename = "preferred_category", default = "default_category")]
    pub category: String,

    #[serde(rename = "expected_price_low")]
    pub budget_low: f64,

    #[serde(rename = "expected_price_high")]
    pub budget_high: f64,

    #[serde(rename = "favorite_keyword")]
    pub keyword: String,
}

impl Customer {
    /// Minimal customer with no profile fields, in the default category
    pub fn new(id: impl Into<String>, budget_low: f64, budget_high: f64, keyword: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            age: None,
            city: None,
            category: default_category(),
            budget_low,
            budget_high,
            keyword: keyword.into(),
        }
    }

    /// Midpoint of the stated budget window
    pub fn mid_budget(&self) -> f64 {
        (self.budget_low + self.budget_high) / 2.0
    }

    /// Inclusive check against the stated (unbuffered) budget
    pub fn in_budget(&self, price: f64) -> bool {
        price >= self.budget_low && price <= self.budget_high
    }

    /// Case-insensitive substring match of the keyword against a product title
    pub fn keyword_matches(&self, title: &str) -> bool {
        title.to_lowercase().contains(&self.keyword.to_lowercase())
    }

    /// Display label, e.g. "USER_0001 - Priya Sharma"
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} - {}", self.id, name),
            None => self.id.clone(),
        }
    }

    /// Reject records the engine cannot score meaningfully.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::EmptyIdentifier);
        }
        for (field, value) in [("budget_low", self.budget_low), ("budget_high", self.budget_high)] {
            if !value.is_finite() {
                return Err(RecordError::NonFinite {
                    id: self.id.clone(),
                    field,
                });
            }
        }
        if self.budget_low < 0.0 {
            return Err(RecordError::NegativeBudget {
                id: self.id.clone(),
                low: self.budget_low,
            });
        }
        if self.budget_high < self.budget_low {
            return Err(RecordError::InvertedBudget {
                id: self.id.clone(),
                low: self.budget_low,
                high: self.budget_high,
            });
        }
        if self.keyword.trim().is_empty() {
            return Err(RecordError::EmptyKeyword { id: self.id.clone() });
        }
        Ok(())
    }
}
