use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Category name reported for products without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Used,
    Expired,
    Thrown,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Used => "used",
            ProductStatus::Expired => "expired",
            ProductStatus::Thrown => "thrown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(ProductStatus::Active),
            "used" => Some(ProductStatus::Used),
            "expired" => Some(ProductStatus::Expired),
            "thrown" => Some(ProductStatus::Thrown),
            _ => None,
        }
    }
}

/// How soon the owner wants to use a product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// The slice of a product the engine works with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub expiration_date: Date,
    pub status: ProductStatus,
    pub priority: Priority,
    pub quantity: f64,
}

impl ProductView {
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}
