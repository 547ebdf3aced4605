use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Product, StorageLocation, Unit};
use crate::engine::{Priority, ProductStatus, UrgencyTier, UNCATEGORIZED};

/// Body of POST /products and PUT /products/:id.
///
/// On update an omitted field keeps its stored value; `null` clears
/// `category_id`, `storage` and `estimated_price`.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i32>>,
    #[serde(default)]
    pub expiration_date: Option<Date>,
    #[serde(default)]
    pub purchase_date: Option<Date>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default, deserialize_with = "nullable")]
    pub storage: Option<Option<StorageLocation>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_price: Option<Option<Decimal>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notifications: Option<bool>,
    /// Only honoured on update.
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

impl ProductRequest {
    /// Category the saved product will point at.
    pub fn category_id(&self, existing: Option<&Product>) -> Option<i32> {
        self.category_id
            .unwrap_or_else(|| existing.and_then(|p| p.category_id))
    }
}

/// Present-but-null becomes `Some(None)`; absent stays `None` via `default`.
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Query string of GET /products.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub storage: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub on: Option<String>,
}
fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    pub on: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<i32>,
    pub category: String,
    pub expiration_date: Date,
    pub purchase_date: Date,
    pub quantity: f64,
    pub unit: Unit,
    pub storage: Option<StorageLocation>,
    pub priority: Priority,
    pub estimated_price: Option<Decimal>,
    pub notes: String,
    pub status: ProductStatus,
    pub notifications: bool,
    pub days_remaining: i64,
    pub urgency: UrgencyTier,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProductResponse {
    pub fn new(p: Product, reference: Date) -> Self {
        let (days_remaining, urgency) = UrgencyTier::classify(p.expiration_date, reference);
        Self {
            id: p.id,
            name: p.name,
            category_id: p.category_id,
            category: p.category_name.unwrap_or_else(|| UNCATEGORIZED.to_string()),
            expiration_date: p.expiration_date,
            purchase_date: p.purchase_date,
            quantity: p.quantity,
            unit: p.unit,
            storage: p.storage,
            priority: p.priority,
            estimated_price: p.estimated_price,
            notes: p.notes,
            status: p.status,
            notifications: p.notifications,
            days_remaining,
            urgency,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
