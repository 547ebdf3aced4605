use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::engine::{Priority, ProductStatus, ProductView};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Fridge,
    Freezer,
    Pantry,
    Room,
}

impl StorageLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageLocation::Fridge => "fridge",
            StorageLocation::Freezer => "freezer",
            StorageLocation::Pantry => "pantry",
            StorageLocation::Room => "room",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fridge" => Some(StorageLocation::Fridge),
            "freezer" => Some(StorageLocation::Freezer),
            "pantry" => Some(StorageLocation::Pantry),
            "room" => Some(StorageLocation::Room),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Pcs,
    Kg,
    G,
    L,
    Ml,
    Pack,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Pcs => "pcs",
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Pack => "pack",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pcs" => Some(Unit::Pcs),
            "kg" => Some(Unit::Kg),
            "g" => Some(Unit::G),
            "l" => Some(Unit::L),
            "ml" => Some(Unit::Ml),
            "pack" => Some(Unit::Pack),
            _ => None,
        }
    }
}

/// Row as stored; enum columns are TEXT.
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub expiration_date: Date,
    pub purchase_date: Date,
    pub quantity: f64,
    pub unit: String,
    pub storage: Option<String>,
    pub priority: String,
    pub estimated_price: Option<Decimal>,
    pub notes: String,
    pub status: String,
    pub notifications: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(r: ProductRow) -> anyhow::Result<Self> {
        let unit = Unit::parse(&r.unit).ok_or_else(|| anyhow!("unknown unit {:?}", r.unit))?;
        let storage = match r.storage.as_deref() {
            None => None,
            Some(s) => Some(
                StorageLocation::parse(s).ok_or_else(|| anyhow!("unknown storage {:?}", s))?,
            ),
        };
        let priority = Priority::parse(&r.priority)
            .ok_or_else(|| anyhow!("unknown priority {:?}", r.priority))?;
        let status = ProductStatus::parse(&r.status)
            .ok_or_else(|| anyhow!("unknown status {:?}", r.status))?;

        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            category_id: r.category_id,
            category_name: r.category_name,
            expiration_date: r.expiration_date,
            purchase_date: r.purchase_date,
            quantity: r.quantity,
            unit,
            storage,
            priority,
            estimated_price: r.estimated_price,
            notes: r.notes,
            status,
            notifications: r.notifications,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl Product {
    pub fn view(&self) -> ProductView {
        ProductView {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            category: self.category_name.clone(),
            expiration_date: self.expiration_date,
            status: self.status,
            priority: self.priority,
            quantity: self.quantity,
        }
    }
}

/// Validated product fields ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<i32>,
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
}
