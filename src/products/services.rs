use axum::http::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;
use time::{macros::format_description, Date, Duration, OffsetDateTime};

use super::dto::{ProductQuery, ProductRequest};
use super::repo_types::{NewProduct, Product, StorageLocation};
use crate::categories::Category;
use crate::engine::{Priority, ProductStatus};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const DEFAULT_QUANTITY: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most 200 characters")]
    NameTooLong,
    #[error("expiration date cannot be in the past")]
    ExpirationInPast,
    #[error("purchase date cannot be in the future")]
    PurchaseInFuture,
    #[error("quantity must be greater than 0")]
    NonPositiveQuantity,
    #[error("estimated price must be between 0 and 99999999.99")]
    PriceOutOfRange,
    #[error("expiration date is required when no category is given")]
    MissingExpiration,
    #[error("unknown category {0}")]
    UnknownCategory(i32),
    #[error("new products must be active")]
    InactiveOnCreate,
    #[error("invalid {field}: {value:?}")]
    InvalidFilter { field: &'static str, value: String },
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl From<ProductError> for (StatusCode, String) {
    fn from(e: ProductError) -> Self {
        (StatusCode::BAD_REQUEST, e.to_string())
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// `on=YYYY-MM-DD` overrides today's date.
pub fn reference_date(on: Option<&str>) -> Result<Date, ProductError> {
    match on.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today()),
        Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| ProductError::InvalidDate(raw.to_string())),
    }
}

/// Checks a create (`existing == None`) or update request and fills defaults.
/// Fields the request omits fall back to `existing`, then to create defaults.
/// `category` must be the catalog entry for `req.category_id(existing)`, if one was found.
pub fn validate_product(
    req: ProductRequest,
    reference: Date,
    existing: Option<&Product>,
    category: Option<&Category>,
) -> Result<NewProduct, ProductError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ProductError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ProductError::NameTooLong);
    }

    let category_id = req.category_id(existing);
    if let Some(id) = category_id {
        if category.map(|c| c.id) != Some(id) {
            return Err(ProductError::UnknownCategory(id));
        }
    }

    let purchase_date = req
        .purchase_date
        .or(existing.map(|p| p.purchase_date))
        .unwrap_or(reference);
    if purchase_date > reference {
        return Err(ProductError::PurchaseInFuture);
    }

    let expiration_date = match (req.expiration_date, existing, category) {
        (Some(d), _, _) => d,
        (None, Some(p), _) => p.expiration_date,
        (None, None, Some(c)) => purchase_date + Duration::days(c.default_shelf_life_days.into()),
        (None, None, None) => return Err(ProductError::MissingExpiration),
    };
    let unchanged = existing.is_some_and(|p| p.expiration_date == expiration_date);
    if expiration_date < reference && !unchanged {
        return Err(ProductError::ExpirationInPast);
    }

    let quantity = req
        .quantity
        .or(existing.map(|p| p.quantity))
        .unwrap_or(DEFAULT_QUANTITY);
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ProductError::NonPositiveQuantity);
    }

    let estimated_price = req
        .estimated_price
        .unwrap_or_else(|| existing.and_then(|p| p.estimated_price))
        .map(|p| p.round_dp(2));
    if let Some(price) = estimated_price {
        if price < Decimal::ZERO || price > Decimal::new(99_999_999_99, 2) {
            return Err(ProductError::PriceOutOfRange);
        }
    }

    let status = match (existing, req.status) {
        (None, None | Some(ProductStatus::Active)) => ProductStatus::Active,
        (None, Some(_)) => return Err(ProductError::InactiveOnCreate),
        (Some(p), status) => status.unwrap_or(p.status),
    };

    let notes = match req.notes {
        Some(n) => n.trim().to_string(),
        None => existing.map(|p| p.notes.clone()).unwrap_or_default(),
    };

    Ok(NewProduct {
        name,
        category_id,
        expiration_date,
        purchase_date,
        quantity,
        unit: req
            .unit
            .or(existing.map(|p| p.unit))
            .unwrap_or_default(),
        storage: req
            .storage
            .unwrap_or_else(|| existing.and_then(|p| p.storage)),
        priority: req
            .priority
            .or(existing.map(|p| p.priority))
            .unwrap_or_default(),
        estimated_price,
        notes,
        status,
        notifications: req
            .notifications
            .or(existing.map(|p| p.notifications))
            .unwrap_or(true),
    })
}

/// Status filter; `Warning` and `Danger` select active products by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Is(ProductStatus),
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    ExpirationAsc,
    ExpirationDesc,
    Name,
    Priority,
    NewestFirst,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "expiration_date" => Some(SortOrder::ExpirationAsc),
            "-expiration_date" => Some(SortOrder::ExpirationDesc),
            "name" => Some(SortOrder::Name),
            "priority" => Some(SortOrder::Priority),
            "-created_at" => Some(SortOrder::NewestFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub status: Option<StatusFilter>,
    pub storage: Option<StorageLocation>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub sort: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn invalid(field: &'static str, value: &str) -> ProductError {
    ProductError::InvalidFilter {
        field,
        value: value.to_string(),
    }
}

impl TryFrom<&ProductQuery> for ProductFilter {
    type Error = ProductError;

    fn try_from(q: &ProductQuery) -> Result<Self, ProductError> {
        let status = match present(&q.status) {
            None => None,
            Some("warning") => Some(StatusFilter::Warning),
            Some("danger") => Some(StatusFilter::Danger),
            Some(s) => Some(StatusFilter::Is(
                ProductStatus::parse(s).ok_or_else(|| invalid("status", s))?,
            )),
        };
        let storage = present(&q.storage)
            .map(|s| StorageLocation::parse(s).ok_or_else(|| invalid("storage", s)))
            .transpose()?;
        let priority = present(&q.priority)
            .map(|s| Priority::parse(s).ok_or_else(|| invalid("priority", s)))
            .transpose()?;
        let sort = present(&q.sort)
            .map(|s| SortOrder::parse(s).ok_or_else(|| invalid("sort", s)))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            category: present(&q.category).map(str::to_string),
            status,
            storage,
            priority,
            search: present(&q.search).map(str::to_string),
            sort,
            limit: q.limit.clamp(1, MAX_PAGE_SIZE),
            offset: q.offset.max(0),
        })
    }
}

/// Escapes LIKE wildcards so user input matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::repo_types::Unit;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    const TODAY: Date = date!(2024 - 06 - 15);

    fn request(name: &str, expiration: Option<Date>) -> ProductRequest {
        ProductRequest {
            name: name.into(),
            category_id: None,
            expiration_date: expiration,
            purchase_date: None,
            quantity: None,
            unit: None,
            storage: None,
            priority: None,
            estimated_price: None,
            notes: None,
            notifications: None,
            status: None,
        }
    }

    fn dairy() -> Category {
        Category {
            id: 3,
            name: "Dairy".into(),
            default_shelf_life_days: 5,
            icon: "fas fa-cheese".into(),
        }
    }

    fn existing(expiration: Date) -> Product {
        Product {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Milk".into(),
            category_id: None,
            category_name: None,
            expiration_date: expiration,
            purchase_date: date!(2024 - 06 - 01),
            quantity: 1.0,
            unit: Unit::L,
            storage: Some(StorageLocation::Fridge),
            priority: Priority::High,
            estimated_price: None,
            notes: String::new(),
            status: ProductStatus::Active,
            notifications: true,
            created_at: datetime!(2024-06-01 8:00 UTC),
            updated_at: datetime!(2024-06-01 8:00 UTC),
        }
    }

    #[test]
    fn create_fills_defaults() {
        let new = validate_product(request("  Milk ", Some(TODAY)), TODAY, None, None).unwrap();
        assert_eq!(new.name, "Milk");
        assert_eq!(new.purchase_date, TODAY);
        assert_eq!(new.expiration_date, TODAY);
        assert_eq!(new.status, ProductStatus::Active);
        assert_eq!(new.quantity, DEFAULT_QUANTITY);
        assert_eq!(new.unit, Unit::Pcs);
        assert_eq!(new.priority, Priority::Medium);
        assert!(new.notifications);
    }

    #[test]
    fn rejects_blank_and_long_names() {
        assert_eq!(
            validate_product(request("   ", Some(TODAY)), TODAY, None, None),
            Err(ProductError::EmptyName)
        );
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            validate_product(request(&long, Some(TODAY)), TODAY, None, None),
            Err(ProductError::NameTooLong)
        );
    }

    #[test]
    fn rejects_past_expiration_on_create() {
        let req = request("Milk", Some(date!(2024 - 06 - 14)));
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::ExpirationInPast)
        );
    }

    #[test]
    fn update_may_keep_existing_past_expiration() {
        let old = existing(date!(2024 - 06 - 10));
        let mut req = request("Milk", None);
        req.priority = Some(Priority::Low);
        let new = validate_product(req, TODAY, Some(&old), None).unwrap();
        assert_eq!(new.expiration_date, date!(2024 - 06 - 10));
        assert_eq!(new.purchase_date, old.purchase_date);

        let moved = request("Milk", Some(date!(2024 - 06 - 11)));
        assert_eq!(
            validate_product(moved, TODAY, Some(&old), None),
            Err(ProductError::ExpirationInPast)
        );
    }

    #[test]
    fn update_keeps_fields_the_body_omits() {
        let mut old = existing(date!(2024 - 06 - 20));
        old.category_id = Some(3);
        old.quantity = 5.0;
        old.estimated_price = Some(Decimal::new(300, 2));
        old.notes = "keep".into();
        old.notifications = false;

        let req: ProductRequest = serde_json::from_str(r#"{"name":"Milk 2"}"#).unwrap();
        let new = validate_product(req, TODAY, Some(&old), Some(&dairy())).unwrap();
        assert_eq!(new.name, "Milk 2");
        assert_eq!(new.category_id, Some(3));
        assert_eq!(new.expiration_date, old.expiration_date);
        assert_eq!(new.quantity, 5.0);
        assert_eq!(new.unit, Unit::L);
        assert_eq!(new.storage, Some(StorageLocation::Fridge));
        assert_eq!(new.priority, Priority::High);
        assert_eq!(new.estimated_price, Some(Decimal::new(300, 2)));
        assert_eq!(new.notes, "keep");
        assert!(!new.notifications);
        assert_eq!(new.status, ProductStatus::Active);
    }

    #[test]
    fn update_null_clears_optional_fields() {
        let mut old = existing(date!(2024 - 06 - 20));
        old.category_id = Some(3);
        old.estimated_price = Some(Decimal::new(300, 2));

        let req: ProductRequest = serde_json::from_str(
            r#"{"name":"Milk","category_id":null,"storage":null,"estimated_price":null}"#,
        )
        .unwrap();
        let new = validate_product(req, TODAY, Some(&old), None).unwrap();
        assert_eq!(new.category_id, None);
        assert_eq!(new.storage, None);
        assert_eq!(new.estimated_price, None);
        assert_eq!(new.quantity, old.quantity);
    }

    #[test]
    fn rejects_future_purchase() {
        let mut req = request("Milk", Some(date!(2024 - 06 - 20)));
        req.purchase_date = Some(date!(2024 - 06 - 16));
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::PurchaseInFuture)
        );
    }

    #[test]
    fn rejects_bad_quantity_and_price() {
        let mut req = request("Milk", Some(TODAY));
        req.quantity = Some(0.0);
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::NonPositiveQuantity)
        );

        let mut req = request("Milk", Some(TODAY));
        req.estimated_price = Some(Some(Decimal::new(-1, 2)));
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::PriceOutOfRange)
        );
    }

    #[test]
    fn price_is_rounded_to_cents() {
        let mut req = request("Milk", Some(TODAY));
        req.estimated_price = Some(Some(Decimal::new(12345, 3)));
        let new = validate_product(req, TODAY, None, None).unwrap();
        assert_eq!(new.estimated_price, Some(Decimal::new(1234, 2)));
    }

    #[test]
    fn expiration_defaults_from_category_shelf_life() {
        let mut req = request("Yogurt", None);
        req.category_id = Some(Some(3));
        req.purchase_date = Some(date!(2024 - 06 - 13));
        let new = validate_product(req, TODAY, None, Some(&dairy())).unwrap();
        assert_eq!(new.expiration_date, date!(2024 - 06 - 18));
        assert_eq!(new.category_id, Some(3));
    }

    #[test]
    fn missing_expiration_without_category() {
        assert_eq!(
            validate_product(request("Yogurt", None), TODAY, None, None),
            Err(ProductError::MissingExpiration)
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut req = request("Yogurt", Some(TODAY));
        req.category_id = Some(Some(99));
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::UnknownCategory(99))
        );
    }

    #[test]
    fn status_rules() {
        let mut req = request("Milk", Some(TODAY));
        req.status = Some(ProductStatus::Used);
        assert_eq!(
            validate_product(req, TODAY, None, None),
            Err(ProductError::InactiveOnCreate)
        );

        let old = existing(TODAY);
        let mut req = request("Milk", None);
        req.status = Some(ProductStatus::Thrown);
        let new = validate_product(req, TODAY, Some(&old), None).unwrap();
        assert_eq!(new.status, ProductStatus::Thrown);

        let kept = validate_product(request("Milk", None), TODAY, Some(&old), None).unwrap();
        assert_eq!(kept.status, ProductStatus::Active);
    }

    #[test]
    fn reference_date_parses_or_defaults() {
        assert_eq!(reference_date(Some("2024-02-29")), Ok(date!(2024 - 02 - 29)));
        assert_eq!(reference_date(Some("  ")), Ok(today()));
        assert_eq!(reference_date(None), Ok(today()));
        assert_eq!(
            reference_date(Some("29.02.2024")),
            Err(ProductError::InvalidDate("29.02.2024".into()))
        );
    }

    #[test]
    fn filter_parses_query() {
        let q = ProductQuery {
            category: Some("Dairy".into()),
            status: Some("warning".into()),
            storage: Some("".into()),
            priority: Some("high".into()),
            search: Some("  milk ".into()),
            sort: Some("-created_at".into()),
            limit: 10_000,
            offset: -5,
            on: None,
        };
        let f = ProductFilter::try_from(&q).unwrap();
        assert_eq!(f.category.as_deref(), Some("Dairy"));
        assert_eq!(f.status, Some(StatusFilter::Warning));
        assert_eq!(f.storage, None);
        assert_eq!(f.priority, Some(Priority::High));
        assert_eq!(f.search.as_deref(), Some("milk"));
        assert_eq!(f.sort, SortOrder::NewestFirst);
        assert_eq!(f.limit, MAX_PAGE_SIZE);
        assert_eq!(f.offset, 0);
    }

    #[test]
    fn filter_rejects_unknown_values() {
        let q = ProductQuery {
            status: Some("rotten".into()),
            ..ProductQuery::default()
        };
        assert_eq!(
            ProductFilter::try_from(&q),
            Err(ProductError::InvalidFilter {
                field: "status",
                value: "rotten".into()
            })
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("milk"), "milk");
    }
}
