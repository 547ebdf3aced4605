use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::{Date, Duration};
use uuid::Uuid;

use super::repo_types::{NewProduct, Product, ProductRow};
use super::services::{escape_like, ProductFilter, SortOrder, StatusFilter};
use crate::engine::{ProductView, UNCATEGORIZED};

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.user_id, p.name, p.category_id, c.name AS category_name,
    p.expiration_date, p.purchase_date, p.quantity, p.unit, p.storage,
    p.priority, p.estimated_price, p.notes, p.status, p.notifications,
    p.created_at, p.updated_at
"#;

const PRIORITY_RANK: &str =
    "CASE p.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END";

fn into_products(rows: Vec<ProductRow>) -> anyhow::Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Active products of a user, soonest expiration first.
pub async fn list_active_products(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ProductView>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
          FROM products p
          LEFT JOIN categories c ON c.id = p.category_id
         WHERE p.user_id = $1 AND p.status = 'active'
         ORDER BY p.expiration_date ASC, {PRIORITY_RANK}, p.created_at ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list active products")?;

    Ok(into_products(rows)?.iter().map(Product::view).collect())
}

pub async fn list_filtered(
    db: &PgPool,
    user_id: Uuid,
    filter: &ProductFilter,
    reference: Date,
) -> anyhow::Result<Vec<Product>> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.user_id = "
    ));
    qb.push_bind(user_id);

    if let Some(category) = &filter.category {
        if category.eq_ignore_ascii_case(UNCATEGORIZED) {
            qb.push(" AND p.category_id IS NULL");
        } else {
            qb.push(" AND lower(c.name) = lower(");
            qb.push_bind(category.clone());
            qb.push(")");
        }
    }

    match filter.status {
        None => {}
        Some(StatusFilter::Is(status)) => {
            qb.push(" AND p.status = ");
            qb.push_bind(status.as_str());
        }
        Some(StatusFilter::Warning) => {
            qb.push(" AND p.status = 'active' AND p.expiration_date BETWEEN ");
            qb.push_bind(reference);
            qb.push(" AND ");
            qb.push_bind(reference + Duration::days(2));
        }
        Some(StatusFilter::Danger) => {
            qb.push(" AND p.status = 'active' AND p.expiration_date < ");
            qb.push_bind(reference);
        }
    }

    if let Some(storage) = filter.storage {
        qb.push(" AND p.storage = ");
        qb.push_bind(storage.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND p.priority = ");
        qb.push_bind(priority.as_str());
    }
    if let Some(search) = &filter.search {
        qb.push(" AND p.name ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(search)));
    }

    qb.push(match filter.sort {
        SortOrder::ExpirationAsc => " ORDER BY p.expiration_date ASC, p.created_at ASC".to_string(),
        SortOrder::ExpirationDesc => " ORDER BY p.expiration_date DESC, p.created_at ASC".to_string(),
        SortOrder::Name => " ORDER BY lower(p.name) ASC, p.expiration_date ASC".to_string(),
        SortOrder::Priority => format!(" ORDER BY {PRIORITY_RANK}, p.expiration_date ASC"),
        SortOrder::NewestFirst => " ORDER BY p.created_at DESC".to_string(),
    });
    qb.push(" LIMIT ");
    qb.push_bind(filter.limit);
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset);

    let rows = qb
        .build_query_as::<ProductRow>()
        .fetch_all(db)
        .await
        .context("list filtered products")?;
    into_products(rows)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
          FROM products p
          LEFT JOIN categories c ON c.id = p.category_id
         WHERE p.id = $1 AND p.user_id = $2
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get product")?;

    row.map(Product::try_from).transpose()
}

pub async fn insert(db: &PgPool, user_id: Uuid, new: &NewProduct) -> anyhow::Result<Product> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        WITH p AS (
            INSERT INTO products (
                user_id, name, category_id, expiration_date, purchase_date,
                quantity, unit, storage, priority, estimated_price, notes,
                status, notifications
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
        )
        SELECT {PRODUCT_COLUMNS}
          FROM p
          LEFT JOIN categories c ON c.id = p.category_id
        "#
    ))
    .bind(user_id)
    .bind(&new.name)
    .bind(new.category_id)
    .bind(new.expiration_date)
    .bind(new.purchase_date)
    .bind(new.quantity)
    .bind(new.unit.as_str())
    .bind(new.storage.map(|s| s.as_str()))
    .bind(new.priority.as_str())
    .bind(new.estimated_price)
    .bind(&new.notes)
    .bind(new.status.as_str())
    .bind(new.notifications)
    .fetch_one(db)
    .await
    .context("insert product")?;

    Product::try_from(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    new: &NewProduct,
) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        WITH p AS (
            UPDATE products
               SET name = $3, category_id = $4, expiration_date = $5,
                   purchase_date = $6, quantity = $7, unit = $8, storage = $9,
                   priority = $10, estimated_price = $11, notes = $12,
                   status = $13, notifications = $14, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING *
        )
        SELECT {PRODUCT_COLUMNS}
          FROM p
          LEFT JOIN categories c ON c.id = p.category_id
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&new.name)
    .bind(new.category_id)
    .bind(new.expiration_date)
    .bind(new.purchase_date)
    .bind(new.quantity)
    .bind(new.unit.as_str())
    .bind(new.storage.map(|s| s.as_str()))
    .bind(new.priority.as_str())
    .bind(new.estimated_price)
    .bind(&new.notes)
    .bind(new.status.as_str())
    .bind(new.notifications)
    .fetch_optional(db)
    .await
    .context("update product")?;

    row.map(Product::try_from).transpose()
}

/// Returns false when no such product belongs to the user.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM products WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete product")?;
    Ok(res.rows_affected() > 0)
}

pub async fn mark_used(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        WITH p AS (
            UPDATE products
               SET status = 'used', updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING *
        )
        SELECT {PRODUCT_COLUMNS}
          FROM p
          LEFT JOIN categories c ON c.id = p.category_id
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("mark product used")?;

    row.map(Product::try_from).transpose()
}

// ---- Statistics ----

pub async fn count_by_status(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*)
          FROM products
         WHERE user_id = $1
         GROUP BY status
         ORDER BY status
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("count products by status")?;
    Ok(rows)
}

pub async fn count_by_category(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT COALESCE(c.name, $2), COUNT(*)
          FROM products p
          LEFT JOIN categories c ON c.id = p.category_id
         WHERE p.user_id = $1
         GROUP BY 1
         ORDER BY 2 DESC, 1
        "#,
    )
    .bind(user_id)
    .bind(UNCATEGORIZED)
    .fetch_all(db)
    .await
    .context("count products by category")?;
    Ok(rows)
}

pub async fn count_by_storage(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT COALESCE(storage, 'unspecified'), COUNT(*)
          FROM products
         WHERE user_id = $1
         GROUP BY 1
         ORDER BY 2 DESC, 1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("count products by storage")?;
    Ok(rows)
}
