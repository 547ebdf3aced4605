use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{error, instrument};

use crate::{auth::AuthUser, state::AppState};

/// Catalog entry; seeded by migration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub default_shelf_life_days: i32,
    pub icon: String,
}

impl Category {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, default_shelf_life_days, icon
              FROM categories
             ORDER BY name
            "#,
        )
        .fetch_all(db)
        .await
        .context("list categories")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i32) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, default_shelf_life_days, icon
              FROM categories
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find category")?;
        Ok(row)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<Category>>, (StatusCode, String)> {
    let categories = Category::list(&state.db).await.map_err(|e| {
        error!(error = %e, "list categories failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(categories))
}
