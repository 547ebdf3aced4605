use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{ProductQuery, ProductRequest, ProductResponse, ReferenceQuery};
use super::repo;
use super::services::{reference_date, today, validate_product, ProductFilter};
use crate::{auth::AuthUser, categories::Category, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/mark_used", post(mark_used))
}

pub(crate) fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "product request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Product not found".into())
}

async fn load_category(
    state: &AppState,
    category_id: Option<i32>,
) -> Result<Option<Category>, (StatusCode, String)> {
    match category_id {
        None => Ok(None),
        Some(id) => Category::find(&state.db, id).await.map_err(internal),
    }
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, (StatusCode, String)> {
    let reference = reference_date(q.on.as_deref())?;
    let filter = ProductFilter::try_from(&q)?;
    let products = repo::list_filtered(&state.db, user_id, &filter, reference)
        .await
        .map_err(internal)?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductResponse::new(p, reference))
            .collect(),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ProductResponse>), (StatusCode, String)> {
    let reference = today();
    let category = load_category(&state, payload.category_id(None)).await?;
    let new = validate_product(payload, reference, None, category.as_ref()).map_err(|e| {
        warn!(error = %e, "rejected product");
        e
    })?;

    let product = repo::insert(&state.db, user_id, &new).await.map_err(internal)?;
    info!(%user_id, product_id = %product.id, name = %product.name, "product created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/products/{}", product.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((
        StatusCode::CREATED,
        headers,
        Json(ProductResponse::new(product, reference)),
    ))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(rq): Query<ReferenceQuery>,
) -> Result<Json<ProductResponse>, (StatusCode, String)> {
    let reference = reference_date(rq.on.as_deref())?;
    let product = repo::get(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(ProductResponse::new(product, reference)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, (StatusCode, String)> {
    let reference = today();
    let existing = repo::get(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    let category = load_category(&state, payload.category_id(Some(&existing))).await?;
    let new = validate_product(payload, reference, Some(&existing), category.as_ref()).map_err(
        |e| {
            warn!(error = %e, %id, "rejected product update");
            e
        },
    )?;

    let product = repo::update(&state.db, user_id, id, &new)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    info!(%user_id, product_id = %id, "product updated");
    Ok(Json(ProductResponse::new(product, reference)))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !repo::delete(&state.db, user_id, id).await.map_err(internal)? {
        return Err(not_found());
    }
    info!(%user_id, product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn mark_used(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(rq): Query<ReferenceQuery>,
) -> Result<Json<ProductResponse>, (StatusCode, String)> {
    let reference = reference_date(rq.on.as_deref())?;
    let product = repo::mark_used(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    info!(%user_id, product_id = %id, "product marked used");
    Ok(Json(ProductResponse::new(product, reference)))
}
