use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    Bucket, DashboardResponse, RecommendationQuery, RecommendationsResponse, StatisticsResponse,
    UpcomingProduct,
};
use crate::{
    auth::AuthUser,
    engine::{build_recommendations, dashboard_summary, days_remaining, expiration_timeline},
    products::{handlers::internal, repo, services::reference_date, ReferenceQuery},
    state::AppState,
};

const DASHBOARD_RECOMMENDATIONS: usize = 3;
const DASHBOARD_UPCOMING: usize = 5;
const TIMELINE_DAYS: i64 = 7;

pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(recommendations))
        .route("/dashboard", get(dashboard))
        .route("/products/statistics", get(statistics))
}

#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecommendationQuery>,
) -> Result<Json<RecommendationsResponse>, (StatusCode, String)> {
    let reference = reference_date(q.on.as_deref())?;
    let products = repo::list_active_products(&state.db, user_id)
        .await
        .map_err(internal)?;

    let mut recommendations = build_recommendations(&products, reference, &state.action_links());
    if let Some(limit) = q.limit {
        recommendations.truncate(limit);
    }
    info!(%user_id, count = recommendations.len(), "recommendations served");

    Ok(Json(RecommendationsResponse {
        reference_date: reference,
        recommendations,
    }))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ReferenceQuery>,
) -> Result<Json<DashboardResponse>, (StatusCode, String)> {
    let reference = reference_date(q.on.as_deref())?;
    let products = repo::list_active_products(&state.db, user_id)
        .await
        .map_err(internal)?;

    let summary = dashboard_summary(&products, reference, state.config.dashboard_top_categories);
    let mut top_recommendations =
        build_recommendations(&products, reference, &state.action_links());
    top_recommendations.truncate(DASHBOARD_RECOMMENDATIONS);

    // products come ordered by expiration date
    let upcoming = products
        .iter()
        .filter(|p| days_remaining(p.expiration_date, reference) >= 0)
        .take(DASHBOARD_UPCOMING)
        .map(|p| UpcomingProduct::new(p, reference))
        .collect();

    Ok(Json(DashboardResponse {
        reference_date: reference,
        summary,
        top_recommendations,
        upcoming,
    }))
}

#[instrument(skip(state))]
pub async fn statistics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ReferenceQuery>,
) -> Result<Json<StatisticsResponse>, (StatusCode, String)> {
    let reference = reference_date(q.on.as_deref())?;
    let db = &state.db;

    let (by_status, by_category, by_storage, active) = tokio::try_join!(
        repo::count_by_status(db, user_id),
        repo::count_by_category(db, user_id),
        repo::count_by_storage(db, user_id),
        repo::list_active_products(db, user_id),
    )
    .map_err(internal)?;

    let buckets = |rows: Vec<(String, i64)>| -> Vec<Bucket> {
        rows.into_iter().map(Bucket::from).collect()
    };
    Ok(Json(StatisticsResponse {
        reference_date: reference,
        by_status: buckets(by_status),
        by_category: buckets(by_category),
        by_storage: buckets(by_storage),
        expiring_next_days: expiration_timeline(&active, reference, TIMELINE_DAYS),
    }))
}
