use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
        services::{
            hash_password, is_valid_email, is_valid_username, verify_password, JwtKeys,
            MIN_PASSWORD_LEN,
        },
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "auth request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Maps a UNIQUE violation from a concurrent registration onto the same 409s
/// the pre-checks return.
fn register_failed(e: anyhow::Error) -> (StatusCode, String) {
    let conflict = e
        .downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .filter(|db| db.is_unique_violation())
        .map(|db| match db.constraint() {
            Some(c) if c.contains("email") => "Email already registered",
            _ => "Username already taken",
        });
    match conflict {
        Some(msg) => {
            warn!(error = %e, "registration lost unique race");
            (StatusCode::CONFLICT, msg.into())
        }
        None => internal(e),
    }
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(user.id).map_err(internal)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

/// Trims optional text, treating blank as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let username = payload.username.trim().to_string();
    let email = non_blank(payload.email).map(|e| e.to_lowercase());
    let first_name = non_blank(payload.first_name);

    if !is_valid_username(&username) {
        warn!(%username, "invalid username");
        return Err((StatusCode::BAD_REQUEST, "Invalid username".into()));
    }
    if let Some(email) = &email {
        if !is_valid_email(email) {
            warn!(%email, "invalid email");
            return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
        }
    }
    if first_name.as_ref().is_some_and(|n| n.chars().count() > 30) {
        return Err((StatusCode::BAD_REQUEST, "First name too long".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    if User::find_by_username(&state.db, &username)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(%username, "username already registered");
        return Err((StatusCode::CONFLICT, "Username already taken".into()));
    }
    if let Some(email) = &email {
        if User::email_taken(&state.db, email).await.map_err(internal)? {
            warn!(%email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let user = User::create(
        &state.db,
        &username,
        email.as_deref(),
        first_name.as_deref(),
        &hash,
    )
    .await
    .map_err(register_failed)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let username = payload.username.trim();

    let user = match User::find_by_username(&state.db, username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%username, "login unknown username");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(user_id = %user_id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(user.into()))
}
