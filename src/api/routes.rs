//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{FromRequest, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{days_until_date, BillingCycle, Subscription, SubscriptionId};
use crate::error::{AppError, AppResult};
use crate::services::{CheckReport, SubscriptionInput, SubscriptionPatch};

use super::middleware::session_token;
use super::session::{credentials_match, expired_session_cookie, session_cookie};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

/// `Json` whose rejections come back as [`AppError::InvalidRequest`]
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub name: String,
    pub price: String,
    pub currency: String,
    pub cycle: BillingCycle,
    /// `DD-MM-YYYY`
    pub next_payment_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            next_payment_date: sub.formatted_payment_date(),
            id: sub.id,
            name: sub.name,
            price: sub.price.to_string(),
            currency: sub.currency,
            cycle: sub.cycle,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpcomingResponse {
    #[serde(flatten)]
    pub subscription: SubscriptionResponse,
    pub days_until: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// =========================================================================
// Routers
// =========================================================================

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes behind the session middleware
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route(
            "/subscriptions/:id",
            get(get_subscription)
                .patch(update_subscription)
                .delete(delete_subscription),
        )
        .route("/upcoming", get(upcoming))
        .route("/check", post(run_check))
}

// =========================================================================
// Public endpoints
// =========================================================================

/// Liveness plus a database ping
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.store_health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unreachable",
                }),
            )
        }
    }
}

async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if !credentials_match(&state.credentials, &request.username, &request.password) {
        tracing::warn!(username = %request.username, "Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.sessions.create(Utc::now());
    tracing::info!("User logged in");

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
    ))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(token);
    }

    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
    )
}

// =========================================================================
// /api/subscriptions
// =========================================================================

async fn list_subscriptions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SubscriptionResponse>>> {
    let subs = state.service.list().await?;
    Ok(Json(subs.into_iter().map(SubscriptionResponse::from).collect()))
}

async fn create_subscription(
    State(state): State<AppState>,
    AppJson(request): AppJson<SubscriptionInput>,
) -> AppResult<(StatusCode, Json<SubscriptionResponse>)> {
    let created = state.service.add(&request).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<SubscriptionId>,
) -> AppResult<Json<SubscriptionResponse>> {
    let sub = state.service.get_subscription(id).await?;
    Ok(Json(sub.into()))
}

async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<SubscriptionId>,
    AppJson(request): AppJson<SubscriptionPatch>,
) -> AppResult<Json<SubscriptionResponse>> {
    let updated = state.service.update(id, &request).await?;
    Ok(Json(updated.into()))
}

async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<SubscriptionId>,
) -> AppResult<StatusCode> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// /api/upcoming, /api/check
// =========================================================================

async fn upcoming(State(state): State<AppState>) -> AppResult<Json<Vec<UpcomingResponse>>> {
    let now = Utc::now();
    let candidates = state.service.upcoming(now).await?;

    Ok(Json(
        candidates
            .into_iter()
            .map(|sub| UpcomingResponse {
                days_until: days_until_date(sub.next_payment_date, now),
                subscription: sub.into(),
            })
            .collect(),
    ))
}

/// Run a full check pass on demand
async fn run_check(State(state): State<AppState>) -> AppResult<Json<CheckReport>> {
    let report = state.service.run_check(Utc::now()).await?;
    Ok(Json(report))
}
