// REST API over one AppContext
//
// Handlers lock the shared context, call the same store/form operations the
// TUI uses, and wrap results in ApiResponse.

use crate::app::{AppContext, SubmitError};
use crate::db::Event;
use crate::forms::{DeliveryForm, FormError, TransactionForm};
use crate::language::Language;
use crate::logbook::{total_fee, DeliveryFilter, DeliveryRecord, LogbookSummary, PlatformFilter};
use crate::wallet::{Transaction, WalletSummary};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<Mutex<AppContext>>,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx: Arc::new(Mutex::new(ctx)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AppContext>, ApiError> {
        self.ctx.lock().map_err(|_| ApiError::Poisoned)
    }
}

/// API Response wrapper
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error("{0}")]
    BadRequest(String),
    #[error("application state is unavailable")]
    Poisoned,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(e) => ApiError::Invalid(e),
            SubmitError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Poisoned | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {self:#}");
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize, Default)]
pub struct DeliveryQuery {
    pub q: Option<String>,
    pub platform: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeliveryList {
    pub deliveries: Vec<DeliveryRecord>,
    pub count: usize,
    pub total_earnings: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WalletSummaryResponse {
    #[serde(flatten)]
    pub summary: WalletSummary,
    pub profit_margin: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LanguageResponse {
    pub language: Language,
    pub direction: String,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/deliveries?q=&platform= - Filtered logbook
async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<DeliveryQuery>,
) -> ApiResult<DeliveryList> {
    let platform: PlatformFilter = query
        .platform
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(ApiError::BadRequest)?;
    let filter = DeliveryFilter::new(query.q.unwrap_or_default(), platform);

    let ctx = state.lock()?;
    let deliveries: Vec<DeliveryRecord> = ctx.logbook.filtered(&filter).cloned().collect();

    Ok(Json(ApiResponse::ok(DeliveryList {
        count: deliveries.len(),
        total_earnings: total_fee(&deliveries),
        deliveries,
    })))
}

/// POST /api/deliveries - Validate and log a delivery
async fn create_delivery(
    State(state): State<AppState>,
    Json(form): Json<DeliveryForm>,
) -> Result<(StatusCode, Json<ApiResponse<DeliveryRecord>>), ApiError> {
    let record = state.lock()?.submit_delivery(&form)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// GET /api/deliveries/today
async fn today_deliveries(State(state): State<AppState>) -> ApiResult<LogbookSummary> {
    let ctx = state.lock()?;
    Ok(Json(ApiResponse::ok(ctx.logbook.summary())))
}

/// DELETE /api/deliveries/:id - Unknown ids are not an error
async fn delete_delivery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = state.lock()?.remove_delivery(&id)?;
    Ok(Json(ApiResponse::ok(Deleted {
        deleted: removed.is_some(),
    })))
}

/// GET /api/deliveries/:id/events - Audit trail, newest first
async fn delivery_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Event>> {
    let events = state.lock()?.history("delivery", &id)?;
    Ok(Json(ApiResponse::ok(events)))
}

/// GET /api/transactions
async fn list_transactions(State(state): State<AppState>) -> ApiResult<Vec<Transaction>> {
    let ctx = state.lock()?;
    Ok(Json(ApiResponse::ok(ctx.wallet.transactions().to_vec())))
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<AppState>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    let tx = state.lock()?.submit_transaction(&form)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(tx))))
}

/// DELETE /api/transactions/:id
async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = state.lock()?.remove_transaction(&id)?;
    Ok(Json(ApiResponse::ok(Deleted {
        deleted: removed.is_some(),
    })))
}

/// GET /api/transactions/:id/events
async fn transaction_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Event>> {
    let events = state.lock()?.history("transaction", &id)?;
    Ok(Json(ApiResponse::ok(events)))
}

/// GET /api/wallet/summary - Today's income, expense and profit
async fn wallet_summary(State(state): State<AppState>) -> ApiResult<WalletSummaryResponse> {
    let summary = state.lock()?.wallet.today_summary();
    Ok(Json(ApiResponse::ok(WalletSummaryResponse {
        profit_margin: summary.profit_margin(),
        summary,
    })))
}

/// GET /api/language
async fn get_language(State(state): State<AppState>) -> ApiResult<LanguageResponse> {
    let ctx = state.lock()?;
    Ok(Json(ApiResponse::ok(language_response(ctx.language.language()))))
}

/// PUT /api/language
async fn put_language(
    State(state): State<AppState>,
    Json(request): Json<LanguageRequest>,
) -> ApiResult<LanguageResponse> {
    let language: Language = request.language.parse().map_err(ApiError::BadRequest)?;
    state.lock()?.set_language(language)?;
    Ok(Json(ApiResponse::ok(language_response(language))))
}

fn language_response(language: Language) -> LanguageResponse {
    LanguageResponse {
        language,
        direction: language.direction().as_str().to_string(),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/deliveries", get(list_deliveries).post(create_delivery))
        .route("/deliveries/today", get(today_deliveries))
        .route("/deliveries/:id", delete(delete_delivery))
        .route("/deliveries/:id/events", get(delivery_events))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/:id", delete(delete_transaction))
        .route("/transactions/:id/events", get(transaction_events))
        .route("/wallet/summary", get(wallet_summary))
        .route("/language", get(get_language).put(put_language))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
