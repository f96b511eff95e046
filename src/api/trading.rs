//! Trading API
//!
//! HTTP surface over the simulated brokerage ledger:
//!
//! - GET    /api/trading/dashboard        - Account snapshot with display strings
//! - POST   /api/trading/orders           - Execute a buy/sell order
//! - POST   /api/trading/ticks            - Apply a market price tick batch
//! - POST   /api/trading/reset            - Reset the account to a fresh state
//! - DELETE /api/trading/positions/:symbol - Drop a position outright
//! - POST   /api/trading/positions/purge  - Purge zero-quantity entries

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::services::{dashboard_display, DashboardDisplay, LedgerError};
use crate::types::{DashboardData, PlaceOrderRequest, PriceTick, ResetRequest, Trade};
use crate::AppState;

/// Create trading router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/orders", post(place_order))
        .route("/ticks", post(push_ticks))
        .route("/reset", post(reset_account))
        .route("/positions/:symbol", delete(delete_position))
        .route("/positions/purge", post(purge_positions))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Dashboard snapshot plus its formatted headline figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub data: DashboardData,
    pub display: DashboardDisplay,
}

/// Convert LedgerError to HTTP response.
impl IntoResponse for LedgerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            LedgerError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            LedgerError::InsufficientPosition { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_POSITION")
            }
            LedgerError::InvalidOrder(_) => (StatusCode::BAD_REQUEST, "INVALID_ORDER"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/trading/dashboard
///
/// Read-only snapshot; never mutates the ledger.
async fn get_dashboard(State(state): State<AppState>) -> Json<ApiResponse<DashboardResponse>> {
    let data = state.ledger.dashboard_data();
    let display = dashboard_display(&data);
    Json(ApiResponse {
        data: DashboardResponse { data, display },
    })
}

/// POST /api/trading/orders
async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<ApiResponse<Trade>>, LedgerError> {
    let trade = state.ledger.execute_order(
        &request.symbol,
        request.side,
        request.price,
        request.quantity,
    )?;
    Ok(Json(ApiResponse { data: trade }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickResponse {
    pub updated: usize,
}

/// POST /api/trading/ticks
///
/// One batch per update cycle; held symbols are marked to market, unheld
/// symbols are ignored.
async fn push_ticks(
    State(state): State<AppState>,
    Json(ticks): Json<Vec<PriceTick>>,
) -> Result<Json<ApiResponse<TickResponse>>, AppError> {
    if ticks.iter().any(|t| !t.price.is_finite() || t.price <= 0.0) {
        return Err(AppError::BadRequest(
            "tick prices must be positive numbers".to_string(),
        ));
    }

    let updated = state.ledger.update_market_prices(&ticks);
    Ok(Json(ApiResponse {
        data: TickResponse { updated },
    }))
}

/// POST /api/trading/reset
///
/// Destructive: replaces the account with a fresh zero-history state.
async fn reset_account(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Json<ApiResponse<DashboardResponse>> {
    let initial_capital = request
        .initial_capital
        .unwrap_or(state.config.initial_capital);
    let currency = request
        .currency
        .unwrap_or_else(|| state.config.currency.clone());

    state.ledger.reset(initial_capital, &currency);

    let data = state.ledger.dashboard_data();
    let display = dashboard_display(&data);
    Json(ApiResponse {
        data: DashboardResponse { data, display },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub purged: usize,
}

/// DELETE /api/trading/positions/:symbol
async fn delete_position(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.ledger.delete_position(&symbol) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no position in {}", symbol)))
    }
}

/// POST /api/trading/positions/purge
async fn purge_positions(State(state): State<AppState>) -> Json<ApiResponse<PurgeResponse>> {
    let purged = state.ledger.purge_zero_positions();
    Json(ApiResponse {
        data: PurgeResponse { purged },
    })
}
