use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::api::{state::AppState, types::*};
use crate::market::{ConsumerFilter, GridFilter, ListingForm};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// GET /api/farmers
pub async fn get_farmers(
    State(state): State<AppState>,
    Query(filter): Query<GridFilter>,
) -> Json<FarmerGridResponse> {
    let cards = state.store.farmer_grid(&filter).await;
    Json(FarmerGridResponse {
        count: cards.len(),
        cards,
    })
}

/// POST /api/listings
pub async fn post_listing(
    State(state): State<AppState>,
    Json(form): Json<ListingForm>,
) -> std::result::Result<(StatusCode, Json<ListingCreated>), ApiError> {
    match state.store.post_listing(form).await {
        Ok(farmer) => {
            info!(farm = ?farmer.farm, "listing created");
            Ok((StatusCode::CREATED, Json(ListingCreated { ok: true, farmer })))
        }
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!(error = %e, "listing rejected");
            Err((status, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}

/// GET /api/consumers
pub async fn get_consumers(
    State(state): State<AppState>,
    Query(filter): Query<ConsumerFilter>,
) -> Json<ConsumersResponse> {
    let consumers = state.store.consumers(&filter).await;
    Json(ConsumersResponse {
        count: consumers.len(),
        consumers,
    })
}

/// GET /api/markets
pub async fn list_markets(State(state): State<AppState>) -> Json<MarketIndexResponse> {
    Json(MarketIndexResponse {
        markets: state.store.market_index(),
    })
}

/// GET /api/markets/:country
pub async fn get_market(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> std::result::Result<Json<MarketResponse>, ApiError> {
    state
        .store
        .market(&country)
        .map(|market| Json(MarketResponse { ok: true, market }))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("no market data for {}", country))),
            )
        })
}
