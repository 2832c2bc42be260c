//! Self-service order tracking by phone number.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cafe_lagune_core::Phone;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::OrderDetails;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub orders: Vec<OrderDetails>,
}

/// POST /api/orders/track
///
/// Matches on the last digits of the number so callers find their orders
/// whether or not they typed the country prefix. Returns an empty list,
/// not an error, when nothing matches.
#[instrument(skip_all)]
pub async fn track(
    State(state): State<AppState>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TrackResponse>> {
    let Some(fragment) = Phone::search_fragment(&req.phone) else {
        return Err(AppError::Validation(
            "Numéro de téléphone invalide".to_owned(),
        ));
    };

    let orders = OrderRepository::new(state.pool())
        .find_by_phone_fragment(&fragment)
        .await?;

    Ok(Json(TrackResponse { orders }))
}
