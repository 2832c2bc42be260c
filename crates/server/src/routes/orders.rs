//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cafe_lagune_core::{NotificationPreference, OrderId, OrderStatus, Price, ProductId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{OptionalAuth, RequireAdmin, RequireAuth};
use crate::models::OrderDetails;
use crate::services::notify::NotificationChannel;
use crate::services::orders::{CreateOrderInput, OrderService, RequestedItem};
use crate::state::AppState;

/// Shown to the client; the kitchen has no say in it yet.
const ESTIMATED_PREP_TIME: &str = "15-20 minutes";

/// One requested line on the wire. A line either references a catalog
/// product by id, or carries a name and price for an off-menu request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireItem {
    #[serde(rename_all = "camelCase")]
    Catalog { product_id: ProductId, quantity: i64 },
    #[serde(rename_all = "camelCase")]
    AdHoc {
        product_name: String,
        price: Price,
        quantity: i64,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
}

impl From<WireItem> for RequestedItem {
    fn from(item: WireItem) -> Self {
        match item {
            WireItem::Catalog {
                product_id,
                quantity,
            } => Self::Catalog {
                product_id,
                quantity,
            },
            WireItem::AdHoc {
                product_name,
                price,
                quantity,
                description,
                image,
                category,
            } => Self::AdHoc {
                name: product_name,
                price,
                quantity,
                description,
                image_url: image,
                category,
            },
        }
    }
}

/// Order creation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    #[serde(default)]
    pub items: Vec<WireItem>,
    pub notes: Option<String>,
    pub source: Option<String>,
    /// Kept as a raw string so an unknown value fails with a 400, not a
    /// deserialization rejection.
    pub notification_preference: Option<String>,
}

/// Extra information the frontend shows alongside the created order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub notification_channels: Vec<NotificationChannel>,
    pub unavailable_products: Vec<String>,
    pub estimated_prep_time: &'static str,
}

/// 201 response body: the order details plus response metadata.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    #[serde(flatten)]
    pub details: OrderDetails,
    #[serde(rename = "_metadata")]
    pub metadata: ResponseMetadata,
}

/// POST /api/orders
#[instrument(skip_all, fields(items = req.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let notification_preference = req
        .notification_preference
        .as_deref()
        .map(str::parse::<NotificationPreference>)
        .transpose()
        .map_err(|err| {
            AppError::Validation(format!("Préférence de notification invalide : {}", err.value))
        })?
        .unwrap_or_default();

    let input = CreateOrderInput {
        customer_name: req.customer_name,
        customer_phone: req.customer_phone,
        customer_email: req.customer_email,
        customer_address: req.customer_address,
        items: req.items.into_iter().map(RequestedItem::from).collect(),
        notes: req.notes,
        source: req.source,
        notification_preference,
    };

    let created = OrderService::new(state.pool(), state.dispatcher())
        .create(user.as_ref(), input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            details: created.details,
            metadata: ResponseMetadata {
                notification_channels: created.channels,
                unavailable_products: created.unavailable,
                estimated_prep_time: ESTIMATED_PREP_TIME,
            },
        }),
    ))
}

/// GET /api/orders/{id}
///
/// Admins can read any order; a signed-in customer only their own.
/// Orders the caller may not see are indistinguishable from missing ones.
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetails>> {
    let id = OrderId::new(id);
    let details = OrderRepository::new(state.pool())
        .get_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("commande {id}")))?;

    if !user.role.is_admin() && details.order.user_id != Some(user.id) {
        return Err(AppError::NotFound(format!("commande {id}")));
    }

    Ok(Json(details))
}

/// Order update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// Raw status string, parsed in the handler so an unknown value gets a
    /// 400 with the usual JSON error body.
    pub status: Option<String>,
    pub notes: Option<String>,
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse()
        .map_err(|err: cafe_lagune_core::ParseEnumError| {
            AppError::Validation(format!("Statut invalide : {}", err.value))
        })
}

/// PATCH /api/orders/{id}
#[instrument(skip_all, fields(order_id = id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderDetails>> {
    if req.status.is_none() && req.notes.is_none() {
        return Err(AppError::Validation(
            "Aucune modification demandée".to_owned(),
        ));
    }

    let status = req.status.as_deref().map(parse_status).transpose()?;

    let details = OrderRepository::new(state.pool())
        .update(OrderId::new(id), status, req.notes.as_deref())
        .await?;

    Ok(Json(details))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/admin/orders
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderDetails>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = OrderRepository::new(state.pool()).list(status).await?;
    Ok(Json(orders))
}
