//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Order, OrderLine, PlaceOrder, RequestedLine};
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;
use crate::identity::AuthenticatedCaller;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub products: Vec<OrderProductRequest>,
}

#[derive(Deserialize)]
pub struct OrderProductRequest {
    pub id: String,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub number: String,
    pub total: i64,
    pub invoice_url: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub number: String,
    pub customer_id: String,
    pub status: String,
    pub recipient_name: String,
    pub address: String,
    pub phone_number: String,
    pub notes: Option<String>,
    pub total: i64,
    pub invoice_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i64,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            product_name: line.product_name.clone(),
            unit_price: line.unit_price.minor(),
            quantity: i64::from(line.quantity),
        }
    }
}

impl OrderResponse {
    fn new(order: Order, lines: &[OrderLine]) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.number.as_str().to_string(),
            customer_id: order.customer_id.to_string(),
            status: order.status.as_str().to_string(),
            recipient_name: order.recipient_name,
            address: order.address,
            phone_number: order.phone,
            notes: order.notes,
            total: order.total.minor(),
            invoice_url: order.invoice.map(|invoice| invoice.url),
            expires_at: order.expires_at,
            paid_at: order.paid_at,
            created_at: order.created_at,
            lines: lines.iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the calling customer.
#[tracing::instrument(skip(state, caller, req))]
pub async fn create<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    if req.address.trim().is_empty() {
        return Err(ApiError::BadRequest("address is required".to_string()));
    }
    if req.phone_number.trim().is_empty() {
        return Err(ApiError::BadRequest("phone_number is required".to_string()));
    }

    let lines = req
        .products
        .into_iter()
        .map(|p| RequestedLine::new(p.id, p.quantity))
        .collect();
    let notes = req.notes.filter(|n| !n.trim().is_empty());
    let command = PlaceOrder::new(req.address, req.phone_number, notes, lines);

    let placed = state.orchestrator.place_order(&caller, command).await?;

    let response = OrderCreatedResponse {
        order_id: placed.order_id.to_string(),
        number: placed.number.as_str().to_string(),
        total: placed.total.minor(),
        invoice_url: placed.invoice_url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders/{id} — load an order with its lines.
///
/// Customers only see their own orders; admins see every order.
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::parse(&id)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid order ID: {id}")))?;
    let not_found = || ApiError::NotFound(format!("Order {id} not found"));

    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(not_found)?;
    if !caller.is_admin() && !order.is_owned_by(&caller.subject_id) {
        return Err(not_found());
    }

    let lines = state.store.get_order_lines(order_id).await?;
    Ok(Json(OrderResponse::new(order, &lines)))
}
