use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{OrderItemInput, PlaceOrderInput, Principal};
use crate::errors::AppError;
use crate::AppOrderService;

use super::dto::{Amount, OrderEnvelope, OrderListResponse, OrderResponse, RatingResponse};

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    /// Unit price, as a decimal string ("9.99") or a JSON number.
    #[schema(value_type = String)]
    pub price: Amount,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub store_id: Uuid,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub items: Vec<OrderItemRequest>,
    #[schema(value_type = String)]
    pub delivery_fee: Amount,
    /// Optional; when present it must equal the server-computed total.
    #[schema(value_type = Option<String>)]
    pub total: Option<Amount>,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
}

impl PlaceOrderRequest {
    fn into_input(self) -> Result<PlaceOrderInput, AppError> {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                Ok(OrderItemInput {
                    product_id: item.product_id,
                    custom_name: item.custom_name,
                    quantity: item.quantity,
                    unit_price: item.price.to_decimal("price")?,
                    special_instructions: item.special_instructions,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(PlaceOrderInput {
            store_id: self.store_id,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            items,
            delivery_fee: self.delivery_fee.to_decimal("delivery_fee")?,
            total: self.total.map(|t| t.to_decimal("total")).transpose()?,
            payment_method: self.payment_method,
            phone: self.phone,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateOrderRequest {
    /// Score between 1 and 5.
    pub rating: i16,
    pub review: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order for the calling customer. The order, its items and the
/// `OrderCreated` outbox event are written in a single transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderEnvelope),
        (status = 401, description = "Missing principal"),
        (status = 403, description = "Caller is not a customer"),
        (status = 422, description = "Validation failed or store out of range"),
    ),
    tag = "customer"
)]
pub async fn place_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_input()?;

    let order = web::block(move || service.place_order(&principal, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderEnvelope::new("Order placed successfully.", order)))
}

/// GET /orders
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = OrderListResponse),
        (status = 403, description = "Caller is not a customer"),
    ),
    tag = "customer"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.customer_orders(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderListResponse::from(orders)))
}

/// GET /orders/{id}
///
/// Orders belonging to someone else are reported as missing.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found or not authorized"),
    ),
    tag = "customer"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.customer_order(&principal, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/rate
#[utoipa::path(
    post,
    path = "/orders/{id}/rate",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = RateOrderRequest,
    responses(
        (status = 201, description = "Rating stored", body = RatingResponse),
        (status = 400, description = "Already rated, or the store is missing"),
        (status = 404, description = "Order not found or not delivered"),
        (status = 422, description = "Rating outside 1..5 or review too long"),
    ),
    tag = "customer"
)]
pub async fn rate_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<RateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let RateOrderRequest { rating, review } = body.into_inner();

    let rating = web::block(move || service.rate_order(&principal, order_id, rating, review))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RatingResponse::from(rating)))
}
