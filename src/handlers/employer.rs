use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::order_service::DELIVERY_HISTORY_PAGE_SIZE;
use crate::domain::order::{DeliveryPerformance, DeliveryProof, EmployerDashboard, Principal};
use crate::errors::AppError;
use crate::AppOrderService;

use super::dto::{parse_status, MessageResponse, OrderEnvelope, OrderListResponse, OrderResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status, e.g. "picked_up".
    pub status: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DeliverRequest {
    /// Reference returned by the file store for the proof photo.
    pub delivery_proof: Option<String>,
    pub customer_signature: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveDeliveryResponse {
    pub active_order: Option<OrderResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub today_orders: i64,
}

impl From<EmployerDashboard> for DashboardStats {
    fn from(d: EmployerDashboard) -> Self {
        Self {
            total_orders: d.total_orders,
            pending_orders: d.pending_orders,
            delivered_orders: d.delivered_orders,
            today_orders: d.today_orders,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PerformanceStats {
    pub total_deliveries: i64,
    pub today_deliveries: i64,
    /// Mean minutes between acceptance and delivery.
    pub avg_delivery_time: f64,
}

impl From<DeliveryPerformance> for PerformanceStats {
    fn from(p: DeliveryPerformance) -> Self {
        Self {
            total_deliveries: p.total_deliveries,
            today_deliveries: p.today_deliveries,
            avg_delivery_time: p.avg_delivery_minutes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PerformanceResponse {
    pub stats: PerformanceStats,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// 1-based page number; defaults to 1.
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryHistoryResponse {
    pub orders: Vec<OrderResponse>,
    pub page: i64,
    pub per_page: i64,
}

#[utoipa::path(
    get,
    path = "/employer/orders",
    responses(
        (status = 200, description = "Orders assigned to the caller", body = OrderListResponse),
        (status = 403, description = "Caller is not an employer"),
    ),
    tag = "employer"
)]
pub async fn my_orders(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.employer_orders(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderListResponse::from(orders)))
}

/// GET /employer/orders/active
///
/// The caller's delivery in progress, if any.
#[utoipa::path(
    get,
    path = "/employer/orders/active",
    responses(
        (status = 200, description = "Current delivery or null", body = ActiveDeliveryResponse),
    ),
    tag = "employer"
)]
pub async fn active_delivery(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let order = web::block(move || service.active_delivery(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ActiveDeliveryResponse {
        active_order: order.map(OrderResponse::from),
    }))
}

/// POST /employer/orders/{id}/accept
///
/// Claims an unassigned order. When two couriers race, exactly one wins and
/// the other receives 400 "Order already assigned to another employer.".
#[utoipa::path(
    post,
    path = "/employer/orders/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order accepted", body = OrderEnvelope),
        (status = 400, description = "Order already assigned to another employer"),
        (status = 403, description = "Caller is not an approved employer"),
        (status = 404, description = "Order not found"),
    ),
    tag = "employer"
)]
pub async fn accept_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.accept_order(&principal, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderEnvelope::new("Order accepted successfully.", order)))
}

/// PUT|PATCH /employer/orders/{id}/status and /orders/{id}/status
///
/// Shared by couriers (delivery statuses on their own orders) and admins
/// (any transition allowed by the status table).
#[utoipa::path(
    put,
    path = "/employer/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderEnvelope),
        (status = 404, description = "Order not found or not assigned to you"),
        (status = 422, description = "Unknown status or illegal transition"),
    ),
    tag = "employer"
)]
pub async fn update_status(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = parse_status(&body.status)?;

    let order = web::block(move || service.update_status(&principal, order_id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderEnvelope::new(
        "Order status updated successfully.",
        order,
    )))
}

#[utoipa::path(
    post,
    path = "/employer/orders/{id}/deliver",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = DeliverRequest,
    responses(
        (status = 200, description = "Order delivered", body = OrderEnvelope),
        (status = 404, description = "Order not found or not assigned to you"),
        (status = 422, description = "Malformed body, overlong fields or illegal transition"),
    ),
    tag = "employer"
)]
pub async fn mark_delivered(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<DeliverRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let proof = DeliveryProof {
        delivery_proof: body.delivery_proof,
        customer_signature: body.customer_signature,
        delivery_notes: body.notes,
    };

    let order = web::block(move || service.mark_delivered(&principal, order_id, proof))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderEnvelope::new(
        "Order marked as delivered successfully.",
        order,
    )))
}

#[utoipa::path(
    get,
    path = "/employer/dashboard",
    responses(
        (status = 200, description = "Order counters for the caller", body = DashboardResponse),
        (status = 403, description = "Caller is not an employer"),
    ),
    tag = "employer"
)]
pub async fn dashboard(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let stats = web::block(move || service.employer_dashboard(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        stats: stats.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/employer/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Delivered orders, latest delivery first", body = DeliveryHistoryResponse),
        (status = 403, description = "Caller is not an employer"),
        (status = 422, description = "Invalid page"),
    ),
    tag = "employer"
)]
pub async fn delivery_history(
    service: web::Data<AppOrderService>,
    principal: Principal,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.into_inner().page.unwrap_or(1);
    let orders = web::block(move || service.delivery_history(&principal, page))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(DeliveryHistoryResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
        page,
        per_page: DELIVERY_HISTORY_PAGE_SIZE,
    }))
}

#[utoipa::path(
    get,
    path = "/employer/stats",
    responses(
        (status = 200, description = "Delivery performance of the caller", body = PerformanceResponse),
        (status = 403, description = "Caller is not an employer"),
    ),
    tag = "employer"
)]
pub async fn performance_stats(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let stats = web::block(move || service.delivery_performance(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(PerformanceResponse {
        stats: stats.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/employer/location",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Location stored", body = MessageResponse),
        (status = 422, description = "Invalid coordinates or unknown order"),
    ),
    tag = "employer"
)]
pub async fn update_location(
    service: web::Data<AppOrderService>,
    principal: Principal,
    body: web::Json<LocationRequest>,
) -> Result<HttpResponse, AppError> {
    let LocationRequest {
        latitude,
        longitude,
        order_id,
    } = body.into_inner();

    web::block(move || service.update_location(&principal, latitude, longitude, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Location updated successfully.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_body_fields_are_optional() {
        let body: DeliverRequest = serde_json::from_str("{}").expect("empty object");
        assert!(body.delivery_proof.is_none());

        let body: DeliverRequest =
            serde_json::from_str(r#"{"delivery_proof":"proofs/1.jpg"}"#).expect("partial body");
        assert_eq!(body.delivery_proof.as_deref(), Some("proofs/1.jpg"));
        assert!(body.notes.is_none());
    }

    #[test]
    fn malformed_deliver_body_is_an_error() {
        assert!(serde_json::from_str::<DeliverRequest>(r#"{"delivery_proof": 12"#).is_err());
        assert!(serde_json::from_str::<DeliverRequest>(r#"{"notes": ["a"]}"#).is_err());
    }
}
