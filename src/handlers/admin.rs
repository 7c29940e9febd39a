use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::{OrderFilter, Principal};
use crate::errors::AppError;
use crate::AppOrderService;

use super::dto::{parse_status, MessageResponse, OrderEnvelope, OrderListResponse, OrderResponse};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminOrdersQuery {
    /// Exact status, e.g. "on_the_way".
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    /// Inclusive lower bound on the creation date (YYYY-MM-DD).
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date; must not precede `from_date`.
    pub to_date: Option<NaiveDate>,
    /// Only orders touched at or after this instant (RFC 3339).
    pub updated_since: Option<DateTime<Utc>>,
}

impl AdminOrdersQuery {
    fn into_filter(self) -> Result<OrderFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_status)
            .transpose()?;
        Ok(OrderFilter {
            status,
            customer_id: self.customer_id,
            from_date: self.from_date,
            to_date: self.to_date,
            updated_since: self.updated_since,
            ..OrderFilter::default()
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignEmployerRequest {
    pub employer_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    params(AdminOrdersQuery),
    responses(
        (status = 200, description = "Filtered orders, newest first", body = OrderListResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 422, description = "Invalid filter"),
    ),
    tag = "admin"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    principal: Principal,
    query: web::Query<AdminOrdersQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;

    let orders = web::block(move || service.admin_orders(&principal, &filter))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderListResponse::from(orders)))
}

#[utoipa::path(
    get,
    path = "/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.admin_order(&principal, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /admin/orders/{id}/assign
///
/// Binds a courier to the order, replacing any previous assignment.
#[utoipa::path(
    put,
    path = "/admin/orders/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = AssignEmployerRequest,
    responses(
        (status = 200, description = "Employer assigned", body = OrderEnvelope),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Selected user is not an employer"),
    ),
    tag = "admin"
)]
pub async fn assign_employer(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<AssignEmployerRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let employer_id = body.employer_id;

    let order = web::block(move || service.assign_employer(&principal, order_id, employer_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderEnvelope::new(
        "Employer assigned successfully.",
        order,
    )))
}

#[utoipa::path(
    delete,
    path = "/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order and its items deleted", body = MessageResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn delete_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || service.delete_order(&principal, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Order deleted successfully.".to_string(),
    }))
}
