use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem, Rating};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;

/// Money accepted either as a JSON string ("9.99") or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    pub fn to_decimal(&self, field: &'static str) -> Result<BigDecimal, AppError> {
        let raw = match self {
            Amount::Text(s) => s.trim().to_string(),
            Amount::Number(n) => n.to_string(),
        };
        BigDecimal::from_str(&raw)
            .map_err(|_| AppError::validation(field, format!("The {field} must be a number.")))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub special_instructions: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            custom_name: item.custom_name,
            quantity: item.quantity,
            price: item.unit_price.to_string(),
            special_instructions: item.special_instructions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Option<Uuid>,
    pub employer_id: Option<Uuid>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: OrderStatus,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
    pub is_rated: bool,
    pub delivery_current_lat: Option<f64>,
    pub delivery_current_lng: Option<f64>,
    pub delivery_proof: Option<String>,
    pub customer_signature: Option<String>,
    pub delivery_notes: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub on_the_way_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub rated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let ts = order.timestamps;
        Self {
            id: order.id,
            customer_id: order.customer_id,
            store_id: order.store_id,
            employer_id: order.employer_id,
            address: order.address,
            latitude: order.latitude,
            longitude: order.longitude,
            status: order.status,
            subtotal: order.subtotal.to_string(),
            delivery_fee: order.delivery_fee.to_string(),
            total: order.total.to_string(),
            payment_method: order.payment_method,
            phone: order.phone,
            notes: order.notes,
            is_rated: order.is_rated,
            delivery_current_lat: order.delivery_position.map(|p| p.0),
            delivery_current_lng: order.delivery_position.map(|p| p.1),
            delivery_proof: order.proof.delivery_proof,
            customer_signature: order.proof.customer_signature,
            delivery_notes: order.proof.delivery_notes,
            confirmed_at: ts.confirmed_at,
            preparing_at: ts.preparing_at,
            accepted_at: ts.accepted_at,
            picked_up_at: ts.picked_up_at,
            on_the_way_at: ts.on_the_way_at,
            arrived_at: ts.arrived_at,
            delivered_at: ts.delivered_at,
            canceled_at: ts.canceled_at,
            assigned_at: ts.assigned_at,
            rated_at: ts.rated_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub message: String,
    pub order: OrderResponse,
}

impl OrderEnvelope {
    pub fn new(message: &str, order: Order) -> Self {
        Self {
            message: message.to_string(),
            order: order.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
}

impl From<Vec<Order>> for OrderListResponse {
    fn from(orders: Vec<Order>) -> Self {
        Self {
            orders: orders.into_iter().map(OrderResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub store_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            order_id: rating.order_id,
            store_id: rating.store_id,
            rating: rating.score,
            review: rating.review,
            created_at: rating.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Parses a status name from a request body into the unified enum.
pub fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.trim()
        .parse::<OrderStatus>()
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_strings_and_numbers() {
        let text: Amount = serde_json::from_str("\"9.99\"").expect("text");
        let number: Amount = serde_json::from_str("9.99").expect("number");
        let expected = BigDecimal::from_str("9.99").expect("decimal");
        assert_eq!(text.to_decimal("price").expect("parse"), expected);
        assert_eq!(number.to_decimal("price").expect("parse"), expected);
    }

    #[test]
    fn garbage_amount_is_a_validation_error() {
        let amount = Amount::Text("free".to_string());
        let err = amount.to_decimal("delivery_fee").expect_err("must fail");
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "delivery_fee"));
    }
}
