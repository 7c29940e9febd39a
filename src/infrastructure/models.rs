use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    DeliveryProof, NewOrder, Order, OrderItem, OrderTimestamps, Rating, StoreLocation, UserAccount,
};
use crate::domain::status::OrderStatus;
use crate::schema::{order_items, order_outbox, orders, ratings, stores, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Option<Uuid>,
    pub employer_id: Option<Uuid>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
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
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        let status: OrderStatus = self.status.parse().map_err(|_| {
            DomainError::Internal(format!("order {} has unknown status '{}'", self.id, self.status))
        })?;
        let delivery_position = match (self.delivery_current_lat, self.delivery_current_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            store_id: self.store_id,
            employer_id: self.employer_id,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            status,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total: self.total,
            payment_method: self.payment_method,
            phone: self.phone,
            notes: self.notes,
            is_rated: self.is_rated,
            delivery_position,
            proof: DeliveryProof {
                delivery_proof: self.delivery_proof,
                customer_signature: self.customer_signature,
                delivery_notes: self.delivery_notes,
            },
            timestamps: OrderTimestamps {
                confirmed_at: self.confirmed_at,
                preparing_at: self.preparing_at,
                accepted_at: self.accepted_at,
                picked_up_at: self.picked_up_at,
                on_the_way_at: self.on_the_way_at,
                arrived_at: self.arrived_at,
                delivered_at: self.delivered_at,
                canceled_at: self.canceled_at,
                assigned_at: self.assigned_at,
                rated_at: self.rated_at,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items.into_iter().map(OrderItemRow::into_item).collect(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Option<Uuid>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
}

impl From<&NewOrder> for NewOrderRow {
    fn from(order: &NewOrder) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            store_id: Some(order.store_id),
            address: order.address.clone(),
            latitude: order.latitude,
            longitude: order.longitude,
            status: OrderStatus::Pending.as_str().to_string(),
            subtotal: order.subtotal.clone(),
            delivery_fee: order.delivery_fee.clone(),
            total: order.total.clone(),
            payment_method: order.payment_method.clone(),
            phone: order.phone.clone(),
            notes: order.notes.clone(),
        }
    }
}

/// Mutable part of an order, written back after a locked read-modify-write.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderChangeset {
    pub status: String,
    pub employer_id: Option<Uuid>,
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
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderChangeset {
    fn from(order: &Order) -> Self {
        let ts = &order.timestamps;
        Self {
            status: order.status.as_str().to_string(),
            employer_id: order.employer_id,
            delivery_current_lat: order.delivery_position.map(|p| p.0),
            delivery_current_lng: order.delivery_position.map(|p| p.1),
            delivery_proof: order.proof.delivery_proof.clone(),
            customer_signature: order.proof.customer_signature.clone(),
            delivery_notes: order.proof.delivery_notes.clone(),
            confirmed_at: ts.confirmed_at,
            preparing_at: ts.preparing_at,
            accepted_at: ts.accepted_at,
            picked_up_at: ts.picked_up_at,
            on_the_way_at: ts.on_the_way_at,
            arrived_at: ts.arrived_at,
            delivered_at: ts.delivered_at,
            canceled_at: ts.canceled_at,
            assigned_at: ts.assigned_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            product_id: self.product_id,
            custom_name: self.custom_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            special_instructions: self.special_instructions,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RatingRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub score: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            store_id: row.store_id,
            score: row.score,
            review: row.review,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ratings)]
pub struct NewRatingRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub score: i16,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub status: String,
    pub fcm_token: Option<String>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let invalid = |what: &str, value: &str| {
            DomainError::Internal(format!("user {} has unknown {} '{}'", row.id, what, value))
        };
        Ok(UserAccount {
            id: row.id,
            role: row.role.parse().map_err(|_| invalid("role", &row.role))?,
            status: row.status.parse().map_err(|_| invalid("status", &row.status))?,
            name: row.name,
            device_token: row.fcm_token,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stores)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoreRow {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<StoreRow> for StoreLocation {
    fn from(row: StoreRow) -> Self {
        StoreLocation {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub attempts: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
