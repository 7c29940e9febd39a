//! In-memory adapters for exercising the application layer without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::OrderEvent;
use crate::domain::order::{
    AcceptOutcome, AccountStatus, DeliveryPerformance, DeliveryProof, EmployerDashboard, NewOrder,
    NewRating, Order, OrderChange, OrderFilter, OrderItem, OrderSort, OrderTimestamps, Rating,
    Role, StoreLocation, UserAccount,
};
use crate::domain::outbox::OutboxMessage;
use crate::domain::ports::{Directory, OrderRepository, OutboxStore};
use crate::domain::status::OrderStatus;

#[derive(Default)]
struct OrderState {
    orders: HashMap<Uuid, Order>,
    ratings: HashMap<Uuid, Rating>,
    events: Vec<OrderEvent>,
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<OrderState>,
}

impl InMemoryOrderRepository {
    pub fn get(&self, id: Uuid) -> Option<Order> {
        self.state.lock().unwrap().orders.get(&id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn events(&self) -> Vec<OrderEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Simulate the store row having been deleted.
    pub fn detach_store(&self, id: Uuid) {
        if let Some(order) = self.state.lock().unwrap().orders.get_mut(&id) {
            order.store_id = None;
        }
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn create(&self, order: &NewOrder, events: &[OrderEvent]) -> Result<Order, DomainError> {
        let now = Utc::now();
        let created = Order {
            id: order.id,
            customer_id: order.customer_id,
            store_id: Some(order.store_id),
            employer_id: None,
            address: order.address.clone(),
            latitude: order.latitude,
            longitude: order.longitude,
            status: OrderStatus::Pending,
            subtotal: order.subtotal.clone(),
            delivery_fee: order.delivery_fee.clone(),
            total: order.total.clone(),
            payment_method: order.payment_method.clone(),
            phone: order.phone.clone(),
            notes: order.notes.clone(),
            is_rated: false,
            delivery_position: None,
            proof: DeliveryProof::default(),
            timestamps: OrderTimestamps::default(),
            created_at: now,
            updated_at: now,
            items: order
                .items
                .iter()
                .map(|i| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    custom_name: i.custom_name.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price.clone(),
                    special_instructions: i.special_instructions.clone(),
                })
                .collect(),
        };
        let mut state = self.state.lock().unwrap();
        state.orders.insert(created.id, created.clone());
        state.events.extend_from_slice(events);
        Ok(created)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.get(id))
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        match filter.sort {
            OrderSort::NewestFirst => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            OrderSort::LatestDelivered => orders.sort_by(|a, b| {
                b.timestamps
                    .delivered_at
                    .cmp(&a.timestamps.delivered_at)
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let mut orders: Vec<Order> = orders.into_iter().skip(offset).collect();
        if let Some(limit) = filter.limit {
            orders.truncate(limit as usize);
        }
        Ok(orders)
    }

    fn modify<F>(&self, id: Uuid, decide: F) -> Result<Option<Order>, DomainError>
    where
        F: FnOnce(&Order) -> Result<Option<OrderChange>, DomainError>,
    {
        let mut state = self.state.lock().unwrap();
        let Some(order) = state.orders.get(&id).cloned() else {
            return Ok(None);
        };
        let Some(change) = decide(&order)? else {
            return Ok(Some(order));
        };
        let mut updated = order;
        updated.apply(&change, Utc::now());
        state.orders.insert(id, updated.clone());
        state.events.extend(change.events);
        Ok(Some(updated))
    }

    fn try_accept(
        &self,
        order_id: Uuid,
        employer_id: Uuid,
        events: &[OrderEvent],
    ) -> Result<AcceptOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(order) = state.orders.get_mut(&order_id) else {
            return Ok(AcceptOutcome::NotFound);
        };
        match order.employer_id {
            Some(owner) if owner != employer_id => return Ok(AcceptOutcome::TakenBy(owner)),
            Some(_) if order.status == OrderStatus::Accepted => {
                return Ok(AcceptOutcome::Accepted(order.clone()))
            }
            _ => {}
        }
        if !order.status.accepts_courier() {
            return Ok(AcceptOutcome::NotAcceptable(order.status));
        }
        let now = Utc::now();
        order.employer_id = Some(employer_id);
        order.status = OrderStatus::Accepted;
        order.timestamps.stamp(OrderStatus::Accepted, now);
        order.timestamps.assigned_at.get_or_insert(now);
        order.updated_at = now;
        let accepted = order.clone();
        state.events.extend_from_slice(events);
        Ok(AcceptOutcome::Accepted(accepted))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.ratings.remove(&id);
        Ok(state.orders.remove(&id).is_some())
    }

    fn find_rating(&self, order_id: Uuid) -> Result<Option<Rating>, DomainError> {
        Ok(self.state.lock().unwrap().ratings.get(&order_id).cloned())
    }

    fn insert_rating(
        &self,
        rating: &NewRating,
        events: &[OrderEvent],
    ) -> Result<Rating, DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.ratings.contains_key(&rating.order_id) {
            return Err(DomainError::Conflict(
                "You have already rated this order.".to_string(),
            ));
        }
        let now = Utc::now();
        let stored = Rating {
            id: rating.id,
            order_id: rating.order_id,
            customer_id: rating.customer_id,
            store_id: rating.store_id,
            score: rating.score,
            review: rating.review.clone(),
            created_at: now,
        };
        state.ratings.insert(rating.order_id, stored.clone());
        if let Some(order) = state.orders.get_mut(&rating.order_id) {
            order.is_rated = true;
            order.timestamps.rated_at = Some(now);
        }
        state.events.extend_from_slice(events);
        Ok(stored)
    }

    fn employer_dashboard(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<EmployerDashboard, DomainError> {
        let state = self.state.lock().unwrap();
        let mine: Vec<&Order> = state
            .orders
            .values()
            .filter(|o| o.employer_id == Some(employer_id))
            .collect();
        let count = |f: &dyn Fn(&Order) -> bool| mine.iter().filter(|o| f(o)).count() as i64;
        Ok(EmployerDashboard {
            total_orders: mine.len() as i64,
            pending_orders: count(&|o| o.status == OrderStatus::Pending),
            delivered_orders: count(&|o| o.status == OrderStatus::Delivered),
            today_orders: count(&|o| o.created_at.date_naive() == today),
        })
    }

    fn delivery_performance(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<DeliveryPerformance, DomainError> {
        let state = self.state.lock().unwrap();
        let delivered: Vec<&Order> = state
            .orders
            .values()
            .filter(|o| o.employer_id == Some(employer_id) && o.status == OrderStatus::Delivered)
            .collect();
        let today_count = delivered
            .iter()
            .filter(|o| o.timestamps.delivered_at.map(|t| t.date_naive()) == Some(today))
            .count() as i64;
        let minutes: Vec<f64> = delivered
            .iter()
            .filter_map(|o| Some(o.timestamps.delivered_at? - o.timestamps.accepted_at?))
            .map(|d| d.num_milliseconds() as f64 / 60_000.0)
            .collect();
        let avg = (!minutes.is_empty()).then(|| minutes.iter().sum::<f64>() / minutes.len() as f64);
        Ok(DeliveryPerformance::new(delivered.len() as i64, today_count, avg))
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<Uuid, UserAccount>>,
    stores: Mutex<HashMap<Uuid, StoreLocation>>,
    locations: Mutex<HashMap<Uuid, (f64, f64)>>,
}

impl InMemoryDirectory {
    pub fn add_user(&self, name: &str, role: Role, status: AccountStatus) -> Uuid {
        self.add_user_with_token(name, role, status, None)
    }

    pub fn add_user_with_token(
        &self,
        name: &str,
        role: Role,
        status: AccountStatus,
        device_token: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            id,
            UserAccount {
                id,
                name: name.to_string(),
                role,
                status,
                device_token: device_token.map(str::to_string),
            },
        );
        id
    }

    pub fn add_store(&self, name: &str, position: Option<(f64, f64)>) -> Uuid {
        let id = Uuid::new_v4();
        self.stores.lock().unwrap().insert(
            id,
            StoreLocation {
                id,
                name: name.to_string(),
                latitude: position.map(|p| p.0),
                longitude: position.map(|p| p.1),
            },
        );
        id
    }

    pub fn location(&self, user_id: Uuid) -> Option<(f64, f64)> {
        self.locations.lock().unwrap().get(&user_id).copied()
    }
}

impl Directory for InMemoryDirectory {
    fn find_user(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    fn find_store(&self, id: Uuid) -> Result<Option<StoreLocation>, DomainError> {
        Ok(self.stores.lock().unwrap().get(&id).cloned())
    }

    fn missing_products(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        // No catalog is modelled in memory: every referenced product is unknown.
        Ok(ids.to_vec())
    }

    fn record_location(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), DomainError> {
        self.locations
            .lock()
            .unwrap()
            .insert(user_id, (latitude, longitude));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOutbox {
    messages: Mutex<Vec<(OutboxMessage, bool)>>,
}

impl InMemoryOutbox {
    pub fn push(&self, event: &OrderEvent) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.lock().unwrap().push((
            OutboxMessage {
                id,
                event_type: event.event_type().to_string(),
                payload: serde_json::to_value(event).unwrap(),
                attempts: 0,
                created_at: Utc::now(),
            },
            false,
        ));
        id
    }

    pub fn push_raw(&self, payload: serde_json::Value) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.lock().unwrap().push((
            OutboxMessage {
                id,
                event_type: "Unknown".to_string(),
                payload,
                attempts: 0,
                created_at: Utc::now(),
            },
            false,
        ));
        id
    }

    pub fn undispatched(&self) -> usize {
        self.messages.lock().unwrap().iter().filter(|(_, d)| !d).count()
    }
}

impl OutboxStore for InMemoryOutbox {
    fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, dispatched)| !dispatched)
            .take(limit as usize)
            .map(|(m, _)| m.clone())
            .collect())
    }

    fn mark_dispatched(&self, id: Uuid) -> Result<(), DomainError> {
        for (message, dispatched) in self.messages.lock().unwrap().iter_mut() {
            if message.id == id {
                *dispatched = true;
                message.attempts += 1;
            }
        }
        Ok(())
    }
}
