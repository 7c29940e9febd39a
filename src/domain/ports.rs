use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::DomainError;
use super::events::OrderEvent;
use super::notification::Notification;
use super::order::{
    AcceptOutcome, DeliveryPerformance, EmployerDashboard, NewOrder, NewRating, Order,
    OrderChange, OrderFilter, Rating, StoreLocation, UserAccount,
};
use super::outbox::OutboxMessage;

pub trait OrderRepository: Send + Sync + 'static {
    /// Persist the order, all of its items and `events` in one transaction.
    fn create(&self, order: &NewOrder, events: &[OrderEvent]) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError>;

    /// Lock the order, let `decide` inspect it and apply the returned change
    /// together with its events. `Ok(None)` means the order does not exist;
    /// a `None` decision leaves the order untouched.
    fn modify<F>(&self, id: Uuid, decide: F) -> Result<Option<Order>, DomainError>
    where
        F: FnOnce(&Order) -> Result<Option<OrderChange>, DomainError>;

    /// Conditionally bind `employer_id` to the order: succeeds only while the
    /// order is unassigned (or already theirs) and in an acceptable status.
    fn try_accept(
        &self,
        order_id: Uuid,
        employer_id: Uuid,
        events: &[OrderEvent],
    ) -> Result<AcceptOutcome, DomainError>;

    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    fn find_rating(&self, order_id: Uuid) -> Result<Option<Rating>, DomainError>;

    /// Insert the rating, flag the order as rated and refresh the store's
    /// aggregates. A second rating for the same order yields `Conflict`.
    fn insert_rating(&self, rating: &NewRating, events: &[OrderEvent])
        -> Result<Rating, DomainError>;

    /// Order counters for one courier; `today` is a UTC calendar day.
    fn employer_dashboard(&self, employer_id: Uuid, today: NaiveDate)
        -> Result<EmployerDashboard, DomainError>;

    /// Delivered-order counters and the mean accepted-to-delivered time.
    fn delivery_performance(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<DeliveryPerformance, DomainError>;
}

/// Read access to users, stores and products owned by other services, plus
/// the courier location column.
pub trait Directory: Send + Sync + 'static {
    fn find_user(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError>;
    fn find_store(&self, id: Uuid) -> Result<Option<StoreLocation>, DomainError>;
    /// Ids from `ids` that do not reference an existing product.
    fn missing_products(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError>;
    /// Last-writer-wins overwrite of a user's position.
    fn record_location(&self, user_id: Uuid, latitude: f64, longitude: f64)
        -> Result<(), DomainError>;
}

pub trait OutboxStore: Send + Sync + 'static {
    fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError>;
    fn mark_dispatched(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait NotificationSink: Send + Sync + 'static {
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DomainError>> + Send;
}

impl<T: OrderRepository> OrderRepository for std::sync::Arc<T> {
    fn create(&self, order: &NewOrder, events: &[OrderEvent]) -> Result<Order, DomainError> {
        (**self).create(order, events)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        (**self).list(filter)
    }

    fn modify<F>(&self, id: Uuid, decide: F) -> Result<Option<Order>, DomainError>
    where
        F: FnOnce(&Order) -> Result<Option<OrderChange>, DomainError>,
    {
        (**self).modify(id, decide)
    }

    fn try_accept(
        &self,
        order_id: Uuid,
        employer_id: Uuid,
        events: &[OrderEvent],
    ) -> Result<AcceptOutcome, DomainError> {
        (**self).try_accept(order_id, employer_id, events)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).delete(id)
    }

    fn find_rating(&self, order_id: Uuid) -> Result<Option<Rating>, DomainError> {
        (**self).find_rating(order_id)
    }

    fn insert_rating(
        &self,
        rating: &NewRating,
        events: &[OrderEvent],
    ) -> Result<Rating, DomainError> {
        (**self).insert_rating(rating, events)
    }

    fn employer_dashboard(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<EmployerDashboard, DomainError> {
        (**self).employer_dashboard(employer_id, today)
    }

    fn delivery_performance(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<DeliveryPerformance, DomainError> {
        (**self).delivery_performance(employer_id, today)
    }
}

impl<T: Directory> Directory for std::sync::Arc<T> {
    fn find_user(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        (**self).find_user(id)
    }

    fn find_store(&self, id: Uuid) -> Result<Option<StoreLocation>, DomainError> {
        (**self).find_store(id)
    }

    fn missing_products(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        (**self).missing_products(ids)
    }

    fn record_location(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), DomainError> {
        (**self).record_location(user_id, latitude, longitude)
    }
}

impl<T: OutboxStore> OutboxStore for std::sync::Arc<T> {
    fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError> {
        (**self).pending(limit)
    }

    fn mark_dispatched(&self, id: Uuid) -> Result<(), DomainError> {
        (**self).mark_dispatched(id)
    }
}
