use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::{AssignmentSource, OrderEvent};
use crate::domain::notification::{Notification, ADMIN_TOPIC};
use crate::domain::outbox::OutboxMessage;
use crate::domain::ports::{Directory, NotificationSink, OutboxStore};
use crate::domain::status::OrderStatus;

/// Who an event's notifications should reach, resolved from the directory.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    pub customer_token: Option<String>,
    pub employer_name: Option<String>,
    pub employer_token: Option<String>,
}

/// Drains the order outbox and fans events out as push notifications.
///
/// Delivery is best effort: a failed send is logged and the outbox row is
/// still marked dispatched, so notification outages never block or fail the
/// order workflow.
pub struct NotificationDispatcher<O, D, S> {
    outbox: Arc<O>,
    directory: Arc<D>,
    sink: S,
    batch_size: i64,
}

impl<O, D, S> NotificationDispatcher<O, D, S>
where
    O: OutboxStore,
    D: Directory,
    S: NotificationSink,
{
    pub fn new(outbox: Arc<O>, directory: Arc<D>, sink: S, batch_size: i64) -> Self {
        Self {
            outbox,
            directory,
            sink,
            batch_size: batch_size.max(1),
        }
    }

    /// Process one batch; returns how many outbox rows were consumed.
    pub async fn run_once(&self) -> Result<usize, DomainError> {
        let outbox = Arc::clone(&self.outbox);
        let limit = self.batch_size;
        let messages = blocking(move || outbox.pending(limit)).await?;
        let count = messages.len();

        for message in messages {
            self.dispatch(&message).await;
            let outbox = Arc::clone(&self.outbox);
            let id = message.id;
            blocking(move || outbox.mark_dispatched(id)).await?;
        }
        Ok(count)
    }

    pub async fn run(self, interval: Duration) {
        let mut timer = tokio::time::interval(interval);
        loop {
            timer.tick().await;
            match self.run_once().await {
                Ok(0) => {}
                Ok(n) => log::debug!("Dispatched {} outbox event(s)", n),
                Err(e) => log::error!("Notification dispatcher error: {}", e),
            }
        }
    }

    async fn dispatch(&self, message: &OutboxMessage) {
        let event = match message.decode() {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Skipping outbox event {}: {}", message.id, e);
                return;
            }
        };
        let recipients = match self.recipients(&event).await {
            Ok(recipients) => recipients,
            Err(e) => {
                log::warn!(
                    "Could not resolve recipients for {} {}: {}",
                    event.event_type(),
                    event.order_id(),
                    e
                );
                Recipients::default()
            }
        };

        for notification in notifications_for(&event, &recipients) {
            if let Err(e) = self.sink.send(&notification).await {
                log::warn!(
                    "Failed to send {} notification for order {}: {}",
                    event.event_type(),
                    event.order_id(),
                    e
                );
            }
        }
    }

    async fn recipients(&self, event: &OrderEvent) -> Result<Recipients, DomainError> {
        let (customer_id, employer_id) = match event {
            OrderEvent::OrderCreated { customer_id, .. }
            | OrderEvent::OrderRated { customer_id, .. } => (Some(*customer_id), None),
            OrderEvent::OrderAssigned {
                customer_id,
                employer_id,
                ..
            } => (Some(*customer_id), Some(*employer_id)),
            OrderEvent::StatusChanged {
                customer_id,
                employer_id,
                ..
            }
            | OrderEvent::OrderDelivered {
                customer_id,
                employer_id,
                ..
            } => (Some(*customer_id), *employer_id),
        };

        let directory = Arc::clone(&self.directory);
        blocking(move || {
            let lookup = |id: Option<Uuid>| match id {
                Some(id) => directory.find_user(id),
                None => Ok(None),
            };
            let customer = lookup(customer_id)?;
            let employer = lookup(employer_id)?;
            Ok(Recipients {
                customer_token: customer.and_then(|c| c.device_token),
                employer_name: employer.as_ref().map(|e| e.name.clone()),
                employer_token: employer.and_then(|e| e.device_token),
            })
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}

fn progress_message(order_id: Uuid, status: OrderStatus) -> String {
    match status {
        OrderStatus::PickedUp => format!("Order #{order_id} has been picked up from the store"),
        OrderStatus::OnTheWay => format!("Order #{order_id} is on the way to you"),
        OrderStatus::Arrived => "Your delivery has arrived at the location".to_string(),
        OrderStatus::Delivered => format!("Order #{order_id} has been delivered successfully"),
        OrderStatus::Cancelled => format!("Order #{order_id} has been cancelled"),
        other => format!("Order #{order_id} is now {other}"),
    }
}

/// Map a domain event to the notifications it should produce.
pub fn notifications_for(event: &OrderEvent, to: &Recipients) -> Vec<Notification> {
    let mut out = Vec::new();
    let employer_name = to.employer_name.as_deref().unwrap_or("a delivery person");

    match event {
        OrderEvent::OrderCreated {
            order_id, total, ..
        } => {
            out.push(
                Notification::to_topic(
                    ADMIN_TOPIC,
                    "New Order",
                    format!("Order #{order_id} has been placed (total {total})"),
                )
                .with("type", "new_order")
                .with("order_id", order_id)
                .with("screen", "orders"),
            );
        }
        OrderEvent::OrderAssigned {
            order_id,
            source: AssignmentSource::Admin,
            ..
        } => {
            if let Some(token) = &to.employer_token {
                out.push(
                    Notification::to_device(
                        token,
                        "New Order Assigned",
                        format!("You have been assigned order #{order_id}"),
                    )
                    .with("type", "order_assigned")
                    .with("order_id", order_id)
                    .with("screen", "orders"),
                );
            }
        }
        OrderEvent::OrderAssigned {
            order_id,
            source: AssignmentSource::SelfAccept,
            ..
        } => {
            out.push(
                Notification::to_topic(
                    ADMIN_TOPIC,
                    "Order Accepted by Delivery Person",
                    format!("Order #{order_id} accepted by {employer_name}"),
                )
                .with("type", "order_accepted")
                .with("order_id", order_id)
                .with("employer_name", employer_name)
                .with("screen", "orders"),
            );
            if let Some(token) = &to.customer_token {
                out.push(
                    Notification::to_device(
                        token,
                        "Order Accepted",
                        format!(
                            "Your order #{order_id} has been accepted and will be delivered soon"
                        ),
                    )
                    .with("type", "order_accepted")
                    .with("order_id", order_id)
                    .with("employer_name", employer_name)
                    .with("screen", "order_tracking"),
                );
            }
        }
        // Acceptance and delivery have dedicated events.
        OrderEvent::StatusChanged {
            to: OrderStatus::Accepted | OrderStatus::Delivered,
            ..
        } => {}
        OrderEvent::StatusChanged {
            order_id,
            to: status,
            ..
        } => {
            if let Some(token) = &to.customer_token {
                out.push(
                    Notification::to_device(
                        token,
                        "Order Status Update",
                        progress_message(*order_id, *status),
                    )
                    .with("type", "delivery_status_update")
                    .with("order_id", order_id)
                    .with("status", status)
                    .with("screen", "order_tracking"),
                );
            }
            out.push(
                Notification::to_topic(
                    ADMIN_TOPIC,
                    format!("Order #{order_id} Status Update"),
                    format!("Status changed to: {status} by {employer_name}"),
                )
                .with("type", "delivery_progress")
                .with("order_id", order_id)
                .with("status", status)
                .with("screen", "orders"),
            );
        }
        OrderEvent::OrderDelivered { order_id, .. } => {
            if let Some(token) = &to.customer_token {
                out.push(
                    Notification::to_device(
                        token,
                        "Order Delivered",
                        progress_message(*order_id, OrderStatus::Delivered),
                    )
                    .with("type", "order_delivered")
                    .with("order_id", order_id)
                    .with("screen", "rate_order"),
                );
            }
            out.push(
                Notification::to_topic(
                    ADMIN_TOPIC,
                    "Order Delivered",
                    format!("Order #{order_id} delivered by {employer_name}"),
                )
                .with("type", "order_delivered")
                .with("order_id", order_id)
                .with("screen", "orders"),
            );
        }
        OrderEvent::OrderRated {
            order_id, score, ..
        } => {
            out.push(
                Notification::to_topic(
                    ADMIN_TOPIC,
                    "New Rating",
                    format!("Order #{order_id} was rated {score}/5"),
                )
                .with("type", "order_rated")
                .with("order_id", order_id)
                .with("screen", "ratings"),
            );
        }
    }
    out
}
