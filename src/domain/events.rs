use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::Role;
use super::status::OrderStatus;

pub const AGGREGATE_TYPE: &str = "Order";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Admin,
    SelfAccept,
}

/// Domain events written to the outbox alongside the state change that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderCreated {
        order_id: Uuid,
        customer_id: Uuid,
        store_id: Uuid,
        total: String,
        item_count: usize,
    },
    OrderAssigned {
        order_id: Uuid,
        customer_id: Uuid,
        employer_id: Uuid,
        source: AssignmentSource,
    },
    StatusChanged {
        order_id: Uuid,
        customer_id: Uuid,
        employer_id: Option<Uuid>,
        from: OrderStatus,
        to: OrderStatus,
        changed_by: Role,
    },
    OrderDelivered {
        order_id: Uuid,
        customer_id: Uuid,
        employer_id: Option<Uuid>,
    },
    OrderRated {
        order_id: Uuid,
        customer_id: Uuid,
        store_id: Uuid,
        score: i16,
    },
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "OrderCreated",
            OrderEvent::OrderAssigned { .. } => "OrderAssigned",
            OrderEvent::StatusChanged { .. } => "StatusChanged",
            OrderEvent::OrderDelivered { .. } => "OrderDelivered",
            OrderEvent::OrderRated { .. } => "OrderRated",
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::OrderCreated { order_id, .. }
            | OrderEvent::OrderAssigned { order_id, .. }
            | OrderEvent::StatusChanged { order_id, .. }
            | OrderEvent::OrderDelivered { order_id, .. }
            | OrderEvent::OrderRated { order_id, .. } => *order_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_type_tag() {
        let order_id = Uuid::new_v4();
        let event = OrderEvent::StatusChanged {
            order_id,
            customer_id: Uuid::new_v4(),
            employer_id: None,
            from: OrderStatus::Accepted,
            to: OrderStatus::PickedUp,
            changed_by: Role::Employer,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["from"], "accepted");
        assert_eq!(json["to"], "picked_up");
        assert_eq!(json["changed_by"], "employer");

        let back: OrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.order_id(), order_id);
        assert_eq!(back.event_type(), "StatusChanged");
    }
}
