use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;
use super::order::Role;

/// Every value the `orders.status` column can hold.
///
/// Admins and couriers historically used two different vocabularies for the
/// same column (`pending → confirmed → preparing → on_the_way → delivered` and
/// `accepted → picked_up → on_the_way → arrived → delivered`). Both live in
/// this single enum and are tied together by [`OrderStatus::allowed_targets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Accepted,
    PickedUp,
    OnTheWay,
    Arrived,
    Delivered,
    Cancelled,
}

/// Statuses a courier may write through the delivery-status endpoint.
pub const EMPLOYER_STATUS_UPDATES: [OrderStatus; 4] = [
    OrderStatus::PickedUp,
    OrderStatus::OnTheWay,
    OrderStatus::Arrived,
    OrderStatus::Delivered,
];

/// Statuses counting as a courier's in-progress delivery.
pub const ACTIVE_DELIVERY: [OrderStatus; 4] = [
    OrderStatus::Accepted,
    OrderStatus::PickedUp,
    OrderStatus::OnTheWay,
    OrderStatus::Arrived,
];

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Accepted,
        OrderStatus::PickedUp,
        OrderStatus::OnTheWay,
        OrderStatus::Arrived,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Accepted => "accepted",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::OnTheWay => "on_the_way",
            OrderStatus::Arrived => "arrived",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The transition table. Terminal states have no outgoing edges.
    pub fn allowed_targets(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Preparing, Accepted, Cancelled],
            Confirmed => &[Preparing, Accepted, Cancelled],
            Preparing => &[Accepted, OnTheWay, Cancelled],
            Accepted => &[PickedUp, OnTheWay, Cancelled],
            PickedUp => &[OnTheWay, Arrived, Delivered, Cancelled],
            OnTheWay => &[Arrived, Delivered, Cancelled],
            Arrived => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Whether a courier may self-accept an order sitting in this status.
    pub fn accepts_courier(self) -> bool {
        self == OrderStatus::Accepted || self.can_transition_to(OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation("status", "The selected status is invalid."))
    }
}

/// Outcome of checking a requested status change against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order already has the requested status; nothing is written.
    Unchanged,
    Apply { from: OrderStatus, to: OrderStatus },
}

/// Decide whether `role` may move an order from `from` to `to`.
///
/// Ownership (the order being assigned to the courier) is checked by the
/// caller; this only covers vocabulary and the transition table.
pub fn check_transition(
    role: Role,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<Transition, DomainError> {
    match role {
        Role::Customer => {
            return Err(DomainError::Forbidden(
                "Customers cannot change order status.".to_string(),
            ))
        }
        Role::Employer if !EMPLOYER_STATUS_UPDATES.contains(&to) => {
            return Err(DomainError::validation(
                "status",
                "The selected status is invalid.",
            ))
        }
        Role::Employer | Role::Admin => {}
    }

    if from == to {
        return Ok(Transition::Unchanged);
    }
    if !from.can_transition_to(to) {
        return Err(DomainError::InvalidTransition { from, to });
    }
    Ok(Transition::Apply { from, to })
}
