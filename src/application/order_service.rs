use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::{AssignmentSource, OrderEvent};
use crate::domain::geo::{self, DeliveryRange};
use crate::domain::order::{
    AcceptOutcome, DeliveryPerformance, DeliveryProof, EmployerDashboard, NewRating, Order,
    OrderChange, OrderFilter, OrderSort, PlaceOrderInput, Principal, Rating, Role,
    MAX_DELIVERY_PROOF_LEN, MAX_NOTES_LEN,
};
use crate::domain::ports::{Directory, OrderRepository};
use crate::domain::status::{check_transition, OrderStatus, Transition, ACTIVE_DELIVERY};

const ALREADY_ASSIGNED: &str = "Order already assigned to another employer.";
const NOT_ASSIGNED_TO_YOU: &str = "Order not found or not assigned to you.";

pub const DELIVERY_HISTORY_PAGE_SIZE: i64 = 20;

/// Order lifecycle: placement, assignment, status progression and rating.
///
/// Every operation takes the caller explicitly; nothing is read from ambient
/// request state.
pub struct OrderService<R, D> {
    repo: R,
    directory: D,
    range: DeliveryRange,
}

impl<R: OrderRepository, D: Directory> OrderService<R, D> {
    pub fn new(repo: R, directory: D, range: DeliveryRange) -> Self {
        Self {
            repo,
            directory,
            range,
        }
    }

    // ── Customer ─────────────────────────────────────────────────────────────

    pub fn place_order(
        &self,
        principal: &Principal,
        input: PlaceOrderInput,
    ) -> Result<Order, DomainError> {
        principal.require_role(Role::Customer)?;
        input.validate()?;

        let store = self
            .directory
            .find_store(input.store_id)?
            .ok_or_else(|| DomainError::validation("store_id", "The selected store id is invalid."))?;
        let store_position = store.coordinates().ok_or_else(|| {
            DomainError::validation("store_id", "Store location is not available.")
        })?;
        let distance = self
            .range
            .check((input.latitude, input.longitude), store_position)?;

        let product_ids: Vec<Uuid> = input.items.iter().filter_map(|i| i.product_id).collect();
        if !product_ids.is_empty() && !self.directory.missing_products(&product_ids)?.is_empty() {
            return Err(DomainError::validation(
                "items",
                "The selected items product id is invalid.",
            ));
        }

        let new_order = input.into_new_order(Uuid::new_v4(), principal.id)?;
        let event = OrderEvent::OrderCreated {
            order_id: new_order.id,
            customer_id: principal.id,
            store_id: new_order.store_id,
            total: new_order.total.to_string(),
            item_count: new_order.items.len(),
        };
        let order = self.repo.create(&new_order, &[event])?;

        log::info!(
            "Order {} placed by customer {} at store {} ({:.2} km, total {})",
            order.id,
            principal.id,
            store.id,
            distance,
            order.total
        );
        Ok(order)
    }

    pub fn customer_orders(&self, principal: &Principal) -> Result<Vec<Order>, DomainError> {
        principal.require_role(Role::Customer)?;
        self.repo.list(&OrderFilter::for_customer(principal.id))
    }

    pub fn customer_order(&self, principal: &Principal, order_id: Uuid) -> Result<Order, DomainError> {
        principal.require_role(Role::Customer)?;
        self.repo
            .find_by_id(order_id)?
            .filter(|o| o.customer_id == principal.id)
            .ok_or_else(|| DomainError::not_found("Order not found or not authorized"))
    }

    /// Rating gate: one immutable rating per delivered order.
    pub fn rate_order(
        &self,
        principal: &Principal,
        order_id: Uuid,
        score: i16,
        review: Option<String>,
    ) -> Result<Rating, DomainError> {
        principal.require_role(Role::Customer)?;
        NewRating::validate_score(score)?;
        NewRating::validate_review(review.as_deref())?;

        let order = self
            .repo
            .find_by_id(order_id)?
            .filter(|o| o.customer_id == principal.id && o.status == OrderStatus::Delivered)
            .ok_or_else(|| DomainError::not_found("Order not found or not delivered."))?;

        let store_id = order.store_id.ok_or_else(|| {
            DomainError::InvalidState(
                "Cannot rate: store information is missing for this order.".to_string(),
            )
        })?;

        if order.is_rated || self.repo.find_rating(order_id)?.is_some() {
            return Err(DomainError::Conflict(
                "You have already rated this order.".to_string(),
            ));
        }

        let rating = NewRating {
            id: Uuid::new_v4(),
            order_id,
            customer_id: principal.id,
            store_id,
            score,
            review,
        };
        let event = OrderEvent::OrderRated {
            order_id,
            customer_id: principal.id,
            store_id,
            score,
        };
        let rating = self.repo.insert_rating(&rating, &[event])?;
        log::info!("Order {} rated {} by customer {}", order_id, score, principal.id);
        Ok(rating)
    }

    // ── Employer ─────────────────────────────────────────────────────────────

    pub fn employer_orders(&self, principal: &Principal) -> Result<Vec<Order>, DomainError> {
        principal.require_role(Role::Employer)?;
        self.repo.list(&OrderFilter::for_employer(principal.id))
    }

    pub fn active_delivery(&self, principal: &Principal) -> Result<Option<Order>, DomainError> {
        principal.require_role(Role::Employer)?;
        let filter = OrderFilter {
            statuses: Some(ACTIVE_DELIVERY.to_vec()),
            limit: Some(1),
            ..OrderFilter::for_employer(principal.id)
        };
        Ok(self.repo.list(&filter)?.into_iter().next())
    }

    pub fn employer_dashboard(&self, principal: &Principal) -> Result<EmployerDashboard, DomainError> {
        principal.require_role(Role::Employer)?;
        self.repo
            .employer_dashboard(principal.id, Utc::now().date_naive())
    }

    /// Delivered orders, most recent delivery first; `page` starts at 1.
    pub fn delivery_history(&self, principal: &Principal, page: i64) -> Result<Vec<Order>, DomainError> {
        principal.require_role(Role::Employer)?;
        if page < 1 {
            return Err(DomainError::validation("page", "The page must be at least 1."));
        }
        let offset = (page - 1)
            .checked_mul(DELIVERY_HISTORY_PAGE_SIZE)
            .ok_or_else(|| DomainError::validation("page", "The page is out of range."))?;
        self.repo.list(&OrderFilter {
            statuses: Some(vec![OrderStatus::Delivered]),
            sort: OrderSort::LatestDelivered,
            limit: Some(DELIVERY_HISTORY_PAGE_SIZE),
            offset: Some(offset),
            ..OrderFilter::for_employer(principal.id)
        })
    }

    pub fn delivery_performance(
        &self,
        principal: &Principal,
    ) -> Result<DeliveryPerformance, DomainError> {
        principal.require_role(Role::Employer)?;
        self.repo
            .delivery_performance(principal.id, Utc::now().date_naive())
    }

    /// First courier to accept wins; the loser gets `Conflict`.
    pub fn accept_order(&self, principal: &Principal, order_id: Uuid) -> Result<Order, DomainError> {
        principal.require_active_employer()?;

        let order = self
            .repo
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found("Order not found."))?;

        let current_owner = order.employer_id;
        match current_owner {
            Some(owner) if owner != principal.id => {
                log::debug!(
                    "Employer {} tried to accept order {} owned by {}",
                    principal.id,
                    order_id,
                    owner
                );
                return Err(DomainError::Conflict(ALREADY_ASSIGNED.to_string()));
            }
            Some(_) if order.status == OrderStatus::Accepted => return Ok(order),
            _ => {}
        }
        if !order.status.accepts_courier() {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Accepted,
            });
        }

        let mut events = vec![OrderEvent::OrderAssigned {
            order_id,
            customer_id: order.customer_id,
            employer_id: principal.id,
            source: AssignmentSource::SelfAccept,
        }];
        if order.status != OrderStatus::Accepted {
            events.push(OrderEvent::StatusChanged {
                order_id,
                customer_id: order.customer_id,
                employer_id: Some(principal.id),
                from: order.status,
                to: OrderStatus::Accepted,
                changed_by: Role::Employer,
            });
        }

        match self.repo.try_accept(order_id, principal.id, &events)? {
            AcceptOutcome::Accepted(order) => {
                log::info!("Order {} accepted by employer {}", order_id, principal.id);
                Ok(order)
            }
            AcceptOutcome::NotFound => Err(DomainError::not_found("Order not found.")),
            AcceptOutcome::TakenBy(owner) => {
                log::debug!(
                    "Employer {} lost the race for order {} to {}",
                    principal.id,
                    order_id,
                    owner
                );
                Err(DomainError::Conflict(ALREADY_ASSIGNED.to_string()))
            }
            AcceptOutcome::NotAcceptable(status) => Err(DomainError::InvalidTransition {
                from: status,
                to: OrderStatus::Accepted,
            }),
        }
    }

    /// Status change by an admin (any table-legal target) or by the assigned
    /// courier (delivery vocabulary only).
    pub fn update_status(
        &self,
        principal: &Principal,
        order_id: Uuid,
        to: OrderStatus,
    ) -> Result<Order, DomainError> {
        let missing = match principal.role {
            Role::Admin => "Order not found.",
            Role::Employer => {
                principal.require_active_employer()?;
                NOT_ASSIGNED_TO_YOU
            }
            Role::Customer => {
                return Err(DomainError::Forbidden("Unauthorized.".to_string()));
            }
        };

        let order = self.repo.modify(order_id, |order| {
            if principal.role == Role::Employer && !order.is_assigned_to(principal.id) {
                return Err(DomainError::not_found(NOT_ASSIGNED_TO_YOU));
            }
            status_change(principal, order, to)
        })?;
        let order = order.ok_or_else(|| DomainError::not_found(missing))?;

        log::info!(
            "Order {} status is now {} ({} {})",
            order_id,
            order.status,
            principal.role,
            principal.id
        );
        Ok(order)
    }

    /// Courier closes a delivery, attaching proof of delivery.
    pub fn mark_delivered(
        &self,
        principal: &Principal,
        order_id: Uuid,
        proof: DeliveryProof,
    ) -> Result<Order, DomainError> {
        principal.require_active_employer()?;
        if proof
            .delivery_proof
            .as_deref()
            .is_some_and(|p| p.chars().count() > MAX_DELIVERY_PROOF_LEN)
        {
            return Err(DomainError::validation(
                "delivery_proof",
                "The delivery proof may not be greater than 255 characters.",
            ));
        }
        if proof
            .delivery_notes
            .as_deref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            return Err(DomainError::validation(
                "notes",
                "The notes may not be greater than 500 characters.",
            ));
        }

        let order = self.repo.modify(order_id, |order| {
            if !order.is_assigned_to(principal.id) {
                return Err(DomainError::not_found(NOT_ASSIGNED_TO_YOU));
            }
            // A delivered order keeps the proof it was closed with.
            let Some(mut change) = status_change(principal, order, OrderStatus::Delivered)? else {
                return Ok(None);
            };
            change.proof = Some(proof);
            Ok(Some(change))
        })?;
        let order = order.ok_or_else(|| DomainError::not_found(NOT_ASSIGNED_TO_YOU))?;

        log::info!("Order {} delivered by employer {}", order_id, principal.id);
        Ok(order)
    }

    /// Overwrite the courier's last known position and, when the order is
    /// theirs, the order's in-flight position.
    pub fn update_location(
        &self,
        principal: &Principal,
        latitude: f64,
        longitude: f64,
        order_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        principal.require_role(Role::Employer)?;
        geo::validate_coordinates(latitude, longitude)?;

        self.directory
            .record_location(principal.id, latitude, longitude)?;

        if let Some(order_id) = order_id {
            let found = self.repo.modify(order_id, |order| {
                if !order.is_assigned_to(principal.id) {
                    return Ok(None);
                }
                Ok(Some(OrderChange {
                    delivery_position: Some((latitude, longitude)),
                    ..OrderChange::default()
                }))
            })?;
            if found.is_none() {
                return Err(DomainError::validation(
                    "order_id",
                    "The selected order id is invalid.",
                ));
            }
        }
        Ok(())
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub fn admin_orders(
        &self,
        principal: &Principal,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, DomainError> {
        principal.require_role(Role::Admin)?;
        filter.validate()?;
        self.repo.list(filter)
    }

    pub fn admin_order(&self, principal: &Principal, order_id: Uuid) -> Result<Order, DomainError> {
        principal.require_role(Role::Admin)?;
        self.repo
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found("Order not found"))
    }

    /// Admin assignment always overwrites any previous courier.
    pub fn assign_employer(
        &self,
        principal: &Principal,
        order_id: Uuid,
        employer_id: Uuid,
    ) -> Result<Order, DomainError> {
        principal.require_role(Role::Admin)?;

        let employer = self.directory.find_user(employer_id)?.ok_or_else(|| {
            DomainError::validation("employer_id", "The selected employer id is invalid.")
        })?;
        if employer.role != Role::Employer {
            return Err(DomainError::validation(
                "employer_id",
                "Selected user is not an employer",
            ));
        }

        let order = self.repo.modify(order_id, |order| {
            if let Some(previous) = order.employer_id.filter(|p| *p != employer_id) {
                log::info!(
                    "Order {} reassigned from employer {} to {}",
                    order.id,
                    previous,
                    employer_id
                );
            }
            Ok(Some(OrderChange {
                assign_to: Some(employer_id),
                events: vec![OrderEvent::OrderAssigned {
                    order_id: order.id,
                    customer_id: order.customer_id,
                    employer_id,
                    source: AssignmentSource::Admin,
                }],
                ..OrderChange::default()
            }))
        })?;
        let order = order.ok_or_else(|| DomainError::not_found("Order not found."))?;

        log::info!("Order {} assigned to employer {}", order_id, employer.name);
        Ok(order)
    }

    pub fn delete_order(&self, principal: &Principal, order_id: Uuid) -> Result<(), DomainError> {
        principal.require_role(Role::Admin)?;
        if !self.repo.delete(order_id)? {
            return Err(DomainError::not_found("Order not found"));
        }
        log::info!("Order {} deleted by admin {}", order_id, principal.id);
        Ok(())
    }
}

/// Build the change (and events) for moving `order` to `to`, or `None` when
/// the order already has that status.
fn status_change(
    principal: &Principal,
    order: &Order,
    to: OrderStatus,
) -> Result<Option<OrderChange>, DomainError> {
    let (from, to) = match check_transition(principal.role, order.status, to)? {
        Transition::Unchanged => return Ok(None),
        Transition::Apply { from, to } => (from, to),
    };

    let mut events = vec![OrderEvent::StatusChanged {
        order_id: order.id,
        customer_id: order.customer_id,
        employer_id: order.employer_id,
        from,
        to,
        changed_by: principal.role,
    }];
    if to == OrderStatus::Delivered {
        events.push(OrderEvent::OrderDelivered {
            order_id: order.id,
            customer_id: order.customer_id,
            employer_id: order.employer_id,
        });
    }

    Ok(Some(OrderChange {
        status: Some(to),
        events,
        ..OrderChange::default()
    }))
}
