use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::events::OrderEvent;
use super::geo;
use super::status::OrderStatus;

pub const MAX_CUSTOM_NAME_LEN: usize = 255;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_PAYMENT_METHOD_LEN: usize = 50;
pub const MAX_PHONE_LEN: usize = 50;
pub const MAX_DELIVERY_PROOF_LEN: usize = 255;

/// Exclusive upper bound for prices and order sums, `NUMERIC(10, 2)`.
const AMOUNT_LIMIT: i64 = 100_000_000;
/// Exclusive upper bound for the delivery fee, `NUMERIC(8, 2)`.
const DELIVERY_FEE_LIMIT: i64 = 1_000_000;

// ── Actors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation("role", format!("Unknown role '{other}'"))),
        }
    }
}

/// Approval state of an account; only meaningful for couriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Approved => "approved",
            AccountStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccountStatus::Pending),
            "approved" => Ok(AccountStatus::Approved),
            "rejected" => Ok(AccountStatus::Rejected),
            other => Err(DomainError::validation(
                "status",
                format!("Unknown account status '{other}'"),
            )),
        }
    }
}

/// The authenticated caller, as vouched for by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub status: AccountStatus,
}

impl Principal {
    pub fn new(id: Uuid, role: Role, status: AccountStatus) -> Self {
        Self { id, role, status }
    }

    pub fn require_role(&self, role: Role) -> Result<(), DomainError> {
        if self.role != role {
            return Err(DomainError::Forbidden("Unauthorized.".to_string()));
        }
        Ok(())
    }

    /// Couriers must be approved before they may take on deliveries.
    pub fn require_active_employer(&self) -> Result<(), DomainError> {
        self.require_role(Role::Employer)?;
        if self.status != AccountStatus::Approved {
            return Err(DomainError::Forbidden(
                "Your account is not approved for deliveries.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StoreLocation {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ── Placing an order ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub special_instructions: Option<String>,
}

impl OrderItemInput {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub store_id: Uuid,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub items: Vec<OrderItemInput>,
    pub delivery_fee: BigDecimal,
    /// Client-computed total; checked against the server-side sum when present.
    pub total: Option<BigDecimal>,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// A validated order ready to be persisted together with its items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

fn required(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(
            field,
            format!("The {} field is required.", field.replace('_', " ")),
        ));
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!(
                "The {} may not be greater than {} characters.",
                field.replace('_', " "),
                max
            ),
        ));
    }
    Ok(())
}

/// Money must be non-negative, carry at most two decimals and fit its column.
fn amount(
    field: &'static str,
    label: &str,
    value: &BigDecimal,
    limit: i64,
) -> Result<(), DomainError> {
    if *value < BigDecimal::zero() {
        return Err(DomainError::validation(
            field,
            format!("The {label} must be at least 0."),
        ));
    }
    if value.with_scale(2) != *value {
        return Err(DomainError::validation(
            field,
            format!("The {label} may not have more than 2 decimal places."),
        ));
    }
    if *value >= BigDecimal::from(limit) {
        return Err(DomainError::validation(
            field,
            format!("The {label} must be less than {limit}."),
        ));
    }
    Ok(())
}

impl PlaceOrderInput {
    /// Field-level checks that need no collaborator.
    pub fn validate(&self) -> Result<(), DomainError> {
        required("address", &self.address)?;
        required("payment_method", &self.payment_method)?;
        required("phone", &self.phone)?;
        max_len("address", self.address.trim(), MAX_ADDRESS_LEN)?;
        max_len("payment_method", &self.payment_method, MAX_PAYMENT_METHOD_LEN)?;
        max_len("phone", &self.phone, MAX_PHONE_LEN)?;
        geo::validate_coordinates(self.latitude, self.longitude)?;

        if self.items.is_empty() {
            return Err(DomainError::validation(
                "items",
                "The items field must have at least 1 items.",
            ));
        }
        for item in &self.items {
            let name = item.custom_name.as_deref().map(str::trim).unwrap_or("");
            if item.product_id.is_none() && name.is_empty() {
                return Err(DomainError::validation(
                    "items",
                    "Each item needs a product_id or a custom_name.",
                ));
            }
            if name.chars().count() > MAX_CUSTOM_NAME_LEN {
                return Err(DomainError::validation(
                    "items",
                    "The custom name may not be greater than 255 characters.",
                ));
            }
            if item.quantity < 1 {
                return Err(DomainError::validation(
                    "items",
                    "The quantity must be at least 1.",
                ));
            }
            amount("items", "price", &item.unit_price, AMOUNT_LIMIT)?;
        }
        amount("delivery_fee", "delivery fee", &self.delivery_fee, DELIVERY_FEE_LIMIT)?;
        Ok(())
    }

    pub fn subtotal(&self) -> BigDecimal {
        self.items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + item.line_total())
    }

    /// Validate and price the order. Totals are always recomputed here; a
    /// client total that disagrees is rejected.
    pub fn into_new_order(self, id: Uuid, customer_id: Uuid) -> Result<NewOrder, DomainError> {
        self.validate()?;
        let subtotal = self.subtotal().with_scale(2);
        amount("items", "order subtotal", &subtotal, AMOUNT_LIMIT)?;
        let total = &subtotal + &self.delivery_fee.with_scale(2);
        amount("total", "total", &total, AMOUNT_LIMIT)?;
        if let Some(claimed) = &self.total {
            if *claimed != total {
                return Err(DomainError::validation(
                    "total",
                    format!("The total does not match the order items ({}).", total.with_scale(2)),
                ));
            }
        }

        Ok(NewOrder {
            id,
            customer_id,
            store_id: self.store_id,
            address: self.address.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            subtotal,
            delivery_fee: self.delivery_fee,
            total,
            payment_method: self.payment_method,
            phone: self.phone,
            notes: self.notes,
            items: self.items,
        })
    }
}

// ── Persisted order ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderTimestamps {
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
}

impl OrderTimestamps {
    fn slot(&mut self, status: OrderStatus) -> Option<&mut Option<DateTime<Utc>>> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(&mut self.confirmed_at),
            OrderStatus::Preparing => Some(&mut self.preparing_at),
            OrderStatus::Accepted => Some(&mut self.accepted_at),
            OrderStatus::PickedUp => Some(&mut self.picked_up_at),
            OrderStatus::OnTheWay => Some(&mut self.on_the_way_at),
            OrderStatus::Arrived => Some(&mut self.arrived_at),
            OrderStatus::Delivered => Some(&mut self.delivered_at),
            OrderStatus::Cancelled => Some(&mut self.canceled_at),
        }
    }

    /// Record entry into `status`. First write wins.
    pub fn stamp(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        if let Some(slot) = self.slot(status) {
            slot.get_or_insert(now);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryProof {
    /// Reference returned by file storage.
    pub delivery_proof: Option<String>,
    pub customer_signature: Option<String>,
    pub delivery_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Option<Uuid>,
    pub employer_id: Option<Uuid>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: OrderStatus,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub payment_method: String,
    pub phone: String,
    pub notes: Option<String>,
    pub is_rated: bool,
    pub delivery_position: Option<(f64, f64)>,
    pub proof: DeliveryProof,
    pub timestamps: OrderTimestamps,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_assigned_to(&self, employer_id: Uuid) -> bool {
        self.employer_id == Some(employer_id)
    }

    /// Apply a mutation decided by the service. Status stamping is
    /// first-write-wins; assignment always overwrites.
    pub fn apply(&mut self, change: &OrderChange, now: DateTime<Utc>) {
        if let Some(status) = change.status {
            self.status = status;
            self.timestamps.stamp(status, now);
        }
        if let Some(employer_id) = change.assign_to {
            self.employer_id = Some(employer_id);
            self.timestamps.assigned_at = Some(now);
        }
        if let Some(proof) = &change.proof {
            self.proof = proof.clone();
        }
        if let Some(position) = change.delivery_position {
            self.delivery_position = Some(position);
        }
        self.updated_at = now;
    }
}

/// A mutation to apply atomically to one order, with the events it emits.
#[derive(Debug, Clone, Default)]
pub struct OrderChange {
    pub status: Option<OrderStatus>,
    pub assign_to: Option<Uuid>,
    pub proof: Option<DeliveryProof>,
    pub delivery_position: Option<(f64, f64)>,
    pub events: Vec<OrderEvent>,
}

/// Result of a courier's conditional self-assignment.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted(Order),
    NotFound,
    TakenBy(Uuid),
    NotAcceptable(OrderStatus),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSort {
    #[default]
    NewestFirst,
    /// Most recently delivered first, for delivery history.
    LatestDelivered,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub statuses: Option<Vec<OrderStatus>>,
    pub customer_id: Option<Uuid>,
    pub employer_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub updated_since: Option<DateTime<Utc>>,
    pub sort: OrderSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderFilter {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn for_employer(employer_id: Uuid) -> Self {
        Self {
            employer_id: Some(employer_id),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if to < from {
                return Err(DomainError::validation(
                    "to_date",
                    "The to date must be a date after or equal to from date.",
                ));
            }
        }
        Ok(())
    }

    /// In-memory predicate mirroring the SQL the repository builds.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self
                .statuses
                .as_ref()
                .map_or(true, |set| set.contains(&order.status))
            && self.customer_id.map_or(true, |c| order.customer_id == c)
            && self.employer_id.map_or(true, |e| order.employer_id == Some(e))
            && self
                .from_date
                .map_or(true, |d| order.created_at.date_naive() >= d)
            && self.to_date.map_or(true, |d| order.created_at.date_naive() <= d)
            && self.updated_since.map_or(true, |t| order.updated_at >= t)
    }
}

// ── Courier statistics ───────────────────────────────────────────────────────

/// Counters over every order ever assigned to one courier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployerDashboard {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    /// Assigned orders created today (UTC).
    pub today_orders: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeliveryPerformance {
    pub total_deliveries: i64,
    /// Deliveries closed today (UTC).
    pub today_deliveries: i64,
    /// Mean minutes from acceptance to delivery, one decimal; 0 without data.
    pub avg_delivery_minutes: f64,
}

impl DeliveryPerformance {
    pub fn new(total_deliveries: i64, today_deliveries: i64, avg_minutes: Option<f64>) -> Self {
        let avg = avg_minutes.filter(|m| m.is_finite()).unwrap_or(0.0);
        Self {
            total_deliveries,
            today_deliveries,
            avg_delivery_minutes: (avg * 10.0).round() / 10.0,
        }
    }
}

// ── Ratings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewRating {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub score: i16,
    pub review: Option<String>,
}

impl NewRating {
    pub fn validate_score(score: i16) -> Result<(), DomainError> {
        if !(1..=5).contains(&score) {
            return Err(DomainError::validation(
                "rating",
                "The rating must be between 1 and 5.",
            ));
        }
        Ok(())
    }

    pub fn validate_review(review: Option<&str>) -> Result<(), DomainError> {
        if review.is_some_and(|r| r.chars().count() > MAX_NOTES_LEN) {
            return Err(DomainError::validation(
                "review",
                "The review may not be greater than 500 characters.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub score: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn item(price: &str, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: Some(Uuid::new_v4()),
            custom_name: None,
            quantity,
            unit_price: dec(price),
            special_instructions: None,
        }
    }

    fn input(items: Vec<OrderItemInput>) -> PlaceOrderInput {
        PlaceOrderInput {
            store_id: Uuid::new_v4(),
            address: "12 Baker Street".to_string(),
            latitude: 33.51,
            longitude: 36.29,
            items,
            delivery_fee: dec("5.00"),
            total: None,
            payment_method: "cash".to_string(),
            phone: "+963900000000".to_string(),
            notes: None,
        }
    }

    #[test]
    fn totals_are_recomputed_from_items() {
        let order = input(vec![item("9.99", 2), item("0.02", 1)])
            .into_new_order(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();
        assert_eq!(order.subtotal, dec("20.00"));
        assert_eq!(order.total, dec("25.00"));
    }

    #[test]
    fn matching_client_total_is_accepted() {
        let mut req = input(vec![item("10", 1)]);
        req.total = Some(dec("15.00"));
        assert!(req.into_new_order(Uuid::new_v4(), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn mismatched_client_total_is_rejected() {
        let mut req = input(vec![item("10", 1)]);
        req.total = Some(dec("1.00"));
        let err = req.into_new_order(Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "total", .. }));
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = input(vec![]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "items", .. }));
    }

    #[test]
    fn custom_items_need_a_name() {
        let mut custom = item("3", 1);
        custom.product_id = None;
        assert!(input(vec![custom.clone()]).validate().is_err());

        custom.custom_name = Some("Extra napkins".to_string());
        assert!(input(vec![custom]).validate().is_ok());
    }

    #[test]
    fn zero_quantity_and_negative_price_are_rejected() {
        assert!(input(vec![item("1", 0)]).validate().is_err());
        assert!(input(vec![item("-1", 1)]).validate().is_err());
    }

    #[test]
    fn sub_cent_prices_and_fees_are_rejected() {
        let err = input(vec![item("1.555", 3)]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "items", .. }));
        assert_eq!(err.to_string(), "The price may not have more than 2 decimal places.");

        let mut req = input(vec![item("1.50", 1)]);
        req.delivery_fee = dec("0.001");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "delivery_fee", .. }));

        // Trailing zeros are not extra precision.
        assert!(input(vec![item("1.500", 1)]).validate().is_ok());
    }

    #[test]
    fn amounts_must_fit_their_columns() {
        let err = input(vec![item("100000000", 1)]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "items", .. }));

        let mut req = input(vec![item("1", 1)]);
        req.delivery_fee = dec("1000000");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "delivery_fee", .. }));

        let err = input(vec![item("99999999", 100)])
            .into_new_order(Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "items", .. }));

        let err = input(vec![item("99999999.99", 1)])
            .into_new_order(Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "total", .. }));
    }

    #[test]
    fn stored_totals_match_their_items() {
        let order = input(vec![item("1.55", 3), item("0.05", 7)])
            .into_new_order(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();
        let from_items = order
            .items
            .iter()
            .fold(BigDecimal::zero(), |acc, i| acc + i.line_total());
        assert_eq!(order.subtotal, from_items);
        assert_eq!(order.subtotal, dec("5.00"));
        assert_eq!(order.total, &order.subtotal + &order.delivery_fee);
    }

    #[test]
    fn overlong_text_fields_are_rejected() {
        let mut req = input(vec![item("1", 1)]);
        req.phone = "9".repeat(MAX_PHONE_LEN + 1);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "phone", .. }));
        assert_eq!(err.to_string(), "The phone may not be greater than 50 characters.");

        let mut req = input(vec![item("1", 1)]);
        req.payment_method = "c".repeat(MAX_PAYMENT_METHOD_LEN + 1);
        assert!(matches!(
            req.validate(),
            Err(DomainError::Validation { field: "payment_method", .. })
        ));

        let mut req = input(vec![item("1", 1)]);
        req.address = "a".repeat(MAX_ADDRESS_LEN + 1);
        assert!(matches!(
            req.validate(),
            Err(DomainError::Validation { field: "address", .. })
        ));

        let mut req = input(vec![item("1", 1)]);
        req.address = "é".repeat(MAX_ADDRESS_LEN);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut req = input(vec![item("1", 1)]);
        req.phone = "  ".to_string();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "phone", .. }));
        assert_eq!(err.to_string(), "The phone field is required.");
    }

    #[test]
    fn stamping_is_first_write_wins() {
        let first = Utc::now();
        let later = first + chrono::Duration::minutes(5);
        let mut ts = OrderTimestamps::default();
        ts.stamp(OrderStatus::Confirmed, first);
        ts.stamp(OrderStatus::Confirmed, later);
        assert_eq!(ts.confirmed_at, Some(first));
        ts.stamp(OrderStatus::Cancelled, later);
        assert_eq!(ts.canceled_at, Some(later));
    }

    #[test]
    fn pending_has_no_timestamp_slot() {
        let mut ts = OrderTimestamps::default();
        ts.stamp(OrderStatus::Pending, Utc::now());
        assert_eq!(ts, OrderTimestamps::default());
    }

    #[test]
    fn score_bounds() {
        assert!(NewRating::validate_score(0).is_err());
        assert!(NewRating::validate_score(1).is_ok());
        assert!(NewRating::validate_score(5).is_ok());
        assert!(NewRating::validate_score(6).is_err());
    }

    #[test]
    fn filter_rejects_inverted_date_range() {
        let filter = OrderFilter {
            from_date: NaiveDate::from_ymd_opt(2025, 9, 10),
            to_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            ..OrderFilter::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn average_delivery_time_is_rounded_to_one_decimal() {
        assert_eq!(DeliveryPerformance::new(3, 1, Some(27.349)).avg_delivery_minutes, 27.3);
        assert_eq!(DeliveryPerformance::new(3, 1, Some(27.35)).avg_delivery_minutes, 27.4);
        assert_eq!(DeliveryPerformance::new(0, 0, None).avg_delivery_minutes, 0.0);
    }

    #[test]
    fn employer_needs_approval() {
        let id = Uuid::new_v4();
        assert!(Principal::new(id, Role::Employer, AccountStatus::Approved)
            .require_active_employer()
            .is_ok());
        assert!(matches!(
            Principal::new(id, Role::Employer, AccountStatus::Pending).require_active_employer(),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            Principal::new(id, Role::Admin, AccountStatus::Approved).require_active_employer(),
            Err(DomainError::Forbidden(_))
        ));
    }
}
