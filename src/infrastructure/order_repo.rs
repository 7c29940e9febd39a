use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use diesel::pg::PgConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Double, Nullable};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::{OrderEvent, AGGREGATE_TYPE};
use crate::domain::order::{
    AcceptOutcome, DeliveryPerformance, EmployerDashboard, NewOrder, NewRating, Order,
    OrderChange, OrderFilter, OrderSort, Rating,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;
use crate::schema::{order_items, order_outbox, orders, ratings, stores};

use super::models::{
    NewOrderItemRow, NewOrderRow, NewOutboxEventRow, NewRatingRow, OrderChangeset, OrderItemRow,
    OrderRow, RatingRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row helpers ───────────────────────────────────────────────────────────────

fn load_items(conn: &mut PgConnection, order_ids: &[Uuid]) -> QueryResult<Vec<OrderItemRow>> {
    order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .order(order_items::created_at.asc())
        .select(OrderItemRow::as_select())
        .load(conn)
}

fn load_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, DomainError> {
    let row = orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let items = load_items(conn, &[id])?;
    row.into_order(items).map(Some)
}

/// Insert `events` into the outbox on the caller's connection, so they commit
/// or roll back with the surrounding transaction.
fn write_events(conn: &mut PgConnection, events: &[OrderEvent]) -> Result<(), DomainError> {
    if events.is_empty() {
        return Ok(());
    }
    let rows = events
        .iter()
        .map(|event| {
            let payload = serde_json::to_value(event)
                .map_err(|e| DomainError::Internal(format!("event serialisation: {e}")))?;
            Ok(NewOutboxEventRow {
                id: Uuid::new_v4(),
                aggregate_type: AGGREGATE_TYPE.to_string(),
                aggregate_id: event.order_id().to_string(),
                event_type: event.event_type().to_string(),
                payload,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    diesel::insert_into(order_outbox::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `[midnight, next midnight)` of a UTC day.
fn day_bounds(day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), DomainError> {
    start_of_day(day)
        .zip(day.succ_opt().and_then(start_of_day))
        .ok_or_else(|| DomainError::Internal(format!("no UTC bounds for {day}")))
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: &NewOrder, events: &[OrderEvent]) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(&NewOrderRow::from(order))
                .execute(conn)?;

            let items: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .map(|item| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    product_id: item.product_id,
                    custom_name: item.custom_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.clone(),
                    special_instructions: item.special_instructions.clone(),
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(conn)?;

            write_events(conn, events)?;

            load_order(conn, order.id)?.ok_or_else(|| {
                DomainError::Internal(format!("order {} vanished after insert", order.id))
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order(&mut conn, id)
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table.select(OrderRow::as_select()).into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(statuses) = &filter.statuses {
            let names: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();
            query = query.filter(orders::status.eq_any(names));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(orders::customer_id.eq(customer_id));
        }
        if let Some(employer_id) = filter.employer_id {
            query = query.filter(orders::employer_id.eq(employer_id));
        }
        if let Some(from) = filter.from_date.and_then(start_of_day) {
            query = query.filter(orders::created_at.ge(from));
        }
        // to_date is inclusive: everything before the following midnight.
        if let Some(until) = filter
            .to_date
            .and_then(|d| d.succ_opt())
            .and_then(start_of_day)
        {
            query = query.filter(orders::created_at.lt(until));
        }
        if let Some(since) = filter.updated_since {
            query = query.filter(orders::updated_at.ge(since));
        }
        query = match filter.sort {
            OrderSort::NewestFirst => query.order(orders::created_at.desc()),
            OrderSort::LatestDelivered => {
                query.order((orders::delivered_at.desc(), orders::created_at.desc()))
            }
        };
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }

        let rows: Vec<OrderRow> = query.load(&mut conn)?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for item in load_items(&mut conn, &ids)? {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    fn modify<F>(&self, id: Uuid, decide: F) -> Result<Option<Order>, DomainError>
    where
        F: FnOnce(&Order) -> Result<Option<OrderChange>, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serialises concurrent status updates on the same order.
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .for_update()
                .get_result(conn)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };
            let items = load_items(conn, &[id])?;
            let mut order = row.into_order(items)?;

            let Some(change) = decide(&order)? else {
                return Ok(Some(order));
            };
            order.apply(&change, Utc::now());

            diesel::update(orders::table.find(id))
                .set(&OrderChangeset::from(&order))
                .execute(conn)?;
            write_events(conn, &change.events)?;

            Ok(Some(order))
        })
    }

    fn try_accept(
        &self,
        order_id: Uuid,
        employer_id: Uuid,
        events: &[OrderEvent],
    ) -> Result<AcceptOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let now = Utc::now();
            let acceptable: Vec<&'static str> = OrderStatus::ALL
                .iter()
                .filter(|s| s.accepts_courier())
                .map(|s| s.as_str())
                .collect();

            // Compare-and-set: only one statement can move the row into
            // `accepted`, including two accepts from the same employer.
            let claimed = diesel::update(
                orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(
                        orders::employer_id.is_null().or(orders::employer_id
                            .is_not_distinct_from(employer_id)
                            .and(orders::status.ne(OrderStatus::Accepted.as_str()))),
                    )
                    .filter(orders::status.eq_any(acceptable)),
            )
            .set((
                orders::employer_id.eq(employer_id),
                orders::status.eq(OrderStatus::Accepted.as_str()),
                orders::updated_at.eq(now),
            ))
            .execute(conn)?;

            if claimed == 0 {
                let current = orders::table
                    .find(order_id)
                    .select((orders::employer_id, orders::status))
                    .first::<(Option<Uuid>, String)>(conn)
                    .optional()?;
                return Ok(match current {
                    None => AcceptOutcome::NotFound,
                    Some((Some(owner), _)) if owner != employer_id => AcceptOutcome::TakenBy(owner),
                    Some((Some(_), status)) if status == OrderStatus::Accepted.as_str() => {
                        let order = load_order(conn, order_id)?.ok_or_else(|| {
                            DomainError::Internal(format!("order {order_id} vanished during accept"))
                        })?;
                        AcceptOutcome::Accepted(order)
                    }
                    Some((_, status)) => {
                        let status: OrderStatus = status.parse().map_err(|_| {
                            DomainError::Internal(format!(
                                "order {order_id} has unknown status '{status}'"
                            ))
                        })?;
                        AcceptOutcome::NotAcceptable(status)
                    }
                });
            }

            diesel::update(
                orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(orders::accepted_at.is_null()),
            )
            .set(orders::accepted_at.eq(now))
            .execute(conn)?;
            diesel::update(
                orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(orders::assigned_at.is_null()),
            )
            .set(orders::assigned_at.eq(now))
            .execute(conn)?;

            write_events(conn, events)?;

            let order = load_order(conn, order_id)?.ok_or_else(|| {
                DomainError::Internal(format!("order {order_id} vanished after accept"))
            })?;
            Ok(AcceptOutcome::Accepted(order))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(orders::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn find_rating(&self, order_id: Uuid) -> Result<Option<Rating>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = ratings::table
            .filter(ratings::order_id.eq(order_id))
            .select(RatingRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Rating::from))
    }

    fn insert_rating(
        &self,
        rating: &NewRating,
        events: &[OrderEvent],
    ) -> Result<Rating, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let stored = diesel::insert_into(ratings::table)
                .values(&NewRatingRow {
                    id: rating.id,
                    order_id: rating.order_id,
                    customer_id: rating.customer_id,
                    store_id: rating.store_id,
                    score: rating.score,
                    review: rating.review.clone(),
                })
                .returning(RatingRow::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        DomainError::Conflict("You have already rated this order.".to_string())
                    }
                    other => DomainError::from(other),
                })?;

            diesel::update(orders::table.find(rating.order_id))
                .set((
                    orders::is_rated.eq(true),
                    orders::rated_at.eq(stored.created_at),
                    orders::updated_at.eq(stored.created_at),
                ))
                .execute(conn)?;

            let (average, count) = ratings::table
                .filter(ratings::store_id.eq(rating.store_id))
                .select((
                    diesel::dsl::avg(ratings::score),
                    diesel::dsl::count(ratings::id),
                ))
                .first::<(Option<bigdecimal::BigDecimal>, i64)>(conn)?;
            diesel::update(stores::table.find(rating.store_id))
                .set((
                    stores::rating_average.eq(average.unwrap_or_default().round(2)),
                    stores::rating_count.eq(i32::try_from(count).map_err(|_| {
                        DomainError::Internal(format!(
                            "rating count {count} for store {} overflows",
                            rating.store_id
                        ))
                    })?),
                ))
                .execute(conn)?;

            write_events(conn, events)?;

            Ok(Rating::from(stored))
        })
    }

    fn employer_dashboard(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<EmployerDashboard, DomainError> {
        let mut conn = self.pool.get()?;
        let (start, end) = day_bounds(today)?;

        let total_orders: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .count()
            .get_result(&mut conn)?;
        let pending_orders: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::status.eq(OrderStatus::Pending.as_str()))
            .count()
            .get_result(&mut conn)?;
        let delivered_orders: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::status.eq(OrderStatus::Delivered.as_str()))
            .count()
            .get_result(&mut conn)?;
        let today_orders: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::created_at.ge(start))
            .filter(orders::created_at.lt(end))
            .count()
            .get_result(&mut conn)?;

        Ok(EmployerDashboard {
            total_orders,
            pending_orders,
            delivered_orders,
            today_orders,
        })
    }

    fn delivery_performance(
        &self,
        employer_id: Uuid,
        today: NaiveDate,
    ) -> Result<DeliveryPerformance, DomainError> {
        let mut conn = self.pool.get()?;
        let (start, end) = day_bounds(today)?;
        let delivered = OrderStatus::Delivered.as_str();

        let total: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::status.eq(delivered))
            .count()
            .get_result(&mut conn)?;
        let today_count: i64 = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::status.eq(delivered))
            .filter(orders::delivered_at.ge(start))
            .filter(orders::delivered_at.lt(end))
            .count()
            .get_result(&mut conn)?;
        let avg_minutes: Option<f64> = orders::table
            .filter(orders::employer_id.eq(employer_id))
            .filter(orders::status.eq(delivered))
            .filter(orders::accepted_at.is_not_null())
            .filter(orders::delivered_at.is_not_null())
            .select(sql::<Nullable<Double>>(
                "(AVG(EXTRACT(EPOCH FROM (delivered_at - accepted_at))) / 60.0)::float8",
            ))
            .first(&mut conn)?;

        Ok(DeliveryPerformance::new(total, today_count, avg_minutes))
    }
}
