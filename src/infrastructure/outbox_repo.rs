use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::outbox::OutboxMessage;
use crate::domain::ports::OutboxStore;
use crate::schema::order_outbox;

use super::models::OutboxEventRow;

/// Reads undelivered rows from `order_outbox` in insertion order.
pub struct DieselOutboxStore {
    pool: DbPool,
}

impl DieselOutboxStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<OutboxEventRow> for OutboxMessage {
    fn from(row: OutboxEventRow) -> Self {
        OutboxMessage {
            id: row.id,
            event_type: row.event_type,
            payload: row.payload,
            attempts: row.attempts,
            created_at: row.created_at,
        }
    }
}

impl OutboxStore for DieselOutboxStore {
    fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = order_outbox::table
            .filter(order_outbox::dispatched_at.is_null())
            .order(order_outbox::created_at.asc())
            .limit(limit)
            .select(OutboxEventRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(OutboxMessage::from).collect())
    }

    fn mark_dispatched(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(order_outbox::table.find(id))
            .set((
                order_outbox::dispatched_at.eq(Utc::now()),
                order_outbox::attempts.eq(order_outbox::attempts + 1),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    use super::DieselOutboxStore;
    use crate::domain::ports::OutboxStore;
    use crate::infrastructure::models::NewOutboxEventRow;
    use crate::infrastructure::test_support::setup_db;
    use crate::schema::order_outbox;

    #[tokio::test]
    async fn dispatched_rows_leave_the_pending_queue() {
        let (_container, pool) = setup_db().await;
        {
            let mut conn = pool.get().expect("conn");
            for n in 0..3 {
                diesel::insert_into(order_outbox::table)
                    .values(&NewOutboxEventRow {
                        id: Uuid::new_v4(),
                        aggregate_type: "Order".to_string(),
                        aggregate_id: Uuid::new_v4().to_string(),
                        event_type: "OrderCreated".to_string(),
                        payload: json!({ "n": n }),
                    })
                    .execute(&mut conn)
                    .expect("insert");
            }
        }
        let store = DieselOutboxStore::new(pool);

        let pending = store.pending(2).expect("pending");
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|m| m.attempts == 0));

        store.mark_dispatched(pending[0].id).expect("mark");
        let rest = store.pending(10).expect("pending");
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|m| m.id != pending[0].id));
    }
}
