use std::collections::HashSet;

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{StoreLocation, UserAccount};
use crate::domain::ports::Directory;
use crate::schema::{products, stores, users};

use super::models::{StoreRow, UserRow};

pub struct DieselDirectory {
    pool: DbPool,
}

impl DieselDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Directory for DieselDirectory {
    fn find_user(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(UserAccount::try_from).transpose()
    }

    fn find_store(&self, id: Uuid) -> Result<Option<StoreLocation>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = stores::table
            .find(id)
            .select(StoreRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(StoreLocation::from))
    }

    fn missing_products(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;
        let found: HashSet<Uuid> = products::table
            .filter(products::id.eq_any(ids))
            .select(products::id)
            .load::<Uuid>(&mut conn)?
            .into_iter()
            .collect();
        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    fn record_location(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(users::table.find(user_id))
            .set((
                users::current_lat.eq(latitude),
                users::current_lng.eq(longitude),
                users::location_updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            log::warn!("Location update for unknown user {}", user_id);
        }
        Ok(())
    }
}
