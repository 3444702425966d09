use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::api_key::ApiLogEntry;
use crate::domain::errors::DomainError;
use crate::domain::ports::ApiKeyRepository;
use crate::schema::{api_keys, api_logs};

use super::models::NewApiLogRow;
use super::store::DieselStore;

impl ApiKeyRepository for DieselStore {
    fn verify_key(&self, key: &str) -> Result<Option<Uuid>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(diesel::update(
            api_keys::table
                .filter(api_keys::key.eq(key))
                .filter(api_keys::is_active.eq(true)),
        )
        .set(api_keys::last_used_at.eq(Utc::now()))
        .returning(api_keys::id)
        .get_result(&mut conn)
        .optional()?)
    }

    fn log_call(&self, entry: ApiLogEntry) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(api_logs::table)
            .values(&NewApiLogRow {
                id: Uuid::new_v4(),
                api_key_id: entry.api_key_id,
                method: entry.method,
                path: entry.path,
                status_code: entry.status_code,
                latency_ms: entry.latency_ms,
            })
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_db::setup_db;

    fn seed_key(store: &DieselStore, key: &str, active: bool) -> Uuid {
        let mut conn = store.pool.get().unwrap();
        diesel::insert_into(api_keys::table)
            .values((
                api_keys::id.eq(Uuid::new_v4()),
                api_keys::name.eq("crm"),
                api_keys::key.eq(key),
                api_keys::is_active.eq(active),
            ))
            .returning(api_keys::id)
            .get_result(&mut conn)
            .unwrap()
    }

    #[tokio::test]
    async fn only_active_keys_verify() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let id = seed_key(&store, "live-key", true);
        seed_key(&store, "revoked-key", false);

        assert_eq!(store.verify_key("live-key").unwrap(), Some(id));
        assert_eq!(store.verify_key("revoked-key").unwrap(), None);
        assert_eq!(store.verify_key("unknown").unwrap(), None);

        let mut conn = store.pool.get().unwrap();
        let last_used: Option<chrono::DateTime<Utc>> = api_keys::table
            .filter(api_keys::id.eq(id))
            .select(api_keys::last_used_at)
            .first(&mut conn)
            .unwrap();
        assert!(last_used.is_some());
    }

    #[tokio::test]
    async fn log_call_accepts_anonymous_entries() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);

        store
            .log_call(ApiLogEntry {
                api_key_id: None,
                method: "GET".to_string(),
                path: "/api/customers".to_string(),
                status_code: 401,
                latency_ms: 3,
            })
            .unwrap();

        let mut conn = store.pool.get().unwrap();
        let logged: i64 = api_logs::table.count().get_result(&mut conn).unwrap();
        assert_eq!(logged, 1);
    }
}
