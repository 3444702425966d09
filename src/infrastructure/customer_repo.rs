use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::ports::CustomerRepository;
use crate::schema::customers;

use super::models::{CustomerChangeset, CustomerRow, NewCustomerRow};
use super::store::DieselStore;

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            agency_id: row.agency_id,
            created_at: row.created_at,
        }
    }
}

impl CustomerRepository for DieselStore {
    fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(customers::table
            .filter(customers::phone.eq(phone))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Customer::from))
    }

    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(customers::table)
            .values(&NewCustomerRow {
                id: Uuid::new_v4(),
                name: customer.name,
                phone: customer.phone,
                email: customer.email,
                agency_id: customer.agency_id,
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(customers::table
            .filter(customers::id.eq(id))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Customer::from))
    }

    fn list_customers(&self, page: i64, limit: i64) -> Result<(Vec<Customer>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = customers::table.count().get_result(conn)?;

            let rows = customers::table
                .select(CustomerRow::as_select())
                .order(customers::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok((rows.into_iter().map(Customer::from).collect(), total))
        })
    }

    fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(customers::table.filter(customers::id.eq(id)))
            .set(&CustomerChangeset {
                name: update.name,
                phone: update.phone,
                email: update.email,
                updated_at: Utc::now(),
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("Customer"))?;
        Ok(row.into())
    }

    fn delete_customer(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let deleted =
            diesel::delete(customers::table.filter(customers::id.eq(id))).execute(&mut conn)?;
        if deleted == 0 {
            return Err(DomainError::NotFound("Customer"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_db::setup_db;

    fn new_customer(phone: &str) -> NewCustomer {
        NewCustomer {
            name: "Sara".to_string(),
            phone: phone.to_string(),
            email: None,
            agency_id: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_phone() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);

        let created = store.create_customer(new_customer("+966500000001")).unwrap();
        let found = store
            .find_customer_by_phone("+966500000001")
            .unwrap()
            .expect("customer should exist");

        assert_eq!(found, created);
        assert!(store.find_customer_by_phone("+1").unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_phone_is_invalid_input() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);

        store.create_customer(new_customer("+966500000001")).unwrap();
        let err = store.create_customer(new_customer("+966500000001")).unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let created = store.create_customer(new_customer("+966500000001")).unwrap();

        let updated = store
            .update_customer(
                created.id,
                CustomerUpdate {
                    name: Some("Sara A.".to_string()),
                    ..CustomerUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Sara A.");
        assert_eq!(updated.phone, "+966500000001");

        store.delete_customer(created.id).unwrap();
        assert!(matches!(
            store.delete_customer(created.id),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            store.update_customer(created.id, CustomerUpdate::default()),
            Err(DomainError::NotFound(_))
        ));
    }
}
