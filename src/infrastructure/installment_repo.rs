use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::installment::{DueInstallment, ReminderSlot};
use crate::domain::ports::InstallmentRepository;
use crate::schema::{customers, installment_payments, installment_plans};

use super::models::DueInstallmentRow;
use super::store::DieselStore;

const PENDING: &str = "pending";

impl From<DueInstallmentRow> for DueInstallment {
    fn from(row: DueInstallmentRow) -> Self {
        DueInstallment {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            phone: row.phone,
            installment_number: row.installment_number,
            amount: row.amount.to_string(),
            due_date: row.due_date,
            reminder_sent_2days: row.reminder_sent_2days,
            reminder_sent_1day: row.reminder_sent_1day,
        }
    }
}

impl InstallmentRepository for DieselStore {
    fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueInstallment>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<DueInstallmentRow> = installment_payments::table
            .inner_join(installment_plans::table.inner_join(customers::table))
            .filter(installment_payments::status.eq(PENDING))
            .filter(installment_payments::due_date.between(from, to))
            .order((
                installment_payments::due_date.asc(),
                installment_payments::installment_number.asc(),
            ))
            .select((
                installment_payments::id,
                installment_payments::installment_number,
                installment_payments::amount,
                installment_payments::due_date,
                installment_payments::reminder_sent_2days,
                installment_payments::reminder_sent_1day,
                customers::id,
                customers::name,
                customers::phone,
            ))
            .load(&mut conn)?;

        Ok(rows.into_iter().map(DueInstallment::from).collect())
    }

    fn mark_reminded(&self, id: Uuid, slot: ReminderSlot) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let target = installment_payments::table.filter(installment_payments::id.eq(id));

        let updated = match slot {
            ReminderSlot::TwoDays => diesel::update(target)
                .set(installment_payments::reminder_sent_2days.eq(true))
                .execute(&mut conn)?,
            ReminderSlot::OneDay => diesel::update(target)
                .set(installment_payments::reminder_sent_1day.eq(true))
                .execute(&mut conn)?,
            ReminderSlot::DueToday => return Ok(()),
        };
        if updated == 0 {
            return Err(DomainError::NotFound("Installment"));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::fixtures::seed_installment;
    use super::*;
    use crate::domain::customer::NewCustomer;
    use crate::domain::ports::CustomerRepository;
    use crate::infrastructure::test_db::setup_db;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn seed_customer(store: &DieselStore) -> Uuid {
        store
            .create_customer(NewCustomer {
                name: "Sara".to_string(),
                phone: "+966500000001".to_string(),
                email: None,
                agency_id: None,
            })
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn due_between_returns_pending_in_window_only() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool.clone());
        let customer_id = seed_customer(&store);

        let in_window = seed_installment(&pool, customer_id, today() + Days::new(2), "pending");
        seed_installment(&pool, customer_id, today() + Days::new(3), "pending");
        seed_installment(&pool, customer_id, today() + Days::new(1), "paid");

        let due = store.due_between(today(), today() + Days::new(2)).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, in_window);
        assert_eq!(due[0].phone, "+966500000001");
        assert_eq!(due[0].amount, "500.00");
        assert!(!due[0].reminder_sent_2days);
    }

    #[tokio::test]
    async fn mark_reminded_sets_only_the_slot_flag() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool.clone());
        let customer_id = seed_customer(&store);
        let id = seed_installment(&pool, customer_id, today(), "pending");

        store.mark_reminded(id, ReminderSlot::OneDay).unwrap();
        store.mark_reminded(id, ReminderSlot::DueToday).unwrap();

        let due = store.due_between(today(), today()).unwrap();
        assert!(due[0].reminder_sent_1day);
        assert!(!due[0].reminder_sent_2days);
        assert!(matches!(
            store.mark_reminded(Uuid::new_v4(), ReminderSlot::TwoDays),
            Err(DomainError::NotFound(_))
        ));
    }
}
