use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    BusinessSummary, ListResult, NewOrderInput, NewPaymentInput, OrderContact, OrderView,
    PaymentView,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{customers, orders, payments};

use super::models::{NewOrderRow, NewPaymentRow, OrderRow, PaymentRow};
use super::store::DieselStore;

impl From<OrderRow> for OrderView {
    fn from(o: OrderRow) -> Self {
        OrderView {
            id: o.id,
            customer_id: o.customer_id,
            order_number: o.order_number,
            status: o.status,
            total_amount: o.total_amount,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

impl From<PaymentRow> for PaymentView {
    fn from(p: PaymentRow) -> Self {
        PaymentView {
            id: p.id,
            order_id: p.order_id,
            amount: p.amount,
            method: p.method,
            paid_at: p.paid_at,
        }
    }
}

fn order_contact(conn: &mut PgConnection, order: OrderRow) -> Result<OrderContact, DomainError> {
    let (customer_name, phone): (String, String) = customers::table
        .filter(customers::id.eq(order.customer_id))
        .select((customers::name, customers::phone))
        .first(conn)?;
    Ok(OrderContact {
        order: order.into(),
        customer_name,
        phone,
    })
}

impl OrderRepository for DieselStore {
    fn create(&self, order: NewOrderInput) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let order_id = Uuid::new_v4();
        diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: order_id,
                customer_id: order.customer_id,
                order_number: order.order_number,
                status: order.status,
                total_amount: order.total_amount,
            })
            .execute(&mut conn)?;

        Ok(order_id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(OrderView::from))
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: rows.into_iter().map(OrderView::from).collect(),
                total,
            })
        })
    }

    fn update_status(&self, id: Uuid, status: &str) -> Result<OrderContact, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((orders::status.eq(status), orders::updated_at.eq(Utc::now())))
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;
            order_contact(conn, order)
        })
    }

    fn list_payments(&self, order_id: Option<Uuid>) -> Result<Vec<PaymentView>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = payments::table
            .select(PaymentRow::as_select())
            .order(payments::paid_at.desc())
            .into_boxed();
        if let Some(order_id) = order_id {
            query = query.filter(payments::order_id.eq(order_id));
        }

        Ok(query
            .load(&mut conn)?
            .into_iter()
            .map(PaymentView::from)
            .collect())
    }

    fn create_payment(
        &self,
        payment: NewPaymentInput,
    ) -> Result<(PaymentView, OrderContact), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = orders::table
                .filter(orders::id.eq(payment.order_id))
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;

            let row = diesel::insert_into(payments::table)
                .values(&NewPaymentRow {
                    id: Uuid::new_v4(),
                    order_id: payment.order_id,
                    amount: payment.amount,
                    method: payment.method,
                })
                .returning(PaymentRow::as_returning())
                .get_result(conn)?;

            Ok((row.into(), order_contact(conn, order)?))
        })
    }

    fn summary(&self) -> Result<BusinessSummary, DomainError> {
        let mut conn = self.pool.get()?;

        let customers: i64 = customers::table.count().get_result(&mut conn)?;
        let orders: i64 = orders::table.count().get_result(&mut conn)?;
        let payments_total: Option<BigDecimal> = payments::table
            .select(diesel::dsl::sum(payments::amount))
            .first(&mut conn)?;

        Ok(BusinessSummary {
            customers,
            orders,
            payments_total: payments_total.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::customer::NewCustomer;
    use crate::domain::ports::CustomerRepository;
    use crate::infrastructure::test_db::setup_db;

    fn seed_order(store: &DieselStore, number: &str) -> (Uuid, Uuid) {
        let customer = store
            .create_customer(NewCustomer {
                name: "Sara".to_string(),
                phone: format!("+96650{number}"),
                email: None,
                agency_id: None,
            })
            .expect("create customer failed");
        let order_id = store
            .create(NewOrderInput {
                customer_id: customer.id,
                order_number: format!("ORD-{number}"),
                status: "new".to_string(),
                total_amount: BigDecimal::from_str("300.00").unwrap(),
            })
            .expect("create order failed");
        (customer.id, order_id)
    }

    #[tokio::test]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (customer_id, order_id) = seed_order(&store, "1");

        let order = store
            .find_by_id(order_id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(order.id, order_id);
        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.status, "new");
        assert_eq!(order.order_number, "ORD-1");
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);

        assert!(store.find_by_id(Uuid::new_v4()).expect("find failed").is_none());
    }

    #[tokio::test]
    async fn list_paginates_correctly() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        for n in 0..5 {
            seed_order(&store, &n.to_string());
        }

        let page1 = store.list(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = store.list(2, 3).expect("list page 2 failed");
        assert_eq!(page2.items.len(), 2);
    }

    #[tokio::test]
    async fn update_status_returns_contact() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (_, order_id) = seed_order(&store, "7");

        let contact = store.update_status(order_id, "ready").unwrap();

        assert_eq!(contact.order.status, "ready");
        assert_eq!(contact.phone, "+966507");
        assert!(matches!(
            store.update_status(Uuid::new_v4(), "ready"),
            Err(DomainError::NotFound("Order"))
        ));
    }

    #[tokio::test]
    async fn payments_are_recorded_and_summed() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (_, order_id) = seed_order(&store, "8");

        for amount in ["100.00", "50.50"] {
            store
                .create_payment(NewPaymentInput {
                    order_id,
                    amount: BigDecimal::from_str(amount).unwrap(),
                    method: "cash".to_string(),
                })
                .unwrap();
        }

        assert_eq!(store.list_payments(Some(order_id)).unwrap().len(), 2);
        assert!(store.list_payments(Some(Uuid::new_v4())).unwrap().is_empty());

        let summary = store.summary().unwrap();
        assert_eq!(summary.customers, 1);
        assert_eq!(summary.orders, 1);
        assert_eq!(summary.payments_total, BigDecimal::from_str("150.50").unwrap());
    }
}
