use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Timestamptz};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::message::{EnqueueOutcome, Message, MessageStats, NewMessage};
use crate::domain::ports::{MessageRepository, TemplateRepository, WebhookRepository};
use crate::domain::webhook::WebhookSetting;
use crate::schema::{message_templates, webhook_settings, whatsapp_messages};

use super::models::{MessageRow, NewMessageRow, WebhookSettingRow};
use super::store::DieselStore;

/// Lease due rows in one statement; `SKIP LOCKED` keeps concurrent claimers apart.
const CLAIM_DUE_SQL: &str = r#"
    UPDATE whatsapp_messages
    SET next_attempt_at = $3, updated_at = now()
    WHERE id IN (
        SELECT id FROM whatsapp_messages
        WHERE (status = 'pending' AND (next_attempt_at IS NULL OR next_attempt_at <= $2))
           OR (status = 'failed' AND next_attempt_at IS NOT NULL AND next_attempt_at <= $2)
        ORDER BY created_at
        LIMIT $1
        FOR UPDATE SKIP LOCKED
    )
    RETURNING id, from_number, to_number, message_type, message_content, status,
              dedupe_key, customer_id, notification_type, webhook_type, order_status,
              attempt_count, next_attempt_at, sent_at, error_message, created_at
"#;

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            from_number: row.from_number,
            to_number: row.to_number,
            message_type: row.message_type,
            content: row.message_content,
            status: row.status.parse()?,
            dedupe_key: row.dedupe_key,
            customer_id: row.customer_id,
            notification_type: row.notification_type,
            webhook_type: row.webhook_type.parse()?,
            order_status: row.order_status,
            attempt_count: row.attempt_count,
            next_attempt_at: row.next_attempt_at,
            sent_at: row.sent_at,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<WebhookSettingRow> for WebhookSetting {
    type Error = DomainError;

    fn try_from(row: WebhookSettingRow) -> Result<Self, Self::Error> {
        Ok(WebhookSetting {
            id: row.id,
            webhook_name: row.webhook_name,
            webhook_type: row.webhook_type.parse()?,
            webhook_url: row.webhook_url,
            is_active: row.is_active,
            order_statuses: row.order_statuses,
            secret_key: row.secret_key,
        })
    }
}

impl MessageRepository for DieselStore {
    fn enqueue(&self, message: NewMessage) -> Result<EnqueueOutcome, DomainError> {
        let mut conn = self.pool.get()?;
        let dedupe_key = message.dedupe_key.clone();

        let inserted: Option<Uuid> = diesel::insert_into(whatsapp_messages::table)
            .values(&NewMessageRow {
                id: Uuid::new_v4(),
                from_number: message.from_number,
                to_number: message.to_number,
                message_type: message.message_type,
                message_content: message.content,
                status: message.status.as_str().to_string(),
                dedupe_key: message.dedupe_key,
                customer_id: message.customer_id,
                notification_type: message.notification_type,
                webhook_type: message.webhook_type.as_str().to_string(),
                order_status: message.order_status,
                next_attempt_at: message.next_attempt_at,
            })
            .on_conflict(whatsapp_messages::dedupe_key)
            .do_nothing()
            .returning(whatsapp_messages::id)
            .get_result(&mut conn)
            .optional()?;

        match (inserted, dedupe_key) {
            (Some(id), _) => Ok(EnqueueOutcome::Inserted(id)),
            (None, Some(key)) => {
                let existing = whatsapp_messages::table
                    .filter(whatsapp_messages::dedupe_key.eq(&key))
                    .select(whatsapp_messages::id)
                    .first(&mut conn)?;
                Ok(EnqueueOutcome::Duplicate(existing))
            }
            (None, None) => Err(DomainError::Internal(
                "insert without dedupe key returned no row".to_string(),
            )),
        }
    }

    fn find_message(&self, id: Uuid) -> Result<Option<Message>, DomainError> {
        let mut conn = self.pool.get()?;
        whatsapp_messages::table
            .filter(whatsapp_messages::id.eq(id))
            .select(MessageRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Message::try_from)
            .transpose()
    }

    fn claim_due(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<MessageRow> = diesel::sql_query(CLAIM_DUE_SQL)
            .bind::<BigInt, _>(limit)
            .bind::<Timestamptz, _>(now)
            .bind::<Timestamptz, _>(lease_until)
            .load(&mut conn)?;

        let mut messages = rows
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // RETURNING order is unspecified.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    fn renew_lease(
        &self,
        id: Uuid,
        held: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        use whatsapp_messages::dsl;
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            dsl::whatsapp_messages
                .filter(dsl::id.eq(id))
                .filter(dsl::status.eq_any(["pending", "failed"]))
                .filter(dsl::next_attempt_at.eq(held)),
        )
        .set((
            dsl::next_attempt_at.eq(Some(until)),
            dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
        Ok(updated == 1)
    }

    fn record_sent(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        use whatsapp_messages::dsl;
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            dsl::whatsapp_messages
                .filter(dsl::id.eq(id))
                .filter(dsl::next_attempt_at.eq(lease)),
        )
        .set((
            dsl::status.eq("sent"),
            dsl::sent_at.eq(Some(sent_at)),
            dsl::attempt_count.eq(dsl::attempt_count + 1),
            dsl::next_attempt_at.eq(None::<DateTime<Utc>>),
            dsl::error_message.eq(None::<String>),
            dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
        Ok(updated == 1)
    }

    fn record_failure(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DomainError> {
        use whatsapp_messages::dsl;
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            dsl::whatsapp_messages
                .filter(dsl::id.eq(id))
                .filter(dsl::next_attempt_at.eq(lease)),
        )
        .set((
            dsl::status.eq("failed"),
            dsl::error_message.eq(Some(error)),
            dsl::attempt_count.eq(dsl::attempt_count + 1),
            dsl::next_attempt_at.eq(next_attempt_at),
            dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
        Ok(updated == 1)
    }

    fn count_due(&self, now: DateTime<Utc>) -> Result<i64, DomainError> {
        use whatsapp_messages::dsl;
        let mut conn = self.pool.get()?;
        let lease_expired = dsl::next_attempt_at.assume_not_null().le(now);
        Ok(dsl::whatsapp_messages
            .filter(
                dsl::status
                    .eq("pending")
                    .and(dsl::next_attempt_at.is_null().or(lease_expired.clone()))
                    .or(dsl::status
                        .eq("failed")
                        .and(dsl::next_attempt_at.is_not_null())
                        .and(lease_expired)),
            )
            .count()
            .get_result(&mut conn)?)
    }

    fn message_stats(&self) -> Result<MessageStats, DomainError> {
        let mut conn = self.pool.get()?;

        let counts: Vec<(String, i64)> = whatsapp_messages::table
            .group_by(whatsapp_messages::status)
            .select((whatsapp_messages::status, diesel::dsl::count_star()))
            .load(&mut conn)?;

        let dead_lettered: i64 = whatsapp_messages::table
            .filter(whatsapp_messages::status.eq("failed"))
            .filter(whatsapp_messages::next_attempt_at.is_null())
            .count()
            .get_result(&mut conn)?;

        let mut stats = MessageStats {
            dead_lettered,
            ..MessageStats::default()
        };
        for (status, count) in counts {
            match status.as_str() {
                "pending" => stats.pending = count,
                "sent" => stats.sent = count,
                "failed" => stats.failed = count,
                "received" => stats.received = count,
                other => log::warn!("Ignoring unknown message status '{}'", other),
            }
        }
        Ok(stats)
    }
}

impl WebhookRepository for DieselStore {
    fn active_webhooks(&self) -> Result<Vec<WebhookSetting>, DomainError> {
        let mut conn = self.pool.get()?;
        webhook_settings::table
            .filter(webhook_settings::is_active.eq(true))
            .order(webhook_settings::created_at.asc())
            .select(WebhookSettingRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(WebhookSetting::try_from)
            .collect()
    }
}

impl TemplateRepository for DieselStore {
    fn active_template(&self, name: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(message_templates::table
            .filter(message_templates::name.eq(name))
            .filter(message_templates::is_active.eq(true))
            .select(message_templates::content)
            .first(&mut conn)
            .optional()?)
    }
}
