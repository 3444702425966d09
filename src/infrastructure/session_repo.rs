use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::SessionRepository;
use crate::domain::session::{SessionStatus, SessionUpdate, WhatsAppSession};
use crate::schema::whatsapp_sessions;

use super::models::SessionRow;
use super::store::DieselStore;

impl TryFrom<SessionRow> for WhatsAppSession {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(WhatsAppSession {
            id: row.id,
            session_name: row.session_name,
            status: row.status.parse()?,
            qr_code: row.qr_code,
            phone_number: row.phone_number,
            updated_at: row.updated_at,
        })
    }
}

fn load_session(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<WhatsAppSession>, DomainError> {
    whatsapp_sessions::table
        .filter(whatsapp_sessions::session_name.eq(name))
        .select(SessionRow::as_select())
        .first(conn)
        .optional()?
        .map(WhatsAppSession::try_from)
        .transpose()
}

impl SessionRepository for DieselStore {
    fn open_session(&self, name: &str) -> Result<WhatsAppSession, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(whatsapp_sessions::table)
            .values((
                whatsapp_sessions::id.eq(Uuid::new_v4()),
                whatsapp_sessions::session_name.eq(name),
                whatsapp_sessions::status.eq(SessionStatus::Pending.as_str()),
            ))
            .on_conflict(whatsapp_sessions::session_name)
            .do_nothing()
            .execute(&mut conn)?;

        load_session(&mut conn, name)?.ok_or(DomainError::NotFound("Session"))
    }

    fn update_session(
        &self,
        name: &str,
        update: SessionUpdate,
    ) -> Result<WhatsAppSession, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(
            whatsapp_sessions::table.filter(whatsapp_sessions::session_name.eq(name)),
        )
        .set((
            whatsapp_sessions::status.eq(update.status.as_str()),
            whatsapp_sessions::qr_code.eq(update.qr_code_for_status()),
            whatsapp_sessions::phone_number.eq(update.phone_number),
            whatsapp_sessions::updated_at.eq(Utc::now()),
        ))
        .returning(SessionRow::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or(DomainError::NotFound("Session"))?;

        row.try_into()
    }

    fn find_session(&self, name: &str) -> Result<Option<WhatsAppSession>, DomainError> {
        let mut conn = self.pool.get()?;
        load_session(&mut conn, name)
    }
}
