use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::installment::{DueInstallment, ReminderSlot};
use crate::domain::message::EnqueueOutcome;
use crate::domain::ports::{InstallmentRepository, WebhookTransport};

use super::blocking;
use super::notification_service::{NotificationService, NotificationStore};

/// How far ahead of the due date reminders start.
const LOOKAHEAD_DAYS: u64 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReminderReport {
    pub checked: usize,
    pub enqueued: usize,
    /// Installments whose reminder for today's offset was already sent.
    pub skipped: usize,
    /// Reminders that were already queued under the same dedupe key.
    pub duplicates: usize,
    pub errors: usize,
}

/// Enqueues reminders for installments due within the next two days.
///
/// Messages are only queued here; the queue processor delivers them.
pub struct ReminderService<S, T> {
    notifier: Arc<NotificationService<S, T>>,
}

impl<S, T> ReminderService<S, T>
where
    S: NotificationStore + InstallmentRepository,
    T: WebhookTransport,
{
    pub fn new(notifier: Arc<NotificationService<S, T>>) -> Self {
        Self { notifier }
    }

    pub async fn run(&self, today: NaiveDate) -> Result<ReminderReport, DomainError> {
        let until = today
            .checked_add_days(Days::new(LOOKAHEAD_DAYS))
            .ok_or_else(|| DomainError::InvalidInput(format!("date out of range: {today}")))?;
        let due = blocking(self.notifier.store(), move |s| s.due_between(today, until)).await?;

        let mut report = ReminderReport {
            checked: due.len(),
            ..ReminderReport::default()
        };

        for installment in due {
            let days_left = (installment.due_date - today).num_days();
            let Some(slot) = ReminderSlot::from_days_left(days_left) else {
                report.skipped += 1;
                continue;
            };
            if installment.already_reminded(slot) {
                report.skipped += 1;
                continue;
            }

            let event = reminder_event(&installment, days_left);
            match self.notifier.enqueue(&event, None).await {
                Ok(EnqueueOutcome::Inserted(_)) => report.enqueued += 1,
                Ok(EnqueueOutcome::Duplicate(_)) => report.duplicates += 1,
                Err(e) => {
                    log::error!(
                        "Could not enqueue reminder for installment {}: {}",
                        installment.id,
                        e
                    );
                    report.errors += 1;
                    continue;
                }
            }

            // Flipped after a duplicate too, so a crash between insert and flag
            // update heals on the next run.
            if slot != ReminderSlot::DueToday {
                let id = installment.id;
                if let Err(e) =
                    blocking(self.notifier.store(), move |s| s.mark_reminded(id, slot)).await
                {
                    log::warn!("Could not flag reminder on installment {}: {}", id, e);
                    report.errors += 1;
                }
            }
        }

        log::info!(
            "Installment reminders for {}: {} checked, {} enqueued, {} skipped, {} duplicates",
            today,
            report.checked,
            report.enqueued,
            report.skipped,
            report.duplicates
        );
        Ok(report)
    }

    /// Run once per `every` for the life of the process.
    pub async fn run_periodically(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run(Utc::now().date_naive()).await {
                log::error!("Installment reminder run failed: {}", e);
            }
        }
    }
}

fn reminder_event(installment: &DueInstallment, days_left: i64) -> NotificationEvent {
    NotificationEvent::InstallmentReminder {
        installment_id: installment.id,
        customer_id: Some(installment.customer_id),
        customer_name: installment.customer_name.clone(),
        phone: installment.phone.clone(),
        installment_number: installment.installment_number,
        amount: installment.amount.clone(),
        due_date: installment.due_date,
        days_left,
    }
}
