use chrono::NaiveDate;
use uuid::Uuid;

/// Which reminder flag guards a day offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    TwoDays,
    OneDay,
    /// Due today; guarded by the dedupe key alone.
    DueToday,
}

impl ReminderSlot {
    pub fn from_days_left(days_left: i64) -> Option<Self> {
        match days_left {
            2 => Some(ReminderSlot::TwoDays),
            1 => Some(ReminderSlot::OneDay),
            0 => Some(ReminderSlot::DueToday),
            _ => None,
        }
    }
}

/// A pending installment joined with the customer contact.
#[derive(Debug, Clone)]
pub struct DueInstallment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub phone: String,
    pub installment_number: i32,
    pub amount: String,
    pub due_date: NaiveDate,
    pub reminder_sent_2days: bool,
    pub reminder_sent_1day: bool,
}

impl DueInstallment {
    pub fn already_reminded(&self, slot: ReminderSlot) -> bool {
        match slot {
            ReminderSlot::TwoDays => self.reminder_sent_2days,
            ReminderSlot::OneDay => self.reminder_sent_1day,
            ReminderSlot::DueToday => false,
        }
    }
}
