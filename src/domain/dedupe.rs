use std::fmt;

/// Identity of one logical notification.
///
/// Keys are derived from the event and the entity it concerns, never from the
/// time of the call, so re-triggering the same event lands on the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// `<event>_<entity_id>`, with the event name lowercased and spaces folded to `_`.
    pub fn for_event(event: &str, entity_id: impl fmt::Display) -> Self {
        Self(format!("{}_{}", slug(event), entity_id))
    }

    /// Append a discriminator for events that legitimately repeat per entity.
    pub fn with(mut self, discriminator: impl fmt::Display) -> Self {
        self.0.push('_');
        self.0.push_str(&slug(&discriminator.to_string()));
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn slug(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn same_event_and_entity_yield_same_key() {
        let id = Uuid::new_v4();
        assert_eq!(
            DedupeKey::for_event("payment_received", id),
            DedupeKey::for_event("payment_received", id)
        );
    }

    #[test]
    fn event_name_is_normalized() {
        let key = DedupeKey::for_event("Order Status", 42);
        assert_eq!(key.as_str(), "order_status_42");
    }

    #[test]
    fn discriminator_distinguishes_repeats() {
        let base = DedupeKey::for_event("installment_reminder", 7);
        assert_eq!(base.clone().with("d2").as_str(), "installment_reminder_7_d2");
        assert_ne!(base.clone().with("d2"), base.with("d1"));
    }
}
