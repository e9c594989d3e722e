// Shared test fixtures for events appended in unit tests.

use crate::shared::core::event_data::EventData;
use serde_json::json;

pub struct CustomerEventBuilder {
    inner: EventData,
}

impl Default for CustomerEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl CustomerEventBuilder {
    pub fn new() -> Self {
        Self {
            inner: EventData::create(
                "CREATE-CUSTOMER",
                json!({"firstName": "Jovan", "lastName": "Trajkov", "random": 0}),
            ),
        }
    }

    pub fn event_name(mut self, v: impl Into<String>) -> Self {
        self.inner.event_name = v.into();
        self
    }

    pub fn random(mut self, v: i64) -> Self {
        self.inner.data = json!({
            "firstName": format!("Jovan{v}"),
            "lastName": format!("Trajkov{v}"),
            "random": v,
        });
        self
    }

    pub fn build(self) -> EventData {
        self.inner
    }
}

/// `count` distinct customer events, payload `random` numbered from 0.
pub fn make_customer_events(count: usize) -> Vec<EventData> {
    (0..count)
        .map(|i| CustomerEventBuilder::new().random(i as i64).build())
        .collect()
}
