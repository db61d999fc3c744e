//! Audit events interface for the Replimend recovery core.
//!
//! Every notable decision taken by the recovery pipeline (detections,
//! registrations, declines, promotions, emergent reads) is emitted as an
//! [`Event`] through the [`Audit`] sink so operators can reconstruct what the
//! control plane did and why.
use anyhow::Context as AnyhowContext;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

mod errors;
mod sink;

pub use self::errors::Error;
pub use self::sink::Audit;
pub use self::sink::AuditBackend;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::sink::{AuditFixture, AuditFixtureBackend};

/// An individual audit event emitted by the recovery core.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identifier of the specific event (and its payload type).
    pub code: String,

    /// JSON encoded event payload.
    #[serde(default)]
    pub payload: Value,

    /// Time the event was generated.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

impl Event {
    /// Create an event without a payload.
    pub fn new<C>(code: C) -> Event
    where
        C: Into<String>,
    {
        Event {
            code: code.into(),
            payload: Value::Null,
            time: OffsetDateTime::now_utc(),
        }
    }

    /// Create an event with a structured payload.
    pub fn new_with_payload<C, P>(code: C, payload: P) -> Result<Event>
    where
        C: Into<String>,
        P: Serialize,
    {
        let payload = serde_json::to_value(payload)
            .context(Error::PayloadEncode)
            .map_err(anyhow::Error::from)?;
        Ok(Event {
            code: code.into(),
            payload,
            time: OffsetDateTime::now_utc(),
        })
    }

    /// Attempt to decode the event payload into the specified type.
    pub fn decode<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(self.payload.clone())
            .context(Error::PayloadDecode)
            .map_err(anyhow::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::Event;

    #[test]
    fn decode_event() {
        let event = Event::new_with_payload("TEST", "test string").unwrap();
        let actual: String = event.decode().unwrap();
        assert_eq!(actual, "test string");
    }

    #[test]
    fn event_without_payload_is_null() {
        let event = Event::new("TEST");
        assert_eq!(event.payload, serde_json::Value::Null);
    }
}
