use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed envelope around an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Event with no payload.
    pub fn bare(event_type: impl Into<String>) -> Self {
        Self::new(event_type, Value::Null)
    }

    /// Serialize any payload into an event.
    pub fn with_payload<T: Serialize>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event(type={})", self.event_type)
    }
}
