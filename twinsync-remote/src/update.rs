use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid twin update: {0}")]
    Json(#[from] serde_json::Error),

    #[error("twin update must be a JSON object")]
    NotAnObject,
}

/// A device twin update delivered by the backend.
///
/// On connection the backend sends the complete twin, with desired and
/// reported sections. Later changes arrive as a patch that only contains
/// the desired properties that changed.
#[derive(Debug, Clone, PartialEq)]
pub enum TwinUpdate {
    Complete(Map<String, Value>),
    Partial(Map<String, Value>),
}

impl TwinUpdate {
    pub fn parse(payload: &[u8]) -> Result<Self, UpdateError> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, UpdateError> {
        let Value::Object(mut doc) = value else {
            return Err(UpdateError::NotAnObject);
        };

        // a complete twin wraps the desired properties
        if doc.get("desired").is_some_and(Value::is_object)
            && let Some(Value::Object(desired)) = doc.remove("desired")
        {
            return Ok(TwinUpdate::Complete(desired));
        }

        Ok(TwinUpdate::Partial(doc))
    }

    /// The desired properties carried by the update
    pub fn desired(&self) -> &Map<String, Value> {
        match self {
            TwinUpdate::Complete(desired) | TwinUpdate::Partial(desired) => desired,
        }
    }
}
