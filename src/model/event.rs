//! Transaction and error events.

use serde::Serialize;
use uuid::Uuid;

use crate::model::ContextSnapshot;

/// A finished transaction, borrowing its pooled context.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TransactionEvent<'a> {
    pub id: Uuid,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    pub result: &'a str,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSnapshot<'a>>,
}

/// A captured application error or panic.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorEvent<'a> {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "is_empty")]
    pub culprit: &'a str,
    pub exception: &'a Exception,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSnapshot<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exception {
    pub message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// False for panics, which the application did not handle itself.
    pub handled: bool,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_event_serialization() {
        let exception = Exception {
            message: "boom".into(),
            kind: None,
            handled: false,
        };
        let id = Uuid::nil();
        let event = ErrorEvent {
            id,
            transaction_id: None,
            culprit: "",
            exception: &exception,
            context: None,
        };
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({
                "id": id.to_string(),
                "exception": {"message": "boom", "handled": false},
            })
        );
    }
}
