//! The progress event type and its wire encoding.

use serde::{Deserialize, Serialize};

/// A transient notification published while a job is processed.
///
/// Two shapes exist: one per-entry update for every processed feed
/// entry, and one fatal error that terminates the run. The job id is
/// carried by the hub topic, not the payload, so the wire form is the
/// bare object a browser client consumes directly:
///
/// ```json
/// {"processed": 3, "total": 10, "product_id": "sku-123"}
/// {"error": "Feed request failed with status 502"}
/// ```
///
/// There is no terminal "done" shape; observers infer completion from
/// `processed == total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    /// One feed entry was processed (successfully or not).
    Entry {
        processed: u32,
        total: u32,
        product_id: String,
    },
    /// The job hit a fatal condition and stopped.
    Error { error: String },
}

impl ProgressEvent {
    /// Build a per-entry update.
    pub fn entry(processed: u32, total: u32, product_id: impl Into<String>) -> Self {
        Self::Entry {
            processed,
            total,
            product_id: product_id.into(),
        }
    }

    /// Build a job-fatal error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_event_wire_shape() {
        let event = ProgressEvent::entry(3, 10, "sku-123");
        let json = serde_json::to_value(&event).expect("serialization should succeed");
        assert_eq!(
            json,
            serde_json::json!({ "processed": 3, "total": 10, "product_id": "sku-123" })
        );
    }

    #[test]
    fn error_event_wire_shape() {
        let event = ProgressEvent::error("feed unreachable");
        let json = serde_json::to_value(&event).expect("serialization should succeed");
        assert_eq!(json, serde_json::json!({ "error": "feed unreachable" }));
    }

    #[test]
    fn wire_shapes_deserialize_to_matching_variants() {
        let entry: ProgressEvent =
            serde_json::from_str(r#"{"processed":1,"total":2,"product_id":"p"}"#)
                .expect("entry shape should parse");
        assert_eq!(entry, ProgressEvent::entry(1, 2, "p"));

        let error: ProgressEvent = serde_json::from_str(r#"{"error":"boom"}"#)
            .expect("error shape should parse");
        assert_eq!(error, ProgressEvent::error("boom"));
    }
}
