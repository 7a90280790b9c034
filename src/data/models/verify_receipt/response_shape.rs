use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::entities::status_code::StatusCode;

/// The payload layouts a verifyReceipt response has used over time.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody
#[derive(Debug)]
pub(crate) enum ResponseShape<'a> {
    /// iOS 7+ receipts: `receipt` is a container holding an `in_app` array.
    Modern {
        status: StatusCode,
        receipt: &'a Map<String, Value>,
        in_app: &'a [Value],
    },
    /// iOS 6 style transaction receipts: `receipt` is the transaction itself.
    Legacy {
        status: StatusCode,
        receipt: &'a Value,
    },
    /// No receipt at all, typically an error response.
    StatusOnly { status: StatusCode },
    Unrecognized,
}

impl<'a> ResponseShape<'a> {
    /// Tries each layout in order; the first one that matches wins.
    pub(crate) fn detect(body: &'a Map<String, Value>) -> Self {
        Self::modern(body)
            .or_else(|| Self::legacy(body))
            .or_else(|| Self::status_only(body))
            .unwrap_or(ResponseShape::Unrecognized)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ResponseShape::Modern { .. } => "modern",
            ResponseShape::Legacy { .. } => "legacy",
            ResponseShape::StatusOnly { .. } => "status_only",
            ResponseShape::Unrecognized => "unrecognized",
        }
    }

    fn modern(body: &'a Map<String, Value>) -> Option<Self> {
        let receipt = body.get("receipt")?.as_object()?;
        let in_app = receipt.get("in_app")?.as_array()?;
        Some(ResponseShape::Modern {
            status: read_status(body),
            receipt,
            in_app: in_app.as_slice(),
        })
    }

    fn legacy(body: &'a Map<String, Value>) -> Option<Self> {
        let receipt = body.get("receipt")?;
        Some(ResponseShape::Legacy {
            status: read_status(body),
            receipt,
        })
    }

    fn status_only(body: &'a Map<String, Value>) -> Option<Self> {
        body.get("status").map(|_| ResponseShape::StatusOnly {
            status: read_status(body),
        })
    }
}

/// Reads the top-level `status`, falling back to
/// [`StatusCode::DataMalformed`] when it is missing or not an integer.
fn read_status(body: &Map<String, Value>) -> StatusCode {
    let Some(raw) = body.get("status") else {
        warn!("verifyReceipt response has a receipt but no status");
        return StatusCode::DataMalformed;
    };
    let code = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    code.map(StatusCode::from).unwrap_or_else(|| {
        warn!(status = %raw, "unreadable verifyReceipt status");
        StatusCode::DataMalformed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detect_name(body: Value) -> &'static str {
        let body = body.as_object().unwrap().clone();
        ResponseShape::detect(&body).name()
    }

    #[test]
    fn receipt_with_in_app_array_is_modern() {
        let body = json!({
            "status": 0,
            "receipt": { "bundle_id": "com.example.app", "in_app": [{}, {}] }
        });
        let body = body.as_object().unwrap();
        match ResponseShape::detect(body) {
            ResponseShape::Modern {
                status,
                receipt,
                in_app,
            } => {
                assert_eq!(status, StatusCode::Ok);
                assert_eq!(receipt["bundle_id"], "com.example.app");
                assert_eq!(in_app.len(), 2);
            }
            other => panic!("expected modern shape, got {other:?}"),
        }
    }

    #[test]
    fn receipt_without_in_app_array_is_legacy() {
        let legacy_bodies = [
            json!({ "status": 0, "receipt": { "bid": "com.example.app" } }),
            json!({ "status": 0, "receipt": { "in_app": "none" } }),
            json!({ "status": 0, "receipt": "opaque" }),
        ];
        for body in legacy_bodies {
            assert_eq!(detect_name(body), "legacy");
        }
    }

    #[test]
    fn status_without_receipt_is_status_only() {
        assert_eq!(detect_name(json!({ "status": 21002 })), "status_only");
        assert_eq!(
            detect_name(json!({ "status": 21007, "environment": "Production" })),
            "status_only"
        );
    }

    #[test]
    fn anything_else_is_unrecognized() {
        assert_eq!(detect_name(json!({})), "unrecognized");
        assert_eq!(detect_name(json!({ "latest_receipt": "abc" })), "unrecognized");
    }

    #[test]
    fn status_falls_back_to_data_malformed() {
        let read = |body: Value| read_status(body.as_object().unwrap());
        assert_eq!(
            read(json!({ "status": "21005" })),
            StatusCode::ReceiptServerUnavailable
        );
        assert_eq!(
            read(json!({ "status": 21006 })),
            StatusCode::ReceiptValidButSubscriptionExpired
        );
        assert_eq!(read(json!({ "status": 42 })), StatusCode::Unknown(42));
        assert_eq!(read(json!({ "status": "ok" })), StatusCode::DataMalformed);
        assert_eq!(read(json!({ "status": null })), StatusCode::DataMalformed);
        assert_eq!(read(json!({ "receipt": {} })), StatusCode::DataMalformed);
    }
}
