use serde_json::Value;

/// Errors raised while reading a verifyReceipt response.
///
/// Business-level rejections (expired, environment mismatch, bad shared
/// secret, ...) are never reported here; they are carried by the parsed
/// response's status code instead.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// The response was not a JSON object.
    #[error("verifyReceipt response must be a JSON object, found {found}")]
    MalformedInput { found: &'static str },

    /// The response body could not be decoded as JSON.
    #[error("failed to decode verifyReceipt response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReceiptError {
    pub(crate) fn malformed_input(value: &Value) -> Self {
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        Self::MalformedInput { found }
    }
}
