use serde::{Deserialize, Serialize};

use super::environment::Environment;

/// The `status` value of a verifyReceipt response.
///
/// https://developer.apple.com/documentation/appstorereceipts/status
///
/// Any integer can be represented; codes not listed here are kept as
/// [`StatusCode::Unknown`] and are never considered OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum StatusCode {
    /// The receipt is valid.
    Ok,
    /// The request to the App Store was not made using the HTTP POST request
    /// method, or the App Store could not read the JSON object provided.
    AppStoreCannotRead,
    /// The data in the receipt-data property was malformed or missing. Also
    /// used when a response has no recognizable layout.
    #[default]
    DataMalformed,
    /// The receipt could not be authenticated.
    ReceiptNotAuthenticated,
    /// The shared secret provided does not match the shared secret on file
    /// for the account.
    SharedSecretMismatch,
    /// The receipt server was temporarily unable to provide the receipt.
    ReceiptServerUnavailable,
    /// The receipt is valid but the subscription has expired. The decoded
    /// receipt data is still part of the response.
    ReceiptValidButSubscriptionExpired,
    /// The receipt is from the sandbox environment but was sent to the
    /// production endpoint.
    SandboxReceiptSentToProduction,
    /// The receipt is from the production environment but was sent to the
    /// sandbox endpoint.
    ProductionReceiptSentToSandbox,
    /// Internal data access error (21009, or any code in 21100..=21199).
    InternalDataAccessError(i64),
    /// The user account cannot be found or has been deleted.
    UserAccountNotFound,

    Unknown(i64),
}

/// How a caller should react to a [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClassification {
    Ok,
    /// The validation server failed; the same request may succeed later.
    TransientServerError,
    /// The receipt was sent to the wrong endpoint; resubmit to the other one.
    EnvironmentMismatch,
    /// The receipt was rejected and retrying will not help.
    ValidationFailure,
}

impl StatusCode {
    pub fn code(&self) -> i64 {
        match *self {
            StatusCode::Ok => 0,
            StatusCode::AppStoreCannotRead => 21000,
            StatusCode::DataMalformed => 21002,
            StatusCode::ReceiptNotAuthenticated => 21003,
            StatusCode::SharedSecretMismatch => 21004,
            StatusCode::ReceiptServerUnavailable => 21005,
            StatusCode::ReceiptValidButSubscriptionExpired => 21006,
            StatusCode::SandboxReceiptSentToProduction => 21007,
            StatusCode::ProductionReceiptSentToSandbox => 21008,
            StatusCode::InternalDataAccessError(code) => code,
            StatusCode::UserAccountNotFound => 21010,
            StatusCode::Unknown(code) => code,
        }
    }

    pub fn classification(&self) -> StatusClassification {
        match self {
            StatusCode::Ok => StatusClassification::Ok,
            StatusCode::ReceiptServerUnavailable | StatusCode::InternalDataAccessError(_) => {
                StatusClassification::TransientServerError
            }
            StatusCode::SandboxReceiptSentToProduction
            | StatusCode::ProductionReceiptSentToSandbox => {
                StatusClassification::EnvironmentMismatch
            }
            StatusCode::AppStoreCannotRead
            | StatusCode::DataMalformed
            | StatusCode::ReceiptNotAuthenticated
            | StatusCode::SharedSecretMismatch
            | StatusCode::ReceiptValidButSubscriptionExpired
            | StatusCode::UserAccountNotFound
            | StatusCode::Unknown(_) => StatusClassification::ValidationFailure,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == StatusCode::Ok
    }

    /// Whether resubmitting the same request to the same endpoint may succeed.
    pub fn is_retryable(&self) -> bool {
        self.classification() == StatusClassification::TransientServerError
    }

    /// The environment the receipt should be resubmitted to, for the two
    /// environment-mismatch codes.
    pub fn retry_environment(&self) -> Option<Environment> {
        match self {
            StatusCode::SandboxReceiptSentToProduction => Some(Environment::Sandbox),
            StatusCode::ProductionReceiptSentToSandbox => Some(Environment::Production),
            _ => None,
        }
    }
}

impl From<i64> for StatusCode {
    fn from(code: i64) -> Self {
        match code {
            0 => StatusCode::Ok,
            21000 => StatusCode::AppStoreCannotRead,
            21002 => StatusCode::DataMalformed,
            21003 => StatusCode::ReceiptNotAuthenticated,
            21004 => StatusCode::SharedSecretMismatch,
            21005 => StatusCode::ReceiptServerUnavailable,
            21006 => StatusCode::ReceiptValidButSubscriptionExpired,
            21007 => StatusCode::SandboxReceiptSentToProduction,
            21008 => StatusCode::ProductionReceiptSentToSandbox,
            21009 | 21100..=21199 => StatusCode::InternalDataAccessError(code),
            21010 => StatusCode::UserAccountNotFound,
            other => StatusCode::Unknown(other),
        }
    }
}

impl From<StatusCode> for i64 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
