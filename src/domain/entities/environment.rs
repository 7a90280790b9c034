use serde::Deserialize;

use crate::constants::{VERIFY_RECEIPT_PRODUCTION_URL, VERIFY_RECEIPT_SANDBOX_URL};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Environment {
    /// Indicates that the receipt was generated in the sandbox environment.
    Sandbox,
    /// Indicates that the receipt was generated in the production environment.
    Production,

    #[serde(untagged)]
    Unknown(String),
}

impl Environment {
    /// The verifyReceipt endpoint that accepts receipts from this
    /// environment, if known.
    pub fn verify_receipt_url(&self) -> Option<&'static str> {
        match self {
            Environment::Sandbox => Some(VERIFY_RECEIPT_SANDBOX_URL),
            Environment::Production => Some(VERIFY_RECEIPT_PRODUCTION_URL),
            Environment::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_known_and_unknown_values() {
        let sandbox: Environment = serde_json::from_str(r#""Sandbox""#).unwrap();
        assert_eq!(sandbox, Environment::Sandbox);
        let production: Environment = serde_json::from_str(r#""Production""#).unwrap();
        assert_eq!(production, Environment::Production);
        let other: Environment = serde_json::from_str(r#""Xcode""#).unwrap();
        assert_eq!(other, Environment::Unknown("Xcode".to_string()));
    }

    #[test]
    fn maps_to_verify_receipt_url() {
        assert_eq!(
            Environment::Sandbox.verify_receipt_url(),
            Some("https://sandbox.itunes.apple.com/verifyReceipt")
        );
        assert_eq!(
            Environment::Production.verify_receipt_url(),
            Some("https://buy.itunes.apple.com/verifyReceipt")
        );
        assert_eq!(
            Environment::Unknown("Xcode".to_string()).verify_receipt_url(),
            None
        );
    }
}
