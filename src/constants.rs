/// Production endpoint of the legacy verifyReceipt API.
///
/// https://developer.apple.com/documentation/appstorereceipts/verifyreceipt
pub const VERIFY_RECEIPT_PRODUCTION_URL: &str = "https://buy.itunes.apple.com/verifyReceipt";

/// Sandbox endpoint of the legacy verifyReceipt API.
pub const VERIFY_RECEIPT_SANDBOX_URL: &str = "https://sandbox.itunes.apple.com/verifyReceipt";
