use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_repr::Deserialize_repr;
use serde_with::{
    formats::Flexible, serde_as, DefaultOnError, DisplayFromStr, PickFirst, TimestampMilliSeconds,
};

use crate::data::models::verify_receipt::common::{expect_object, LenientBool, LenientString};

/// Renewal state of one auto-renewable subscription, from the
/// `pending_renewal_info` array of a verifyReceipt response.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/pending_renewal_info
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingRenewalInfo {
    /// The unique identifier of the product purchased.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    product_id: Option<String>,
    /// The product identifier of the product that renews at the next billing
    /// period.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    auto_renew_product_id: Option<String>,
    /// Absent is read as off.
    #[serde_as(as = "DefaultOnError<LenientBool>")]
    #[serde(default)]
    auto_renew_status: bool,
    /// The reason a subscription expired.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    expiration_intent: Option<ExpirationIntent>,
    /// Whether an expired subscription is still being retried for billing.
    #[serde_as(as = "DefaultOnError<Option<LenientBool>>")]
    #[serde(default)]
    is_in_billing_retry_period: Option<bool>,
    /// The transaction identifier of the original purchase.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    original_transaction_id: Option<String>,
    /// The time at which the grace period for subscription renewals expires,
    /// in milliseconds since the epoch.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "grace_period_expires_date_ms")]
    grace_period_expires_date: Option<DateTime<Utc>>,

    #[serde(skip)]
    raw: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum ExpirationIntent {
    /// The customer canceled their subscription.
    VoluntaryCancellation = 1,
    /// Billing error; for example, the customer’s payment information is no
    /// longer valid.
    BillingError = 2,
    /// The customer didn’t consent to a recent price increase.
    PriceIncreaseDecline = 3,
    /// The product wasn’t available for purchase at the time of renewal.
    ProductUnavailable = 4,
    /// The subscription expired for some other reason.
    Other = 5,
}

impl FromStr for ExpirationIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(ExpirationIntent::VoluntaryCancellation),
            "2" => Ok(ExpirationIntent::BillingError),
            "3" => Ok(ExpirationIntent::PriceIncreaseDecline),
            "4" => Ok(ExpirationIntent::ProductUnavailable),
            "5" => Ok(ExpirationIntent::Other),
            other => Err(format!("unknown expiration intent '{other}'")),
        }
    }
}

impl PendingRenewalInfo {
    /// Builds the renewal info from one flat field mapping.
    ///
    /// Fails only if `value` is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let fields = expect_object(value, "pending renewal info")?;
        let mut info = PendingRenewalInfo::deserialize(value)?;
        info.raw = fields.clone();
        Ok(info)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    /// The product that renews at the next billing period. Differs from
    /// [`Self::product_id`] after an upgrade, downgrade, or crossgrade.
    pub fn auto_renew_product_id(&self) -> Option<&str> {
        self.auto_renew_product_id.as_deref()
    }

    /// Whether the subscription will renew at the end of the current period.
    pub fn auto_renew_status(&self) -> bool {
        self.auto_renew_status
    }

    /// Why the subscription expired. Only present for expired subscriptions.
    pub fn expiration_intent(&self) -> Option<ExpirationIntent> {
        self.expiration_intent
    }

    /// Whether the App Store is still attempting to renew an expired
    /// subscription.
    pub fn is_in_billing_retry_period(&self) -> Option<bool> {
        self.is_in_billing_retry_period
    }

    pub fn original_transaction_id(&self) -> Option<&str> {
        self.original_transaction_id.as_deref()
    }

    pub fn grace_period_expires_date(&self) -> Option<DateTime<Utc>> {
        self.grace_period_expires_date
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn reads_back_supplied_fields() {
        let fields = json!({
            "auto_renew_product_id": "com.example.yearly",
            "product_id": "com.example.monthly",
            "original_transaction_id": "1000000123456700",
            "auto_renew_status": "1",
            "expiration_intent": "2",
            "is_in_billing_retry_period": "1",
            "grace_period_expires_date_ms": "1711965600000"
        });
        let info = PendingRenewalInfo::from_value(&fields).unwrap();

        assert_eq!(info.product_id(), Some("com.example.monthly"));
        assert_eq!(info.auto_renew_product_id(), Some("com.example.yearly"));
        assert!(info.auto_renew_status());
        assert_eq!(info.expiration_intent(), Some(ExpirationIntent::BillingError));
        assert_eq!(info.is_in_billing_retry_period(), Some(true));
        assert_eq!(info.original_transaction_id(), Some("1000000123456700"));
        assert_eq!(
            info.grace_period_expires_date(),
            Utc.timestamp_millis_opt(1_711_965_600_000).single()
        );
        assert_eq!(Value::Object(info.raw().clone()), fields);
    }

    #[test]
    fn missing_optional_fields_are_absent() {
        let info = PendingRenewalInfo::from_value(&json!({
            "product_id": "com.example.monthly",
            "auto_renew_product_id": "com.example.monthly",
            "auto_renew_status": "0"
        }))
        .unwrap();

        assert!(!info.auto_renew_status());
        assert_eq!(info.expiration_intent(), None);
        assert_eq!(info.is_in_billing_retry_period(), None);
        assert_eq!(info.original_transaction_id(), None);
        assert_eq!(info.grace_period_expires_date(), None);
    }

    #[test]
    fn accepts_native_json_types() {
        let info = PendingRenewalInfo::from_value(&json!({
            "product_id": "com.example.monthly",
            "auto_renew_status": true,
            "expiration_intent": 5,
            "is_in_billing_retry_period": 0
        }))
        .unwrap();
        assert!(info.auto_renew_status());
        assert_eq!(info.expiration_intent(), Some(ExpirationIntent::Other));
        assert_eq!(info.is_in_billing_retry_period(), Some(false));
    }

    #[test]
    fn unknown_expiration_intent_is_absent() {
        let info = PendingRenewalInfo::from_value(&json!({ "expiration_intent": "9" })).unwrap();
        assert_eq!(info.expiration_intent(), None);
        assert!(!info.auto_renew_status());
        assert_eq!(info.product_id(), None);
        assert_eq!(info.auto_renew_product_id(), None);
    }
}
