use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_repr::Deserialize_repr;
use serde_with::{
    formats::Flexible, serde_as, DefaultOnError, DisplayFromStr, PickFirst, TimestampMilliSeconds,
};

use crate::data::models::verify_receipt::common::{expect_object, LenientBool, LenientString};

/// One in-app purchase transaction of a verifyReceipt response, as found in
/// `receipt.in_app`, `latest_receipt_info`, or (for iOS 6 style receipts) the
/// `receipt` object itself.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/receipt/in_app
///
/// Decoding never fails on individual fields: values that are missing or
/// unreadable are left absent, while present values (including empty
/// strings) are surfaced unchanged. The unmodified fields are kept and
/// available through [`PurchaseItem::raw`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PurchaseItem {
    /// The unique identifier of the product purchased.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    product_id: Option<String>,
    /// A unique identifier for a transaction such as a purchase, restore, or
    /// renewal.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    transaction_id: Option<String>,
    /// The transaction identifier of the original purchase.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    original_transaction_id: Option<String>,
    /// The time the App Store charged the user's account for a purchased or
    /// restored product, or for a subscription purchase or renewal after a
    /// lapse, in milliseconds since the epoch.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "purchase_date_ms")]
    purchase_date: Option<DateTime<Utc>>,
    /// The time of the original app purchase, in milliseconds since the
    /// epoch.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "original_purchase_date_ms")]
    original_purchase_date: Option<DateTime<Utc>>,
    /// The time a subscription expires or when it will renew, in milliseconds
    /// since the epoch.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "expires_date_ms")]
    expires_date: Option<DateTime<Utc>>,
    /// iOS 6 style receipts carry the expiration as milliseconds in
    /// `expires_date`; newer receipts use that key for a formatted date,
    /// which fails to decode here and is ignored.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "expires_date")]
    legacy_expires_date: Option<DateTime<Utc>>,
    /// The time the App Store refunded a transaction or revoked it from
    /// family sharing, in milliseconds since the epoch.
    #[serde_as(as = "DefaultOnError<Option<TimestampMilliSeconds<String, Flexible>>>")]
    #[serde(default, rename = "cancellation_date_ms")]
    cancellation_date: Option<DateTime<Utc>>,
    /// The reason for a refunded or revoked transaction.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    cancellation_reason: Option<CancellationReason>,
    /// The number of consumable products purchased.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    quantity: Option<u32>,
    /// A unique identifier for purchase events across devices, including
    /// subscription-renewal events.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    web_order_line_item_id: Option<String>,
    /// An indicator of whether a subscription is in the free trial period.
    #[serde_as(as = "DefaultOnError<Option<LenientBool>>")]
    #[serde(default)]
    is_trial_period: Option<bool>,
    /// An indicator of whether an auto-renewable subscription is in the
    /// introductory price period.
    #[serde_as(as = "DefaultOnError<Option<LenientBool>>")]
    #[serde(default)]
    is_in_intro_offer_period: Option<bool>,
    /// The identifier of the subscription offer redeemed by the user.
    #[serde_as(as = "DefaultOnError<Option<LenientString>>")]
    #[serde(default)]
    promotional_offer_id: Option<String>,

    #[serde(skip)]
    raw: Map<String, Value>,
}

/// The reason for a refund or revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum CancellationReason {
    /// The customer canceled the transaction for another reason, for example,
    /// an accidental purchase.
    Other = 0,
    /// The customer canceled the transaction due to an actual or perceived
    /// issue within the app.
    AppIssue = 1,
}

impl FromStr for CancellationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(CancellationReason::Other),
            "1" => Ok(CancellationReason::AppIssue),
            other => Err(format!("unknown cancellation reason '{other}'")),
        }
    }
}

impl PurchaseItem {
    /// Builds a purchase item from one flat field mapping.
    ///
    /// Fails only if `value` is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let fields = expect_object(value, "purchase item")?;
        let mut item = PurchaseItem::deserialize(value)?;
        item.raw = fields.clone();
        Ok(item)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn original_transaction_id(&self) -> Option<&str> {
        self.original_transaction_id.as_deref()
    }

    /// The time the App Store charged the account for a purchase, restored
    /// product, subscription, or subscription renewal after a lapse.
    pub fn purchase_date(&self) -> Option<DateTime<Utc>> {
        self.purchase_date
    }

    /// For restored transactions and subscription renewals, the time of the
    /// original purchase.
    pub fn original_purchase_date(&self) -> Option<DateTime<Utc>> {
        self.original_purchase_date
    }

    /// The time a subscription expires or renews. Absent for
    /// non-subscription products.
    pub fn expires_date(&self) -> Option<DateTime<Utc>> {
        self.expires_date.or(self.legacy_expires_date)
    }

    /// The time Apple customer support canceled the transaction, or the time
    /// an auto-renewable subscription plan was upgraded.
    pub fn cancellation_date(&self) -> Option<DateTime<Utc>> {
        self.cancellation_date
    }

    pub fn cancellation_reason(&self) -> Option<CancellationReason> {
        self.cancellation_reason
    }

    /// The number of consumable products purchased, as stated by the receipt.
    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn web_order_line_item_id(&self) -> Option<&str> {
        self.web_order_line_item_id.as_deref()
    }

    pub fn is_trial_period(&self) -> Option<bool> {
        self.is_trial_period
    }

    pub fn is_in_intro_offer_period(&self) -> Option<bool> {
        self.is_in_intro_offer_period
    }

    pub fn promotional_offer_id(&self) -> Option<&str> {
        self.promotional_offer_id.as_deref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_date.is_some()
    }

    /// The field mapping this item was built from.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}
