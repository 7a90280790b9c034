use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::DeserializeAs;
use tracing::{debug, warn};

use crate::{
    data::models::verify_receipt::{common::LenientBool, response_shape::ResponseShape},
    errors::ReceiptError,
};

use super::{
    environment::Environment, pending_renewal_info::PendingRenewalInfo,
    purchase_item::PurchaseItem, status_code::StatusCode,
};

/// A decoded verifyReceipt response.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody
///
/// Vendor rejections (expired subscription, environment mismatch, ...) are
/// reported through [`ReceiptResponse::result_code`], never as an error. The
/// only hard failure is a response that is not a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptResponse {
    result_code: StatusCode,
    bundle_id: Option<String>,
    receipt: Map<String, Value>,
    purchases: Vec<PurchaseItem>,
    latest_receipt: Option<String>,
    latest_receipt_info: Option<Vec<PurchaseItem>>,
    pending_renewal_info: Option<Vec<PendingRenewalInfo>>,
    environment: Option<Environment>,
    is_retryable: Option<bool>,
}

impl ReceiptResponse {
    /// Parses an already-decoded response body.
    pub fn new(body: &Value) -> Result<Self, ReceiptError> {
        let mut response = Self::default();
        response.parse(body)?;
        Ok(response)
    }

    /// Decodes and parses a raw response body.
    pub fn from_json_str(body: &str) -> Result<Self, ReceiptError> {
        let body: Value = serde_json::from_str(body)?;
        Self::new(&body)
    }

    /// Replaces the entire state of this response with the contents of
    /// `body`. On error the previous state is left untouched.
    pub fn parse(&mut self, body: &Value) -> Result<&mut Self, ReceiptError> {
        let fields = body
            .as_object()
            .ok_or_else(|| ReceiptError::malformed_input(body))?;

        let mut parsed = ReceiptResponse {
            environment: fields
                .get("environment")
                .and_then(|v| Environment::deserialize(v).ok()),
            is_retryable: fields
                .get("is-retryable")
                .and_then(|v| {
                <LenientBool as DeserializeAs<'_, bool>>::deserialize_as(v).ok()
            }),
            ..Default::default()
        };

        let shape = ResponseShape::detect(fields);
        let shape_name = shape.name();
        match shape {
            ResponseShape::Modern {
                status,
                receipt,
                in_app,
            } => {
                parsed.result_code = status;
                parsed.receipt = receipt.clone();
                parsed.purchases = purchase_items(in_app, "receipt.in_app");
                parsed.bundle_id = string_field(receipt, "bundle_id");
                parsed.latest_receipt_info =
                    array_field(fields, "latest_receipt_info").map(|items| {
                        let mut items = purchase_items(items, "latest_receipt_info");
                        // Stable, so entries with equal purchase dates keep
                        // their vendor order.
                        items.sort_by(|a, b| b.purchase_date().cmp(&a.purchase_date()));
                        items
                    });
                parsed.latest_receipt = string_field(fields, "latest_receipt");
                parsed.pending_renewal_info = array_field(fields, "pending_renewal_info")
                    .map(pending_renewal_items);
            }
            ResponseShape::Legacy { status, receipt } => {
                parsed.result_code = status;
                match receipt.as_object() {
                    Some(receipt_fields) => {
                        parsed.receipt = receipt_fields.clone();
                        parsed.purchases =
                            purchase_items(std::slice::from_ref(receipt), "receipt");
                        parsed.bundle_id = string_field(receipt_fields, "bid");
                    }
                    None => warn!("legacy receipt is not an object; no purchase extracted"),
                }
            }
            ResponseShape::StatusOnly { status } => parsed.result_code = status,
            ResponseShape::Unrecognized => parsed.result_code = StatusCode::DataMalformed,
        }
        debug!(
            shape = shape_name,
            status = %parsed.result_code,
            purchases = parsed.purchases.len(),
            "parsed verifyReceipt response"
        );

        *self = parsed;
        Ok(self)
    }

    /// True only for status 0. A receipt with an expired subscription
    /// (21006) is not valid, even though its data is still decoded.
    pub fn is_valid(&self) -> bool {
        self.result_code.is_ok()
    }

    pub fn result_code(&self) -> StatusCode {
        self.result_code
    }

    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    /// The raw `receipt` object, whose layout depends on the receipt version.
    pub fn receipt(&self) -> &Map<String, Value> {
        &self.receipt
    }

    /// Transactions of the original receipt, in vendor order.
    pub fn purchases(&self) -> &[PurchaseItem] {
        &self.purchases
    }

    /// The latest base64-encoded receipt, which can be resubmitted for
    /// validation. Only returned for receipts with auto-renewable
    /// subscriptions.
    pub fn latest_receipt(&self) -> Option<&str> {
        self.latest_receipt.as_deref()
    }

    /// Most recent transactions of auto-renewable subscriptions, most recent
    /// purchase first. Entries without a purchase date sort last.
    pub fn latest_receipt_info(&self) -> Option<&[PurchaseItem]> {
        self.latest_receipt_info.as_deref()
    }

    pub fn pending_renewal_info(&self) -> Option<&[PendingRenewalInfo]> {
        self.pending_renewal_info.as_deref()
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Whether the same request may succeed if sent again. Uses the vendor's
    /// `is-retryable` flag when present, otherwise the status code.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable
            .unwrap_or_else(|| self.result_code.is_retryable())
    }

    /// The most recent transaction for `product_id`, preferring
    /// `latest_receipt_info` over the original receipt's purchases.
    pub fn latest_purchase_for(&self, product_id: &str) -> Option<&PurchaseItem> {
        if let Some(latest) = self
            .latest_receipt_info()
            .and_then(|items| items.iter().find(|p| p.product_id() == Some(product_id)))
        {
            return Some(latest);
        }
        self.purchases
            .iter()
            .filter(|p| p.product_id() == Some(product_id))
            .fold(None, |best: Option<&PurchaseItem>, p| match best {
                Some(b) if b.purchase_date() >= p.purchase_date() => Some(b),
                _ => Some(p),
            })
    }
}

fn purchase_items(values: &[Value], field: &str) -> Vec<PurchaseItem> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match PurchaseItem::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(field, index, error = %e, "skipping unreadable purchase item");
                None
            }
        })
        .collect()
}

fn pending_renewal_items(values: &[Value]) -> Vec<PendingRenewalInfo> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match PendingRenewalInfo::from_value(value) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable pending renewal info");
                None
            }
        })
        .collect()
}

fn array_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    let value = fields.get(key)?;
    match value.as_array() {
        Some(items) => Some(items.as_slice()),
        None => {
            warn!(field = key, "expected an array; ignoring field");
            None
        }
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let value = fields.get(key)?;
    match value.as_str() {
        Some(s) => Some(s.to_owned()),
        None => {
            warn!(field = key, value = %value, "expected a string; ignoring field");
            None
        }
    }
}
