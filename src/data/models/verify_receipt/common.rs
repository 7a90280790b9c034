//! serde_with adapters for the stringly-typed fields of verifyReceipt
//! payloads. Apple encodes most scalars as strings ("1", "1500000000000"),
//! but older receipts and hand-built fixtures use native JSON types, so every
//! adapter accepts both.

use serde::{
    de::{Error, Unexpected},
    Deserialize, Deserializer,
};
use serde_json::{Map, Value};
use serde_with::DeserializeAs;

/// Borrows the fields of a line item, rejecting anything but a JSON object.
///
/// Struct decoding alone is not enough here: serde also accepts a JSON array
/// for a struct, which would silently produce an all-default record.
pub(crate) fn expect_object<'a>(
    value: &'a Value,
    what: &str,
) -> Result<&'a Map<String, Value>, serde_json::Error> {
    value
        .as_object()
        .ok_or_else(|| serde_json::Error::custom(format!("expected {what} to be a JSON object")))
}

/// Reads a boolean flag from `true`/`false`, `1`/`0`, or their string forms.
pub(crate) struct LenientBool;

impl<'de> DeserializeAs<'de, bool> for LenientBool {
    fn deserialize_as<D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Bool(flag) => Ok(flag),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(D::Error::invalid_value(
                    Unexpected::Other("number"),
                    &"0 or 1",
                )),
            },
            Value::String(s) => match s.as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(D::Error::invalid_value(
                    Unexpected::Str(other),
                    &"a boolean flag",
                )),
            },
            _ => Err(D::Error::custom("expected a boolean flag")),
        }
    }
}

/// Reads an identifier from a string, or from a number rendered as a string.
pub(crate) struct LenientString;

impl<'de> DeserializeAs<'de, String> for LenientString {
    fn deserialize_as<D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(D::Error::custom("expected a string identifier")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use serde_with::{serde_as, DefaultOnError};

    #[serde_as]
    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde_as(as = "DefaultOnError<Option<LenientBool>>")]
        #[serde(default)]
        flag: Option<bool>,
        #[serde_as(as = "DefaultOnError<LenientString>")]
        #[serde(default)]
        id: String,
    }

    fn decode(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lenient_bool_accepts_vendor_encodings() {
        for (raw, expected) in [
            (json!("1"), true),
            (json!("0"), false),
            (json!("true"), true),
            (json!("false"), false),
            (json!(1), true),
            (json!(0), false),
            (json!(true), true),
        ] {
            assert_eq!(decode(json!({ "flag": raw })).flag, Some(expected));
        }
    }

    #[test]
    fn lenient_bool_degrades_to_absent() {
        assert_eq!(decode(json!({})).flag, None);
        assert_eq!(decode(json!({ "flag": null })).flag, None);
        assert_eq!(decode(json!({ "flag": "maybe" })).flag, None);
        assert_eq!(decode(json!({ "flag": 7 })).flag, None);
    }

    #[test]
    fn expect_object_rejects_other_kinds() {
        assert!(expect_object(&json!({ "a": 1 }), "item").is_ok());
        let err = expect_object(&json!([1, 2]), "item").unwrap_err();
        assert!(err.to_string().contains("expected item to be a JSON object"));
    }

    #[test]
    fn lenient_string_accepts_numbers() {
        assert_eq!(decode(json!({ "id": "1000000123" })).id, "1000000123");
        assert_eq!(decode(json!({ "id": 1000000123 })).id, "1000000123");
        assert_eq!(decode(json!({ "id": [] })).id, "");
        assert_eq!(decode(json!({})).id, "");
    }
}
