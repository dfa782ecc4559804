//! Form encoding of requests and decoding of gateway responses.
//!
//! Both directions use `application/x-www-form-urlencoded`. Encoding is pure
//! and deterministic; decoding never fails, a body that cannot be read simply
//! yields fewer fields.

use std::collections::BTreeMap;

use crate::params::Params;

/// Decoded gateway response: field name to (possibly comma-joined) value.
pub type ResponseFields = BTreeMap<String, String>;

/// Serialize parameters into a form body.
pub fn encode_params(params: &Params) -> Result<String, serde_urlencoded::ser::Error> {
    let pairs: Vec<(&str, String)> = params.iter().map(|(k, v)| (k, v.to_wire())).collect();
    serde_urlencoded::to_string(pairs)
}

/// Parse a form body into fields.
///
/// Repeated keys are joined with commas in order of appearance. Pairs with an
/// empty value are skipped, so `a=&b=1` reads as `{b: "1"}`.
pub fn decode_fields(body: &str) -> ResponseFields {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(body.trim()) {
        Ok(pairs) => pairs,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable response body, treating as empty");
            Vec::new()
        }
    };

    let mut fields = ResponseFields::new();
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        fields
            .entry(key)
            .and_modify(|existing: &mut String| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    fields
}
