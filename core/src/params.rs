//! Parameter filtering and query-string encoding.

use serde_json::{Map, Value};

use crate::types::Params;

/// Drop entries whose value is absent.
///
/// Explicit nulls are kept: `Some(Value::Null)` is a value the caller chose
/// to send, `None` is one it never set.
pub fn filter_defined(params: &Params) -> Map<String, Value> {
    params
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.clone())))
        .collect()
}

/// Encode defined, non-null parameters as an `application/x-www-form-urlencoded`
/// query string. Returns `None` when nothing is left to send.
///
/// Arrays are comma-joined, which is how LaunchDarkly reads list-valued
/// parameters such as `expand`.
pub fn encode_query(params: &Params) -> Option<String> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in filter_defined(params) {
        if let Some(text) = query_value(&value) {
            serializer.append_pair(&name, &text);
            any = true;
        }
    }
    any.then(|| serializer.finish())
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(query_value).collect();
            Some(parts.join(","))
        }
        other => Some(other.to_string()),
    }
}
