//! Route data and its deep-merge rule.
//!
//! Route groups attach data (middleware names, auth scopes, anything the
//! application wants to read back after a match) that nested groups and
//! routes inherit. Inheritance is a recursive merge of JSON objects:
//!
//! - object meets object: merge recursively
//! - any other collision: the inner (more specific) value wins
//! - keys present on one side only are kept; outer keys come first, new
//!   inner keys follow in their own order

use serde_json::{Map, Value};

/// Data attached to a route or group.
pub type RouteData = Map<String, Value>;

/// Turns a JSON object into [`RouteData`]. Any other value yields empty data.
///
/// Handy with `serde_json::json!`: `route_data(json!({"auth": "token"}))`.
pub fn route_data(value: Value) -> RouteData {
    match value {
        Value::Object(map) => map,
        _ => RouteData::new(),
    }
}

/// Merges `inner` over `outer` and returns the result.
pub fn deep_merge(outer: &RouteData, inner: &RouteData) -> RouteData {
    let mut merged = outer.clone();
    merge_into(&mut merged, inner);
    merged
}

fn merge_into(target: &mut RouteData, inner: &RouteData) {
    for (key, value) in inner {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_into(existing, nested),
            (Some(slot), _) => *slot = value.clone(),
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
