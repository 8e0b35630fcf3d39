// SPDX-License-Identifier: MIT

//! Combining assignee sets and payloads across saves
//!
//! Both helpers treat malformed prior state as empty instead of failing.

use serde_json::{Map, Value};

/// Append `incoming` to the `existing` user list, keeping first occurrences.
///
/// A non-array `existing` yields an empty list and `incoming` is dropped
/// with it.
pub fn merge_users(existing: &Value, incoming: &[Value]) -> Vec<Value> {
    let Value::Array(users) = existing else {
        return vec![];
    };

    let mut merged: Vec<Value> = Vec::with_capacity(users.len() + incoming.len());
    for user in users.iter().chain(incoming) {
        if !merged.contains(user) {
            merged.push(user.clone());
        }
    }
    merged
}

/// Combine a stored payload with a new one.
///
/// A non-object `existing` yields an empty map. An object `incoming`
/// replaces the stored payload wholesale: keys only present in `existing`
/// are dropped. Any other `incoming` leaves `existing` as it was.
pub fn merge_data(existing: &Value, incoming: &Value) -> Map<String, Value> {
    let Value::Object(stored) = existing else {
        return Map::new();
    };

    match incoming {
        Value::Object(new) => new.clone(),
        _ => stored.clone(),
    }
}
