//! Canonicalisation of heterogeneous upstream payload shapes.
//!
//! Upstream serves the same logical resource as a map keyed by id
//! (`{"1": "Alice"}`), a wrapped array (`{"posts": [...]}`), or a bare array.
//! [`normalize`] is the only place that inspects those shapes; everything
//! downstream sees an order-preserving JSON array. The `decode_*` helpers then
//! lift canonical arrays into typed records.

use serde_json::{Map, Value};

use super::activity::compare_ids;
use super::upstream_error::UpstreamError;

mod decode;

pub use decode::{decode_comments, decode_identities, decode_posts};

/// Logical resource carried by an upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `GET /users`: user identity records.
    Identities,
    /// `GET /users/{id}/posts`.
    Posts,
    /// `GET /posts/{id}/comments`.
    Comments,
}

impl ResourceKind {
    /// Field name upstream uses when wrapping this resource in an object.
    #[must_use]
    pub const fn wrapper_key(self) -> &'static str {
        match self {
            Self::Identities => "users",
            Self::Posts => "posts",
            Self::Comments => "comments",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Identities => "identities",
            Self::Posts => "posts",
            Self::Comments => "comments",
        })
    }
}

/// Convert a raw upstream payload into its canonical array form.
///
/// Normalisation is idempotent: feeding the output back in returns it
/// unchanged.
///
/// # Errors
///
/// Returns [`UpstreamError::Format`] when the payload shape is not one of the
/// recognised forms for `kind`.
///
/// # Examples
/// ```
/// use backend::domain::{ResourceKind, normalize};
/// use serde_json::json;
///
/// let users = normalize(json!({ "10": "Bea", "2": "Al" }), ResourceKind::Identities)
///     .expect("map is a known shape");
/// assert_eq!(
///     users,
///     json!([{ "id": "2", "name": "Al" }, { "id": "10", "name": "Bea" }])
/// );
///
/// let posts = normalize(json!({ "posts": [{ "id": 1 }] }), ResourceKind::Posts)
///     .expect("wrapped array is a known shape");
/// assert_eq!(posts, json!([{ "id": 1 }]));
/// ```
pub fn normalize(raw: Value, kind: ResourceKind) -> Result<Value, UpstreamError> {
    match kind {
        ResourceKind::Identities => normalize_identities(raw),
        ResourceKind::Posts | ResourceKind::Comments => normalize_wrapped_array(raw, kind),
    }
}

fn normalize_identities(raw: Value) -> Result<Value, UpstreamError> {
    let kind = ResourceKind::Identities;
    match unwrap_identity_wrapper(raw) {
        Value::Array(items) => Ok(Value::Array(items)),
        Value::Object(map) => identity_map_to_array(map),
        other => Err(format_error(kind, &other)),
    }
}

fn unwrap_identity_wrapper(raw: Value) -> Value {
    let key = ResourceKind::Identities.wrapper_key();
    match raw {
        Value::Object(mut map)
            if map.get(key).is_some_and(|v| v.is_object() || v.is_array()) =>
        {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn identity_map_to_array(map: Map<String, Value>) -> Result<Value, UpstreamError> {
    let mut entries = Vec::with_capacity(map.len());
    for (id, name) in map {
        let Value::String(name) = name else {
            return Err(UpstreamError::format(
                ResourceKind::Identities,
                format!("non-string name for id {id}: {}", describe_shape(&name)),
            ));
        };
        entries.push((id, name));
    }
    entries.sort_by(|(left, _), (right, _)| compare_ids(left, right));

    Ok(Value::Array(
        entries
            .into_iter()
            .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
            .collect(),
    ))
}

fn normalize_wrapped_array(raw: Value, kind: ResourceKind) -> Result<Value, UpstreamError> {
    match raw {
        Value::Array(items) => Ok(Value::Array(items)),
        Value::Object(mut map) if map.get(kind.wrapper_key()).is_some_and(Value::is_array) => {
            Ok(map.remove(kind.wrapper_key()).unwrap_or(Value::Null))
        }
        other => Err(format_error(kind, &other)),
    }
}

fn format_error(kind: ResourceKind, received: &Value) -> UpstreamError {
    UpstreamError::format(kind, describe_shape(received))
}

/// Short description of a JSON value's shape for error reports.
pub(crate) fn describe_shape(value: &Value) -> String {
    const KEY_LIMIT: usize = 5;

    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "boolean".to_owned(),
        Value::Number(_) => "number".to_owned(),
        Value::String(_) => "string".to_owned(),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(map) => {
            let mut keys = map.keys().take(KEY_LIMIT).cloned().collect::<Vec<_>>();
            if map.len() > KEY_LIMIT {
                keys.push("...".to_owned());
            }
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}
