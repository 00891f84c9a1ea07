//! Typed decoding of canonical (already normalised) arrays.

use serde_json::{Map, Value};

use super::{ResourceKind, describe_shape};
use crate::domain::activity::{CommentRecord, IdentityRecord, PostRecord};
use crate::domain::upstream_error::UpstreamError;

/// Decode canonical identity entries.
///
/// # Errors
///
/// Returns [`UpstreamError::Format`] when the payload is not an array or an
/// entry lacks an `id`.
pub fn decode_identities(canonical: &Value) -> Result<Vec<IdentityRecord>, UpstreamError> {
    entries(canonical, ResourceKind::Identities)?
        .map(|entry| {
            Ok(IdentityRecord {
                id: required_id(entry, ResourceKind::Identities)?,
                name: text_field(entry, &["name", "username"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// Decode canonical post entries.
///
/// # Errors
///
/// Returns [`UpstreamError::Format`] when the payload is not an array or an
/// entry lacks an `id`.
pub fn decode_posts(canonical: &Value) -> Result<Vec<PostRecord>, UpstreamError> {
    entries(canonical, ResourceKind::Posts)?
        .map(|entry| {
            Ok(PostRecord {
                id: required_id(entry, ResourceKind::Posts)?,
                author_id: id_field(entry, &["userid", "userId", "user_id"]),
                body: text_field(entry, &["content", "body"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// Decode canonical comment entries for `post_id`.
///
/// # Errors
///
/// Returns [`UpstreamError::Format`] when the payload is not an array or an
/// entry lacks an `id`.
pub fn decode_comments(
    canonical: &Value,
    post_id: &str,
) -> Result<Vec<CommentRecord>, UpstreamError> {
    entries(canonical, ResourceKind::Comments)?
        .map(|entry| {
            Ok(CommentRecord {
                id: required_id(entry, ResourceKind::Comments)?,
                post_id: id_field(entry, &["postid", "postId", "post_id"])
                    .unwrap_or_else(|| post_id.to_owned()),
                author: text_field(entry, &["name", "author"]).unwrap_or_default(),
                body: text_field(entry, &["body", "content"]).unwrap_or_default(),
            })
        })
        .collect()
}

fn entries(
    canonical: &Value,
    kind: ResourceKind,
) -> Result<impl Iterator<Item = &Map<String, Value>>, UpstreamError> {
    let Value::Array(items) = canonical else {
        return Err(UpstreamError::format(kind, describe_shape(canonical)));
    };
    if let Some(bad) = items.iter().find(|item| !item.is_object()) {
        return Err(UpstreamError::format(
            kind,
            format!("entry is {}", describe_shape(bad)),
        ));
    }
    Ok(items.iter().filter_map(Value::as_object))
}

fn required_id(entry: &Map<String, Value>, kind: ResourceKind) -> Result<String, UpstreamError> {
    id_field(entry, &["id"])
        .ok_or_else(|| UpstreamError::format(kind, "entry without a string or numeric id"))
}

fn id_field(entry: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match entry.get(*name) {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

fn text_field(entry: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| entry.get(*name).and_then(Value::as_str).map(str::to_owned))
}
