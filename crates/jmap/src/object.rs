/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{RequestContext, Server, query::{scratch::Scratch, sort::SortKey}};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::query::Comparator,
    response::Response,
};
use serde_json::Value;
use store::{Collection, Row, StoreError};

/// Capability set every data type provides to the uniform-verb
/// framework. The framework supplies the verbs; a type supplies how its
/// rows materialize, filter and sort.
pub trait JmapObject {
    const NAME: &'static str;
    const COLLECTION: Collection;
    const CAN_CALCULATE_CHANGES: bool = true;

    /// Materialize a stored row into its full client-visible object.
    /// Property projection happens afterwards in the framework.
    fn materialize(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
    ) -> Result<Object, MethodError> {
        let mut obj = Object::new();
        obj.insert("id".into(), Value::String(row.id.clone()));
        for (key, value) in &row.fields {
            obj.insert(key.clone(), value.clone());
        }
        Ok(obj)
    }

    /// Evaluate one leaf filter predicate.
    fn matches(
        _server: &Server,
        _scratch: &mut Scratch,
        _row: &Row,
        property: &str,
        _operand: &Value,
    ) -> Result<bool, MethodError> {
        Err(MethodError::invalid_arguments(format!(
            "Unsupported filter condition {property:?} for {}.",
            Self::NAME
        )))
    }

    /// Sort key for one comparator, computed once per row per query.
    fn sort_key(
        _server: &Server,
        _scratch: &mut Scratch,
        _row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        Err(MethodError::invalid_arguments(format!(
            "Unsupported sort property {:?} for {}.",
            comparator.property,
            Self::NAME
        )))
    }
}

/// Write-side hooks for types that support `/set`.
pub trait JmapSetObject: JmapObject {
    fn before_create(
        _server: &Server,
        _ctx: &RequestContext<'_>,
        _fields: &mut Object,
    ) -> Result<(), SetError> {
        Ok(())
    }

    fn before_update(
        _server: &Server,
        _ctx: &RequestContext<'_>,
        _row: &Row,
        _patch: &mut Object,
    ) -> Result<(), SetError> {
        Ok(())
    }

    fn before_destroy(
        _server: &Server,
        _ctx: &RequestContext<'_>,
        _row: &Row,
    ) -> Result<(), SetError> {
        Ok(())
    }
}

pub(crate) fn store_error(err: StoreError) -> MethodError {
    MethodError::ServerError(err.to_string())
}

pub(crate) fn into_value<S: serde::Serialize>(response: S) -> Result<Value, MethodError> {
    serde_json::to_value(response).map_err(|err| MethodError::InternalError(err.to_string()))
}

/// Validate the supplied accountId against the session account.
pub(crate) fn check_account(
    ctx: &RequestContext<'_>,
    account_id: Option<&str>,
) -> Result<String, MethodError> {
    match account_id {
        Some(supplied) if supplied != ctx.account_id => Err(MethodError::AccountNotFound),
        _ => Ok(ctx.account_id.to_string()),
    }
}

/// Translate a `#cid` creation placeholder into its assigned id. Ids
/// without the marker pass through; an unregistered placeholder is
/// returned as-is and fails downstream as an unknown id.
pub(crate) fn resolve_id(response: &Response, id: &str) -> String {
    match response.created_id(id) {
        Some(resolved) => resolved.to_string(),
        None => id.to_string(),
    }
}

pub(crate) fn resolve_ids(response: &Response, ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .map(|id| resolve_id(response, &id))
        .collect()
}

/// Replace `#cid` strings anywhere inside a creation or patch object,
/// including map keys (mailboxIds-style id maps).
pub(crate) fn resolve_creation_refs(fields: &mut Object, response: &Response) {
    let renames = fields
        .keys()
        .filter(|key| response.created_id(key).is_some())
        .cloned()
        .collect::<Vec<_>>();
    for key in renames {
        if let Some(inner) = fields.remove(&key) {
            if let Some(id) = response.created_id(&key) {
                fields.insert(id.to_string(), inner);
            }
        }
    }
    for item in fields.values_mut() {
        resolve_refs_in_value(item, response);
    }
}

fn resolve_refs_in_value(value: &mut Value, response: &Response) {
    match value {
        Value::String(text) => {
            if let Some(id) = response.created_id(text) {
                *text = id.to_string();
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_refs_in_value(item, response);
            }
        }
        Value::Object(map) => {
            let renames = map
                .keys()
                .filter(|key| response.created_id(key).is_some())
                .cloned()
                .collect::<Vec<_>>();
            for key in renames {
                if let Some(inner) = map.remove(&key) {
                    if let Some(id) = response.created_id(&key) {
                        map.insert(id.to_string(), inner);
                    }
                }
            }
            for item in map.values_mut() {
                resolve_refs_in_value(item, response);
            }
        }
        _ => (),
    }
}

/// Keep only the requested properties; `id` is always present.
pub(crate) fn project(mut obj: Object, properties: Option<&[String]>) -> Object {
    if let Some(properties) = properties {
        obj.retain(|key, _| key == "id" || properties.iter().any(|p| p == key));
    }
    obj
}
