/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Server, object::JmapObject, query::scratch::Scratch};
use jmap_proto::{Object, error::MethodError, references::jsptr::patch_segments};
use serde_json::Value;

/// Expand pointer-keyed entries (`myRights/mayDelete`) of an update map
/// into whole top-level property values, merging into the object's
/// currently stored state. An unknown id skips expansion; the update
/// path reports it.
pub fn expand<T: JmapObject>(
    server: &Server,
    scratch: &mut Scratch,
    id: &str,
    update: Object,
) -> Result<Object, MethodError> {
    if !update.keys().any(|key| key.contains('/')) {
        return Ok(update);
    }

    let row = match server
        .store
        .row(T::COLLECTION, id)
        .map_err(crate::object::store_error)?
    {
        Some(row) if row.active => row,
        _ => return Ok(update),
    };
    let stored = T::materialize(server, scratch, &row)?;

    Ok(expand_against(&stored, update))
}

/// Expand pointer keys of `update` against a freshly loaded object.
pub fn expand_against(stored: &Object, update: Object) -> Object {
    // Working copies of every top-level property touched by a pointer.
    let mut current = Object::new();
    for key in update.keys().filter(|key| key.contains('/')) {
        let top = patch_segments(key).swap_remove(0);
        if !current.contains_key(&top) {
            let value = stored.get(&top).cloned().unwrap_or(Value::Null);
            current.insert(top, value);
        }
    }

    let mut expanded = Object::new();
    for (key, value) in update {
        if !key.contains('/') {
            expanded.insert(key, value);
            continue;
        }

        let segments = patch_segments(&key);
        apply_at(&mut current, &segments, value);
        let top = &segments[0];
        expanded.insert(
            top.clone(),
            current.get(top).cloned().unwrap_or(Value::Null),
        );
    }

    expanded
}

/// Set the leaf addressed by `segments`, creating intermediate objects;
/// a null value deletes the leaf.
fn apply_at(root: &mut Object, segments: &[String], value: Value) {
    let (first, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return,
    };

    if rest.is_empty() {
        if value.is_null() {
            root.remove(first);
        } else {
            root.insert(first.clone(), value);
        }
        return;
    }

    let child = root
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Object::new()));
    if !child.is_object() {
        *child = Value::Object(Object::new());
    }
    if let Some(child) = child.as_object_mut() {
        apply_at(child, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::apply_at;
    use jmap_proto::references::jsptr::patch_segments;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> jmap_proto::Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn set_and_delete_leaves() {
        let mut current = obj(json!({"myRights": {"mayAddItems": true, "mayDelete": false}}));

        apply_at(
            &mut current,
            &patch_segments("myRights/mayDelete"),
            json!(true),
        );
        assert_eq!(
            current["myRights"],
            json!({"mayAddItems": true, "mayDelete": true})
        );

        apply_at(
            &mut current,
            &patch_segments("myRights/mayAddItems"),
            json!(null),
        );
        assert_eq!(current["myRights"], json!({"mayDelete": true}));
    }

    #[test]
    fn intermediate_objects_are_created() {
        let mut current = obj(json!({}));
        apply_at(&mut current, &patch_segments("a/b/c"), json!(1));
        assert_eq!(current["a"], json!({"b": {"c": 1}}));
    }

    #[test]
    fn escaped_segments() {
        let mut current = obj(json!({"keywords": {}}));
        apply_at(
            &mut current,
            &patch_segments("keywords/a~1b"),
            json!(true),
        );
        assert_eq!(current["keywords"], json!({"a/b": true}));
    }
}
