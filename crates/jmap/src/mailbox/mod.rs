/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod changes;

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError, set::SetErrorType},
    method::query::Comparator,
};
use serde_json::{Value, json};
use store::{Collection, Row};

pub struct Mailbox;

impl JmapObject for Mailbox {
    const NAME: &'static str = "Mailbox";
    const COLLECTION: Collection = Collection::Mailbox;
    const CAN_CALCULATE_CHANGES: bool = false;

    fn materialize(
        server: &Server,
        scratch: &mut Scratch,
        row: &Row,
    ) -> Result<Object, MethodError> {
        let mut obj = Object::new();
        obj.insert("id".into(), Value::String(row.id.clone()));
        for (key, value) in &row.fields {
            obj.insert(key.clone(), value.clone());
        }

        // Counts are derived from the message table, never stored.
        let counts = scratch.mailbox_counts(server, &row.id)?;
        obj.insert("totalEmails".into(), json!(counts.total_emails));
        obj.insert("unreadEmails".into(), json!(counts.unread_emails));
        obj.insert("totalThreads".into(), json!(counts.total_threads));
        obj.insert("unreadThreads".into(), json!(counts.unread_threads));

        Ok(obj)
    }

    fn matches(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "hasRole" => {
                let has_role = row
                    .field("role")
                    .map(|role| !role.is_null())
                    .unwrap_or(false);
                Ok(Some(has_role) == operand.as_bool())
            }
            "parentId" => Ok(match operand.as_str() {
                Some(parent) => row.str_field("parentId") == Some(parent),
                None => row.str_field("parentId").is_none(),
            }),
            "isSubscribed" => Ok(Some(row.bool_field("isSubscribed").unwrap_or(false))
                == operand.as_bool()),
            "name" => Ok(match operand.as_str() {
                Some(name) => row
                    .str_field("name")
                    .map(|found| found.to_lowercase().contains(&name.to_lowercase()))
                    .unwrap_or(false),
                None => false,
            }),
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for Mailbox."
            ))),
        }
    }

    fn sort_key(
        server: &Server,
        scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        if comparator.is_property("name") {
            Ok(row
                .str_field("name")
                .map(SortKey::text)
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("sortOrder") {
            Ok(SortKey::Int(
                row.field("sortOrder").and_then(Value::as_i64).unwrap_or(0),
            ))
        } else if comparator.is_property("parent/name") {
            Ok(SortKey::text(&scratch.mailbox_path(server, &row.id)?))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for Mailbox.",
                comparator.property
            )))
        }
    }
}

impl JmapSetObject for Mailbox {
    fn before_create(
        server: &Server,
        _ctx: &RequestContext<'_>,
        fields: &mut Object,
    ) -> Result<(), SetError> {
        match fields.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => (),
            _ => {
                return Err(SetError::invalid_properties()
                    .with_property("name")
                    .with_description("Mailbox name is required"));
            }
        }
        check_parent(server, fields, None)?;

        if !fields.contains_key("myRights") {
            fields.insert("myRights".into(), default_rights());
        }
        if !fields.contains_key("sortOrder") {
            fields.insert("sortOrder".into(), json!(0));
        }
        if !fields.contains_key("isSubscribed") {
            fields.insert("isSubscribed".into(), json!(true));
        }

        Ok(())
    }

    fn before_update(
        server: &Server,
        _ctx: &RequestContext<'_>,
        row: &Row,
        patch: &mut Object,
    ) -> Result<(), SetError> {
        check_parent(server, patch, Some(&row.id))
    }

    fn before_destroy(
        server: &Server,
        _ctx: &RequestContext<'_>,
        row: &Row,
    ) -> Result<(), SetError> {
        let rows = server
            .store
            .rows(Collection::Mailbox)
            .map_err(|err| SetError::forbidden().with_description(err.to_string()))?;
        if rows
            .iter()
            .any(|child| child.active && child.str_field("parentId") == Some(&row.id))
        {
            Err(SetError::new(SetErrorType::MailboxHasChild)
                .with_description("Mailbox has at least one child"))
        } else {
            Ok(())
        }
    }
}

/// Validate a supplied parentId: it must name an existing mailbox and,
/// on update, must not introduce a cycle.
fn check_parent(
    server: &Server,
    fields: &Object,
    updating: Option<&str>,
) -> Result<(), SetError> {
    let parent_id = match fields.get("parentId") {
        Some(Value::String(parent_id)) => parent_id.clone(),
        _ => return Ok(()),
    };

    let mut cursor = Some(parent_id);
    let mut depth = 0;
    while let Some(id) = cursor {
        if updating == Some(id.as_str()) || depth > 100 {
            return Err(SetError::invalid_properties()
                .with_property("parentId")
                .with_description("Mailbox cannot be a descendant of itself"));
        }
        depth += 1;
        match server.store.row(Collection::Mailbox, &id) {
            Ok(Some(row)) if row.active => {
                cursor = row.str_field("parentId").map(String::from);
            }
            Ok(_) => {
                return Err(SetError::invalid_properties()
                    .with_property("parentId")
                    .with_description("Parent mailbox not found"));
            }
            Err(err) => {
                return Err(SetError::forbidden().with_description(err.to_string()));
            }
        }
    }

    Ok(())
}

fn default_rights() -> Value {
    json!({
        "mayReadItems": true,
        "mayAddItems": true,
        "mayRemoveItems": true,
        "maySetSeen": true,
        "maySetKeywords": true,
        "mayCreateChild": true,
        "mayRename": true,
        "mayDelete": true,
        "maySubmit": true,
    })
}
