/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod set;

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject, store_error},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::query::Comparator,
};
use serde_json::Value;
use store::{Collection, Row};

pub struct EmailSubmission;

impl JmapObject for EmailSubmission {
    const NAME: &'static str = "EmailSubmission";
    const COLLECTION: Collection = Collection::EmailSubmission;

    fn matches(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "emailIds" => Ok(id_list_contains(operand, row.str_field("emailId"))),
            "threadIds" => Ok(id_list_contains(operand, row.str_field("threadId"))),
            "identityIds" => Ok(id_list_contains(operand, row.str_field("identityId"))),
            "undoStatus" => Ok(row.str_field("undoStatus") == operand.as_str()),
            "before" => Ok(compare_sent_at(row, operand, |sent, bound| sent < bound)),
            "after" => Ok(compare_sent_at(row, operand, |sent, bound| sent >= bound)),
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for EmailSubmission."
            ))),
        }
    }

    fn sort_key(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        if comparator.is_property("emailId") {
            Ok(row
                .str_field("emailId")
                .map(|id| SortKey::Text(id.to_string()))
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("threadId") {
            Ok(row
                .str_field("threadId")
                .map(|id| SortKey::Text(id.to_string()))
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("sentAt") {
            Ok(SortKey::date(row.str_field("sentAt")))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for EmailSubmission.",
                comparator.property
            )))
        }
    }
}

impl JmapSetObject for EmailSubmission {
    fn before_create(
        server: &Server,
        _ctx: &RequestContext<'_>,
        fields: &mut Object,
    ) -> Result<(), SetError> {
        let email_id = match fields.get("emailId").and_then(Value::as_str) {
            Some(email_id) => email_id.to_string(),
            None => {
                return Err(SetError::invalid_properties()
                    .with_property("emailId")
                    .with_description("An emailId is required"));
            }
        };

        let email = match server
            .store
            .row(Collection::Email, &email_id)
            .map_err(|err| SetError::forbidden().with_description(err.to_string()))?
        {
            Some(email) if email.active => email,
            _ => {
                return Err(SetError::invalid_properties()
                    .with_property("emailId")
                    .with_description(format!("Email {email_id} not found")));
            }
        };

        // The submission inherits the message's thread.
        if let Some(thread_id) = email.str_field("threadId") {
            fields.insert("threadId".into(), Value::String(thread_id.to_string()));
        } else {
            fields.insert("threadId".into(), Value::String(email.id.clone()));
        }
        if !fields.contains_key("undoStatus") {
            fields.insert("undoStatus".into(), Value::String("final".into()));
        }
        if !fields.contains_key("sentAt") {
            fields.insert(
                "sentAt".into(),
                Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            );
        }

        Ok(())
    }
}

fn id_list_contains(operand: &Value, found: Option<&str>) -> bool {
    match (operand.as_array(), found) {
        (Some(wanted), Some(found)) => wanted.iter().any(|id| id.as_str() == Some(found)),
        _ => false,
    }
}

fn compare_sent_at(row: &Row, operand: &Value, cmp: fn(i64, i64) -> bool) -> bool {
    let bound = operand
        .as_str()
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    let sent = row
        .str_field("sentAt")
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    match (sent, bound) {
        (Some(sent), Some(bound)) => cmp(sent, bound),
        _ => false,
    }
}

pub(crate) fn email_of(server: &Server, submission_id: &str) -> Result<Option<String>, MethodError> {
    Ok(server
        .store
        .row(Collection::EmailSubmission, submission_id)
        .map_err(store_error)?
        .and_then(|row| row.str_field("emailId").map(String::from)))
}
