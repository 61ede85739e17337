/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod copy;
pub mod import;
pub mod snippet;

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::query::Comparator,
};
use serde_json::Value;
use store::{Collection, Row};

pub struct Email;

pub(crate) const SEEN: &str = "$seen";

impl JmapObject for Email {
    const NAME: &'static str = "Email";
    const COLLECTION: Collection = Collection::Email;

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
        // A message that was never threaded is its own thread.
        if !obj.contains_key("threadId") {
            obj.insert("threadId".into(), Value::String(row.id.clone()));
        }
        Ok(obj)
    }

    fn matches(
        server: &Server,
        scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "inMailbox" => Ok(match operand.as_str() {
                Some(mailbox) => row
                    .object_field("mailboxIds")
                    .map(|ids| ids.contains_key(mailbox))
                    .unwrap_or(false),
                None => false,
            }),
            "inMailboxOtherThan" => {
                // Scalar and list operands are both accepted.
                let excluded = match operand {
                    Value::String(id) => vec![id.as_str()],
                    Value::Array(ids) => ids.iter().filter_map(Value::as_str).collect(),
                    _ => {
                        return Err(MethodError::invalid_arguments(
                            "inMailboxOtherThan expects a mailbox id or a list.",
                        ));
                    }
                };
                Ok(row
                    .object_field("mailboxIds")
                    .map(|ids| ids.keys().any(|id| !excluded.contains(&id.as_str())))
                    .unwrap_or(false))
            }
            "before" => Ok(compare_date(row, operand, |received, bound| received < bound)),
            "after" => Ok(compare_date(row, operand, |received, bound| received >= bound)),
            "minSize" => Ok(match operand.as_u64() {
                Some(min) => row.u64_field("size").unwrap_or(0) >= min,
                None => false,
            }),
            "maxSize" => Ok(match operand.as_u64() {
                Some(max) => row.u64_field("size").unwrap_or(0) < max,
                None => false,
            }),
            "hasKeyword" => Ok(match operand.as_str() {
                Some(keyword) => has_keyword(row, keyword),
                None => false,
            }),
            "notKeyword" => Ok(match operand.as_str() {
                Some(keyword) => !has_keyword(row, keyword),
                None => false,
            }),
            "allInThreadHaveKeyword" => match operand.as_str() {
                Some(keyword) => {
                    let status = scratch.thread_keywords(server, thread_of(row))?;
                    Ok(status.all.contains(keyword))
                }
                None => Ok(false),
            },
            "someInThreadHaveKeyword" => match operand.as_str() {
                Some(keyword) => {
                    let status = scratch.thread_keywords(server, thread_of(row))?;
                    Ok(status.some.contains(keyword))
                }
                None => Ok(false),
            },
            "noneInThreadHaveKeyword" => match operand.as_str() {
                Some(keyword) => {
                    let status = scratch.thread_keywords(server, thread_of(row))?;
                    Ok(!status.some.contains(keyword))
                }
                None => Ok(false),
            },
            "hasAttachment" => {
                Ok(Some(row.bool_field("hasAttachment").unwrap_or(false)) == operand.as_bool())
            }
            "header" => Ok(match_header(row, operand)),
            "text" | "from" | "to" | "cc" | "bcc" | "subject" | "body" => {
                match operand.as_str() {
                    Some(term) => Ok(scratch
                        .text_matches(server, property, term)?
                        .contains(&row.id)),
                    None => Ok(false),
                }
            }
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for Email."
            ))),
        }
    }

    fn sort_key(
        server: &Server,
        scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        if comparator.is_property("id") {
            Ok(SortKey::Text(row.id.clone()))
        } else if comparator.is_property("receivedAt") {
            Ok(SortKey::date(row.str_field("receivedAt")))
        } else if comparator.is_property("sentAt") {
            Ok(SortKey::date(row.str_field("sentAt")))
        } else if comparator.is_property("size") {
            Ok(SortKey::Int(row.u64_field("size").unwrap_or(0) as i64))
        } else if comparator.is_property("isunread") {
            Ok(SortKey::Bool(!has_keyword(row, SEEN)))
        } else if comparator.is_property("subject") {
            Ok(row
                .str_field("subject")
                .map(|subject| SortKey::text(strip_subject_prefixes(subject)))
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("from") || comparator.is_property("to") {
            Ok(address_key(row.field(&comparator.property.to_lowercase())))
        } else if comparator.is_property("keyword") {
            let keyword = sort_argument(comparator)?;
            Ok(SortKey::Bool(has_keyword(row, keyword)))
        } else if comparator.is_property("allInThreadHaveKeyword") {
            let keyword = sort_argument(comparator)?.to_string();
            let status = scratch.thread_keywords(server, thread_of(row))?;
            Ok(SortKey::Bool(status.all.contains(&keyword)))
        } else if comparator.is_property("someInThreadHaveKeyword") {
            let keyword = sort_argument(comparator)?.to_string();
            let status = scratch.thread_keywords(server, thread_of(row))?;
            Ok(SortKey::Bool(status.some.contains(&keyword)))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for Email.",
                comparator.property
            )))
        }
    }
}

impl JmapSetObject for Email {
    fn before_create(
        server: &Server,
        _ctx: &RequestContext<'_>,
        fields: &mut Object,
    ) -> Result<(), SetError> {
        check_mailbox_ids(server, fields.get("mailboxIds"))?;
        if !fields.contains_key("keywords") {
            fields.insert("keywords".into(), Value::Object(Object::new()));
        }
        if !fields.contains_key("receivedAt") {
            fields.insert(
                "receivedAt".into(),
                Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            );
        }
        Ok(())
    }

    fn before_update(
        server: &Server,
        _ctx: &RequestContext<'_>,
        _row: &Row,
        patch: &mut Object,
    ) -> Result<(), SetError> {
        if let Some(mailbox_ids) = patch.get("mailboxIds") {
            check_mailbox_ids(server, Some(mailbox_ids))?;
        }
        Ok(())
    }
}

pub(crate) fn thread_of(row: &Row) -> &str {
    row.str_field("threadId").unwrap_or(&row.id)
}

pub(crate) fn has_keyword(row: &Row, keyword: &str) -> bool {
    row.object_field("keywords")
        .map(|keywords| keywords.contains_key(keyword))
        .unwrap_or(false)
}

fn compare_date(row: &Row, operand: &Value, cmp: fn(i64, i64) -> bool) -> bool {
    let bound = operand
        .as_str()
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    let received = row
        .str_field("receivedAt")
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    match (received, bound) {
        (Some(received), Some(bound)) => cmp(received, bound),
        _ => false,
    }
}

/// `header` operand: `[name]` asks for presence, `[name, value]` for a
/// substring match on that header's value.
fn match_header(row: &Row, operand: &Value) -> bool {
    let parts = match operand.as_array() {
        Some(parts) if !parts.is_empty() => parts,
        _ => return false,
    };
    let name = match parts[0].as_str() {
        Some(name) => name.to_lowercase(),
        None => return false,
    };
    let headers = match row.object_field("headers") {
        Some(headers) => headers,
        None => return false,
    };
    let found = headers
        .iter()
        .find(|(key, _)| key.to_lowercase() == name)
        .map(|(_, value)| value);

    match (found, parts.get(1).and_then(Value::as_str)) {
        (Some(value), Some(wanted)) => value
            .as_str()
            .map(|value| value.to_lowercase().contains(&wanted.to_lowercase()))
            .unwrap_or(false),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Sort by the display name or address of the first sender/recipient.
fn address_key(value: Option<&Value>) -> SortKey {
    let first = match value {
        Some(Value::Array(entries)) => entries.first(),
        Some(single) => Some(single),
        None => None,
    };

    match first {
        Some(Value::String(address)) => SortKey::text(address),
        Some(Value::Object(entry)) => entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .or_else(|| entry.get("email").and_then(Value::as_str))
            .map(SortKey::text)
            .unwrap_or(SortKey::Missing),
        _ => SortKey::Missing,
    }
}

fn sort_argument<'x>(comparator: &'x Comparator) -> Result<&'x str, MethodError> {
    comparator.argument.as_deref().ok_or_else(|| {
        MethodError::invalid_arguments(format!(
            "Sort property {:?} requires a keyword argument.",
            comparator.property
        ))
    })
}

fn strip_subject_prefixes(subject: &str) -> &str {
    let mut subject = subject.trim();
    loop {
        let lower = subject.to_lowercase();
        let stripped = ["re:", "fwd:", "fw:"]
            .iter()
            .find(|prefix| lower.starts_with(**prefix))
            .map(|prefix| subject[prefix.len()..].trim_start());
        match stripped {
            Some(rest) => subject = rest,
            None => return subject,
        }
    }
}

fn check_mailbox_ids(server: &Server, value: Option<&Value>) -> Result<(), SetError> {
    let ids = match value.and_then(Value::as_object) {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            return Err(SetError::invalid_mailboxes()
                .with_property("mailboxIds")
                .with_description("At least one mailbox is required"));
        }
    };

    for id in ids.keys() {
        match server.store.row(Collection::Mailbox, id) {
            Ok(Some(row)) if row.active => (),
            Ok(_) => {
                return Err(SetError::invalid_mailboxes()
                    .with_property("mailboxIds")
                    .with_description(format!("Mailbox {id} not found")));
            }
            Err(err) => {
                return Err(SetError::forbidden().with_description(err.to_string()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::strip_subject_prefixes;

    #[test]
    fn subject_prefixes() {
        assert_eq!(strip_subject_prefixes("Re: Fwd: hello"), "hello");
        assert_eq!(strip_subject_prefixes("fw:  budget"), "budget");
        assert_eq!(strip_subject_prefixes("Regards"), "Regards");
    }
}
