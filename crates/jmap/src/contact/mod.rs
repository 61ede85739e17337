/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod addressbook;
pub mod group;

use crate::{
    Server,
    object::{JmapObject, JmapSetObject, store_error},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{error::MethodError, method::query::Comparator};
use serde_json::Value;
use store::{Collection, Row};

pub struct Contact;

impl JmapObject for Contact {
    const NAME: &'static str = "Contact";
    const COLLECTION: Collection = Collection::Contact;
    const CAN_CALCULATE_CHANGES: bool = false;

    fn matches(
        server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "inContactGroup" => {
                let group_id = match operand.as_str() {
                    Some(group_id) => group_id,
                    None => return Ok(false),
                };
                match server
                    .store
                    .row(Collection::ContactGroup, group_id)
                    .map_err(store_error)?
                {
                    Some(group) if group.active => Ok(group
                        .field("contactIds")
                        .and_then(Value::as_array)
                        .map(|ids| ids.iter().any(|id| id.as_str() == Some(&row.id)))
                        .unwrap_or(false)),
                    _ => Ok(false),
                }
            }
            "text" => Ok(match operand.as_str() {
                Some(term) => {
                    let term = term.to_lowercase();
                    ["firstName", "lastName", "company"].iter().any(|field| {
                        row.str_field(field)
                            .map(|value| value.to_lowercase().contains(&term))
                            .unwrap_or(false)
                    }) || row
                        .field("emails")
                        .map(|emails| contains_string(emails, &term))
                        .unwrap_or(false)
                }
                None => false,
            }),
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for Contact."
            ))),
        }
    }

    fn sort_key(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        for field in ["lastName", "firstName", "uid"] {
            if comparator.is_property(field) {
                return Ok(row
                    .str_field(field)
                    .map(SortKey::text)
                    .unwrap_or(SortKey::Missing));
            }
        }
        Err(MethodError::invalid_arguments(format!(
            "Unsupported sort property {:?} for Contact.",
            comparator.property
        )))
    }
}

impl JmapSetObject for Contact {}

fn contains_string(value: &Value, term: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(term),
        Value::Array(items) => items.iter().any(|item| contains_string(item, term)),
        Value::Object(map) => map.values().any(|item| contains_string(item, term)),
        _ => false,
    }
}
