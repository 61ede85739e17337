/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    Server,
    object::JmapObject,
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{error::MethodError, method::query::Comparator};
use serde_json::Value;
use store::{Collection, Row};

/// Nodes of the synced file store; read-only through this interface.
pub struct StorageNode;

impl JmapObject for StorageNode {
    const NAME: &'static str = "StorageNode";
    const COLLECTION: Collection = Collection::StorageNode;
    const CAN_CALCULATE_CHANGES: bool = false;

    fn matches(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "parentId" => Ok(match operand.as_str() {
                Some(parent) => row.str_field("parentId") == Some(parent),
                None => row.str_field("parentId").is_none(),
            }),
            "name" => Ok(match operand.as_str() {
                Some(name) => row
                    .str_field("name")
                    .map(|found| found.to_lowercase().contains(&name.to_lowercase()))
                    .unwrap_or(false),
                None => false,
            }),
            "type" => Ok(row.str_field("type") == operand.as_str()),
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for StorageNode."
            ))),
        }
    }

    fn sort_key(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        if comparator.is_property("name") {
            Ok(row
                .str_field("name")
                .map(SortKey::text)
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("size") {
            Ok(SortKey::Int(row.u64_field("size").unwrap_or(0) as i64))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for StorageNode.",
                comparator.property
            )))
        }
    }
}
