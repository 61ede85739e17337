/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{opt_state, opt_string, opt_usize};
use crate::{Object, error::MethodError, types::state::State};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ChangesRequest {
    pub account_id: Option<String>,
    pub since_state: State,
    pub max_changes: Option<usize>,
}

impl ChangesRequest {
    pub fn parse(args: &Object) -> Result<Self, MethodError> {
        Ok(ChangesRequest {
            account_id: opt_string(args, "accountId")?,
            since_state: opt_state(args, "sinceState")?.ok_or_else(|| {
                MethodError::invalid_arguments("Missing sinceState argument.")
            })?,
            max_changes: opt_usize(args, "maxChanges")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldState")]
    pub old_state: State,

    #[serde(rename = "newState")]
    pub new_state: State,

    pub created: Vec<String>,

    pub updated: Vec<String>,

    pub removed: Vec<String>,

    /// Mailbox only: the closed count-property set when every updated row
    /// changed counts alone, an explicit null otherwise.
    #[serde(rename = "changedProperties")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_properties: Option<Value>,
}

impl ChangesResponse {
    pub fn new(account_id: String, old_state: State, new_state: State) -> Self {
        ChangesResponse {
            account_id,
            old_state,
            new_state,
            created: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            changed_properties: None,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }
}
