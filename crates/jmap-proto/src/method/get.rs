/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{opt_string, opt_string_list};
use crate::{Object, error::MethodError, types::state::State};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    pub account_id: Option<String>,
    /// `None` means all objects of this type.
    pub ids: Option<Vec<String>>,
    /// `None` means all properties.
    pub properties: Option<Vec<String>>,
}

impl GetRequest {
    pub fn parse(args: &Object) -> Result<Self, MethodError> {
        Ok(GetRequest {
            account_id: opt_string(args, "accountId")?,
            ids: opt_string_list(args, "ids")?,
            properties: opt_string_list(args, "properties")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    pub state: State,

    pub list: Vec<Value>,

    #[serde(rename = "notFound")]
    pub not_found: Vec<String>,
}
