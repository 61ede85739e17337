/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{opt_bool, opt_state, opt_string, opt_usize};
use crate::{
    Object,
    error::MethodError,
    method::query::{Comparator, Filter},
    types::state::State,
};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct QueryChangesRequest {
    pub account_id: Option<String>,
    pub filter: Option<Filter>,
    pub sort: Option<Vec<Comparator>>,
    pub since_query_state: State,
    pub max_changes: Option<usize>,
    pub up_to_id: Option<String>,
    pub collapse_threads: bool,
}

impl QueryChangesRequest {
    pub fn parse(args: &Object) -> Result<Self, MethodError> {
        let up_to_id = match opt_string(args, "upToId")? {
            Some(id) => Some(id),
            None => opt_string(args, "upToEmailId")?,
        };

        Ok(QueryChangesRequest {
            account_id: opt_string(args, "accountId")?,
            filter: Filter::parse_opt(args, "filter")?,
            sort: Comparator::parse_opt(args, "sort")?,
            since_query_state: opt_state(args, "sinceQueryState")?.ok_or_else(|| {
                MethodError::invalid_arguments("Missing sinceQueryState argument.")
            })?,
            max_changes: opt_usize(args, "maxChanges")?,
            up_to_id,
            collapse_threads: opt_bool(args, "collapseThreads")?.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddedItem {
    pub id: String,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct QueryChangesResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldQueryState")]
    pub old_query_state: State,

    #[serde(rename = "newQueryState")]
    pub new_query_state: State,

    pub total: usize,

    pub removed: Vec<String>,

    pub added: Vec<AddedItem>,
}
