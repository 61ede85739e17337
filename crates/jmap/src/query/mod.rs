/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod changes;
pub mod filter;
pub mod scratch;
pub mod sort;

use crate::{
    RequestContext, Server,
    object::{JmapObject, check_account, into_value, store_error},
    query::{filter::filter_rows, scratch::Scratch, sort::sort_rows},
};
use ahash::AHashSet;
use jmap_proto::{
    Object,
    error::MethodError,
    method::query::{QueryRequest, QueryResponse},
    types::state::State,
};
use serde_json::Value;
use store::Row;

pub fn handle<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = QueryRequest::parse(&args)?;
    query::<T>(server, ctx, &request).and_then(into_value)
}

/// The uniform query pipeline: load candidates, sort, filter, collapse
/// threads when asked to, then window to the requested page.
pub fn query<T: JmapObject>(
    server: &Server,
    ctx: &RequestContext<'_>,
    request: &QueryRequest,
) -> Result<QueryResponse, MethodError> {
    let account_id = check_account(ctx, request.account_id.as_deref())?;
    let mut scratch = Scratch::new();

    let mut rows = server.store.rows(T::COLLECTION).map_err(store_error)?;
    rows.retain(|row| row.active);
    sort_rows::<T>(server, &mut scratch, &mut rows, request.sort.as_deref())?;
    let mut rows = filter_rows::<T>(server, &mut scratch, rows, request.filter.as_ref())?;
    if request.collapse_threads {
        rows = collapse_threads(rows);
    }

    let total = rows.len();
    let start = resolve_start(&rows, request)?;
    let limit = request
        .limit
        .unwrap_or(server.config.query_max_results)
        .min(server.config.query_max_results);
    let ids = rows
        .iter()
        .skip(start)
        .take(limit)
        .map(|row| row.id.clone())
        .collect();

    Ok(QueryResponse {
        account_id,
        query_state: State::new(server.store.state(T::COLLECTION).map_err(store_error)?),
        can_calculate_changes: T::CAN_CALCULATE_CHANGES,
        position: start,
        total,
        ids,
    })
}

/// First index of the result window: an explicit position, or the anchor
/// row's index shifted by anchorOffset and clamped at zero.
fn resolve_start(rows: &[Row], request: &QueryRequest) -> Result<usize, MethodError> {
    match (&request.anchor, request.position) {
        (Some(anchor), _) => {
            let index = rows
                .iter()
                .position(|row| &row.id == anchor)
                .ok_or(MethodError::AnchorNotFound)?;
            Ok((index as i64 + request.anchor_offset).max(0) as usize)
        }
        (None, Some(position)) => Ok(position),
        (None, None) => Ok(0),
    }
}

/// Keep only the first in-order message of each thread; that message is
/// the thread's exemplar under the current sort.
fn collapse_threads(rows: Vec<Row>) -> Vec<Row> {
    let mut seen = AHashSet::new();
    rows.into_iter()
        .filter(|row| {
            let thread = row.str_field("threadId").unwrap_or(&row.id).to_string();
            seen.insert(thread)
        })
        .collect()
}
