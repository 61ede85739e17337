/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::{JmapObject, check_account, into_value, store_error},
    query::{filter::matches_filter, scratch::Scratch, sort::sort_rows},
};
use ahash::{AHashMap, AHashSet};
use jmap_proto::{
    Object,
    error::MethodError,
    method::query_changes::{AddedItem, QueryChangesRequest, QueryChangesResponse},
    types::state::State,
};
use serde_json::Value;

pub fn handle<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = QueryChangesRequest::parse(&args)?;
    query_changes::<T>(server, ctx, &request).and_then(into_value)
}

/// Reconstruct the edits between the query result at `sinceQueryState`
/// and now: ids to remove, and ids to insert with their index in the
/// current list. Rows are walked in current sort order, destroyed rows
/// included, so tombstoned entries still produce removals.
pub fn query_changes<T: JmapObject>(
    server: &Server,
    ctx: &RequestContext<'_>,
    request: &QueryChangesRequest,
) -> Result<QueryChangesResponse, MethodError> {
    let account_id = check_account(ctx, request.account_id.as_deref())?;
    let new_query_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);
    let since = request.since_query_state;

    if since.modseq() <= server.store.deleted_modseq().map_err(store_error)? {
        return Err(MethodError::CannotCalculateQueryChanges { new_query_state });
    }

    let mut scratch = Scratch::new();
    let mut rows = server.store.rows(T::COLLECTION).map_err(store_error)?;
    sort_rows::<T>(server, &mut scratch, &mut rows, request.sort.as_deref())?;

    let max_changes = request
        .max_changes
        .unwrap_or(server.config.changes_max_results)
        .min(server.config.changes_max_results);

    let mut response = QueryChangesResponse {
        account_id,
        old_query_state: since,
        new_query_state,
        total: 0,
        removed: Vec::new(),
        added: Vec::new(),
    };

    let mut reporting = true;
    // Collapsed mode bookkeeping: the exemplar chosen so far per thread
    // (id plus creation modseq), and threads whose reporting has
    // terminated.
    let mut exemplar: AHashMap<String, (String, u64)> = AHashMap::new();
    let mut finished: AHashSet<String> = AHashSet::new();

    for row in &rows {
        let thread = if request.collapse_threads {
            Some(row.str_field("threadId").unwrap_or(&row.id).to_string())
        } else {
            None
        };

        if let Some(thread) = &thread {
            if finished.contains(thread) {
                if reporting && Some(row.id.as_str()) == request.up_to_id.as_deref() {
                    reporting = false;
                }
                continue;
            }
        }

        let mut is_in = row.active;
        if is_in {
            if let Some(filter) = &request.filter {
                is_in = matches_filter::<T>(server, &mut scratch, row, filter)?;
            }
        }

        let is_exemplar = match &thread {
            Some(thread) => {
                if is_in && !exemplar.contains_key(thread) {
                    exemplar.insert(thread.clone(), (row.id.clone(), row.created_modseq));
                    response.total += 1;
                    true
                } else {
                    false
                }
            }
            None => {
                if is_in {
                    response.total += 1;
                }
                is_in
            }
        };

        let changed = row.change_modseq() > since.modseq();
        if reporting {
            if changed {
                response.removed.push(row.id.clone());
                if is_exemplar {
                    response.added.push(AddedItem {
                        id: row.id.clone(),
                        index: response.total - 1,
                    });
                }
            } else if is_in {
                match &thread {
                    Some(thread) => {
                        // Unchanged and in filter: if a newly arrived
                        // message took over as exemplar, this row may
                        // have been the exemplar the client holds and
                        // must go. An exemplar that already existed at
                        // sinceQueryState was the exemplar then too, so
                        // the row was never in the client's list. Either
                        // way the thread needs no further reporting.
                        let exemplar_is_new = exemplar
                            .get(thread)
                            .map(|(_, created)| *created > since.modseq())
                            .unwrap_or(false);
                        if !is_exemplar && exemplar_is_new {
                            response.removed.push(row.id.clone());
                        }
                        finished.insert(thread.clone());
                    }
                    None => (),
                }
            }

            if response.removed.len() + response.added.len() > max_changes {
                return Err(MethodError::CannotCalculateQueryChanges { new_query_state });
            }
            if Some(row.id.as_str()) == request.up_to_id.as_deref() {
                reporting = false;
            }
        }
    }

    Ok(response)
}
