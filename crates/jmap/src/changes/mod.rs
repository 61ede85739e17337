/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::{JmapObject, check_account, into_value, store_error},
};
use jmap_proto::{
    Object,
    error::MethodError,
    method::changes::{ChangesRequest, ChangesResponse},
    types::state::State,
};
use serde_json::Value;
use store::Row;

pub fn handle<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = ChangesRequest::parse(&args)?;
    let rows = server.store.rows(T::COLLECTION).map_err(store_error)?;
    changes::<T>(server, ctx, &request, rows)
        .map(|(response, _)| response)
        .and_then(into_value)
}

/// Compute a `/changes` response over a row set. Returns the updated
/// rows alongside so type handlers can post-process (mailbox counts).
pub fn changes<T: JmapObject>(
    server: &Server,
    ctx: &RequestContext<'_>,
    request: &ChangesRequest,
    rows: Vec<Row>,
) -> Result<(ChangesResponse, Vec<Row>), MethodError> {
    let account_id = check_account(ctx, request.account_id.as_deref())?;
    let new_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);
    let since = request.since_state;

    // Below the horizon the tombstones are gone and deltas can no longer
    // be reconstructed.
    if since.modseq() <= server.store.deleted_modseq().map_err(store_error)? {
        return Err(MethodError::CannotCalculateChanges { new_state });
    }

    let changed = rows
        .into_iter()
        .filter(|row| row.change_modseq() > since.modseq())
        .collect::<Vec<_>>();

    let max_changes = request
        .max_changes
        .unwrap_or(server.config.changes_max_results)
        .min(server.config.changes_max_results);
    if changed.len() > max_changes {
        return Err(MethodError::CannotCalculateChanges { new_state });
    }

    let mut response = ChangesResponse::new(account_id, since, new_state);
    let mut updated_rows = Vec::new();
    for row in changed {
        if row.active {
            if row.created_modseq > since.modseq() {
                response.created.push(row.id);
            } else {
                response.updated.push(row.id.clone());
                updated_rows.push(row);
            }
        } else if row.created_modseq <= since.modseq() {
            response.removed.push(row.id);
        }
        // Created and destroyed within the window: never seen, omitted.
    }

    Ok((response, updated_rows))
}

/// `ifInState` assertion for `/set`: the supplied token must match the
/// state read under the superlock.
pub fn assert_state(old_state: State, if_in_state: Option<State>) -> Result<State, MethodError> {
    match if_in_state {
        Some(expected) if expected != old_state => Err(MethodError::StateMismatch),
        _ => Ok(old_state),
    }
}
