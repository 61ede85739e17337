/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod patch;
pub mod singleton;

use crate::{
    RequestContext, Server,
    changes::assert_state,
    object::{
        JmapSetObject, check_account, into_value, resolve_creation_refs, resolve_id, store_error,
    },
    query::scratch::Scratch,
};
use jmap_proto::{
    Object,
    error::MethodError,
    method::set::{SetRequest, SetResponse},
    types::state::State,
};
use serde_json::Value;

pub fn handle<T: JmapSetObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = SetRequest::parse(&args)?;
    set::<T>(server, ctx, request).and_then(into_value)
}

/// The uniform write sequence: take the per-type superlock, reconcile
/// with the external source, sample oldState, then run creates, updates
/// (with deep-patch expansion) and destroys, reconcile again and sample
/// newState. Per-entity failures land in the notX maps; the call itself
/// still succeeds.
pub fn set<T: JmapSetObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    request: SetRequest,
) -> Result<SetResponse, MethodError> {
    let account_id = check_account(ctx, request.account_id.as_deref())?;
    if request.total_objects() > server.config.set_max_objects {
        return Err(MethodError::invalid_arguments(format!(
            "Too many objects in one call, maximum is {}.",
            server.config.set_max_objects
        )));
    }

    let _superlock = server.store.superlock(T::COLLECTION);
    if let Some(source) = T::COLLECTION.sync_source() {
        server.store.sync(source).map_err(store_error)?;
    }

    let old_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);
    assert_state(old_state, request.if_in_state)?;
    let mut response = SetResponse::new(account_id, old_state);
    let mut scratch = Scratch::new();

    // Create, one entry at a time: each success registers its
    // placeholder immediately so later creates in the same call, the
    // update/destroy phases below, and later calls in the batch can all
    // refer to it.
    for (placeholder, mut fields) in request.create {
        resolve_creation_refs(&mut fields, &ctx.response);
        if let Err(error) = T::before_create(server, ctx, &mut fields) {
            response.push_not_created(placeholder, error);
            continue;
        }

        let result = server
            .store
            .create(T::COLLECTION, vec![(placeholder.clone(), fields)])
            .map_err(store_error)?;
        for (placeholder, server_set) in result.created {
            if let Some(id) = server_set.get("id").and_then(Value::as_str) {
                ctx.response
                    .created_ids
                    .insert(placeholder.clone(), id.to_string());
            }
            response.push_created(placeholder, server_set);
        }
        for (placeholder, error) in result.not_created {
            response.push_not_created(placeholder, error);
        }
    }

    // Update, expanding pointer-keyed patches against the stored object.
    let mut to_update = Vec::new();
    for (id, mut patch) in request.update {
        let id = resolve_id(&ctx.response, &id);
        resolve_creation_refs(&mut patch, &ctx.response);
        let mut patch = patch::expand::<T>(server, &mut scratch, &id, patch)?;

        match server.store.row(T::COLLECTION, &id).map_err(store_error)? {
            Some(row) if row.active => match T::before_update(server, ctx, &row, &mut patch) {
                Ok(()) => to_update.push((id, patch)),
                Err(error) => response.push_not_updated(id, error),
            },
            // Let the store produce its own notFound for the rest.
            _ => to_update.push((id, patch)),
        }
    }
    if !to_update.is_empty() {
        let result = server
            .store
            .update(T::COLLECTION, to_update)
            .map_err(store_error)?;
        for (id, extras) in result.updated {
            response.push_updated(id, extras);
        }
        for (id, error) in result.not_updated {
            response.push_not_updated(id, error);
        }
    }

    // Destroy.
    let mut to_destroy = Vec::new();
    for id in request.destroy {
        let id = resolve_id(&ctx.response, &id);
        match server.store.row(T::COLLECTION, &id).map_err(store_error)? {
            Some(row) if row.active => match T::before_destroy(server, ctx, &row) {
                Ok(()) => to_destroy.push(id),
                Err(error) => response.push_not_destroyed(id, error),
            },
            _ => to_destroy.push(id),
        }
    }
    if !to_destroy.is_empty() {
        let result = server
            .store
            .destroy(T::COLLECTION, to_destroy)
            .map_err(store_error)?;
        response.destroyed.extend(result.destroyed);
        for (id, error) in result.not_destroyed {
            response.push_not_destroyed(id, error);
        }
    }

    if let Some(source) = T::COLLECTION.sync_source() {
        server.store.sync(source).map_err(store_error)?;
    }
    response.new_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);

    Ok(response)
}
