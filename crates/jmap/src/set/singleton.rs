/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    changes::assert_state,
    object::{JmapObject, check_account, into_value, project, store_error},
    set::patch::expand_against,
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::{
        get::{GetRequest, GetResponse},
        set::{SetRequest, SetResponse},
    },
    types::state::State,
};
use serde_json::Value;
use store::SINGLETON_ID;

/// `/get` for types with exactly one object under the well-known id.
pub fn handle_get<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = GetRequest::parse(&args)?;
    let account_id = check_account(ctx, request.account_id.as_deref())?;

    let mut response = GetResponse {
        account_id,
        state: State::new(server.store.state(T::COLLECTION).map_err(store_error)?),
        list: Vec::new(),
        not_found: Vec::new(),
    };

    let ids = request
        .ids
        .unwrap_or_else(|| vec![SINGLETON_ID.to_string()]);
    for id in ids {
        if id == SINGLETON_ID {
            let obj = project(current_value::<T>(server)?, request.properties.as_deref());
            response.list.push(Value::Object(obj));
        } else {
            response.not_found.push(id);
        }
    }

    into_value(response)
}

/// `/set` for singleton types: creates and destroys are categorically
/// rejected; the one update target is read-merge-written in full.
pub fn handle_set<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = SetRequest::parse(&args)?;
    let account_id = check_account(ctx, request.account_id.as_deref())?;

    let _superlock = server.store.superlock(T::COLLECTION);
    let old_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);
    assert_state(old_state, request.if_in_state)?;
    let mut response = SetResponse::new(account_id, old_state);

    for (placeholder, _) in request.create {
        response.push_not_created(
            placeholder,
            SetError::singleton().with_description("Can't create singleton types"),
        );
    }
    for id in request.destroy {
        response.push_not_destroyed(
            id,
            SetError::singleton().with_description("Can't destroy singleton types"),
        );
    }

    for (id, patch) in request.update {
        if id != SINGLETON_ID {
            response.push_not_updated(
                id,
                SetError::not_found().with_description("Unknown id for a singleton type"),
            );
            continue;
        }

        let current = current_value::<T>(server)?;
        let merged = expand_against(&current, patch);
        server
            .store
            .upsert(T::COLLECTION, SINGLETON_ID, merged)
            .map_err(store_error)?;
        response.push_updated(id, None);
    }

    response.new_state = State::new(server.store.state(T::COLLECTION).map_err(store_error)?);
    into_value(response)
}

fn current_value<T: JmapObject>(server: &Server) -> Result<Object, MethodError> {
    let mut obj = Object::new();
    obj.insert("id".into(), Value::String(SINGLETON_ID.into()));
    if let Some(row) = server
        .store
        .row(T::COLLECTION, SINGLETON_ID)
        .map_err(store_error)?
    {
        if row.active {
            for (key, value) in &row.fields {
                obj.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(obj)
}
