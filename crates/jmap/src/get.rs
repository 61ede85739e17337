/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::{JmapObject, check_account, into_value, project, resolve_ids, store_error},
    query::scratch::Scratch,
};
use jmap_proto::{
    Object,
    error::MethodError,
    method::get::{GetRequest, GetResponse},
    types::state::State,
};
use serde_json::Value;
use store::Row;

pub fn handle<T: JmapObject>(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = GetRequest::parse(&args)?;
    let rows = server.store.rows(T::COLLECTION).map_err(store_error)?;
    get::<T>(server, ctx, &request, rows).and_then(into_value)
}

pub fn get<T: JmapObject>(
    server: &Server,
    ctx: &RequestContext<'_>,
    request: &GetRequest,
    rows: Vec<Row>,
) -> Result<GetResponse, MethodError> {
    let account_id = check_account(ctx, request.account_id.as_deref())?;
    let mut scratch = Scratch::new();
    let properties = request.properties.as_deref();

    let mut response = GetResponse {
        account_id,
        state: State::new(server.store.state(T::COLLECTION).map_err(store_error)?),
        list: Vec::new(),
        not_found: Vec::new(),
    };

    match &request.ids {
        Some(ids) => {
            if ids.len() > server.config.get_max_objects {
                return Err(MethodError::invalid_arguments(format!(
                    "Too many ids requested, maximum is {}.",
                    server.config.get_max_objects
                )));
            }
            let ids = resolve_ids(&ctx.response, ids.clone());
            for id in ids {
                match rows.iter().find(|row| row.active && row.id == id) {
                    Some(row) => {
                        let obj = T::materialize(server, &mut scratch, row)?;
                        response.list.push(Value::Object(project(obj, properties)));
                    }
                    None => response.not_found.push(id),
                }
            }
        }
        None => {
            for row in rows.iter().filter(|row| row.active) {
                if response.list.len() == server.config.get_max_objects {
                    break;
                }
                let obj = T::materialize(server, &mut scratch, row)?;
                response.list.push(Value::Object(project(obj, properties)));
            }
        }
    }

    Ok(response)
}
