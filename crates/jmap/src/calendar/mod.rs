/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod event;

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject, check_account, store_error},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{
    Object,
    error::MethodError,
    method::{opt_string, query::Comparator},
    types::state::State,
};
use serde_json::{Value, json};
use store::{Collection, Row, SyncSource};

pub struct Calendar;

impl JmapObject for Calendar {
    const NAME: &'static str = "Calendar";
    const COLLECTION: Collection = Collection::Calendar;

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
        } else if comparator.is_property("sortOrder") {
            Ok(SortKey::Int(
                row.field("sortOrder").and_then(Value::as_i64).unwrap_or(0),
            ))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for Calendar.",
                comparator.property
            )))
        }
    }
}

impl JmapSetObject for Calendar {}

/// `Calendar/refreshSynced`: force a reconciliation with the remote
/// calendar source and report the resulting state.
pub fn handle_refresh(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let account_id = check_account(ctx, opt_string(&args, "accountId")?.as_deref())?;

    server
        .store
        .sync(SyncSource::Calendars)
        .map_err(store_error)?;

    Ok(json!({
        "accountId": account_id,
        "newState": State::new(
            server
                .store
                .state(Collection::Calendar)
                .map_err(store_error)?,
        ),
    }))
}
