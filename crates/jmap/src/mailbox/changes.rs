/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server, changes,
    mailbox::Mailbox,
    object::{into_value, store_error},
};
use jmap_proto::{Object, error::MethodError, method::changes::ChangesRequest};
use serde_json::{Value, json};
use store::Collection;

/// `Mailbox/changes` with the count-only refinement: when every updated
/// mailbox changed nothing but its message counts, the client is told
/// the closed property set instead of having to refetch everything.
pub fn handle(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = ChangesRequest::parse(&args)?;
    let rows = server.store.rows(Collection::Mailbox).map_err(store_error)?;
    let (mut response, updated_rows) = changes::changes::<Mailbox>(server, ctx, &request, rows)?;

    let since = request.since_state.modseq();
    let counts_only = !updated_rows.is_empty()
        && updated_rows
            .iter()
            .all(|row| row.counts_modseq > since && row.modseq <= since);
    response.changed_properties = Some(if counts_only {
        json!(["totalEmails", "unreadEmails", "totalThreads", "unreadThreads"])
    } else {
        Value::Null
    });

    into_value(response)
}
