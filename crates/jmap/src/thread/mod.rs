/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server, changes, get,
    email::thread_of,
    object::{JmapObject, into_value, store_error},
};
use ahash::AHashMap;
use jmap_proto::{
    Object,
    error::MethodError,
    method::{changes::ChangesRequest, get::GetRequest},
};
use serde_json::{Value, json};
use store::{Collection, Row};

/// Threads have no table of their own: they are projected from the
/// message rows, destroyed members included so thread tombstones still
/// surface in `/changes`.
pub struct Thread;

impl JmapObject for Thread {
    const NAME: &'static str = "Thread";
    const COLLECTION: Collection = Collection::Thread;
    const CAN_CALCULATE_CHANGES: bool = false;
}

pub fn handle_get(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = GetRequest::parse(&args)?;
    let rows = derive_rows(server)?;
    get::get::<Thread>(server, ctx, &request, rows).and_then(into_value)
}

pub fn handle_changes(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = ChangesRequest::parse(&args)?;
    let rows = derive_rows(server)?;
    changes::changes::<Thread>(server, ctx, &request, rows)
        .map(|(response, _)| response)
        .and_then(into_value)
}

fn derive_rows(server: &Server) -> Result<Vec<Row>, MethodError> {
    let emails = server.store.rows(Collection::Email).map_err(store_error)?;
    let mut members: AHashMap<String, Vec<&Row>> = AHashMap::new();
    for email in &emails {
        members
            .entry(thread_of(email).to_string())
            .or_default()
            .push(email);
    }

    let mut rows = Vec::with_capacity(members.len());
    for (thread_id, mut emails) in members {
        emails.sort_by(|a, b| {
            (a.str_field("receivedAt"), &a.id).cmp(&(b.str_field("receivedAt"), &b.id))
        });

        let email_ids = emails
            .iter()
            .filter(|email| email.active)
            .map(|email| email.id.clone())
            .collect::<Vec<_>>();
        let active = !email_ids.is_empty();
        let mut fields = Object::new();
        fields.insert("emailIds".into(), json!(email_ids));

        rows.push(Row {
            id: thread_id,
            fields,
            modseq: emails.iter().map(|email| email.change_modseq()).max().unwrap_or(0),
            counts_modseq: 0,
            created_modseq: emails
                .iter()
                .map(|email| email.created_modseq)
                .min()
                .unwrap_or(0),
            active,
        });
    }
    rows.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(rows)
}
