/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    changes::assert_state,
    email::Email,
    object::{JmapSetObject, check_account, into_value, resolve_creation_refs, store_error},
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::{opt_object, opt_state, opt_string, set::SetResponse},
    types::state::State,
};
use serde_json::Value;
use store::{Collection, SyncSource};

/// `Email/import`: file one message per creation entry from an uploaded
/// blob into a set of mailboxes. MIME parsing belongs to the blob layer;
/// this path records what the envelope declares.
pub fn handle(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let account_id = check_account(ctx, opt_string(&args, "accountId")?.as_deref())?;
    let if_in_state = opt_state(&args, "ifInState")?;
    let emails = opt_object(&args, "emails")?
        .cloned()
        .ok_or_else(|| MethodError::invalid_arguments("Missing emails argument."))?;

    let _superlock = server.store.superlock(Collection::Email);
    server.store.sync(SyncSource::Mail).map_err(store_error)?;
    let old_state = State::new(server.store.state(Collection::Email).map_err(store_error)?);
    assert_state(old_state, if_in_state)?;
    let mut response = SetResponse::new(account_id, old_state);

    for (placeholder, entry) in emails {
        let mut entry = match entry {
            Value::Object(entry) => entry,
            _ => {
                response.push_not_created(
                    placeholder,
                    SetError::invalid_properties()
                        .with_description("Import entry is not an object"),
                );
                continue;
            }
        };
        resolve_creation_refs(&mut entry, &ctx.response);

        let blob = match entry.get("blobId").and_then(Value::as_str) {
            Some(blob_id) => match server.store.blob(blob_id).map_err(store_error)? {
                Some(blob) => blob,
                None => {
                    response.push_not_created(
                        placeholder,
                        SetError::blob_not_found().with_property("blobId"),
                    );
                    continue;
                }
            },
            None => {
                response.push_not_created(
                    placeholder,
                    SetError::invalid_properties()
                        .with_property("blobId")
                        .with_description("A blobId is required"),
                );
                continue;
            }
        };

        let mut fields = Object::new();
        for key in ["blobId", "mailboxIds", "keywords", "receivedAt"] {
            if let Some(value) = entry.get(key) {
                fields.insert(key.into(), value.clone());
            }
        }
        fields.insert("size".into(), Value::from(blob.len()));
        if let Err(error) = Email::before_create(server, ctx, &mut fields) {
            response.push_not_created(placeholder, error);
            continue;
        }

        let result = server
            .store
            .create(Collection::Email, vec![(placeholder.clone(), fields)])
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

    server.store.sync(SyncSource::Mail).map_err(store_error)?;
    response.new_state = State::new(server.store.state(Collection::Email).map_err(store_error)?);

    into_value(response)
}
