/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::into_value,
    set,
    submission::{EmailSubmission, email_of},
};
use ahash::AHashSet;
use jmap_proto::{
    Object,
    error::MethodError,
    method::set::{SetRequest, SetResponse},
    request::Call,
};
use serde_json::Value;

/// `EmailSubmission/set` with the `onSuccessUpdateEmail` and
/// `onSuccessDestroyEmail` extras: once the submission outcome is known,
/// an implicit `Email/set` confined to the emails of the submissions
/// that succeeded is chained under the same call tag.
pub fn handle(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let request = SetRequest::parse(&args)?;
    let on_update = request.arguments.get("onSuccessUpdateEmail").cloned();
    let on_destroy = request.arguments.get("onSuccessDestroyEmail").cloned();

    let response = set::set::<EmailSubmission>(server, ctx, request)?;

    let succeeded = succeeded_ids(&response);
    let mut email_update = Object::new();
    let mut email_destroy = Vec::new();

    if let Some(Value::Object(updates)) = on_update {
        for (key, patch) in updates {
            if let Some(submission_id) = resolve_submission_id(&response, &key) {
                if succeeded.contains(&submission_id) {
                    if let Some(email_id) = email_of(server, &submission_id)? {
                        email_update.insert(email_id, patch);
                    }
                }
            }
        }
    }
    if let Some(Value::Array(destroys)) = on_destroy {
        for key in destroys {
            let key = match key.as_str() {
                Some(key) => key,
                None => continue,
            };
            if let Some(submission_id) = resolve_submission_id(&response, key) {
                if succeeded.contains(&submission_id) {
                    if let Some(email_id) = email_of(server, &submission_id)? {
                        email_destroy.push(Value::String(email_id));
                    }
                }
            }
        }
    }

    if !email_update.is_empty() || !email_destroy.is_empty() {
        let mut arguments = Object::new();
        arguments.insert(
            "accountId".into(),
            Value::String(response.account_id.clone()),
        );
        if !email_update.is_empty() {
            arguments.insert("update".into(), Value::Object(email_update));
        }
        if !email_destroy.is_empty() {
            arguments.insert("destroy".into(), Value::Array(email_destroy));
        }
        ctx.next_call = Some(Call {
            name: "Email/set".into(),
            arguments,
            id: String::new(),
        });
    }

    into_value(response)
}

fn succeeded_ids(response: &SetResponse) -> AHashSet<String> {
    let mut ids = AHashSet::new();
    for created in response.created.values() {
        if let Some(id) = created.get("id").and_then(Value::as_str) {
            ids.insert(id.to_string());
        }
    }
    for id in response.updated.keys() {
        ids.insert(id.clone());
    }
    for id in &response.destroyed {
        ids.insert(id.clone());
    }
    ids
}

/// `onSuccess*` keys may name a submission id or a `#cid` placeholder
/// from this call's create map.
fn resolve_submission_id(response: &SetResponse, key: &str) -> Option<String> {
    match key.strip_prefix('#') {
        Some(placeholder) => response.created_id(placeholder).map(String::from),
        None => Some(key.to_string()),
    }
}
