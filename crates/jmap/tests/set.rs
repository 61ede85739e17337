/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod common;

use common::{call, call_err, seed_mail, server, submit};
use serde_json::json;

#[test]
fn singleton_preferences_update() {
    let (server, _store) = server();

    let payload = call(
        &server,
        "UserPreferences/set",
        json!({"update": {"singleton": {"theme": "dark"}}}),
    );
    assert_ne!(payload["oldState"], payload["newState"]);
    assert!(payload["updated"].get("singleton").is_some());

    let payload = call(
        &server,
        "UserPreferences/get",
        json!({"ids": ["singleton"]}),
    );
    assert_eq!(payload["list"][0]["id"], "singleton");
    assert_eq!(payload["list"][0]["theme"], "dark");

    // Merge keeps earlier keys.
    call(
        &server,
        "UserPreferences/set",
        json!({"update": {"singleton": {"locale": "de"}}}),
    );
    let payload = call(&server, "UserPreferences/get", json!({}));
    assert_eq!(payload["list"][0]["theme"], "dark");
    assert_eq!(payload["list"][0]["locale"], "de");
}

#[test]
fn singleton_create_and_destroy_are_rejected() {
    let (server, _store) = server();

    let payload = call(
        &server,
        "UserPreferences/set",
        json!({
            "create": {"x": {"theme": "light"}},
            "destroy": ["singleton"],
            "update": {"other": {"theme": "light"}},
        }),
    );

    assert_eq!(payload["notCreated"]["x"]["type"], "singleton");
    assert_eq!(
        payload["notCreated"]["x"]["description"],
        "Can't create singleton types"
    );
    assert_eq!(payload["notDestroyed"]["singleton"]["type"], "singleton");
    assert_eq!(payload["notUpdated"]["other"]["type"], "notFound");
}

#[test]
fn deep_patch_preserves_siblings() {
    let (server, store) = server();
    seed_mail(&store);

    let payload = call(
        &server,
        "Mailbox/set",
        json!({"update": {"f1": {"myRights/mayDelete": true}}}),
    );
    assert!(payload["updated"].get("f1").is_some(), "{payload:?}");

    let payload = call(
        &server,
        "Mailbox/get",
        json!({"ids": ["f1"], "properties": ["myRights"]}),
    );
    let rights = &payload["list"][0]["myRights"];
    assert_eq!(rights["mayAddItems"], true, "sibling preserved");
    assert_eq!(rights["mayDelete"], true, "leaf patched");
}

#[test]
fn deep_patch_null_deletes_leaf() {
    let (server, store) = server();
    seed_mail(&store);

    call(
        &server,
        "Email/set",
        json!({"update": {"m2": {"keywords/$seen": null}}}),
    );
    let payload = call(
        &server,
        "Email/get",
        json!({"ids": ["m2"], "properties": ["keywords"]}),
    );
    assert_eq!(payload["list"][0]["keywords"], json!({}));
}

#[test]
fn creation_placeholders_span_the_batch() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([
            [
                "Mailbox/set",
                {"create": {
                    "parent": {"name": "Work"},
                    "child": {"name": "Reports", "parentId": "#parent"},
                }},
                "c0"
            ],
            ["Mailbox/get", {"ids": ["#child"], "properties": ["name", "parentId"]}, "c1"],
            ["Mailbox/set", {"destroy": ["#child"]}, "c2"],
        ]),
    );

    let created = &responses[0][1]["created"];
    let parent_id = created["parent"]["id"].as_str().unwrap();
    let child_id = created["child"]["id"].as_str().unwrap();

    let fetched = &responses[1][1]["list"][0];
    assert_eq!(fetched["id"].as_str(), Some(child_id));
    assert_eq!(fetched["parentId"].as_str(), Some(parent_id));

    assert_eq!(
        responses[2][1]["destroyed"].as_array().unwrap(),
        &vec![json!(child_id)]
    );
}

#[test]
fn if_in_state_mismatch() {
    let (server, store) = server();
    seed_mail(&store);

    let stale = call(&server, "Mailbox/get", json!({}))["state"]
        .as_str()
        .unwrap()
        .to_string();
    call(
        &server,
        "Mailbox/set",
        json!({"create": {"new": {"name": "Receipts"}}}),
    );

    let error = call_err(
        &server,
        "Mailbox/set",
        json!({"ifInState": stale, "create": {"x": {"name": "Nope"}}}),
    );
    assert_eq!(error["type"], "stateMismatch");
}

#[test]
fn partial_failure_keeps_the_call_successful() {
    let (server, store) = server();
    seed_mail(&store);

    let payload = call(
        &server,
        "Mailbox/set",
        json!({
            "create": {
                "ok": {"name": "Kept"},
                "bad": {"name": "Orphan", "parentId": "missing"},
            },
            "destroy": ["f1", "f2"],
        }),
    );

    assert!(payload["created"].get("ok").is_some());
    assert_eq!(payload["notCreated"]["bad"]["type"], "invalidProperties");
    // f1 has a child, f2 does not.
    assert_eq!(payload["notDestroyed"]["f1"]["type"], "mailboxHasChild");
    assert_eq!(
        payload["destroyed"].as_array().unwrap(),
        &vec![json!("f2")]
    );
}

#[test]
fn email_create_requires_valid_mailboxes() {
    let (server, store) = server();
    seed_mail(&store);

    let payload = call(
        &server,
        "Email/set",
        json!({"create": {
            "a": {"subject": "no mailboxes"},
            "b": {"subject": "bad mailbox", "mailboxIds": {"missing": true}},
        }}),
    );

    assert_eq!(payload["notCreated"]["a"]["type"], "invalidMailboxes");
    assert_eq!(payload["notCreated"]["b"]["type"], "invalidMailboxes");
}

#[test]
fn update_of_missing_id_reports_not_found() {
    let (server, store) = server();
    seed_mail(&store);

    let payload = call(
        &server,
        "Mailbox/set",
        json!({"update": {"f999": {"name": "ghost"}}}),
    );
    assert_eq!(payload["notUpdated"]["f999"]["type"], "notFound");
}
