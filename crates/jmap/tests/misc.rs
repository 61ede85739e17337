/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod common;

use common::{call, call_err, seed, seed_mail, server};
use serde_json::json;
use store::{Collection, Store};

#[test]
fn email_import_from_blob() {
    let (server, store) = server();
    seed_mail(&store);
    let blob_id = store.put_blob(b"Subject: hi\r\n\r\nhello".to_vec()).unwrap();

    let payload = call(
        &server,
        "Email/import",
        json!({"emails": {
            "a": {"blobId": blob_id, "mailboxIds": {"f1": true},
                  "keywords": {"$seen": true}, "receivedAt": "2024-03-08T10:00:00Z"},
            "b": {"blobId": "missing", "mailboxIds": {"f1": true}},
            "c": {"mailboxIds": {"f1": true}},
        }}),
    );

    let id = payload["created"]["a"]["id"].as_str().unwrap();
    assert_eq!(payload["notCreated"]["b"]["type"], "blobNotFound");
    assert_eq!(payload["notCreated"]["c"]["type"], "invalidProperties");
    assert_ne!(payload["oldState"], payload["newState"]);

    let fetched = call(
        &server,
        "Email/get",
        json!({"ids": [id], "properties": ["size", "keywords"]}),
    );
    assert_eq!(fetched["list"][0]["size"], 20);
    assert_eq!(fetched["list"][0]["keywords"]["$seen"], true);
}

#[test]
fn email_copy_needs_a_second_account() {
    let (server, store) = server();
    seed_mail(&store);

    let error = call_err(
        &server,
        "Email/copy",
        json!({"fromAccountId": "other", "create": {}}),
    );
    assert_eq!(error["type"], "accountNotFound");

    let error = call_err(
        &server,
        "Email/copy",
        json!({"fromAccountId": common::ACCOUNT, "create": {}}),
    );
    assert_eq!(error["type"], "invalidArguments");
}

#[test]
fn calendar_refresh_returns_fresh_state() {
    let (server, store) = server();
    seed(
        &store,
        Collection::Calendar,
        "c1",
        json!({"name": "Personal", "sortOrder": 1}),
    );

    let payload = call(&server, "Calendar/refreshSynced", json!({}));
    assert_eq!(payload["accountId"], common::ACCOUNT);
    let state = call(&server, "Calendar/get", json!({}))["state"].clone();
    assert_eq!(payload["newState"], state);
}

#[test]
fn calendar_event_set_validates_calendar() {
    let (server, store) = server();
    seed(
        &store,
        Collection::Calendar,
        "c1",
        json!({"name": "Personal"}),
    );

    let payload = call(
        &server,
        "CalendarEvent/set",
        json!({"create": {
            "ok": {"calendarId": "c1", "title": "Standup", "start": "2024-03-06T09:00:00Z"},
            "bad": {"calendarId": "c9", "title": "Ghost"},
        }}),
    );

    assert!(payload["created"].get("ok").is_some());
    assert_eq!(payload["notCreated"]["bad"]["type"], "invalidProperties");

    let events = call(
        &server,
        "CalendarEvent/query",
        json!({"filter": {"inCalendar": "c1"}}),
    );
    assert_eq!(events["total"], 1);
}

#[test]
fn storage_node_query() {
    let (server, store) = server();
    seed(
        &store,
        Collection::StorageNode,
        "n1",
        json!({"name": "Documents", "type": "folder"}),
    );
    seed(
        &store,
        Collection::StorageNode,
        "n2",
        json!({"name": "report.pdf", "type": "file", "parentId": "n1", "size": 1024}),
    );

    let payload = call(
        &server,
        "StorageNode/query",
        json!({"filter": {"parentId": "n1"}}),
    );
    assert_eq!(payload["ids"].as_array().unwrap(), &vec![json!("n2")]);

    let payload = call(&server, "StorageNode/get", json!({"ids": ["n2"]}));
    assert_eq!(payload["list"][0]["name"], "report.pdf");
}

#[test]
fn read_only_singletons() {
    let (server, store) = server();
    seed(
        &store,
        Collection::Quota,
        "singleton",
        json!({"used": 1234, "total": 100000}),
    );

    let payload = call(&server, "Quota/get", json!({}));
    assert_eq!(payload["list"][0]["id"], "singleton");
    assert_eq!(payload["list"][0]["used"], 1234);

    // Types without stored rows still expose their singleton object.
    let payload = call(&server, "Identity/get", json!({}));
    assert_eq!(payload["list"][0]["id"], "singleton");
    let payload = call(&server, "VacationResponse/get", json!({"ids": ["singleton", "other"]}));
    assert_eq!(payload["list"][0]["id"], "singleton");
    assert_eq!(payload["notFound"].as_array().unwrap(), &vec![json!("other")]);
}

#[test]
fn contact_group_membership_filter() {
    let (server, store) = server();
    seed(
        &store,
        Collection::Contact,
        "p1",
        json!({"firstName": "Ada", "lastName": "Lovelace"}),
    );
    seed(
        &store,
        Collection::Contact,
        "p2",
        json!({"firstName": "Charles", "lastName": "Babbage"}),
    );
    seed(
        &store,
        Collection::ContactGroup,
        "g1",
        json!({"name": "Pioneers", "contactIds": ["p1"]}),
    );

    let payload = call(
        &server,
        "Contact/query",
        json!({"filter": {"inContactGroup": "g1"}}),
    );
    assert_eq!(payload["ids"].as_array().unwrap(), &vec![json!("p1")]);

    let payload = call(
        &server,
        "Contact/query",
        json!({"sort": [{"property": "lastName", "isAscending": true}]}),
    );
    assert_eq!(
        payload["ids"].as_array().unwrap(),
        &vec![json!("p2"), json!("p1")]
    );
}

#[test]
fn patch_expansion_is_idempotent() {
    let (server, store) = server();
    seed_mail(&store);

    // Applying the same pointer patch twice lands in the same place.
    for _ in 0..2 {
        call(
            &server,
            "Mailbox/set",
            json!({"update": {"f1": {"myRights/mayDelete": true}}}),
        );
    }
    let payload = call(
        &server,
        "Mailbox/get",
        json!({"ids": ["f1"], "properties": ["myRights"]}),
    );
    assert_eq!(payload["list"][0]["myRights"]["mayDelete"], true);
    assert_eq!(payload["list"][0]["myRights"]["mayAddItems"], true);
}
