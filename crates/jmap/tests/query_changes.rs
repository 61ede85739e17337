/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod common;

use common::{call, call_err, seed_mail, server};
use serde_json::{Value, json};

fn email_state(server: &jmap::Server) -> String {
    call(server, "Email/get", json!({"ids": []}))["state"]
        .as_str()
        .unwrap()
        .to_string()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn collapsed_exemplar_flag_change() {
    let (server, store) = server();
    seed_mail(&store);
    let since = email_state(&server);

    // Mark the thread exemplar read; membership and order are unchanged.
    call(
        &server,
        "Email/set",
        json!({"update": {"m2": {"keywords/$seen": true}}}),
    );

    let payload = call(
        &server,
        "Email/queryChanges",
        json!({
            "sinceQueryState": since,
            "collapseThreads": true,
            "sort": [{"property": "receivedAt", "isAscending": false}],
        }),
    );

    // Only the exemplar is re-announced; its thread-mate m1 stays silent
    // and the collapsed total is untouched.
    assert_eq!(string_list(&payload["removed"]), ["m2"]);
    assert_eq!(payload["added"].as_array().unwrap().len(), 1);
    assert_eq!(payload["added"][0]["id"], "m2");
    assert_eq!(payload["added"][0]["index"], 3);
    assert_eq!(payload["total"], 4);
}

#[test]
fn collapsed_new_message_takes_over_exemplar() {
    let (server, store) = server();
    seed_mail(&store);
    let since = email_state(&server);

    // A new message lands on top of thread t1.
    let new_id = call(
        &server,
        "Email/set",
        json!({"create": {"n": {
            "threadId": "t1",
            "mailboxIds": {"f1": true},
            "receivedAt": "2024-03-09T10:00:00Z",
            "subject": "Re: Budget draft",
        }}}),
    )["created"]["n"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let payload = call(
        &server,
        "Email/queryChanges",
        json!({
            "sinceQueryState": since,
            "collapseThreads": true,
            "sort": [{"property": "receivedAt", "isAscending": false}],
        }),
    );

    // The new exemplar arrives at the top; the old exemplar m2 goes.
    assert_eq!(payload["added"][0]["id"].as_str(), Some(new_id.as_str()));
    assert_eq!(payload["added"][0]["index"], 0);
    let removed = string_list(&payload["removed"]);
    assert!(removed.contains(&new_id));
    assert!(removed.contains(&"m2".to_string()));
    assert_eq!(payload["total"], 4);
}

#[test]
fn uncollapsed_replay_converges() {
    let (server, store) = server();
    seed_mail(&store);

    let sort = json!([{"property": "receivedAt", "isAscending": true}]);
    let old = call(
        &server,
        "Email/query",
        json!({"filter": {"inMailbox": "f1"}, "sort": sort}),
    );
    let mut client_ids = string_list(&old["ids"]);
    let since = old["queryState"].as_str().unwrap().to_string();

    // Move one message out of the filter, destroy another, add a third.
    call(
        &server,
        "Email/set",
        json!({
            "update": {"m1": {"mailboxIds": {"f2": true}}},
            "destroy": ["m5"],
        }),
    );
    call(
        &server,
        "Email/set",
        json!({"create": {"n": {
            "mailboxIds": {"f1": true},
            "receivedAt": "2024-03-02T12:00:00Z",
            "subject": "wedged in the middle",
        }}}),
    );

    let delta = call(
        &server,
        "Email/queryChanges",
        json!({
            "sinceQueryState": since,
            "filter": {"inMailbox": "f1"},
            "sort": sort,
        }),
    );
    for id in string_list(&delta["removed"]) {
        client_ids.retain(|have| have != &id);
    }
    let mut added = delta["added"].as_array().unwrap().clone();
    added.sort_by_key(|item| item["index"].as_u64().unwrap());
    for item in added {
        client_ids.insert(
            item["index"].as_u64().unwrap() as usize,
            item["id"].as_str().unwrap().to_string(),
        );
    }

    let new = call(
        &server,
        "Email/query",
        json!({"filter": {"inMailbox": "f1"}, "sort": sort}),
    );
    assert_eq!(client_ids, string_list(&new["ids"]));
    assert_eq!(delta["total"], new["total"]);
}

#[test]
fn up_to_id_stops_reporting_but_not_counting() {
    let (server, store) = server();
    seed_mail(&store);
    let since = email_state(&server);

    call(
        &server,
        "Email/set",
        json!({"update": {
            "m1": {"keywords/$flagged": true},
            "m5": {"keywords/$flagged": true},
        }}),
    );

    let payload = call(
        &server,
        "Email/queryChanges",
        json!({
            "sinceQueryState": since,
            "sort": [{"property": "receivedAt", "isAscending": true}],
            "upToId": "m3",
        }),
    );

    // m5 sorts after the cut-off: changed but not reported.
    assert_eq!(string_list(&payload["removed"]), ["m1"]);
    assert_eq!(payload["total"], 5);
}

#[test]
fn over_max_changes_fails() {
    let (server, store) = server();
    seed_mail(&store);
    let since = email_state(&server);

    call(
        &server,
        "Email/set",
        json!({"update": {
            "m1": {"keywords/$flagged": true},
            "m2": {"keywords/$flagged": true},
            "m3": {"keywords/$flagged": true},
        }}),
    );

    let error = call_err(
        &server,
        "Email/queryChanges",
        json!({"sinceQueryState": since, "maxChanges": 2}),
    );
    assert_eq!(error["type"], "cannotCalculateChanges");
    assert!(error["newQueryState"].is_string());
}

#[test]
fn missing_since_query_state_is_invalid() {
    let (server, store) = server();
    seed_mail(&store);

    let error = call_err(&server, "Email/queryChanges", json!({}));
    assert_eq!(error["type"], "invalidArguments");
}
