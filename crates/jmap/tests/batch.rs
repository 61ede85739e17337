/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod common;

use common::{seed_mail, server, server_with, submit};
use jmap::JmapConfig;
use serde_json::json;

#[test]
fn every_call_gets_exactly_one_response_in_order() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([
            ["Mailbox/get", {}, "c0"],
            ["Bogus/method", {}, "c1"],
            ["Email/query", {}, "c2"],
        ]),
    );

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0][0], "Mailbox/get");
    assert_eq!(responses[0][2], "c0");
    assert_eq!(responses[1][0], "error");
    assert_eq!(responses[1][1]["type"], "unknownMethod");
    assert_eq!(responses[1][2], "c1");
    assert_eq!(responses[2][0], "Email/query");
    assert_eq!(responses[2][2], "c2");
    assert_eq!(responses[2][1]["ids"].as_array().unwrap().len(), 5);
}

#[test]
fn back_reference_chain() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([
            [
                "Mailbox/query",
                {
                    "filter": {"hasRole": true},
                    "sort": [{"property": "name", "isAscending": true}],
                },
                "a"
            ],
            [
                "Mailbox/get",
                {"#ids": {"resultOf": "a", "name": "ids", "path": "/ids"}},
                "b"
            ],
        ]),
    );

    let total = responses[0][1]["total"].as_u64().unwrap();
    let list = responses[1][1]["list"].as_array().unwrap();
    assert_eq!(list.len() as u64, total);
    assert!(total > 0);
    for mailbox in list {
        assert!(!mailbox["role"].is_null(), "{mailbox:?}");
    }
}

#[test]
fn back_reference_to_failed_call() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([
            ["Bogus/method", {}, "a"],
            [
                "Mailbox/get",
                {"#ids": {"resultOf": "a", "name": "ids", "path": "/ids"}},
                "b"
            ],
        ]),
    );

    assert_eq!(responses[1][0], "error");
    assert_eq!(responses[1][1]["type"], "resultReference");
}

#[test]
fn unknown_result_reference_tag() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([[
            "Mailbox/get",
            {"#ids": {"resultOf": "nope", "name": "ids", "path": "/ids"}},
            "b"
        ]]),
    );

    assert_eq!(responses[0][0], "error");
    assert_eq!(responses[0][1]["type"], "resultReference");
}

#[test]
fn oversized_batch_fails_every_call() {
    let (server, store) = server_with(JmapConfig {
        request_max_calls: 2,
        ..JmapConfig::default()
    });
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([
            ["Mailbox/get", {}, "c0"],
            ["Mailbox/get", {}, "c1"],
            ["Mailbox/get", {}, "c2"],
        ]),
    );

    assert_eq!(responses.len(), 3);
    for (index, response) in responses.iter().enumerate() {
        assert_eq!(response[0], "error");
        assert_eq!(response[1]["type"], "invalidArguments");
        assert_eq!(response[2].as_str(), Some(format!("c{index}").as_str()));
    }
}

#[test]
fn account_id_must_match_session() {
    let (server, store) = server();
    seed_mail(&store);

    let responses = submit(
        &server,
        json!([["Mailbox/get", {"accountId": "someone-else"}, "c0"]]),
    );

    assert_eq!(responses[0][0], "error");
    assert_eq!(responses[0][1]["type"], "accountNotFound");
}

#[test]
fn wildcard_back_reference_collects_ids() {
    let (server, store) = server();
    seed_mail(&store);

    // threadIds of every fetched message, flattened one level.
    let responses = submit(
        &server,
        json!([
            ["Email/get", {"ids": ["m1", "m3"], "properties": ["threadId"]}, "a"],
            [
                "Thread/get",
                {"#ids": {"resultOf": "a", "name": "list", "path": "/list/*/threadId"}},
                "b"
            ],
        ]),
    );

    let threads = responses[1][1]["list"].as_array().unwrap();
    let mut ids = threads
        .iter()
        .map(|thread| thread["id"].as_str().unwrap())
        .collect::<Vec<_>>();
    ids.sort_unstable();
    assert_eq!(ids, ["t1", "t2"]);
}
