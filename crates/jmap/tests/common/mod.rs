/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

// Each test binary uses its own slice of these helpers.
#![allow(dead_code)]

use jmap::{JmapConfig, Server};
use jmap_proto::request::Request;
use serde_json::{Value, json};
use std::sync::Arc;
use store::{Collection, Store, memory::MemoryStore};

pub const ACCOUNT: &str = "u1";

pub fn server() -> (Server, Arc<MemoryStore>) {
    server_with(JmapConfig::default())
}

pub fn server_with(config: JmapConfig) -> (Server, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Server::new(store.clone(), config), store)
}

/// Run one request envelope and return the methodResponses triples.
pub fn submit(server: &Server, calls: Value) -> Vec<Value> {
    let request = Request::parse(json!({ "methodCalls": calls }), 16).unwrap();
    let response = server.handle_request(request, ACCOUNT);
    let value = serde_json::to_value(&response).unwrap();
    value["methodResponses"].as_array().unwrap().clone()
}

/// Run a single method call and return its response payload.
pub fn call(server: &Server, name: &str, args: Value) -> Value {
    let responses = submit(server, json!([[name, args, "r0"]]));
    assert_eq!(responses.len(), 1, "{responses:?}");
    assert_eq!(responses[0][0].as_str(), Some(name), "{responses:?}");
    responses[0][1].clone()
}

/// Like `call`, but expects an error response and returns its payload.
pub fn call_err(server: &Server, name: &str, args: Value) -> Value {
    let responses = submit(server, json!([[name, args, "r0"]]));
    assert_eq!(responses.len(), 1, "{responses:?}");
    assert_eq!(responses[0][0].as_str(), Some("error"), "{responses:?}");
    responses[0][1].clone()
}

pub fn seed(store: &MemoryStore, collection: Collection, id: &str, fields: Value) {
    store
        .upsert(collection, id, fields.as_object().cloned().unwrap())
        .unwrap();
}

/// Three mailboxes and a small threaded message corpus.
pub fn seed_mail(store: &MemoryStore) {
    seed(
        store,
        Collection::Mailbox,
        "f1",
        json!({"name": "Inbox", "role": "inbox", "sortOrder": 1, "isSubscribed": true,
               "myRights": {"mayAddItems": true, "mayDelete": false}}),
    );
    seed(
        store,
        Collection::Mailbox,
        "f2",
        json!({"name": "Archive", "role": "archive", "sortOrder": 2, "isSubscribed": true}),
    );
    seed(
        store,
        Collection::Mailbox,
        "f3",
        json!({"name": "Projects", "parentId": "f1", "sortOrder": 3, "isSubscribed": false}),
    );

    for (id, thread, received, subject, seen, size) in [
        ("m1", "t1", "2024-03-01T10:00:00Z", "Budget draft", false, 100),
        ("m2", "t1", "2024-03-02T10:00:00Z", "Re: Budget draft", true, 200),
        ("m3", "t2", "2024-03-03T10:00:00Z", "Lunch?", true, 300),
        ("m4", "t3", "2024-03-04T10:00:00Z", "Quarterly report", false, 400),
        ("m5", "t4", "2024-03-05T10:00:00Z", "Standup notes", true, 500),
    ] {
        let mut keywords = serde_json::Map::new();
        if seen {
            keywords.insert("$seen".into(), json!(true));
        }
        seed(
            store,
            Collection::Email,
            id,
            json!({
                "threadId": thread,
                "mailboxIds": {"f1": true},
                "keywords": keywords,
                "receivedAt": received,
                "subject": subject,
                "size": size,
                "from": [{"name": "Sender", "email": "sender@example.com"}],
                "to": [{"name": "User", "email": "user@example.com"}],
                "textBody": format!("body of {subject}"),
            }),
        );
    }
}
