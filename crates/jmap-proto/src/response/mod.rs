/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::error::MethodError;
use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Value;
use std::collections::HashMap;

/// Accumulated per-request state: the ordered response log plus the map
/// from creation placeholders to server-assigned ids.
#[derive(Debug, Default)]
pub struct Response {
    pub method_responses: Vec<CallResponse>,
    pub created_ids: HashMap<String, String>,
}

#[derive(Debug)]
pub struct CallResponse {
    pub name: String,
    pub payload: Value,
    pub id: String,
}

impl Response {
    pub fn new(capacity: usize) -> Self {
        Response {
            method_responses: Vec::with_capacity(capacity),
            created_ids: HashMap::new(),
        }
    }

    pub fn push_response(&mut self, id: String, name: impl Into<String>, payload: Value) {
        self.method_responses.push(CallResponse {
            name: name.into(),
            payload,
            id,
        });
    }

    pub fn push_error(&mut self, id: String, error: MethodError) {
        self.method_responses.push(CallResponse {
            name: "error".into(),
            payload: error.to_value(),
            id,
        });
    }

    /// Successful results logged under a call tag, in order. Responses of
    /// kind `error` are invisible to back-references.
    pub fn results_of(&self, tag: &str) -> Vec<&Value> {
        self.method_responses
            .iter()
            .filter(|response| response.id == tag && response.name != "error")
            .map(|response| &response.payload)
            .collect()
    }

    /// Translate a `#cid` creation placeholder to its assigned id, if one
    /// was registered by an earlier `/set` in this request.
    pub fn created_id(&self, placeholder: &str) -> Option<&str> {
        placeholder
            .strip_prefix('#')
            .and_then(|cid| self.created_ids.get(cid))
            .map(String::as_str)
    }
}

impl serde::Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("methodResponses", &MethodResponses(&self.method_responses))?;
        map.end()
    }
}

struct MethodResponses<'x>(&'x [CallResponse]);

impl serde::Serialize for MethodResponses<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for response in self.0 {
            seq.serialize_element(&(&response.name, &response.payload, &response.id))?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::Response;
    use crate::error::MethodError;
    use serde_json::json;

    #[test]
    fn serializes_as_triples() {
        let mut response = Response::new(2);
        response.push_response("a".into(), "Mailbox/get", json!({"list": []}));
        response.push_error("b".into(), MethodError::UnknownMethod(String::new()));

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"methodResponses": [
                ["Mailbox/get", {"list": []}, "a"],
                ["error", {"type": "unknownMethod"}, "b"],
            ]})
        );
    }

    #[test]
    fn created_id_lookup() {
        let mut response = Response::new(0);
        response.created_ids.insert("draft".into(), "m42".into());

        assert_eq!(response.created_id("#draft"), Some("m42"));
        assert_eq!(response.created_id("#other"), None);
        assert_eq!(response.created_id("m42"), None);
    }
}
