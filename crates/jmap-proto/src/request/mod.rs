/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::Object;
use serde_json::Value;
use std::fmt;

/// One JMAP request envelope: an ordered batch of method calls.
#[derive(Debug, Default)]
pub struct Request {
    pub method_calls: Vec<Call>,
}

/// A single `[methodName, arguments, callTag]` triple.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub arguments: Object,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    NotJson(String),
    NotRequest(String),
    TooManyCalls,
}

impl Request {
    pub fn parse_str(json: &str, max_calls: usize) -> Result<Self, RequestError> {
        let value = serde_json::from_str::<Value>(json)
            .map_err(|err| RequestError::NotJson(err.to_string()))?;
        Self::parse(value, max_calls)
    }

    pub fn parse(value: Value, max_calls: usize) -> Result<Self, RequestError> {
        let mut envelope = match value {
            Value::Object(obj) => obj,
            _ => {
                return Err(RequestError::NotRequest(
                    "Request is not a JSON object.".into(),
                ));
            }
        };

        let calls = match envelope.remove("methodCalls") {
            Some(Value::Array(calls)) => calls,
            _ => {
                return Err(RequestError::NotRequest(
                    "Missing or invalid methodCalls property.".into(),
                ));
            }
        };

        if calls.len() > max_calls {
            return Err(RequestError::TooManyCalls);
        }

        let mut method_calls = Vec::with_capacity(calls.len());
        for call in calls {
            let mut triple = match call {
                Value::Array(triple) if triple.len() == 3 => triple.into_iter(),
                _ => {
                    return Err(RequestError::NotRequest(
                        "Method call is not a [name, arguments, tag] triple.".into(),
                    ));
                }
            };

            let name = match triple.next() {
                Some(Value::String(name)) => name,
                _ => {
                    return Err(RequestError::NotRequest("Method name is not a string.".into()));
                }
            };
            let arguments = match triple.next() {
                Some(Value::Object(arguments)) => arguments,
                _ => {
                    return Err(RequestError::NotRequest(format!(
                        "Arguments of {name} are not an object."
                    )));
                }
            };
            let id = match triple.next() {
                Some(Value::String(id)) => id,
                _ => {
                    return Err(RequestError::NotRequest(format!(
                        "Call tag of {name} is not a string."
                    )));
                }
            };

            method_calls.push(Call {
                name,
                arguments,
                id,
            });
        }

        Ok(Request { method_calls })
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NotJson(detail) => write!(f, "not JSON: {detail}"),
            RequestError::NotRequest(detail) => write!(f, "not a request: {detail}"),
            RequestError::TooManyCalls => f.write_str("too many method calls"),
        }
    }
}

impl std::error::Error for RequestError {}
