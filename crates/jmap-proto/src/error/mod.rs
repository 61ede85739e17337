/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod set;

use crate::types::state::State;
use serde_json::{Map, Value, json};
use std::fmt;

/// Per-method-call error. Serialized in place of the method's own result
/// as `["error", {"type": ..., ...}, callTag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodError {
    AccountNotFound,
    InvalidArguments(String),
    UnknownMethod(String),
    ResultReference(String),
    AnchorNotFound,
    CannotCalculateChanges { new_state: State },
    CannotCalculateQueryChanges { new_query_state: State },
    InvalidMailboxes,
    NotFound,
    NotImplemented,
    StateMismatch,
    ServerError(String),
    InternalError(String),
}

impl MethodError {
    pub fn error_type(&self) -> &'static str {
        match self {
            MethodError::AccountNotFound => "accountNotFound",
            MethodError::InvalidArguments(_) => "invalidArguments",
            MethodError::UnknownMethod(_) => "unknownMethod",
            MethodError::ResultReference(_) => "resultReference",
            MethodError::AnchorNotFound => "anchorNotFound",
            MethodError::CannotCalculateChanges { .. }
            | MethodError::CannotCalculateQueryChanges { .. } => "cannotCalculateChanges",
            MethodError::InvalidMailboxes => "invalidMailboxes",
            MethodError::NotFound => "notFound",
            MethodError::NotImplemented => "notImplemented",
            MethodError::StateMismatch => "stateMismatch",
            MethodError::ServerError(_) => "serverError",
            MethodError::InternalError(_) => "internalError",
        }
    }

    /// Wire payload for the `error` response.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(self.error_type()));
        match self {
            MethodError::InvalidArguments(description)
            | MethodError::UnknownMethod(description)
            | MethodError::ResultReference(description)
            | MethodError::ServerError(description)
            | MethodError::InternalError(description) => {
                if !description.is_empty() {
                    obj.insert("description".into(), json!(description));
                }
            }
            MethodError::CannotCalculateChanges { new_state } => {
                obj.insert("newState".into(), json!(new_state));
            }
            MethodError::CannotCalculateQueryChanges { new_query_state } => {
                obj.insert("newQueryState".into(), json!(new_query_state));
            }
            _ => (),
        }
        Value::Object(obj)
    }

    pub fn invalid_arguments(description: impl Into<String>) -> Self {
        MethodError::InvalidArguments(description.into())
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodError::InvalidArguments(description)
            | MethodError::UnknownMethod(description)
            | MethodError::ResultReference(description)
            | MethodError::ServerError(description)
            | MethodError::InternalError(description)
                if !description.is_empty() =>
            {
                write!(f, "{}: {}", self.error_type(), description)
            }
            _ => f.write_str(self.error_type()),
        }
    }
}

impl std::error::Error for MethodError {}
