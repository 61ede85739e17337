/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{opt_object, opt_state, opt_string, opt_string_list};
use crate::{
    Object,
    error::{MethodError, set::SetError},
    types::state::State,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct SetRequest {
    pub account_id: Option<String>,
    pub if_in_state: Option<State>,
    /// Creation placeholder to full object, in request order.
    pub create: Vec<(String, Object)>,
    /// Object id (or `#cid` placeholder) to patch map, in request order.
    pub update: Vec<(String, Object)>,
    pub destroy: Vec<String>,
    /// Type-specific extras, e.g. `onSuccessUpdateEmail`.
    pub arguments: Object,
}

impl SetRequest {
    pub fn parse(args: &Object) -> Result<Self, MethodError> {
        let mut request = SetRequest {
            account_id: opt_string(args, "accountId")?,
            if_in_state: opt_state(args, "ifInState")?,
            create: parse_object_map(args, "create")?,
            update: parse_object_map(args, "update")?,
            destroy: opt_string_list(args, "destroy")?.unwrap_or_default(),
            arguments: Object::new(),
        };

        for (key, value) in args {
            if !matches!(
                key.as_str(),
                "accountId" | "ifInState" | "create" | "update" | "destroy"
            ) {
                request.arguments.insert(key.clone(), value.clone());
            }
        }

        Ok(request)
    }

    pub fn total_objects(&self) -> usize {
        self.create.len() + self.update.len() + self.destroy.len()
    }
}

fn parse_object_map(args: &Object, key: &str) -> Result<Vec<(String, Object)>, MethodError> {
    let mut entries = Vec::new();
    if let Some(map) = opt_object(args, key)? {
        for (id, value) in map {
            match value {
                Value::Object(obj) => entries.push((id.clone(), obj.clone())),
                _ => {
                    return Err(MethodError::invalid_arguments(format!(
                        "Entry {id:?} in {key:?} is not an object."
                    )));
                }
            }
        }
    }
    Ok(entries)
}

#[derive(Debug, Serialize)]
pub struct SetResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldState")]
    pub old_state: State,

    #[serde(rename = "newState")]
    pub new_state: State,

    pub created: Object,

    pub updated: Object,

    pub destroyed: Vec<String>,

    #[serde(rename = "notCreated")]
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub not_created: Object,

    #[serde(rename = "notUpdated")]
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub not_updated: Object,

    #[serde(rename = "notDestroyed")]
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub not_destroyed: Object,
}

impl SetResponse {
    pub fn new(account_id: String, old_state: State) -> Self {
        SetResponse {
            account_id,
            old_state,
            new_state: old_state,
            created: Object::new(),
            updated: Object::new(),
            destroyed: Vec::new(),
            not_created: Object::new(),
            not_updated: Object::new(),
            not_destroyed: Object::new(),
        }
    }

    pub fn push_created(&mut self, placeholder: String, server_set: Object) {
        self.created.insert(placeholder, Value::Object(server_set));
    }

    pub fn push_updated(&mut self, id: String, extras: Option<Object>) {
        self.updated
            .insert(id, extras.map(Value::Object).unwrap_or(Value::Null));
    }

    pub fn push_not_created(&mut self, placeholder: String, error: SetError) {
        self.not_created.insert(placeholder, set_error_value(error));
    }

    pub fn push_not_updated(&mut self, id: String, error: SetError) {
        self.not_updated.insert(id, set_error_value(error));
    }

    pub fn push_not_destroyed(&mut self, id: String, error: SetError) {
        self.not_destroyed.insert(id, set_error_value(error));
    }

    pub fn created_id(&self, placeholder: &str) -> Option<&str> {
        self.created
            .get(placeholder)
            .and_then(|obj| obj.get("id"))
            .and_then(Value::as_str)
    }
}

fn set_error_value(error: SetError) -> Value {
    serde_json::to_value(&error).unwrap_or_default()
}
