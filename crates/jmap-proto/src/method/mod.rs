/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod changes;
pub mod get;
pub mod query;
pub mod query_changes;
pub mod set;

use crate::{Object, error::MethodError};
use serde_json::Value;

// Argument extraction over dynamic maps. A JSON null is treated the same
// as an absent key; a present key of the wrong shape is invalidArguments.

pub fn opt_str<'x>(args: &'x Object, key: &str) -> Result<Option<&'x str>, MethodError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected a string for {key:?}."
        ))),
    }
}

pub fn opt_string(args: &Object, key: &str) -> Result<Option<String>, MethodError> {
    opt_str(args, key).map(|value| value.map(String::from))
}

pub fn opt_bool(args: &Object, key: &str) -> Result<Option<bool>, MethodError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected a boolean for {key:?}."
        ))),
    }
}

pub fn opt_i64(args: &Object, key: &str) -> Result<Option<i64>, MethodError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(value)) => value.as_i64().map(Some).ok_or_else(|| {
            MethodError::invalid_arguments(format!("Expected an integer for {key:?}."))
        }),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected an integer for {key:?}."
        ))),
    }
}

pub fn opt_usize(args: &Object, key: &str) -> Result<Option<usize>, MethodError> {
    match opt_i64(args, key)? {
        Some(value) if value >= 0 => Ok(Some(value as usize)),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected a non-negative integer for {key:?}."
        ))),
        None => Ok(None),
    }
}

pub fn opt_string_list(
    args: &Object,
    key: &str,
) -> Result<Option<Vec<String>>, MethodError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => {
            let mut list = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Value::String(value) => list.push(value.clone()),
                    _ => {
                        return Err(MethodError::invalid_arguments(format!(
                            "Expected a list of strings for {key:?}."
                        )));
                    }
                }
            }
            Ok(Some(list))
        }
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected a list of strings for {key:?}."
        ))),
    }
}

pub fn opt_object<'x>(
    args: &'x Object,
    key: &str,
) -> Result<Option<&'x Object>, MethodError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(value)) => Ok(Some(value)),
        Some(_) => Err(MethodError::invalid_arguments(format!(
            "Expected an object for {key:?}."
        ))),
    }
}

pub fn opt_state(
    args: &Object,
    key: &str,
) -> Result<Option<crate::types::state::State>, MethodError> {
    match opt_str(args, key)? {
        Some(token) => crate::types::state::State::parse(token)
            .map(Some)
            .ok_or_else(|| {
                MethodError::invalid_arguments(format!("Failed to parse state {token:?}."))
            }),
        None => Ok(None),
    }
}
