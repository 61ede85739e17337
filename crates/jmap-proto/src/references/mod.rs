/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod jsptr;

use crate::{Object, error::MethodError, references::jsptr::Pointer, response::Response};
use serde_json::Value;
use std::fmt;

/// Argument value of a `#name` key: the result of an earlier call in the
/// same request, addressed by call tag and pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReference {
    pub result_of: String,
    pub name: String,
    pub path: String,
}

impl ResultReference {
    pub fn parse(value: &Value) -> Result<Self, MethodError> {
        let obj = value.as_object().ok_or_else(|| {
            MethodError::ResultReference("Result reference is not an object.".into())
        })?;
        let field = |key: &str| {
            obj.get(key).and_then(Value::as_str).map(String::from).ok_or_else(|| {
                MethodError::ResultReference(format!("Result reference is missing {key:?}."))
            })
        };

        Ok(ResultReference {
            result_of: field("resultOf")?,
            name: field("name")?,
            path: field("path")?,
        })
    }
}

impl fmt::Display for ResultReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resultOf: {}, name: {}, path: {}",
            self.result_of, self.name, self.path
        )
    }
}

/// Rewrite every `#key` argument into `key` by evaluating the reference
/// against the successful results logged so far. The scan is shallow:
/// only top-level argument keys are considered.
pub fn resolve_references(
    arguments: &mut Object,
    response: &Response,
) -> Result<(), MethodError> {
    let ref_keys = arguments
        .keys()
        .filter(|key| key.starts_with('#') && key.len() > 1)
        .cloned()
        .collect::<Vec<_>>();

    for key in ref_keys {
        let reference = ResultReference::parse(&arguments[&key])?;
        let results = response.results_of(&reference.result_of);
        if results.is_empty() {
            return Err(MethodError::ResultReference(format!(
                "Failed to evaluate {reference} result reference: no matching call."
            )));
        }

        let pointer = Pointer::parse(&reference.path);
        let mut resolved = Vec::new();
        for payload in results {
            match pointer.resolve(payload) {
                Some(Value::Array(items)) => resolved.extend(items),
                Some(item) => resolved.push(item),
                None => (),
            }
        }

        arguments.remove(&key);
        arguments.insert(key[1..].to_string(), Value::Array(resolved));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::resolve_references;
    use crate::{error::MethodError, response::Response};
    use serde_json::json;

    #[test]
    fn rewrites_reference_arguments() {
        let mut response = Response::new(0);
        response.push_response(
            "a".into(),
            "Mailbox/query",
            json!({"ids": ["f1", "f2"], "total": 2}),
        );

        let mut args = json!({
            "#ids": {"resultOf": "a", "name": "ids", "path": "/ids"},
            "properties": ["name"],
        })
        .as_object()
        .cloned()
        .unwrap();

        resolve_references(&mut args, &response).unwrap();
        assert_eq!(args.get("ids"), Some(&json!(["f1", "f2"])));
        assert!(!args.contains_key("#ids"));
        assert_eq!(args.get("properties"), Some(&json!(["name"])));
    }

    #[test]
    fn unknown_tag_fails() {
        let response = Response::new(0);
        let mut args = json!({
            "#ids": {"resultOf": "nope", "name": "ids", "path": "/ids"},
        })
        .as_object()
        .cloned()
        .unwrap();

        match resolve_references(&mut args, &response) {
            Err(MethodError::ResultReference(_)) => (),
            other => panic!("expected resultReference, got {other:?}"),
        }
    }

    #[test]
    fn error_results_are_invisible() {
        let mut response = Response::new(0);
        response.push_error("a".into(), MethodError::NotFound);

        let mut args = json!({
            "#ids": {"resultOf": "a", "name": "ids", "path": "/ids"},
        })
        .as_object()
        .cloned()
        .unwrap();

        assert!(resolve_references(&mut args, &response).is_err());
    }

    #[test]
    fn repeated_tags_concatenate() {
        let mut response = Response::new(0);
        response.push_response("a".into(), "Email/query", json!({"ids": ["m1"]}));
        response.push_response("a".into(), "Email/query", json!({"ids": ["m2", "m3"]}));

        let mut args = json!({
            "#ids": {"resultOf": "a", "name": "ids", "path": "/ids"},
        })
        .as_object()
        .cloned()
        .unwrap();

        resolve_references(&mut args, &response).unwrap();
        assert_eq!(args.get("ids"), Some(&json!(["m1", "m2", "m3"])));
    }
}
