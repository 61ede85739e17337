/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{opt_bool, opt_i64, opt_string, opt_usize};
use crate::{Object, error::MethodError, types::state::State};
use serde::Serialize;
use serde_json::Value;

/// Filter tree: leaf condition maps joined by AND/OR/NOT operator nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Condition(Object),
    Operator {
        operator: Operator,
        conditions: Vec<Filter>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Filter {
    pub fn parse(value: &Value) -> Result<Self, MethodError> {
        let obj = match value {
            Value::Object(obj) => obj,
            _ => {
                return Err(MethodError::invalid_arguments("Filter is not an object."));
            }
        };

        match obj.get("operator") {
            Some(Value::String(operator)) => {
                let operator = match operator.as_str() {
                    "AND" => Operator::And,
                    "OR" => Operator::Or,
                    "NOT" => Operator::Not,
                    other => {
                        return Err(MethodError::invalid_arguments(format!(
                            "Unknown filter operator {other:?}."
                        )));
                    }
                };
                let conditions = match obj.get("conditions") {
                    Some(Value::Array(conditions)) => conditions
                        .iter()
                        .map(Filter::parse)
                        .collect::<Result<Vec<_>, _>>()?,
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => {
                        return Err(MethodError::invalid_arguments(
                            "Filter conditions is not a list.",
                        ));
                    }
                };

                Ok(Filter::Operator {
                    operator,
                    conditions,
                })
            }
            Some(_) => Err(MethodError::invalid_arguments(
                "Filter operator is not a string.",
            )),
            None => Ok(Filter::Condition(obj.clone())),
        }
    }

    pub fn parse_opt(args: &Object, key: &str) -> Result<Option<Self>, MethodError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Filter::parse(value).map(Some),
        }
    }
}

/// One sort key. Properties of the form `keyword:$seen` carry the part
/// after the colon as an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub property: String,
    pub argument: Option<String>,
    pub is_ascending: bool,
}

impl Comparator {
    pub fn parse(value: &Value) -> Result<Self, MethodError> {
        let obj = match value {
            Value::Object(obj) => obj,
            _ => {
                return Err(MethodError::invalid_arguments("Sort entry is not an object."));
            }
        };
        let property = opt_string(obj, "property")?
            .ok_or_else(|| MethodError::invalid_arguments("Sort entry is missing property."))?;
        let is_ascending = opt_bool(obj, "isAscending")?.unwrap_or(true);

        let (property, argument) = match property.split_once(':') {
            Some((name, argument)) => (name.to_string(), Some(argument.to_string())),
            None => (property, None),
        };

        Ok(Comparator {
            property,
            argument,
            is_ascending,
        })
    }

    pub fn parse_opt(args: &Object, key: &str) -> Result<Option<Vec<Self>>, MethodError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(Comparator::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(MethodError::invalid_arguments("Sort is not a list.")),
        }
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.property.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub account_id: Option<String>,
    pub filter: Option<Filter>,
    pub sort: Option<Vec<Comparator>>,
    pub position: Option<usize>,
    pub anchor: Option<String>,
    pub anchor_offset: i64,
    pub limit: Option<usize>,
    pub collapse_threads: bool,
}

impl QueryRequest {
    pub fn parse(args: &Object) -> Result<Self, MethodError> {
        let position = match opt_i64(args, "position")? {
            Some(position) if position < 0 => {
                return Err(MethodError::invalid_arguments(
                    "Negative positions are not supported.",
                ));
            }
            Some(position) => Some(position as usize),
            None => None,
        };
        let anchor = opt_string(args, "anchor")?;
        if position.is_some() && anchor.is_some() {
            return Err(MethodError::invalid_arguments(
                "Only one of position or anchor may be specified.",
            ));
        }

        Ok(QueryRequest {
            account_id: opt_string(args, "accountId")?,
            filter: Filter::parse_opt(args, "filter")?,
            sort: Comparator::parse_opt(args, "sort")?,
            position,
            anchor,
            anchor_offset: opt_i64(args, "anchorOffset")?.unwrap_or(0),
            limit: opt_usize(args, "limit")?,
            collapse_threads: opt_bool(args, "collapseThreads")?.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "queryState")]
    pub query_state: State,

    #[serde(rename = "canCalculateChanges")]
    pub can_calculate_changes: bool,

    pub position: usize,

    pub total: usize,

    pub ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{Comparator, Filter, Operator, QueryRequest};
    use crate::error::MethodError;
    use serde_json::json;

    fn args(value: serde_json::Value) -> crate::Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_filter_tree() {
        let filter = Filter::parse(&json!({
            "operator": "OR",
            "conditions": [
                {"inMailbox": "f1"},
                {"operator": "NOT", "conditions": [{"hasKeyword": "$seen"}]},
            ],
        }))
        .unwrap();

        match filter {
            Filter::Operator {
                operator: Operator::Or,
                conditions,
            } => {
                assert_eq!(conditions.len(), 2);
                assert!(matches!(conditions[0], Filter::Condition(_)));
                assert!(matches!(
                    conditions[1],
                    Filter::Operator {
                        operator: Operator::Not,
                        ..
                    }
                ));
            }
            other => panic!("unexpected filter {other:?}"),
        }

        assert!(Filter::parse(&json!({"operator": "XOR", "conditions": []})).is_err());
    }

    #[test]
    fn parse_comparator_argument() {
        let comparator = Comparator::parse(&json!({
            "property": "keyword:$flagged",
            "isAscending": false,
        }))
        .unwrap();

        assert_eq!(comparator.property, "keyword");
        assert_eq!(comparator.argument.as_deref(), Some("$flagged"));
        assert!(!comparator.is_ascending);
    }

    #[test]
    fn reject_position_anchor_combinations() {
        assert!(matches!(
            QueryRequest::parse(&args(json!({"position": 3, "anchor": "m1"}))),
            Err(MethodError::InvalidArguments(_))
        ));
        assert!(matches!(
            QueryRequest::parse(&args(json!({"position": -1}))),
            Err(MethodError::InvalidArguments(_))
        ));
        assert!(QueryRequest::parse(&args(json!({"anchor": "m1", "anchorOffset": -2}))).is_ok());
    }
}
