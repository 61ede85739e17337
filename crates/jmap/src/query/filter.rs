/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Server, object::JmapObject, query::scratch::Scratch};
use jmap_proto::{
    error::MethodError,
    method::query::{Filter, Operator},
};
use store::Row;

/// Recursive descent over the operator tree. AND and OR short-circuit;
/// NOT is the negation of OR over its conditions. A leaf condition map
/// matches when every predicate in it matches. Operator nodes with no
/// conditions evaluate to the operator's neutral element.
pub fn matches_filter<T: JmapObject>(
    server: &Server,
    scratch: &mut Scratch,
    row: &Row,
    filter: &Filter,
) -> Result<bool, MethodError> {
    match filter {
        Filter::Operator {
            operator: Operator::And,
            conditions,
        } => {
            for condition in conditions {
                if !matches_filter::<T>(server, scratch, row, condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Operator {
            operator: Operator::Or,
            conditions,
        } => {
            for condition in conditions {
                if matches_filter::<T>(server, scratch, row, condition)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Operator {
            operator: Operator::Not,
            conditions,
        } => {
            for condition in conditions {
                if matches_filter::<T>(server, scratch, row, condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Condition(predicates) => {
            for (property, operand) in predicates {
                if !T::matches(server, scratch, row, property, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Retain the rows matched by `filter`; a missing filter matches all.
pub fn filter_rows<T: JmapObject>(
    server: &Server,
    scratch: &mut Scratch,
    rows: Vec<Row>,
    filter: Option<&Filter>,
) -> Result<Vec<Row>, MethodError> {
    match filter {
        Some(filter) => {
            let mut matched = Vec::with_capacity(rows.len());
            for row in rows {
                if matches_filter::<T>(server, scratch, &row, filter)? {
                    matched.push(row);
                }
            }
            Ok(matched)
        }
        None => Ok(rows),
    }
}
