/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject},
    query::{scratch::Scratch, sort::SortKey},
};
use jmap_proto::{
    Object,
    error::{MethodError, set::SetError},
    method::query::Comparator,
};
use serde_json::Value;
use store::{Collection, Row};

pub struct CalendarEvent;

impl JmapObject for CalendarEvent {
    const NAME: &'static str = "CalendarEvent";
    const COLLECTION: Collection = Collection::CalendarEvent;
    const CAN_CALCULATE_CHANGES: bool = false;

    fn matches(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        property: &str,
        operand: &Value,
    ) -> Result<bool, MethodError> {
        match property {
            "inCalendar" => Ok(match operand.as_str() {
                Some(calendar) => row.str_field("calendarId") == Some(calendar),
                None => false,
            }),
            "before" => Ok(compare(row, "start", operand, |start, bound| start < bound)),
            "after" => Ok(compare(row, "end", operand, |end, bound| end >= bound)),
            "uid" => Ok(row.str_field("uid") == operand.as_str()),
            "text" => Ok(match operand.as_str() {
                Some(term) => {
                    let term = term.to_lowercase();
                    ["title", "description", "location"].iter().any(|field| {
                        row.str_field(field)
                            .map(|value| value.to_lowercase().contains(&term))
                            .unwrap_or(false)
                    })
                }
                None => false,
            }),
            other => Err(MethodError::invalid_arguments(format!(
                "Unsupported filter condition {other:?} for CalendarEvent."
            ))),
        }
    }

    fn sort_key(
        _server: &Server,
        _scratch: &mut Scratch,
        row: &Row,
        comparator: &Comparator,
    ) -> Result<SortKey, MethodError> {
        if comparator.is_property("start") {
            Ok(SortKey::date(row.str_field("start")))
        } else if comparator.is_property("uid") {
            Ok(row
                .str_field("uid")
                .map(SortKey::text)
                .unwrap_or(SortKey::Missing))
        } else if comparator.is_property("title") {
            Ok(row
                .str_field("title")
                .map(SortKey::text)
                .unwrap_or(SortKey::Missing))
        } else {
            Err(MethodError::invalid_arguments(format!(
                "Unsupported sort property {:?} for CalendarEvent.",
                comparator.property
            )))
        }
    }
}

impl JmapSetObject for CalendarEvent {
    fn before_create(
        server: &Server,
        _ctx: &RequestContext<'_>,
        fields: &mut Object,
    ) -> Result<(), SetError> {
        check_calendar(server, fields.get("calendarId"))
    }

    fn before_update(
        server: &Server,
        _ctx: &RequestContext<'_>,
        _row: &Row,
        patch: &mut Object,
    ) -> Result<(), SetError> {
        match patch.get("calendarId") {
            Some(calendar_id) => check_calendar(server, Some(calendar_id)),
            None => Ok(()),
        }
    }
}

fn compare(row: &Row, field: &str, operand: &Value, cmp: fn(i64, i64) -> bool) -> bool {
    let bound = operand
        .as_str()
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    let value = row
        .str_field(field)
        .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|date| date.timestamp());
    match (value, bound) {
        (Some(value), Some(bound)) => cmp(value, bound),
        _ => false,
    }
}

fn check_calendar(server: &Server, value: Option<&Value>) -> Result<(), SetError> {
    let calendar_id = match value.and_then(Value::as_str) {
        Some(calendar_id) => calendar_id,
        None => {
            return Err(SetError::invalid_properties()
                .with_property("calendarId")
                .with_description("A calendarId is required"));
        }
    };

    match server.store.row(Collection::Calendar, calendar_id) {
        Ok(Some(row)) if row.active => Ok(()),
        Ok(_) => Err(SetError::invalid_properties()
            .with_property("calendarId")
            .with_description(format!("Calendar {calendar_id} not found"))),
        Err(err) => Err(SetError::forbidden().with_description(err.to_string())),
    }
}
