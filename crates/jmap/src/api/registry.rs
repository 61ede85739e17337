/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    calendar::{self, Calendar, event::CalendarEvent},
    changes,
    contact::{Contact, addressbook::Addressbook, group::ContactGroup},
    email::{self, Email},
    get,
    identity::Identity,
    mailbox::{self, Mailbox},
    preferences::{CalendarPreferences, ClientPreferences, UserPreferences},
    query,
    quota::Quota,
    set::{self, singleton},
    storage::StorageNode,
    submission::{self, EmailSubmission},
    thread,
    vacation::VacationResponse,
};
use ahash::AHashMap;
use jmap_proto::{Object, error::MethodError};
use serde_json::Value;

pub type Handler =
    fn(&Server, &mut RequestContext<'_>, Object) -> Result<Value, MethodError>;

/// Method-name to handler table, built once at server startup.
pub struct Registry {
    handlers: AHashMap<&'static str, Handler>,
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Registry {
            handlers: AHashMap::with_capacity(64),
        };

        registry.insert("Mailbox/get", get::handle::<Mailbox>);
        registry.insert("Mailbox/query", query::handle::<Mailbox>);
        registry.insert("Mailbox/changes", mailbox::changes::handle);
        registry.insert("Mailbox/set", set::handle::<Mailbox>);

        registry.insert("Email/get", get::handle::<Email>);
        registry.insert("Email/query", query::handle::<Email>);
        registry.insert("Email/queryChanges", query::changes::handle::<Email>);
        registry.insert("Email/changes", changes::handle::<Email>);
        registry.insert("Email/set", set::handle::<Email>);
        registry.insert("Email/import", email::import::handle);
        registry.insert("Email/copy", email::copy::handle);
        registry.insert("SearchSnippet/get", email::snippet::handle);

        registry.insert("Thread/get", thread::handle_get);
        registry.insert("Thread/changes", thread::handle_changes);

        registry.insert("Calendar/get", get::handle::<Calendar>);
        registry.insert("Calendar/changes", changes::handle::<Calendar>);
        registry.insert("Calendar/set", set::handle::<Calendar>);
        registry.insert("Calendar/refreshSynced", calendar::handle_refresh);
        registry.insert("CalendarEvent/get", get::handle::<CalendarEvent>);
        registry.insert("CalendarEvent/query", query::handle::<CalendarEvent>);
        registry.insert("CalendarEvent/changes", changes::handle::<CalendarEvent>);
        registry.insert("CalendarEvent/set", set::handle::<CalendarEvent>);
        registry.insert(
            "CalendarPreferences/get",
            singleton::handle_get::<CalendarPreferences>,
        );
        registry.insert(
            "CalendarPreferences/set",
            singleton::handle_set::<CalendarPreferences>,
        );

        registry.insert("Addressbook/get", get::handle::<Addressbook>);
        registry.insert("Addressbook/changes", changes::handle::<Addressbook>);
        registry.insert("Contact/get", get::handle::<Contact>);
        registry.insert("Contact/query", query::handle::<Contact>);
        registry.insert("Contact/changes", changes::handle::<Contact>);
        registry.insert("Contact/set", set::handle::<Contact>);
        registry.insert("ContactGroup/get", get::handle::<ContactGroup>);
        registry.insert("ContactGroup/changes", changes::handle::<ContactGroup>);
        registry.insert("ContactGroup/set", set::handle::<ContactGroup>);

        registry.insert("EmailSubmission/get", get::handle::<EmailSubmission>);
        registry.insert("EmailSubmission/query", query::handle::<EmailSubmission>);
        registry.insert(
            "EmailSubmission/queryChanges",
            query::changes::handle::<EmailSubmission>,
        );
        registry.insert("EmailSubmission/changes", changes::handle::<EmailSubmission>);
        registry.insert("EmailSubmission/set", submission::set::handle);

        registry.insert("StorageNode/get", get::handle::<StorageNode>);
        registry.insert("StorageNode/query", query::handle::<StorageNode>);

        registry.insert("UserPreferences/get", singleton::handle_get::<UserPreferences>);
        registry.insert("UserPreferences/set", singleton::handle_set::<UserPreferences>);
        registry.insert(
            "ClientPreferences/get",
            singleton::handle_get::<ClientPreferences>,
        );
        registry.insert(
            "ClientPreferences/set",
            singleton::handle_set::<ClientPreferences>,
        );
        registry.insert(
            "VacationResponse/get",
            singleton::handle_get::<VacationResponse>,
        );
        registry.insert("Identity/get", singleton::handle_get::<Identity>);
        registry.insert("Quota/get", singleton::handle_get::<Quota>);

        registry
    }

    fn insert(&mut self, name: &'static str, handler: Handler) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
