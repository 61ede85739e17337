/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod memory;

use ahash::AHashSet;
use jmap_proto::{Object, error::set::SetError};
use serde_json::Value;
use std::sync::MutexGuard;

/// Well-known id of singleton-typed objects.
pub const SINGLETON_ID: &str = "singleton";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Collection {
    Mailbox,
    Email,
    Thread,
    Calendar,
    CalendarEvent,
    CalendarPreferences,
    AddressBook,
    Contact,
    ContactGroup,
    EmailSubmission,
    Identity,
    Quota,
    StorageNode,
    UserPreferences,
    ClientPreferences,
    VacationResponse,
}

impl Collection {
    pub const COUNT: usize = 16;

    pub const ALL: [Collection; Self::COUNT] = [
        Collection::Mailbox,
        Collection::Email,
        Collection::Thread,
        Collection::Calendar,
        Collection::CalendarEvent,
        Collection::CalendarPreferences,
        Collection::AddressBook,
        Collection::Contact,
        Collection::ContactGroup,
        Collection::EmailSubmission,
        Collection::Identity,
        Collection::Quota,
        Collection::StorageNode,
        Collection::UserPreferences,
        Collection::ClientPreferences,
        Collection::VacationResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Mailbox => "Mailbox",
            Collection::Email => "Email",
            Collection::Thread => "Thread",
            Collection::Calendar => "Calendar",
            Collection::CalendarEvent => "CalendarEvent",
            Collection::CalendarPreferences => "CalendarPreferences",
            Collection::AddressBook => "AddressBook",
            Collection::Contact => "Contact",
            Collection::ContactGroup => "ContactGroup",
            Collection::EmailSubmission => "EmailSubmission",
            Collection::Identity => "Identity",
            Collection::Quota => "Quota",
            Collection::StorageNode => "StorageNode",
            Collection::UserPreferences => "UserPreferences",
            Collection::ClientPreferences => "ClientPreferences",
            Collection::VacationResponse => "VacationResponse",
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            Collection::Mailbox => "f",
            Collection::Email => "m",
            Collection::Thread => "t",
            Collection::Calendar => "c",
            Collection::CalendarEvent => "e",
            Collection::AddressBook => "a",
            Collection::Contact => "p",
            Collection::ContactGroup => "g",
            Collection::EmailSubmission => "s",
            Collection::StorageNode => "n",
            Collection::Identity => "i",
            Collection::Quota => "q",
            Collection::CalendarPreferences
            | Collection::UserPreferences
            | Collection::ClientPreferences
            | Collection::VacationResponse => "x",
        }
    }

    /// External source a write to this type has to be reconciled with.
    pub fn sync_source(&self) -> Option<SyncSource> {
        match self {
            Collection::Mailbox => Some(SyncSource::Folders),
            Collection::Email | Collection::Thread => Some(SyncSource::Mail),
            Collection::Calendar | Collection::CalendarEvent => Some(SyncSource::Calendars),
            Collection::AddressBook | Collection::Contact | Collection::ContactGroup => {
                Some(SyncSource::AddressBooks)
            }
            _ => None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            Collection::CalendarPreferences
                | Collection::UserPreferences
                | Collection::ClientPreferences
                | Collection::VacationResponse
                | Collection::Identity
                | Collection::Quota
        )
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncSource {
    Folders,
    Mail,
    Calendars,
    AddressBooks,
}

/// A stored object: dynamic payload plus the version metadata the change
/// machinery depends on. Destroyed rows stay behind with `active` unset
/// until they age out past the deleted-modseq horizon.
#[derive(Debug, Clone)]
pub struct Row {
    pub id: String,
    pub fields: Object,
    pub modseq: u64,
    /// Mailbox only: advanced when message writes change this mailbox's
    /// counts without touching the mailbox itself.
    pub counts_modseq: u64,
    pub created_modseq: u64,
    pub active: bool,
}

impl Row {
    /// Highest modseq at which anything about this row changed.
    pub fn change_modseq(&self) -> u64 {
        self.modseq.max(self.counts_modseq)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn u64_field(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    pub fn object_field(&self, name: &str) -> Option<&Object> {
        self.fields.get(name).and_then(Value::as_object)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Eq,
    Gt,
}

#[derive(Debug, Default)]
pub struct CreateResult {
    pub created: Vec<(String, Object)>,
    pub not_created: Vec<(String, SetError)>,
}

#[derive(Debug, Default)]
pub struct UpdateResult {
    pub updated: Vec<(String, Option<Object>)>,
    pub not_updated: Vec<(String, SetError)>,
}

#[derive(Debug, Default)]
pub struct DestroyResult {
    pub destroyed: Vec<String>,
    pub not_destroyed: Vec<(String, SetError)>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store failure: {0}")]
    Internal(String),
    #[error("unbalanced transaction")]
    UnbalancedTransaction,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Scoped per-type write lock. Dropping the guard releases the lock on
/// every exit path.
pub struct SuperlockGuard<'x> {
    _guard: MutexGuard<'x, ()>,
}

impl<'x> SuperlockGuard<'x> {
    pub fn new(guard: MutexGuard<'x, ()>) -> Self {
        SuperlockGuard { _guard: guard }
    }
}

/// The narrow store surface the method handlers are written against. A
/// handle is scoped to a single account, mirroring the one-database-per-
/// user layout of the synchronizing backend.
pub trait Store: Send + Sync {
    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;

    /// Process-wide mutual exclusion for state-advancing writes to one
    /// data type.
    fn superlock(&self, collection: Collection) -> SuperlockGuard<'_>;

    /// All rows of a type, destroyed ones included, ordered by id.
    fn rows(&self, collection: Collection) -> Result<Vec<Row>>;

    fn row(&self, collection: Collection, id: &str) -> Result<Option<Row>>;

    fn rows_where(
        &self,
        collection: Collection,
        field: &str,
        compare: Compare,
        value: &Value,
    ) -> Result<Vec<Row>>;

    fn create(&self, collection: Collection, entries: Vec<(String, Object)>)
    -> Result<CreateResult>;

    fn update(&self, collection: Collection, entries: Vec<(String, Object)>)
    -> Result<UpdateResult>;

    fn destroy(&self, collection: Collection, ids: Vec<String>) -> Result<DestroyResult>;

    /// Read-merge-write for well-known-id objects (singletons).
    fn upsert(&self, collection: Collection, id: &str, fields: Object) -> Result<()>;

    /// Reconcile the local tables with the external source. A no-op for
    /// backends that are not proxies.
    fn sync(&self, source: SyncSource) -> Result<()>;

    /// Server-side text search over message content; returns matching
    /// email ids.
    fn search_text(&self, field: &str, term: &str) -> Result<AHashSet<String>>;

    fn blob(&self, id: &str) -> Result<Option<Vec<u8>>>;

    fn put_blob(&self, data: Vec<u8>) -> Result<String>;

    /// Current state token value for a type.
    fn state(&self, collection: Collection) -> Result<u64>;

    /// Oldest modseq for which changes can still be computed.
    fn deleted_modseq(&self) -> Result<u64>;
}
