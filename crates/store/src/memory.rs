/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    Collection, Compare, CreateResult, DestroyResult, Result, Row, Store, StoreError,
    SuperlockGuard, SyncSource, UpdateResult,
};
use ahash::{AHashMap, AHashSet};
use jmap_proto::{Object, error::set::SetError};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Single-account in-memory backend. Writes are applied atomically under
/// the table lock; `begin`/`commit`/`rollback` only validate pairing.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    locks: [Mutex<()>; Collection::COUNT],
}

#[derive(Default)]
struct Inner {
    tables: AHashMap<Collection, AHashMap<String, Row>>,
    states: [u64; Collection::COUNT],
    next_ids: [u64; Collection::COUNT],
    modseq: u64,
    deleted_modseq: u64,
    blobs: AHashMap<String, Vec<u8>>,
    txn_depth: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            inner: RwLock::new(Inner::default()),
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the change horizon and drop destroyed rows below it.
    pub fn purge_below(&self, modseq: u64) {
        let mut inner = self.write();
        inner.deleted_modseq = modseq;
        for table in inner.tables.values_mut() {
            table.retain(|_, row| row.active || row.change_modseq() > modseq);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Inner {
    fn next_modseq(&mut self) -> u64 {
        self.modseq += 1;
        self.modseq
    }

    fn touch(&mut self, collection: Collection, modseq: u64) {
        self.states[collection.index()] = modseq;
    }

    fn allocate_id(&mut self, collection: Collection) -> String {
        loop {
            let next = &mut self.next_ids[collection.index()];
            *next += 1;
            let id = format!("{}{}", collection.id_prefix(), next);
            let taken = self
                .tables
                .get(&collection)
                .map(|table| table.contains_key(&id))
                .unwrap_or(false);
            if !taken {
                return id;
            }
        }
    }

    /// Message writes change mailbox counts and thread membership without
    /// touching those rows directly; advance their state here.
    fn message_written(&mut self, mailbox_ids: &AHashSet<String>, modseq: u64) {
        if let Some(mailboxes) = self.tables.get_mut(&Collection::Mailbox) {
            for id in mailbox_ids {
                if let Some(row) = mailboxes.get_mut(id) {
                    row.counts_modseq = modseq;
                }
            }
        }
        if !mailbox_ids.is_empty() {
            self.touch(Collection::Mailbox, modseq);
        }
        self.touch(Collection::Thread, modseq);
    }
}

fn mailbox_id_set(fields: &Object) -> AHashSet<String> {
    match fields.get("mailboxIds") {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => AHashSet::new(),
    }
}

fn apply_patch(fields: &mut Object, patch: Object) {
    for (key, value) in patch {
        if value.is_null() {
            fields.remove(&key);
        } else {
            fields.insert(key, value);
        }
    }
}

/// Append every string reachable under a value; used for substring search
/// over address lists and header maps.
fn flatten_text(value: &Value, out: &mut String) {
    match value {
        Value::String(text) => {
            out.push_str(text);
            out.push(' ');
        }
        Value::Array(items) => {
            for item in items {
                flatten_text(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                flatten_text(item, out);
            }
        }
        _ => (),
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> Result<()> {
        self.write().txn_depth += 1;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut inner = self.write();
        if inner.txn_depth == 0 {
            return Err(StoreError::UnbalancedTransaction);
        }
        inner.txn_depth -= 1;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.write().txn_depth = 0;
        Ok(())
    }

    fn superlock(&self, collection: Collection) -> SuperlockGuard<'_> {
        let guard: MutexGuard<'_, ()> = match self.locks[collection.index()].lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        SuperlockGuard::new(guard)
    }

    fn rows(&self, collection: Collection) -> Result<Vec<Row>> {
        let inner = self.read();
        let mut rows = inner
            .tables
            .get(&collection)
            .map(|table| table.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    fn row(&self, collection: Collection, id: &str) -> Result<Option<Row>> {
        Ok(self
            .read()
            .tables
            .get(&collection)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn rows_where(
        &self,
        collection: Collection,
        field: &str,
        compare: Compare,
        value: &Value,
    ) -> Result<Vec<Row>> {
        let mut rows = self.rows(collection)?;
        rows.retain(|row| match (compare, row.field(field)) {
            (Compare::Eq, Some(found)) => found == value,
            (Compare::Gt, Some(Value::Number(found))) => match (found.as_f64(), value.as_f64()) {
                (Some(found), Some(wanted)) => found > wanted,
                _ => false,
            },
            _ => false,
        });
        Ok(rows)
    }

    fn create(
        &self,
        collection: Collection,
        entries: Vec<(String, Object)>,
    ) -> Result<CreateResult> {
        let mut inner = self.write();
        let mut result = CreateResult::default();

        for (placeholder, mut fields) in entries {
            fields.remove("id");
            let modseq = inner.next_modseq();
            let id = inner.allocate_id(collection);
            let row = Row {
                id: id.clone(),
                fields,
                modseq,
                counts_modseq: 0,
                created_modseq: modseq,
                active: true,
            };

            if collection == Collection::Email {
                let mailboxes = mailbox_id_set(&row.fields);
                inner.message_written(&mailboxes, modseq);
            }
            inner.touch(collection, modseq);
            inner.tables.entry(collection).or_default().insert(id.clone(), row);

            let mut server_set = Object::new();
            server_set.insert("id".into(), Value::String(id));
            result.created.push((placeholder, server_set));
        }

        Ok(result)
    }

    fn update(
        &self,
        collection: Collection,
        entries: Vec<(String, Object)>,
    ) -> Result<UpdateResult> {
        let mut inner = self.write();
        let mut result = UpdateResult::default();

        for (id, patch) in entries {
            let exists = inner
                .tables
                .get(&collection)
                .and_then(|table| table.get(&id))
                .map(|row| row.active)
                .unwrap_or(false);
            if !exists {
                result
                    .not_updated
                    .push((id, SetError::not_found().with_description("Not found")));
                continue;
            }

            let modseq = inner.next_modseq();
            let mut touched_mailboxes = AHashSet::new();
            if let Some(row) = inner
                .tables
                .get_mut(&collection)
                .and_then(|table| table.get_mut(&id))
            {
                if collection == Collection::Email {
                    touched_mailboxes.extend(mailbox_id_set(&row.fields));
                }
                apply_patch(&mut row.fields, patch);
                if collection == Collection::Email {
                    touched_mailboxes.extend(mailbox_id_set(&row.fields));
                }
                row.modseq = modseq;
            }

            if collection == Collection::Email {
                inner.message_written(&touched_mailboxes, modseq);
            }
            inner.touch(collection, modseq);
            result.updated.push((id, None));
        }

        Ok(result)
    }

    fn destroy(&self, collection: Collection, ids: Vec<String>) -> Result<DestroyResult> {
        let mut inner = self.write();
        let mut result = DestroyResult::default();

        for id in ids {
            let exists = inner
                .tables
                .get(&collection)
                .and_then(|table| table.get(&id))
                .map(|row| row.active)
                .unwrap_or(false);
            if !exists {
                result
                    .not_destroyed
                    .push((id, SetError::not_found().with_description("Not found")));
                continue;
            }

            let modseq = inner.next_modseq();
            let mut touched_mailboxes = AHashSet::new();
            if let Some(row) = inner
                .tables
                .get_mut(&collection)
                .and_then(|table| table.get_mut(&id))
            {
                if collection == Collection::Email {
                    touched_mailboxes.extend(mailbox_id_set(&row.fields));
                }
                row.active = false;
                row.modseq = modseq;
            }

            if collection == Collection::Email {
                inner.message_written(&touched_mailboxes, modseq);
            }
            inner.touch(collection, modseq);
            result.destroyed.push(id);
        }

        Ok(result)
    }

    fn upsert(&self, collection: Collection, id: &str, fields: Object) -> Result<()> {
        let mut inner = self.write();
        let modseq = inner.next_modseq();

        if collection == Collection::Email {
            let mut touched = AHashSet::new();
            if let Some(row) = inner
                .tables
                .get(&collection)
                .and_then(|table| table.get(id))
            {
                touched.extend(mailbox_id_set(&row.fields));
            }
            touched.extend(mailbox_id_set(&fields));
            inner.message_written(&touched, modseq);
        }

        let table = inner.tables.entry(collection).or_default();
        match table.get_mut(id) {
            Some(row) => {
                apply_patch(&mut row.fields, fields);
                row.modseq = modseq;
                row.active = true;
            }
            None => {
                table.insert(
                    id.to_string(),
                    Row {
                        id: id.to_string(),
                        fields,
                        modseq,
                        counts_modseq: 0,
                        created_modseq: modseq,
                        active: true,
                    },
                );
            }
        }
        inner.touch(collection, modseq);

        Ok(())
    }

    fn sync(&self, _source: SyncSource) -> Result<()> {
        // A proxying backend refreshes its tables from IMAP or DAV here.
        Ok(())
    }

    fn search_text(&self, field: &str, term: &str) -> Result<AHashSet<String>> {
        let inner = self.read();
        let term = term.to_lowercase();
        let mut matches = AHashSet::new();

        if let Some(emails) = inner.tables.get(&Collection::Email) {
            for row in emails.values().filter(|row| row.active) {
                let mut haystack = String::new();
                match field {
                    "text" => {
                        for name in ["subject", "textBody", "preview", "from", "to", "cc", "bcc"] {
                            if let Some(value) = row.field(name) {
                                flatten_text(value, &mut haystack);
                            }
                        }
                    }
                    "body" => {
                        for name in ["textBody", "preview"] {
                            if let Some(value) = row.field(name) {
                                flatten_text(value, &mut haystack);
                            }
                        }
                    }
                    "header" => {
                        if let Some(value) = row.field("headers") {
                            flatten_text(value, &mut haystack);
                        }
                    }
                    name => {
                        if let Some(value) = row.field(name) {
                            flatten_text(value, &mut haystack);
                        }
                    }
                }
                if haystack.to_lowercase().contains(&term) {
                    matches.insert(row.id.clone());
                }
            }
        }

        Ok(matches)
    }

    fn blob(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.read().blobs.get(id).cloned())
    }

    fn put_blob(&self, data: Vec<u8>) -> Result<String> {
        let id = format!("b{:016x}", rand::random::<u64>());
        self.write().blobs.insert(id.clone(), data);
        Ok(id)
    }

    fn state(&self, collection: Collection) -> Result<u64> {
        Ok(self.read().states[collection.index()])
    }

    fn deleted_modseq(&self) -> Result<u64> {
        Ok(self.read().deleted_modseq)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::{Collection, Compare, Store};
    use serde_json::{Value, json};

    fn fields(value: Value) -> jmap_proto::Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_update_destroy() {
        let store = MemoryStore::new();
        let result = store
            .create(
                Collection::Mailbox,
                vec![("new".into(), fields(json!({"name": "Inbox"})))],
            )
            .unwrap();
        let id = result.created[0].1["id"].as_str().unwrap().to_string();
        let state_after_create = store.state(Collection::Mailbox).unwrap();

        let result = store
            .update(
                Collection::Mailbox,
                vec![(id.clone(), fields(json!({"name": "Postbox"})))],
            )
            .unwrap();
        assert_eq!(result.updated.len(), 1);
        let row = store.row(Collection::Mailbox, &id).unwrap().unwrap();
        assert_eq!(row.str_field("name"), Some("Postbox"));
        assert!(row.modseq > state_after_create);

        let result = store.destroy(Collection::Mailbox, vec![id.clone()]).unwrap();
        assert_eq!(result.destroyed, vec![id.clone()]);
        let row = store.row(Collection::Mailbox, &id).unwrap().unwrap();
        assert!(!row.active);

        let result = store.destroy(Collection::Mailbox, vec![id]).unwrap();
        assert_eq!(result.not_destroyed.len(), 1);
    }

    #[test]
    fn message_writes_bump_mailbox_counts() {
        let store = MemoryStore::new();
        let result = store
            .create(
                Collection::Mailbox,
                vec![("inbox".into(), fields(json!({"name": "Inbox"})))],
            )
            .unwrap();
        let mailbox_id = result.created[0].1["id"].as_str().unwrap().to_string();
        let mailbox_modseq = store
            .row(Collection::Mailbox, &mailbox_id)
            .unwrap()
            .unwrap()
            .modseq;

        store
            .create(
                Collection::Email,
                vec![(
                    "m".into(),
                    fields(json!({"mailboxIds": {mailbox_id.clone(): true}, "subject": "hi"})),
                )],
            )
            .unwrap();

        let mailbox = store.row(Collection::Mailbox, &mailbox_id).unwrap().unwrap();
        assert_eq!(mailbox.modseq, mailbox_modseq, "mailbox row itself unchanged");
        assert!(mailbox.counts_modseq > mailbox_modseq, "counts changed");
        assert_eq!(store.state(Collection::Mailbox).unwrap(), mailbox.counts_modseq);
    }

    #[test]
    fn rows_where_and_search() {
        let store = MemoryStore::new();
        store
            .upsert(
                Collection::Email,
                "m1",
                fields(json!({"subject": "Quarterly report", "size": 100})),
            )
            .unwrap();
        store
            .upsert(
                Collection::Email,
                "m2",
                fields(json!({"subject": "lunch?", "size": 300})),
            )
            .unwrap();

        let rows = store
            .rows_where(Collection::Email, "size", Compare::Gt, &json!(200))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "m2");

        let found = store.search_text("subject", "quarterly").unwrap();
        assert!(found.contains("m1") && !found.contains("m2"));
    }

    #[test]
    fn purge_raises_horizon() {
        let store = MemoryStore::new();
        store
            .upsert(Collection::Email, "m1", fields(json!({"subject": "a"})))
            .unwrap();
        store.destroy(Collection::Email, vec!["m1".into()]).unwrap();
        let horizon = store.state(Collection::Email).unwrap();

        store.purge_below(horizon);
        assert_eq!(store.deleted_modseq().unwrap(), horizon);
        assert!(store.row(Collection::Email, "m1").unwrap().is_none());
    }
}
