/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Server, object::store_error};
use ahash::{AHashMap, AHashSet};
use jmap_proto::error::MethodError;
use store::Collection;

/// Per-query scratch for derived data that is expensive to compute:
/// thread keyword aggregation, full mailbox paths, mailbox counts and
/// server-side text search results. Each datum is built at most once per
/// query, no matter how many rows are compared or matched.
#[derive(Default)]
pub struct Scratch {
    thread_keywords: Option<AHashMap<String, ThreadKeywords>>,
    mailbox_paths: Option<AHashMap<String, String>>,
    mailbox_counts: Option<AHashMap<String, MailboxCounts>>,
    text_matches: AHashMap<(String, String), AHashSet<String>>,
}

/// Per-thread keyword status: `all` holds keywords present on every seen
/// message of the thread, `some` those present on at least one.
#[derive(Debug, Default, Clone)]
pub struct ThreadKeywords {
    pub all: AHashSet<String>,
    pub some: AHashSet<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MailboxCounts {
    pub total_emails: u64,
    pub unread_emails: u64,
    pub total_threads: u64,
    pub unread_threads: u64,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_keywords(
        &mut self,
        server: &Server,
        thread_id: &str,
    ) -> Result<ThreadKeywords, MethodError> {
        if self.thread_keywords.is_none() {
            let mut aggregated: AHashMap<String, ThreadKeywords> = AHashMap::new();
            for row in server
                .store
                .rows(Collection::Email)
                .map_err(store_error)?
                .iter()
                .filter(|row| row.active)
            {
                let thread = row.str_field("threadId").unwrap_or(&row.id);
                let keywords = row
                    .object_field("keywords")
                    .map(|map| map.keys().cloned().collect::<AHashSet<_>>())
                    .unwrap_or_default();

                match aggregated.get_mut(thread) {
                    Some(status) => {
                        status.all.retain(|keyword| keywords.contains(keyword));
                        status.some.extend(keywords);
                    }
                    None => {
                        aggregated.insert(
                            thread.to_string(),
                            ThreadKeywords {
                                all: keywords.clone(),
                                some: keywords,
                            },
                        );
                    }
                }
            }
            self.thread_keywords = Some(aggregated);
        }

        Ok(self
            .thread_keywords
            .as_ref()
            .and_then(|map| map.get(thread_id))
            .cloned()
            .unwrap_or_default())
    }

    /// Full slash-joined path of a mailbox, ancestors first.
    pub fn mailbox_path(
        &mut self,
        server: &Server,
        mailbox_id: &str,
    ) -> Result<String, MethodError> {
        if self.mailbox_paths.is_none() {
            let rows = server.store.rows(Collection::Mailbox).map_err(store_error)?;
            let by_id: AHashMap<&str, (&str, Option<&str>)> = rows
                .iter()
                .map(|row| {
                    (
                        row.id.as_str(),
                        (
                            row.str_field("name").unwrap_or(""),
                            row.str_field("parentId"),
                        ),
                    )
                })
                .collect();

            let mut paths = AHashMap::new();
            for row in &rows {
                let mut segments = Vec::new();
                let mut cursor = Some(row.id.as_str());
                // Walk up with a depth cap to survive parent cycles.
                let mut depth = 0;
                while let Some(id) = cursor {
                    if depth > 100 {
                        break;
                    }
                    depth += 1;
                    match by_id.get(id) {
                        Some((name, parent)) => {
                            segments.push(name.to_string());
                            cursor = *parent;
                        }
                        None => break,
                    }
                }
                segments.reverse();
                paths.insert(row.id.clone(), segments.join("/"));
            }
            self.mailbox_paths = Some(paths);
        }

        Ok(self
            .mailbox_paths
            .as_ref()
            .and_then(|paths| paths.get(mailbox_id))
            .cloned()
            .unwrap_or_default())
    }

    pub fn mailbox_counts(
        &mut self,
        server: &Server,
        mailbox_id: &str,
    ) -> Result<MailboxCounts, MethodError> {
        if self.mailbox_counts.is_none() {
            let mut threads: AHashMap<String, AHashSet<String>> = AHashMap::new();
            let mut unread_threads: AHashMap<String, AHashSet<String>> = AHashMap::new();
            let mut counts: AHashMap<String, MailboxCounts> = AHashMap::new();

            for row in server
                .store
                .rows(Collection::Email)
                .map_err(store_error)?
                .iter()
                .filter(|row| row.active)
            {
                let unread = !row
                    .object_field("keywords")
                    .map(|keywords| keywords.contains_key("$seen"))
                    .unwrap_or(false);
                let thread = row.str_field("threadId").unwrap_or(&row.id).to_string();

                if let Some(mailboxes) = row.object_field("mailboxIds") {
                    for mailbox in mailboxes.keys() {
                        let entry = counts.entry(mailbox.clone()).or_default();
                        entry.total_emails += 1;
                        if unread {
                            entry.unread_emails += 1;
                        }
                        threads
                            .entry(mailbox.clone())
                            .or_default()
                            .insert(thread.clone());
                        if unread {
                            unread_threads
                                .entry(mailbox.clone())
                                .or_default()
                                .insert(thread.clone());
                        }
                    }
                }
            }

            for (mailbox, thread_set) in threads {
                if let Some(entry) = counts.get_mut(&mailbox) {
                    entry.total_threads = thread_set.len() as u64;
                }
            }
            for (mailbox, thread_set) in unread_threads {
                if let Some(entry) = counts.get_mut(&mailbox) {
                    entry.unread_threads = thread_set.len() as u64;
                }
            }
            self.mailbox_counts = Some(counts);
        }

        Ok(self
            .mailbox_counts
            .as_ref()
            .and_then(|counts| counts.get(mailbox_id))
            .copied()
            .unwrap_or_default())
    }

    /// Memoized server-side text search, keyed by (field, term).
    pub fn text_matches(
        &mut self,
        server: &Server,
        field: &str,
        term: &str,
    ) -> Result<&AHashSet<String>, MethodError> {
        let key = (field.to_string(), term.to_string());
        if !self.text_matches.contains_key(&key) {
            let matches = server.store.search_text(field, term).map_err(store_error)?;
            self.text_matches.insert(key.clone(), matches);
        }
        Ok(&self.text_matches[&key])
    }
}
