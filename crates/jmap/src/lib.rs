/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod api;
pub mod calendar;
pub mod changes;
pub mod contact;
pub mod email;
pub mod get;
pub mod identity;
pub mod mailbox;
pub mod object;
pub mod preferences;
pub mod query;
pub mod quota;
pub mod set;
pub mod storage;
pub mod submission;
pub mod thread;
pub mod vacation;

use crate::api::registry::Registry;
use jmap_proto::{request::Call, response::Response};
use serde::Deserialize;
use std::sync::Arc;
use store::Store;

pub struct Server {
    pub store: Arc<dyn Store>,
    pub config: JmapConfig,
    registry: Registry,
}

impl Server {
    pub fn new(store: Arc<dyn Store>, config: JmapConfig) -> Self {
        Server {
            store,
            config,
            registry: Registry::new(),
        }
    }
}

/// Request processing limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JmapConfig {
    pub request_max_calls: usize,
    pub get_max_objects: usize,
    pub set_max_objects: usize,
    pub query_max_results: usize,
    pub changes_max_results: usize,
    pub snippet_max_results: usize,
}

impl Default for JmapConfig {
    fn default() -> Self {
        JmapConfig {
            request_max_calls: 16,
            get_max_objects: 500,
            set_max_objects: 500,
            query_max_results: 5000,
            changes_max_results: 5000,
            snippet_max_results: 100,
        }
    }
}

/// Per-request scratch owned by a single request: the accumulating
/// response log (which doubles as the creation-id map) and the follow-up
/// call slot a handler may fill.
pub struct RequestContext<'x> {
    pub account_id: &'x str,
    pub response: Response,
    pub next_call: Option<Call>,
}
