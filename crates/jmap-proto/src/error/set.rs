/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde::Serialize;

/// Per-entity failure inside a `/set` response (`notCreated`,
/// `notUpdated`, `notDestroyed`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetError {
    #[serde(rename = "type")]
    pub typ: SetErrorType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SetErrorType {
    #[serde(rename = "forbidden")]
    Forbidden,
    #[serde(rename = "invalidProperties")]
    InvalidProperties,
    #[serde(rename = "invalidMailboxes")]
    InvalidMailboxes,
    #[serde(rename = "notFound")]
    NotFound,
    #[serde(rename = "singleton")]
    Singleton,
    #[serde(rename = "blobNotFound")]
    BlobNotFound,
    #[serde(rename = "mailboxHasChild")]
    MailboxHasChild,
    #[serde(rename = "willDestroy")]
    WillDestroy,
    #[serde(rename = "tooLarge")]
    TooLarge,
}

impl SetError {
    pub fn new(typ: SetErrorType) -> Self {
        SetError {
            typ,
            description: None,
            properties: None,
        }
    }

    pub fn forbidden() -> Self {
        Self::new(SetErrorType::Forbidden)
    }

    pub fn invalid_properties() -> Self {
        Self::new(SetErrorType::InvalidProperties)
    }

    pub fn invalid_mailboxes() -> Self {
        Self::new(SetErrorType::InvalidMailboxes)
    }

    pub fn not_found() -> Self {
        Self::new(SetErrorType::NotFound)
    }

    pub fn singleton() -> Self {
        Self::new(SetErrorType::Singleton)
    }

    pub fn blob_not_found() -> Self {
        Self::new(SetErrorType::BlobNotFound)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(Vec::new)
            .push(property.into());
        self
    }
}
