/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server,
    object::{JmapObject, JmapSetObject},
};
use jmap_proto::{Object, error::set::SetError};
use serde_json::Value;
use store::Collection;

pub struct ContactGroup;

impl JmapObject for ContactGroup {
    const NAME: &'static str = "ContactGroup";
    const COLLECTION: Collection = Collection::ContactGroup;
}

impl JmapSetObject for ContactGroup {
    fn before_create(
        _server: &Server,
        _ctx: &RequestContext<'_>,
        fields: &mut Object,
    ) -> Result<(), SetError> {
        match fields.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(SetError::invalid_properties()
                .with_property("name")
                .with_description("Contact group name is required")),
        }
    }
}
