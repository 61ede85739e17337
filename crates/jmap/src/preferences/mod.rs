/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::object::JmapObject;
use store::Collection;

// Preference stores are singleton-typed: one object per account under
// the well-known id, updated by read-merge-write.

pub struct UserPreferences;

impl JmapObject for UserPreferences {
    const NAME: &'static str = "UserPreferences";
    const COLLECTION: Collection = Collection::UserPreferences;
    const CAN_CALCULATE_CHANGES: bool = false;
}

pub struct ClientPreferences;

impl JmapObject for ClientPreferences {
    const NAME: &'static str = "ClientPreferences";
    const COLLECTION: Collection = Collection::ClientPreferences;
    const CAN_CALCULATE_CHANGES: bool = false;
}

pub struct CalendarPreferences;

impl JmapObject for CalendarPreferences {
    const NAME: &'static str = "CalendarPreferences";
    const COLLECTION: Collection = Collection::CalendarPreferences;
    const CAN_CALCULATE_CHANGES: bool = false;
}
