/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::object::JmapObject;
use store::Collection;

pub struct Identity;

impl JmapObject for Identity {
    const NAME: &'static str = "Identity";
    const COLLECTION: Collection = Collection::Identity;
    const CAN_CALCULATE_CHANGES: bool = false;
}
