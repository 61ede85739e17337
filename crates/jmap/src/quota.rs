/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::object::JmapObject;
use store::Collection;

pub struct Quota;

impl JmapObject for Quota {
    const NAME: &'static str = "Quota";
    const COLLECTION: Collection = Collection::Quota;
    const CAN_CALCULATE_CHANGES: bool = false;
}
