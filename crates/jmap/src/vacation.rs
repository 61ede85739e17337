/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::object::JmapObject;
use store::Collection;

pub struct VacationResponse;

impl JmapObject for VacationResponse {
    const NAME: &'static str = "VacationResponse";
    const COLLECTION: Collection = Collection::VacationResponse;
    const CAN_CALCULATE_CHANGES: bool = false;
}
