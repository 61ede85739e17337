/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::object::JmapObject;
use store::Collection;

/// Address books are read-only through this interface; they are managed
/// by the synchronized source.
pub struct Addressbook;

impl JmapObject for Addressbook {
    const NAME: &'static str = "Addressbook";
    const COLLECTION: Collection = Collection::AddressBook;
}
