/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod error;
pub mod method;
pub mod references;
pub mod request;
pub mod response;
pub mod types;

/// Dynamic JSON object used for method arguments, patches and results.
pub type Object = serde_json::Map<String, serde_json::Value>;
