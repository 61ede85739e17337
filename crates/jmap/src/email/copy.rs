/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{RequestContext, Server, object::check_account};
use jmap_proto::{Object, error::MethodError, method::opt_string};
use serde_json::Value;

/// `Email/copy` moves messages between accounts. This server manages a
/// single account per store handle, so there is never a second account
/// to copy from.
pub fn handle(
    _server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    check_account(ctx, opt_string(&args, "accountId")?.as_deref())?;

    match opt_string(&args, "fromAccountId")? {
        Some(from) if from == ctx.account_id => Err(MethodError::invalid_arguments(
            "Cannot copy between identical accounts.",
        )),
        Some(_) => Err(MethodError::AccountNotFound),
        None => Err(MethodError::invalid_arguments(
            "Missing fromAccountId argument.",
        )),
    }
}
