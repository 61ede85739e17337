/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{RequestContext, Server, object::resolve_creation_refs};
use jmap_proto::{
    error::MethodError,
    references::resolve_references,
    request::{Call, Request},
    response::Response,
};
use std::time::Instant;

impl Server {
    /// Execute one request batch: method calls run strictly in order,
    /// each seeing the results and created ids of the calls before it. A
    /// failed call becomes one `error` response and the batch continues.
    pub fn handle_request(&self, request: Request, account_id: &str) -> Response {
        let mut ctx = RequestContext {
            account_id,
            response: Response::new(request.method_calls.len()),
            next_call: None,
        };

        // Every call gets exactly one response, so an oversized batch
        // fails call-by-call rather than dropping calls on the floor.
        if request.method_calls.len() > self.config.request_max_calls {
            for call in request.method_calls {
                ctx.response.push_error(
                    call.id,
                    MethodError::invalid_arguments(format!(
                        "Request exceeds the maximum of {} method calls.",
                        self.config.request_max_calls
                    )),
                );
            }
            return ctx.response;
        }

        for mut call in request.method_calls {
            loop {
                // Substitute back-references and ids assigned to earlier
                // creation placeholders before the handler sees the
                // arguments.
                if let Err(error) = resolve_references(&mut call.arguments, &ctx.response) {
                    log::debug!("{}: {}", call.name, error);
                    ctx.response.push_error(call.id.clone(), error);
                    break;
                }
                resolve_creation_refs(&mut call.arguments, &ctx.response);

                let op_start = Instant::now();
                let arguments = std::mem::take(&mut call.arguments);
                let outcome = match self.registry.get(&call.name) {
                    Some(handler) => {
                        if let Err(error) = self.store.begin() {
                            Err(MethodError::ServerError(error.to_string()))
                        } else {
                            handler(self, &mut ctx, arguments)
                        }
                    }
                    None => Err(MethodError::UnknownMethod(format!(
                        "Unknown method {}",
                        call.name
                    ))),
                };

                log::debug!("{} completed in {:?}", call.name, op_start.elapsed());

                match outcome {
                    Ok(payload) => {
                        if let Err(error) = self.store.commit() {
                            log::warn!("{}: commit failed: {error}", call.name);
                        }
                        ctx.response
                            .push_response(call.id.clone(), call.name.clone(), payload);
                    }
                    Err(error) => {
                        // Unhandled failures must not leave a transaction
                        // open for the rest of the batch.
                        let _ = self.store.rollback();
                        log::error!("{}: {error}", call.name);
                        ctx.response.push_error(call.id.clone(), error);
                    }
                }

                // A handler may chain a follow-up call (e.g. the implicit
                // Email/set of EmailSubmission/set); it runs under the
                // same call tag.
                match ctx.next_call.take() {
                    Some(next) => {
                        call = Call {
                            name: next.name,
                            arguments: next.arguments,
                            id: call.id,
                        };
                    }
                    None => break,
                }
            }
        }

        ctx.response
    }
}
