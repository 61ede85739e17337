/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    RequestContext, Server, get,
    email::Email,
    object::{check_account, into_value, store_error},
};
use jmap_proto::{
    Object,
    error::MethodError,
    method::{
        get::GetRequest,
        opt_string, opt_string_list,
        query::{Filter, Operator},
    },
};
use serde::Serialize;
use serde_json::Value;
use store::Collection;

const PREVIEW_WINDOW: usize = 200;

#[derive(Debug, Serialize)]
struct SearchSnippetResponse {
    #[serde(rename = "accountId")]
    account_id: String,
    list: Vec<SearchSnippet>,
    #[serde(rename = "notFound")]
    not_found: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SearchSnippet {
    #[serde(rename = "emailId")]
    email_id: String,
    subject: Option<String>,
    preview: Option<String>,
}

/// `SearchSnippet/get`: highlight the filter's search terms in each
/// message's subject and a bounded preview window of its body.
pub fn handle(
    server: &Server,
    ctx: &mut RequestContext<'_>,
    args: Object,
) -> Result<Value, MethodError> {
    let account_id = check_account(ctx, opt_string(&args, "accountId")?.as_deref())?;
    let email_ids = opt_string_list(&args, "emailIds")?
        .ok_or_else(|| MethodError::invalid_arguments("Missing emailIds argument."))?;
    if email_ids.len() > server.config.snippet_max_results {
        return Err(MethodError::invalid_arguments(format!(
            "Too many ids requested, maximum is {}.",
            server.config.snippet_max_results
        )));
    }

    let mut terms = Vec::new();
    if let Some(filter) = Filter::parse_opt(&args, "filter")? {
        collect_terms(&filter, &mut terms);
    }

    let request = GetRequest {
        account_id: None,
        ids: Some(email_ids),
        properties: Some(vec![
            "subject".into(),
            "textBody".into(),
            "preview".into(),
        ]),
    };
    let rows = server.store.rows(Collection::Email).map_err(store_error)?;
    let fetched = get::get::<Email>(server, ctx, &request, rows)?;

    let mut response = SearchSnippetResponse {
        account_id,
        list: Vec::with_capacity(fetched.list.len()),
        not_found: fetched.not_found,
    };

    for obj in fetched.list {
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let subject = obj.get("subject").and_then(Value::as_str);
        let body = obj
            .get("textBody")
            .and_then(Value::as_str)
            .or_else(|| obj.get("preview").and_then(Value::as_str));

        response.list.push(SearchSnippet {
            email_id: id,
            subject: subject.and_then(|subject| {
                let escaped = escape_html(subject);
                contains_any(&escaped, &terms).then(|| highlight(&escaped, &terms))
            }),
            preview: body.and_then(|body| preview_window(body, &terms)),
        });
    }

    into_value(response)
}

/// Pull search terms out of `text`, `subject` and `body` conditions,
/// descending through every operator node.
fn collect_terms(filter: &Filter, terms: &mut Vec<String>) {
    match filter {
        Filter::Condition(predicates) => {
            for (property, operand) in predicates {
                if matches!(property.as_str(), "text" | "subject" | "body") {
                    if let Some(term) = operand.as_str() {
                        if !term.is_empty() {
                            terms.push(term.to_string());
                        }
                    }
                }
            }
        }
        Filter::Operator {
            operator: Operator::And | Operator::Or | Operator::Not,
            conditions,
        } => {
            for condition in conditions {
                collect_terms(condition, terms);
            }
        }
    }
}

/// A window of at most `PREVIEW_WINDOW` characters centered on the first
/// term match, with every term occurrence wrapped in a highlight marker.
fn preview_window(body: &str, terms: &[String]) -> Option<String> {
    let lower = body.to_lowercase();
    let match_at = terms
        .iter()
        .filter_map(|term| lower.find(&term.to_lowercase()))
        .min()?;

    let chars = body.char_indices().map(|(at, _)| at).collect::<Vec<_>>();
    let match_char = chars.partition_point(|at| *at < match_at);
    let start_char = match_char.saturating_sub(PREVIEW_WINDOW / 4);
    let end_char = (start_char + PREVIEW_WINDOW).min(chars.len());
    let start = chars[start_char];
    let end = if end_char == chars.len() {
        body.len()
    } else {
        chars[end_char]
    };

    Some(highlight(&escape_html(&body[start..end]), terms))
}

fn contains_any(text: &str, terms: &[String]) -> bool {
    let lower = text.to_lowercase();
    terms.iter().any(|term| lower.contains(&term.to_lowercase()))
}

/// Wrap each term occurrence in `<mark>`, case-insensitively, keeping
/// the original casing of the matched text.
fn highlight(text: &str, terms: &[String]) -> String {
    let mut marked = text.to_string();
    for term in terms {
        let term_lower = term.to_lowercase();
        if term_lower.is_empty() {
            continue;
        }

        let mut result = String::with_capacity(marked.len());
        let mut rest = marked.as_str();
        loop {
            match rest.to_lowercase().find(&term_lower) {
                Some(at) if rest.is_char_boundary(at) && rest.is_char_boundary(at + term_lower.len()) => {
                    let found = &rest[at..at + term_lower.len()];
                    result.push_str(&rest[..at]);
                    result.push_str("<mark>");
                    result.push_str(found);
                    result.push_str("</mark>");
                    rest = &rest[at + term_lower.len()..];
                }
                _ => {
                    result.push_str(rest);
                    break;
                }
            }
        }
        marked = result;
    }
    marked
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
