/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    Server,
    object::JmapObject,
    query::scratch::Scratch,
};
use jmap_proto::{error::MethodError, method::query::Comparator};
use std::cmp::Ordering;
use store::Row;

/// Precomputed per-row sort key. Keys of different kinds order by kind
/// first so the comparator is total over mixed-type fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Missing,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SortKey {
    /// Case-insensitive text key.
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }

    pub fn date(value: Option<&str>) -> Self {
        value
            .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
            .map(|date| SortKey::Int(date.timestamp()))
            .unwrap_or(SortKey::Missing)
    }
}

/// Stable multi-key sort: the user's sort list folded left-to-right,
/// then id ascending as the implicit final key.
pub fn sort_rows<T: JmapObject>(
    server: &Server,
    scratch: &mut Scratch,
    rows: &mut Vec<Row>,
    sort: Option<&[Comparator]>,
) -> Result<(), MethodError> {
    let comparators = sort.unwrap_or_default();
    if comparators.is_empty() {
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        return Ok(());
    }

    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows.drain(..) {
        let keys = comparators
            .iter()
            .map(|comparator| T::sort_key(server, scratch, &row, comparator))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.push((keys, row));
    }

    keyed.sort_by(|(a_keys, a_row), (b_keys, b_row)| {
        for (index, comparator) in comparators.iter().enumerate() {
            let ordering = a_keys[index].cmp(&b_keys[index]);
            let ordering = if comparator.is_ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a_row.id.cmp(&b_row.id)
    });

    rows.extend(keyed.into_iter().map(|(_, row)| row));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SortKey;

    #[test]
    fn mixed_kinds_order_totally() {
        let mut keys = vec![
            SortKey::Text("b".into()),
            SortKey::Missing,
            SortKey::Int(3),
            SortKey::Bool(true),
            SortKey::Int(-1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SortKey::Missing,
                SortKey::Bool(true),
                SortKey::Int(-1),
                SortKey::Int(3),
                SortKey::Text("b".into()),
            ]
        );
    }

    #[test]
    fn date_keys() {
        assert_eq!(
            SortKey::date(Some("2024-03-01T10:00:00Z")),
            SortKey::Int(1709287200)
        );
        assert_eq!(SortKey::date(Some("not a date")), SortKey::Missing);
        assert_eq!(SortKey::date(None), SortKey::Missing);
    }
}
