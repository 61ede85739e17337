/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde_json::Value;

/// RFC 6901-style pointer with the `*` wildcard extension used by result
/// references. Evaluation is tolerant: a segment that does not apply to
/// the current node leaves the node unchanged rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Number(usize),
    Wildcard,
}

impl Pointer {
    pub fn parse(pointer: &str) -> Self {
        let pointer = pointer.strip_prefix('/').unwrap_or(pointer);
        let segments = if pointer.is_empty() {
            Vec::new()
        } else {
            pointer
                .split('/')
                .map(|part| {
                    let part = unescape(part);
                    if part == "*" {
                        Segment::Wildcard
                    } else if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                        part.parse::<usize>()
                            .map(Segment::Number)
                            .unwrap_or(Segment::Key(part))
                    } else {
                        Segment::Key(part)
                    }
                })
                .collect()
        };

        Pointer { segments }
    }

    /// Walk the pointer over `root` and normalize the result to a list:
    /// a defined non-list result is wrapped in a single-element list.
    pub fn resolve(&self, root: &Value) -> Option<Value> {
        self.eval(root).map(|value| match value {
            list @ Value::Array(_) => list,
            other => Value::Array(vec![other]),
        })
    }

    pub fn eval(&self, root: &Value) -> Option<Value> {
        eval_segments(&self.segments, root)
    }
}

fn eval_segments(segments: &[Segment], node: &Value) -> Option<Value> {
    let (segment, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return Some(node.clone()),
    };

    match (segment, node) {
        (Segment::Key(key), Value::Object(map)) => {
            map.get(key).and_then(|child| eval_segments(rest, child))
        }
        (Segment::Number(n), Value::Array(list)) => {
            list.get(*n).and_then(|child| eval_segments(rest, child))
        }
        (Segment::Number(n), Value::Object(map)) => map
            .get(&n.to_string())
            .and_then(|child| eval_segments(rest, child)),
        (Segment::Wildcard, Value::Array(list)) => {
            // Apply the remaining pointer to every element and flatten
            // one level, so a list of lists becomes a list.
            let mut results = Vec::with_capacity(list.len());
            for child in list {
                match eval_segments(rest, child) {
                    Some(Value::Array(items)) => results.extend(items),
                    Some(item) => results.push(item),
                    None => (),
                }
            }
            Some(Value::Array(results))
        }
        _ => Some(node.clone()),
    }
}

fn unescape(segment: &str) -> String {
    if segment.contains('~') {
        segment.replace("~1", "/").replace("~0", "~")
    } else {
        segment.to_string()
    }
}

/// Split a slash-separated patch path into unescaped segments.
pub fn patch_segments(path: &str) -> Vec<String> {
    path.split('/').map(unescape).collect()
}

#[cfg(test)]
mod tests {
    use super::Pointer;
    use serde_json::json;

    #[test]
    fn descend_and_normalize() {
        let root = json!({"ids": ["a", "b"], "total": 2});

        assert_eq!(
            Pointer::parse("/ids").resolve(&root),
            Some(json!(["a", "b"]))
        );
        assert_eq!(Pointer::parse("/total").resolve(&root), Some(json!([2])));
        assert_eq!(Pointer::parse("/ids/1").resolve(&root), Some(json!(["b"])));
        assert_eq!(Pointer::parse("/ids/9").resolve(&root), None);
        assert_eq!(Pointer::parse("/missing").resolve(&root), None);
    }

    #[test]
    fn wildcard_flattens_one_level() {
        let root = json!({"list": [
            {"id": "m1", "threadIds": ["t1", "t2"]},
            {"id": "m2", "threadIds": ["t3"]},
        ]});

        assert_eq!(
            Pointer::parse("/list/*/id").resolve(&root),
            Some(json!(["m1", "m2"]))
        );
        assert_eq!(
            Pointer::parse("/list/*/threadIds").resolve(&root),
            Some(json!(["t1", "t2", "t3"]))
        );
    }

    #[test]
    fn tolerant_on_kind_mismatch() {
        let root = json!({"total": 7});

        // Descending into a scalar keeps the scalar.
        assert_eq!(
            Pointer::parse("/total/name").resolve(&root),
            Some(json!([7]))
        );
        // Wildcard over an object keeps the object.
        assert_eq!(
            Pointer::parse("/*").resolve(&root),
            Some(json!([{"total": 7}]))
        );
    }

    #[test]
    fn escapes() {
        let root = json!({"a/b": {"c~d": 1}});
        assert_eq!(
            Pointer::parse("/a~1b/c~0d").resolve(&root),
            Some(json!([1]))
        );
    }
}
