//! JSON-pointer view of a config document.

use serde_json::Value;

/// Every scalar in `doc` with its JSON pointer, sorted by pointer.
/// Empty objects and arrays contribute nothing.
pub(crate) fn leaves(doc: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), doc)];
    while let Some((pointer, value)) = stack.pop() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    stack.push((format!("{pointer}/{}", escape_token(key)), child));
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    stack.push((format!("{pointer}/{index}"), child));
                }
            }
            _ if pointer.is_empty() => out.push(("/".to_string(), value)),
            _ => out.push((pointer, value)),
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Leading "/", no trailing "/" except for the root itself.
pub(crate) fn normalize(pointer: &str) -> String {
    let trimmed = pointer.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/a/b` covers `/a/b` and `/a/b/c`, not `/a/bc`. `/` covers everything.
pub(crate) fn covers(prefix: &str, pointer: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    pointer
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// RFC 6901 token escaping.
fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
