//! Key path resolution over item bodies.
//!
//! A key path is either a literal top-level key or a dot-separated path such
//! as `user.key` or `rows[0].name`. A literal key that exists on the object
//! always wins over path splitting, so `{"a.b": 1}` resolves `a.b` to `1`.

use serde_json::{Map, Value};

/// Resolves a key path against an item body.
pub trait KeyPathResolver: Send + Sync {
    /// Returns the value at `path`, or `None` if any segment is missing.
    fn resolve<'a>(&self, body: &'a Map<String, Value>, path: &str) -> Option<&'a Value>;
}

/// Resolver that supports dot notation and `[n]` array indexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotPathResolver;

impl KeyPathResolver for DotPathResolver {
    fn resolve<'a>(&self, body: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
        resolve(body, path)
    }
}

/// Resolver that only addresses top-level keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralKeyResolver;

impl KeyPathResolver for LiteralKeyResolver {
    fn resolve<'a>(&self, body: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
        body.get(path)
    }
}

/// Resolve a dot path directly against an object body.
pub fn resolve<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(v) = map.get(path) {
        return Some(v);
    }

    let segments = split_path(path);
    let (first, rest) = segments.split_first()?;
    rest.iter()
        .try_fold(map.get(first.as_str())?, |current, segment| child(current, segment))
}

/// Remove the field addressed by `path`, keeping the order of the remaining keys.
///
/// Array elements are never removed; only object fields are.
pub fn remove_path(map: &mut Map<String, Value>, path: &str) -> Option<Value> {
    if map.contains_key(path) {
        return map.shift_remove(path);
    }

    let segments = split_path(path);
    let (last, parents) = segments.split_last()?;
    let (first, rest) = match parents.split_first() {
        Some(split) => split,
        None => return map.shift_remove(last.as_str()),
    };

    let mut current = map.get_mut(first.as_str())?;
    for segment in rest {
        current = child_mut(current, segment)?;
    }

    current.as_object_mut()?.shift_remove(last.as_str())
}

/// Final segment of a path: the part after the last `.`, or the whole path.
pub fn last_segment(path: &str) -> &str {
    match path.rfind('.') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

/// Split `a.b[0].c` into `["a", "b", "0", "c"]`.
fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => segments.push(std::mem::take(&mut current)),
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let index: String = chars.by_ref().take_while(|c| *c != ']').collect();
                segments.push(index.trim_matches(|c| c == '"' || c == '\'').to_string());
                // Skip a '.' directly following the closing bracket.
                let rest = chars.as_str();
                if let Some(stripped) = rest.strip_prefix('.') {
                    chars = stripped.chars();
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() || path.ends_with('.') {
        segments.push(current);
    }

    segments
}
