//! Path-addressed access into nested JSON trees.
//!
//! Paths use `.`-separated segments with `[N]` or bare-digit array indices
//! (`packages.0.items.0.gst.cgst`, `user.workspace[0].urmId`). Reads never
//! fail; writes construct missing structure on the way down.

use serde_json::{Map, Value};

fn split_segments(path: &str) -> Vec<&str> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Resolves `path` against `tree`, returning `None` the instant a segment is
/// unresolvable: a missing key, an out-of-range index, a scalar where
/// traversal is expected, or an explicit `null` along the way.
pub fn get_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in split_segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Resolves `path` and renders scalar hits as text. Server payloads carry
/// identifiers as either strings or numbers; callers that only need the
/// textual form go through here.
pub fn get_path_string(tree: &Value, path: &str) -> Option<String> {
    match get_path(tree, path)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Assigns `value` at `path`, creating missing intermediate objects for
/// non-numeric segments and padding arrays with empty objects up to a numeric
/// index. A scalar already sitting on the walked path is overwritten with the
/// container type the path needs; the write is best effort and never fails.
pub fn set_path(tree: &mut Value, path: &str, value: Value) {
    let segments = split_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        tracing::debug!(path, "empty path, nothing to set");
        return;
    };

    let mut current = tree;
    for segment in parents {
        current = descend_or_create(current, segment);
    }
    set_final(current, last, value);
}

fn descend_or_create<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    match segment.parse::<usize>() {
        Ok(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let items = node.as_array_mut().expect("node coerced to array");
            while items.len() <= index {
                items.push(Value::Object(Map::new()));
            }
            &mut items[index]
        }
        Err(_) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let map = node.as_object_mut().expect("node coerced to object");
            map.entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
        }
    }
}

fn set_final(node: &mut Value, segment: &str, value: Value) {
    match segment.parse::<usize>() {
        Ok(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let items = node.as_array_mut().expect("node coerced to array");
            while items.len() <= index {
                items.push(Value::Null);
            }
            items[index] = value;
        }
        Err(_) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let map = node.as_object_mut().expect("node coerced to object");
            map.insert(segment.to_string(), value);
        }
    }
}

/// Removes the value at `path` and returns it. When a non-numeric segment
/// meets a list-valued node, the walk descends into element 0 before
/// resolving the segment, so `items.name` strips `name` from the first item.
pub fn remove_path(tree: &mut Value, path: &str) -> Option<Value> {
    let segments = split_segments(path);
    let (last, parents) = segments.split_last()?;

    let mut current = tree;
    for segment in parents {
        if current.is_array() && segment.parse::<usize>().is_err() {
            current = current.get_mut(0)?;
        }
        current = step_mut(current, segment)?;
    }
    if current.is_array() && last.parse::<usize>().is_err() {
        current = current.get_mut(0)?;
    }

    match current {
        Value::Object(map) => map.remove(*last),
        Value::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn step_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Recursively folds `overlay` into `base`: object values merge key by key,
/// everything else replaces the base value outright.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        deep_merge(base_value, overlay_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
