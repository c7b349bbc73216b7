//! Walking and mutating the nested state tree.

use crate::error::{Result, StoreError};
use crate::path::StorePath;
use serde_json::{Map, Value};

/// Write `value` at `path`, creating empty mappings for missing parents.
///
/// The final segment is replaced wholesale. Arrays can be walked and written
/// through with an in-bounds numeric segment.
pub(crate) fn assign(root: &mut Value, path: &StorePath, value: Value) -> Result<()> {
    let (parents, last) = path.split_last();

    let mut node = root;
    for segment in parents {
        node = child_or_insert(node, segment).ok_or_else(|| conflict(path, segment))?;
    }

    match node {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => match index_of(last).and_then(|i| items.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(conflict(path, last)),
        },
        _ => Err(conflict(path, last)),
    }
}

/// Resolve `path` to a borrowed value, or `None` if any step is missing.
pub(crate) fn lookup<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => index_of(segment).and_then(|i| items.get(i)),
            _ => None,
        })
}

pub(crate) fn empty() -> Value {
    Value::Object(Map::new())
}

fn child_or_insert<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => Some(map.entry(segment).or_insert_with(empty)),
        Value::Array(items) => index_of(segment).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn index_of(segment: &str) -> Option<usize> {
    segment.parse().ok()
}

fn conflict(path: &StorePath, segment: &str) -> StoreError {
    StoreError::PathConflict {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s, "test").unwrap()
    }

    #[test]
    fn assign_creates_intermediate_mappings() {
        let mut root = empty();
        assign(&mut root, &path("a.b.c"), json!(1)).unwrap();
        assert_eq!(root, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn assign_replaces_rather_than_merges() {
        let mut root = json!({"model": {"a": 1, "b": 2}});
        assign(&mut root, &path("model"), json!({"c": 3})).unwrap();
        assert_eq!(root, json!({"model": {"c": 3}}));
    }

    #[test]
    fn assign_keeps_siblings() {
        let mut root = json!({"model": {"a": 1}});
        assign(&mut root, &path("model.b"), json!(2)).unwrap();
        assert_eq!(root, json!({"model": {"a": 1, "b": 2}}));
    }

    #[test]
    fn assign_through_array_index() {
        let mut root = json!({"list": [{"name": "x"}, {"name": "y"}]});
        assign(&mut root, &path("list.1.name"), json!("z")).unwrap();
        assign(&mut root, &path("list.0"), json!("first")).unwrap();
        assert_eq!(root, json!({"list": ["first", {"name": "z"}]}));
    }

    #[test]
    fn assign_through_scalar_conflicts() {
        let mut root = json!({"a": 5});
        let err = assign(&mut root, &path("a.b"), json!(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::PathConflict { ref segment, .. } if segment == "b"
        ));
        assert_eq!(root, json!({"a": 5}));
    }

    #[test]
    fn assign_through_null_conflicts() {
        let mut root = json!({"a": null});
        assert!(assign(&mut root, &path("a.b.c"), json!(1)).is_err());
    }

    #[test]
    fn assign_out_of_bounds_conflicts() {
        let mut root = json!({"list": [1]});
        assert!(assign(&mut root, &path("list.3"), json!(2)).is_err());
        assert!(assign(&mut root, &path("list.name"), json!(2)).is_err());
    }

    #[test]
    fn lookup_nested_and_missing() {
        let root = json!({"model": {"listOfItems": ["x", "y"]}});
        assert_eq!(lookup(&root, &path("model.listOfItems.1")), Some(&json!("y")));
        assert_eq!(lookup(&root, &path("model.other")), None);
        assert_eq!(lookup(&root, &path("model.listOfItems.9")), None);
        assert_eq!(lookup(&root, &path("model.listOfItems.1.deeper")), None);
    }

    #[test]
    fn lookup_distinguishes_null() {
        let root = json!({"a": null});
        assert_eq!(lookup(&root, &path("a")), Some(&Value::Null));
        assert_eq!(lookup(&root, &path("b")), None);
    }
}
