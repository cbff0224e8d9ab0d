//! Hierarchical override merging
//!
//! Layers are always folded in ascending precedence order: the argument of
//! [`Merge::merge`] is the higher-precedence layer. The rules are:
//!
//! - scalars: a non-zero value overwrites, a zero value never does
//! - lists of named elements: merged element-wise by key, new keys appended
//!   in arrival order
//! - lists without a key: replaced wholesale, only when the new list is non-empty
//! - string maps: merged key by key, non-empty values win
//!
//! Merging is deterministic, and merging the same layer twice yields the same
//! result as merging it once.

use std::collections::{BTreeMap, HashMap};

/// Override-merge of one layer into an accumulated value
pub trait Merge {
    /// Folds `other` into `self`, with `other` winning on every non-zero field
    fn merge(&mut self, other: &Self);

    /// Folds several layers into `self`, lowest precedence first
    fn merge_all<'a, I>(&mut self, layers: I)
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        for layer in layers {
            self.merge(layer);
        }
    }
}

/// Overwrites a string unless the new value is empty
pub fn merge_string(dst: &mut String, src: &str) {
    if !src.is_empty() {
        dst.clear();
        dst.push_str(src);
    }
}

/// Overwrites a flag only when the new value is set
pub fn merge_flag(dst: &mut bool, src: bool) {
    if src {
        *dst = true;
    }
}

/// Merges an optional struct: an absent side never clears the other
pub fn merge_option<T: Merge + Clone>(dst: &mut Option<T>, src: &Option<T>) {
    match (dst.as_mut(), src) {
        (Some(current), Some(next)) => current.merge(next),
        (None, Some(next)) => *dst = Some(next.clone()),
        (_, None) => {}
    }
}

/// Merges an opaque JSON value: anything but `null` replaces the current value
pub fn merge_opaque(dst: &mut Option<serde_json::Value>, src: &Option<serde_json::Value>) {
    if let Some(next) = src {
        if !next.is_null() {
            *dst = Some(next.clone());
        }
    }
}

/// Merges string maps key by key
pub fn merge_map(dst: &mut BTreeMap<String, String>, src: &BTreeMap<String, String>) {
    for (key, value) in src {
        if value.is_empty() && dst.contains_key(key) {
            continue;
        }
        dst.insert(key.clone(), value.clone());
    }
}

/// Replaces a list that has no identifying key, unless the new list is empty
pub fn merge_replace<T: Clone>(dst: &mut Vec<T>, src: &[T]) {
    if !src.is_empty() {
        *dst = src.to_vec();
    }
}

/// Merges a list of named elements by the key that `key` extracts.
///
/// Elements of `src` whose key already exists in `dst` are merged into that
/// element recursively. Elements with a new key are appended, and later
/// elements of `src` carrying the same key merge into the appended one.
/// The empty string is a key like any other.
pub fn merge_by_key<T, F>(dst: &mut Vec<T>, src: &[T], key: F)
where
    T: Merge + Clone,
    F: Fn(&T) -> &str,
{
    let mut positions: HashMap<String, usize> = dst
        .iter()
        .enumerate()
        .map(|(idx, element)| (key(element).to_string(), idx))
        .collect();

    for element in src {
        let name = key(element);
        match positions.get(name).copied() {
            Some(idx) => dst[idx].merge(element),
            None => {
                positions.insert(name.to_string(), dst.len());
                dst.push(element.clone());
            }
        }
    }
}
