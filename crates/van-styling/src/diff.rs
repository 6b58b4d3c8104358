use std::cmp::Ordering;

use crate::array_map::ArrayMap;
use crate::value::StylingValue;

/// Iterations a single cursor may take before the walk is considered stuck.
const MAX_CURSOR: usize = 999;

/// Merge-walk two sorted maps and report every key whose value changed.
///
/// Keys only in `old` are reported with `Undefined` so the caller can fall back
/// to lower-priority sources. Keys whose value is `Undefined` on both sides (or
/// missing on one side and `Undefined` on the other) are not reported.
pub fn diff_array_maps(old: &ArrayMap, new: &ArrayMap, mut apply: impl FnMut(&str, StylingValue)) {
    let mut old_cursor = 0;
    let mut new_cursor = 0;
    loop {
        let old_entry = old.entry(old_cursor);
        let new_entry = new.entry(new_cursor);
        if old_entry.is_none() && new_entry.is_none() {
            break;
        }
        debug_assert!(old_cursor <= MAX_CURSOR, "map diff: old cursor ran away");
        debug_assert!(new_cursor <= MAX_CURSOR, "map diff: new cursor ran away");
        let order = match (old_entry, new_entry) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((old_key, _)), Some((new_key, _))) => old_key.cmp(new_key),
        };
        match (order, old_entry, new_entry) {
            (Ordering::Equal, Some((_, old_value)), Some((key, new_value))) => {
                if !old_value.same_value(new_value) {
                    apply(key, new_value.clone());
                }
                old_cursor += 1;
                new_cursor += 1;
            }
            (Ordering::Less, Some((key, old_value)), _) => {
                if old_value.is_present() {
                    apply(key, StylingValue::Undefined);
                }
                old_cursor += 1;
            }
            (_, _, Some((key, new_value))) => {
                if new_value.is_present() {
                    apply(key, new_value.clone());
                }
                new_cursor += 1;
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_map::EMPTY_ARRAY_MAP;

    fn map(entries: &[(&str, f64)]) -> ArrayMap {
        entries
            .iter()
            .map(|(k, v)| (*k, StylingValue::Number(*v)))
            .collect()
    }

    fn diff(old: &ArrayMap, new: &ArrayMap) -> Vec<(String, StylingValue)> {
        let mut calls = Vec::new();
        diff_array_maps(old, new, |key, value| calls.push((key.to_string(), value)));
        calls
    }

    #[test]
    fn test_add_update_remove() {
        let old = map(&[("a", 1.0), ("b", 2.0)]);
        let new = map(&[("b", 3.0), ("c", 4.0)]);
        assert_eq!(
            diff(&old, &new),
            vec![
                ("a".to_string(), StylingValue::Undefined),
                ("b".to_string(), StylingValue::Number(3.0)),
                ("c".to_string(), StylingValue::Number(4.0)),
            ]
        );
    }

    #[test]
    fn test_unchanged_maps_emit_nothing() {
        let old = map(&[("a", 1.0), ("b", 2.0)]);
        assert!(diff(&old, &old.clone()).is_empty());
        assert!(diff(&ArrayMap::new(), &ArrayMap::new()).is_empty());
    }

    #[test]
    fn test_from_empty() {
        let new = map(&[("x", 1.0), ("y", 2.0)]);
        let calls = diff(&ArrayMap::new(), &new);
        assert_eq!(calls.len(), 2);
        let removed = diff(&new, &ArrayMap::new());
        assert!(removed.iter().all(|(_, v)| *v == StylingValue::Undefined));
    }

    #[test]
    fn test_undefined_values_are_not_changes() {
        let old = ArrayMap::new();
        let new: ArrayMap = [("a", StylingValue::Undefined)].into_iter().collect();
        assert!(diff(&old, &new).is_empty());
        assert!(diff(&new, &old).is_empty());
    }

    #[test]
    fn test_unchanged_nan_is_not_a_change() {
        let old = map(&[("opacity", f64::NAN)]);
        assert!(diff(&old, &old.clone()).is_empty());
        assert_eq!(diff(&old, &map(&[("opacity", 1.0)])).len(), 1);
    }

    #[test]
    fn test_largest_map_is_walked_to_the_end() {
        let keys: Vec<String> = (0..MAX_CURSOR).map(|i| format!("k{i:04}")).collect();
        let big: ArrayMap = keys.iter().map(|k| (k.as_str(), StylingValue::Number(1.0))).collect();
        assert_eq!(big.len(), MAX_CURSOR);
        assert_eq!(diff(&EMPTY_ARRAY_MAP, &big).len(), MAX_CURSOR);
        assert_eq!(diff(&big, &EMPTY_ARRAY_MAP).len(), MAX_CURSOR);
    }
}
