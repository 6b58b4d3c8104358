use crate::value::StylingValue;

/// A flat, key-sorted sequence of `(key, value)` entries.
///
/// Keys are unique and kept in ascending order by every mutation, so two maps can
/// be compared with a single merge walk (see [`diff_array_maps`](crate::diff_array_maps)).
/// An empty map does not allocate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayMap {
    entries: Vec<(String, StylingValue)>,
}

/// Shared empty map, used as the "old" side of the first diff.
pub static EMPTY_ARRAY_MAP: ArrayMap = ArrayMap::new();

impl ArrayMap {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search for `key`: `Ok(position)` when present, `Err(insertion point)` otherwise.
    pub fn index_of(&self, key: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(probe, _)| probe.as_str().cmp(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_ok()
    }

    /// Insert `key` at its sorted position, or overwrite the value of an existing key.
    /// Returns the position of the entry.
    pub fn set(&mut self, key: impl Into<String>, value: StylingValue) -> usize {
        let key = key.into();
        match self.index_of(&key) {
            Ok(pos) => {
                self.entries[pos].1 = value;
                pos
            }
            Err(pos) => {
                self.entries.insert(pos, (key, value));
                pos
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&StylingValue> {
        self.index_of(key).ok().map(|pos| &self.entries[pos].1)
    }

    /// Value for `key`, or `Undefined` when absent.
    pub fn value_of(&self, key: &str) -> StylingValue {
        self.get(key).cloned().unwrap_or_default()
    }

    pub fn remove(&mut self, key: &str) -> Option<StylingValue> {
        self.index_of(key).ok().map(|pos| self.entries.remove(pos).1)
    }

    pub fn entry(&self, pos: usize) -> Option<(&str, &StylingValue)> {
        self.entries.get(pos).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StylingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, StylingValue)> for ArrayMap {
    fn from_iter<I: IntoIterator<Item = (K, StylingValue)>>(iter: I) -> Self {
        let mut map = ArrayMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_keys_sorted() {
        let mut map = ArrayMap::new();
        map.set("width", "1px".into());
        map.set("color", "red".into());
        map.set("height", "2px".into());
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["color", "height", "width"]);
    }

    #[test]
    fn test_set_overwrites_existing_key() {
        let mut map = ArrayMap::new();
        map.set("color", "red".into());
        let pos = map.set("color", "blue".into());
        assert_eq!(pos, 0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.value_of("color"), StylingValue::from("blue"));
    }

    #[test]
    fn test_index_of_reports_insertion_point() {
        let map: ArrayMap = [("b", StylingValue::Bool(true)), ("d", StylingValue::Bool(true))]
            .into_iter()
            .collect();
        assert_eq!(map.index_of("b"), Ok(0));
        assert_eq!(map.index_of("a"), Err(0));
        assert_eq!(map.index_of("c"), Err(1));
        assert_eq!(map.index_of("e"), Err(2));
    }

    #[test]
    fn test_missing_key_is_undefined() {
        let map = ArrayMap::new();
        assert_eq!(map.value_of("color"), StylingValue::Undefined);
        assert!(EMPTY_ARRAY_MAP.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut map: ArrayMap = [("a", StylingValue::Bool(true))].into_iter().collect();
        assert!(map.contains_key("a"));
        assert_eq!(map.remove("a"), Some(StylingValue::Bool(true)));
        assert_eq!(map.remove("a"), None);
        assert!(map.is_empty());
    }
}
