//! Keyed container for `dict` values.
//!
//! [`PlistMap`] wraps [`IndexMap`] so that keys stay unique (a repeated key
//! replaces the earlier value) while encoding order stays deterministic:
//! entries are written in insertion order, which makes checkpoints of the same
//! state byte-identical. Equality ignores order, matching the format's view of
//! a dictionary as an unordered mapping.
//!
//! ## Examples
//!
//! ```rust
//! use bitplist::{PlistMap, Value};
//!
//! let mut map = PlistMap::new();
//! map.insert("step".to_string(), Value::from(12));
//! map.insert("dt".to_string(), Value::from(0.5));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("step").and_then(|v| v.as_i32()), Some(12));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of string keys to plist values.
///
/// # Examples
///
/// ```rust
/// use bitplist::{PlistMap, Value};
///
/// let mut a = PlistMap::new();
/// a.insert("x".to_string(), Value::from(1));
/// a.insert("y".to_string(), Value::from(2));
///
/// let mut b = PlistMap::new();
/// b.insert("y".to_string(), Value::from(2));
/// b.insert("x".to_string(), Value::from(1));
///
/// // Iteration keeps insertion order, equality does not care.
/// assert_eq!(a.keys().next().map(String::as_str), Some("x"));
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlistMap(IndexMap<String, crate::Value>);

impl PlistMap {
    /// Creates an empty `PlistMap`.
    #[must_use]
    pub fn new() -> Self {
        PlistMap(IndexMap::new())
    }

    /// Creates an empty `PlistMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        PlistMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is replaced and
    /// returned; the key keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitplist::{PlistMap, Value};
    ///
    /// let mut map = PlistMap::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// assert_eq!(map.get("key"), Some(&Value::from(43)));
    /// ```
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut crate::Value> {
        self.0.get_mut(key)
    }

    /// Returns `true` if the map holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes `key`, preserving the relative order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    /// Moves every entry of `other` into `self`, later entries winning.
    pub fn extend(&mut self, other: PlistMap) {
        self.0.extend(other.0);
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl Default for PlistMap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HashMap<String, crate::Value>> for PlistMap {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        PlistMap(map.into_iter().collect())
    }
}

impl From<PlistMap> for HashMap<String, crate::Value> {
    fn from(map: PlistMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for PlistMap {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlistMap {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for PlistMap {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        PlistMap(IndexMap::from_iter(iter))
    }
}
