//! # Items, Values and the Item Store
//!
//! The engine is generic over the records it lists. It never looks at concrete
//! struct fields: everything it needs from an item goes through two seams.
//!
//! - The [`Item`] trait: a stable unique key, and the text that plain search
//!   terms are matched against.
//! - The field registry ([`crate::fields`]): named accessors that turn an item
//!   into a [`FieldValue`] for predicates and sorting.
//!
//! ## The Store
//!
//! [`ItemStore`] holds every loaded item by key, plus the **ordering**: the
//! sequence of keys in current sort order over *all* loaded items, regardless of
//! what is visible. The paginated list controller is the only writer (the
//! mutators are crate-private); the search engine and render driver only read.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A record that can be listed, searched and filtered.
pub trait Item {
    /// The unique, stable identifier of this item.
    fn key(&self) -> &str;

    /// Every piece of text a plain search term may match.
    fn searchable_text(&self) -> Vec<Cow<'_, str>>;

    /// Whether the (already lower-cased) term appears in any searchable text.
    fn matches_search(&self, term: &str) -> bool {
        self.searchable_text()
            .iter()
            .any(|text| text.to_lowercase().contains(term))
    }
}

/// The runtime value of one item field, as produced by a registered accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    /// A timestamp; `None` when unset (zero on the wire).
    Time(Option<DateTime<Utc>>),
}

impl FieldValue {
    /// Truthiness used by boolean filters.
    ///
    /// - Bool: the value itself
    /// - Text: non-empty ("has an email")
    /// - Time: set ("has ever been active")
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(v) => *v,
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Time(t) => t.is_some(),
        }
    }

    /// Lower-cased text form used by string filters.
    pub fn as_search_text(&self) -> String {
        match self {
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Text(s) => s.to_lowercase(),
            FieldValue::Time(Some(t)) => t.to_rfc3339(),
            FieldValue::Time(None) => String::new(),
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(t) => *t,
            _ => None,
        }
    }

    /// Ordering used when sorting by a column.
    ///
    /// Text compares case-insensitively, `false < true`, and unset times sort
    /// before every set time. Values of different kinds compare equal, leaving
    /// their relative order to the stable sort.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (FieldValue::Time(a), FieldValue::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Outcome of replacing the whole item set on reload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaceReport {
    pub updated: usize,
    pub inserted: usize,
    /// Keys that were known before and are absent from the new set.
    pub removed: Vec<String>,
}

/// Keyed item storage plus the authoritative ordering of keys.
#[derive(Debug, Clone)]
pub struct ItemStore<T> {
    items: HashMap<String, T>,
    ordering: Vec<String>,
}

impl<T> Default for ItemStore<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            ordering: Vec::new(),
        }
    }
}

impl<T: Item> ItemStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Keys of all loaded items, in current order.
    pub fn ordering(&self) -> &[String] {
        &self.ordering
    }

    /// Items in current order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &T> {
        self.ordering.iter().filter_map(|key| self.items.get(key))
    }

    /// Replaces the full item set with `items`, keeping their order.
    ///
    /// Known keys are updated in place, new keys inserted, and keys absent from
    /// `items` dropped. A key repeated within `items` keeps its first position
    /// and its last value.
    pub(crate) fn replace_all(&mut self, items: Vec<T>) -> ReplaceReport {
        let mut report = ReplaceReport::default();
        let mut next_items = HashMap::with_capacity(items.len());
        let mut next_ordering = Vec::with_capacity(items.len());

        for item in items {
            let key = item.key().to_string();
            if !next_items.contains_key(&key) {
                next_ordering.push(key.clone());
                if self.items.contains_key(&key) {
                    report.updated += 1;
                } else {
                    report.inserted += 1;
                }
            }
            next_items.insert(key, item);
        }

        let kept: HashSet<&String> = next_ordering.iter().collect();
        report.removed = self
            .ordering
            .iter()
            .filter(|key| !kept.contains(key))
            .cloned()
            .collect();

        self.items = next_items;
        self.ordering = next_ordering;
        report
    }

    /// Merges a page into the store. Unseen keys are appended to the ordering;
    /// known keys are updated in place. Returns how many keys were new.
    pub(crate) fn append(&mut self, items: Vec<T>) -> usize {
        let mut inserted = 0;
        for item in items {
            if self.upsert_item(item) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Inserts or updates one item. Returns `true` if the key was new.
    pub(crate) fn upsert_item(&mut self, item: T) -> bool {
        let key = item.key().to_string();
        let inserted = self.items.insert(key.clone(), item).is_none();
        if inserted {
            self.ordering.push(key);
        }
        inserted
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<T> {
        let removed = self.items.remove(key)?;
        self.ordering.retain(|k| k != key);
        Some(removed)
    }

    /// Stable-sorts the ordering with a comparator over items.
    pub(crate) fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let items = &self.items;
        self.ordering.sort_by(|a, b| match (items.get(a), items.get(b)) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => Ordering::Equal,
        });
    }
}

/// Serde adapter for optional timestamps sent as Unix seconds, where `0`
/// means unset.
pub mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.map_or(0, |t| t.timestamp()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
        if secs == 0 {
            return Ok(None);
        }
        DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}")))
    }
}
