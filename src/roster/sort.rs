//! Sortable columns and the active sort.
//!
//! Each column remembers its own direction. Clicking an inactive column makes
//! it active with that remembered direction (ascending at first); clicking the
//! active column flips it. Sorting is stable, so items that compare equal keep
//! their relative order and the result is always a permutation of the input.

use crate::fields::{Accessor, FieldRegistry};
use crate::model::{Item, ItemStore};
use std::fmt;

pub struct Column<T> {
    pub key: &'static str,
    pub ascending: bool,
    accessor: Accessor<T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            ascending: self.ascending,
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("ascending", &self.ascending)
            .finish_non_exhaustive()
    }
}

pub struct SortState<T> {
    columns: Vec<Column<T>>,
    active: Option<usize>,
}

impl<T> Default for SortState<T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            active: None,
        }
    }
}

impl<T> Clone for SortState<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            active: self.active,
        }
    }
}

impl<T> fmt::Debug for SortState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortState")
            .field("columns", &self.columns)
            .field("active", &self.active)
            .finish()
    }
}

impl<T: Item> SortState<T> {
    /// Builds columns for `keys` from the registry's accessors. Unknown keys are skipped.
    pub fn from_registry(registry: &FieldRegistry<T>, keys: &[&str]) -> Self {
        let columns = keys
            .iter()
            .filter_map(|key| registry.get(key))
            .map(|field| Column {
                key: field.key,
                ascending: true,
                accessor: field.accessor(),
            })
            .collect();
        Self {
            columns,
            active: None,
        }
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn active(&self) -> Option<&Column<T>> {
        self.active.and_then(|idx| self.columns.get(idx))
    }

    /// Field key of the active column, or `""` when nothing is sorted.
    pub fn sort_field(&self) -> &'static str {
        self.active().map_or("", |column| column.key)
    }

    pub fn ascending(&self) -> bool {
        self.active().map_or(true, |column| column.ascending)
    }

    /// Handles a click on a column header. Returns `false` for unknown columns.
    pub fn click(&mut self, key: &str) -> bool {
        let Some(idx) = self.position(key) else {
            return false;
        };
        if self.active == Some(idx) {
            self.columns[idx].ascending = !self.columns[idx].ascending;
        } else {
            self.active = Some(idx);
        }
        true
    }

    /// Activates a column with an explicit direction.
    pub fn set_active(&mut self, key: &str, ascending: bool) -> bool {
        let Some(idx) = self.position(key) else {
            return false;
        };
        self.columns[idx].ascending = ascending;
        self.active = Some(idx);
        true
    }

    /// Stable-sorts the store's ordering by the active column.
    pub fn apply(&self, store: &mut ItemStore<T>) {
        let Some(column) = self.active() else {
            return;
        };
        let accessor = &column.accessor;
        let ascending = column.ascending;
        store.sort_by(|a, b| {
            let ordering = accessor(a).sort_cmp(&accessor(b));
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.key.eq_ignore_ascii_case(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::QueryType;
    use crate::model::tests::{named, Named};
    use crate::model::FieldValue;

    fn registry() -> FieldRegistry<Named> {
        FieldRegistry::new()
            .register("name", QueryType::new("Name", "name").string(), |n: &Named| {
                FieldValue::Text(n.name.clone())
            })
            .register("key", QueryType::new("Key", "key").string(), |n: &Named| {
                FieldValue::Text(n.key.clone())
            })
    }

    fn store() -> ItemStore<Named> {
        let mut store = ItemStore::new();
        store.replace_all(vec![
            named("u1", "Charlie"),
            named("u2", "alice"),
            named("u3", "Bob"),
            named("u4", "alice"),
        ]);
        store
    }

    #[test]
    fn clicking_inactive_column_sorts_ascending() {
        let mut sort = SortState::from_registry(&registry(), &["name", "key"]);
        let mut store = store();
        assert!(sort.click("name"));
        sort.apply(&mut store);
        assert_eq!(store.ordering(), &["u2", "u4", "u3", "u1"]);
        assert_eq!(sort.sort_field(), "name");
        assert!(sort.ascending());
    }

    #[test]
    fn clicking_again_reverses() {
        let mut sort = SortState::from_registry(&registry(), &["name"]);
        let mut store = store();
        sort.click("name");
        sort.click("name");
        sort.apply(&mut store);
        assert!(!sort.ascending());
        assert_eq!(store.ordering(), &["u1", "u3", "u2", "u4"]);
    }

    #[test]
    fn switching_columns_remembers_direction() {
        let mut sort = SortState::from_registry(&registry(), &["name", "key"]);
        sort.click("name");
        sort.click("name");
        sort.click("key");
        assert!(sort.ascending());
        sort.click("name");
        assert!(!sort.ascending());
    }

    #[test]
    fn sort_is_a_permutation() {
        let mut sort = SortState::from_registry(&registry(), &["name"]);
        let mut store = store();
        let mut before = store.ordering().to_vec();
        sort.click("name");
        sort.apply(&mut store);
        let mut after = store.ordering().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn unknown_column_is_ignored() {
        let mut sort = SortState::from_registry(&registry(), &["name", "bogus"]);
        assert_eq!(sort.columns().len(), 1);
        assert!(!sort.click("bogus"));
        assert_eq!(sort.sort_field(), "");
    }
}
