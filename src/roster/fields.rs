//! Field descriptors and the accessor registry.
//!
//! A [`QueryType`] is the static metadata of one searchable field: its display
//! name, which predicate classes are legal for it, and its gating flags. The
//! [`FieldRegistry`] pairs each descriptor with an accessor closure captured at
//! setup, so the engine never reads concrete struct fields.
//!
//! ## Capabilities
//!
//! A field may depend on a capability (`depends_on`), e.g. the Telegram fields
//! only exist when Telegram integration is enabled. Gated fields are unknown to
//! the parser and hidden from the filter list while their capability is off.
//! Capabilities start disabled.

use crate::model::FieldValue;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Resolves one field of an item.
pub type Accessor<T> = Rc<dyn Fn(&T) -> FieldValue>;

/// Static per-field metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryType {
    /// Display name used on filter chips and in the filter list.
    pub name: &'static str,
    pub description: Option<&'static str>,
    /// Name of the item attribute the accessor reads.
    pub getter: &'static str,
    pub bool: bool,
    pub string: bool,
    pub date: bool,
    /// Capability that must be enabled for the field to be searchable.
    pub depends_on: Option<&'static str>,
    /// The backend cannot evaluate this field; it is always filtered locally.
    pub local_only: bool,
    /// Hidden fields stay queryable but are not offered in the filter list.
    pub show: bool,
}

impl QueryType {
    pub const fn new(name: &'static str, getter: &'static str) -> Self {
        Self {
            name,
            description: None,
            getter,
            bool: false,
            string: false,
            date: false,
            depends_on: None,
            local_only: false,
            show: true,
        }
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Allow `field:true` style predicates.
    pub const fn bool(mut self) -> Self {
        self.bool = true;
        self
    }

    /// Allow substring predicates.
    pub const fn string(mut self) -> Self {
        self.string = true;
        self
    }

    /// Allow date comparisons.
    pub const fn date(mut self) -> Self {
        self.date = true;
        self
    }

    pub const fn depends_on(mut self, capability: &'static str) -> Self {
        self.depends_on = Some(capability);
        self
    }

    pub const fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.show = false;
        self
    }
}

/// A registered field: its key, descriptor and accessor.
pub struct Field<T> {
    pub key: &'static str,
    pub query_type: QueryType,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    pub fn value(&self, item: &T) -> FieldValue {
        (self.accessor)(item)
    }

    pub fn accessor(&self) -> Accessor<T> {
        Rc::clone(&self.accessor)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            query_type: self.query_type,
            accessor: Rc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("query_type", &self.query_type)
            .finish_non_exhaustive()
    }
}

/// One entry of the filter list offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub key: &'static str,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub bool: bool,
    pub string: bool,
    pub date: bool,
}

/// Field key → descriptor and accessor, in registration order.
pub struct FieldRegistry<T> {
    fields: Vec<Field<T>>,
    enabled: HashSet<String>,
}

impl<T> Default for FieldRegistry<T> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            enabled: HashSet::new(),
        }
    }
}

impl<T> Clone for FieldRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            enabled: self.enabled.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("fields", &self.fields)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<T> FieldRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field. `key` is what the backend calls the field; lookups
    /// ignore ASCII case.
    pub fn register<F>(mut self, key: &'static str, query_type: QueryType, accessor: F) -> Self
    where
        F: Fn(&T) -> FieldValue + 'static,
    {
        self.fields.push(Field {
            key,
            query_type,
            accessor: Rc::new(accessor),
        });
        self
    }

    /// Looks up a field by key regardless of capability state.
    pub fn get(&self, key: &str) -> Option<&Field<T>> {
        self.fields
            .iter()
            .find(|field| field.key.eq_ignore_ascii_case(key))
    }

    /// Looks up a field that is currently searchable.
    pub fn lookup(&self, key: &str) -> Option<&Field<T>> {
        self.get(key).filter(|field| self.is_available(field))
    }

    pub fn is_available(&self, field: &Field<T>) -> bool {
        field
            .query_type
            .depends_on
            .map_or(true, |capability| self.capability_enabled(capability))
    }

    pub fn capability_enabled(&self, capability: &str) -> bool {
        self.enabled.contains(capability)
    }

    /// Turns a capability on or off. Returns `true` if the state changed.
    pub fn set_capability(&mut self, capability: &str, enabled: bool) -> bool {
        if enabled {
            self.enabled.insert(capability.to_string())
        } else {
            self.enabled.remove(capability)
        }
    }

    /// Enables every capability any field depends on.
    pub fn enable_all(mut self) -> Self {
        let gates: Vec<&'static str> = self
            .fields
            .iter()
            .filter_map(|field| field.query_type.depends_on)
            .collect();
        self.enabled.extend(gates.into_iter().map(String::from));
        self
    }

    /// Every capability any field depends on, in registration order.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for gate in self.fields.iter().filter_map(|f| f.query_type.depends_on) {
            if !out.contains(&gate) {
                out.push(gate);
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<T>> {
        self.fields.iter()
    }

    /// Shown, available fields with the predicate classes they accept.
    pub fn filter_options(&self) -> Vec<FilterOption> {
        self.fields
            .iter()
            .filter(|field| field.query_type.show && self.is_available(field))
            .map(|field| FilterOption {
                key: field.key,
                name: field.query_type.name,
                description: field.query_type.description,
                bool: field.query_type.bool,
                string: field.query_type.string,
                date: field.query_type.date,
            })
            .collect()
    }
}
