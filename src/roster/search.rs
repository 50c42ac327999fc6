//! # The Search Engine
//!
//! Holds the search text, its parsed form and the search mode, and filters the
//! store's ordering against it.
//!
//! ## Modes
//!
//! ```text
//!   Idle ──(non-empty text)──▶ LocalSearch ──(begin_server_search)──▶ ServerSearch
//!    ▲                              │                                    │
//!    └──────────(empty text)────────┘◀──────────(any edit)───────────────┘
//! ```
//!
//! In local search every term and predicate is evaluated against loaded items.
//! In server search the backend has already applied the plain terms and the
//! predicates it understands, so locally only `local_only` predicates are
//! evaluated. Chips are still produced for everything.
//!
//! Leaving server search yields [`SearchTransition::ServerSearchCleared`]; the
//! list controller answers with an unconstrained reload.

use crate::fields::{FieldRegistry, FilterOption};
use crate::list::{ListEvent, ListView};
use crate::model::{Item, ItemStore};
use crate::query::{parse_query, FilterChip, ParseContext, ParsedQuery, QueryDescriptor};
use crate::sort::SortState;
use tracing::{debug, trace};

/// What a change to the search text or mode means for the list controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTransition {
    /// Re-filter locally.
    Unchanged,
    /// Reload with the server search constraints.
    EnteredServerSearch,
    /// Reload without search constraints.
    ServerSearchCleared,
}

/// Search constraints handed to the paginated endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerSearch {
    pub search_terms: Vec<String>,
    pub queries: Vec<QueryDescriptor>,
    pub sort_by_field: String,
    pub ascending: bool,
}

pub struct SearchEngine<T> {
    registry: FieldRegistry<T>,
    sort: SortState<T>,
    ctx: ParseContext,
    query: String,
    in_search: bool,
    in_server_search: bool,
    parsed: ParsedQuery<T>,
}

impl<T: Item> SearchEngine<T> {
    pub fn new(registry: FieldRegistry<T>, sort: SortState<T>, ctx: ParseContext) -> Self {
        Self {
            registry,
            sort,
            ctx,
            query: String::new(),
            in_search: false,
            in_server_search: false,
            parsed: ParsedQuery::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn in_search(&self) -> bool {
        self.in_search
    }

    pub fn in_server_search(&self) -> bool {
        self.in_server_search
    }

    pub fn registry(&self) -> &FieldRegistry<T> {
        &self.registry
    }

    pub fn sort(&self) -> &SortState<T> {
        &self.sort
    }

    pub fn sort_mut(&mut self) -> &mut SortState<T> {
        &mut self.sort
    }

    /// The current parse of the search text.
    pub fn parsed(&self) -> &ParsedQuery<T> {
        &self.parsed
    }

    pub fn chips(&self) -> Vec<FilterChip> {
        self.parsed.queries.iter().map(|q| q.chip().clone()).collect()
    }

    /// Replaces the search text. Any edit leaves server search.
    pub fn set_query(&mut self, text: &str) -> SearchTransition {
        if text == self.query {
            return SearchTransition::Unchanged;
        }
        self.query = text.to_string();
        self.reparse();
        if self.in_server_search {
            debug!("search text edited, leaving server search");
            self.in_server_search = false;
            return SearchTransition::ServerSearchCleared;
        }
        SearchTransition::Unchanged
    }

    /// Hands the current search to the backend (the "enter" key).
    pub fn begin_server_search(&mut self) -> SearchTransition {
        if self.query.trim().is_empty() {
            if self.in_server_search {
                self.in_server_search = false;
                return SearchTransition::ServerSearchCleared;
            }
            return SearchTransition::Unchanged;
        }
        debug!(query = %self.query, "entering server search");
        self.in_search = true;
        self.in_server_search = true;
        SearchTransition::EnteredServerSearch
    }

    /// Filters the store's ordering by the current search text.
    ///
    /// The result keeps the ordering's relative order.
    pub fn search(&self, store: &ItemStore<T>) -> Vec<String> {
        if self.parsed.is_empty() {
            return store.ordering().to_vec();
        }
        let result: Vec<String> = store
            .ordering()
            .iter()
            .filter(|key| store.get(key).is_some_and(|item| self.matches(item)))
            .cloned()
            .collect();
        trace!(
            query = %self.query,
            matched = result.len(),
            of = store.len(),
            "evaluated search"
        );
        result
    }

    /// Whether one item passes the current search.
    pub fn matches(&self, item: &T) -> bool {
        if !self.in_server_search
            && !self
                .parsed
                .terms
                .iter()
                .all(|term| item.matches_search(term))
        {
            return false;
        }
        self.parsed
            .queries
            .iter()
            .filter(|q| !self.in_server_search || q.is_local_only())
            .all(|q| q.compare_item(item))
    }

    /// Re-derives the search flag, runs the search and reports chips and the
    /// empty-result signal. Returns the keys to make visible.
    pub fn on_search_box_change<V: ListView + ?Sized>(
        &mut self,
        store: &ItemStore<T>,
        view: &mut V,
    ) -> Vec<String> {
        self.in_search = !self.query.trim().is_empty();
        let result = self.search(store);
        view.emit(ListEvent::Filters(self.chips()));
        view.emit(ListEvent::NotFound(result.is_empty()));
        result
    }

    /// Everything the backend needs to run the current search itself.
    pub fn server_search_params(&self) -> ServerSearch {
        ServerSearch {
            search_terms: self.parsed.terms.clone(),
            queries: self.parsed.queries.iter().filter_map(|q| q.as_dto()).collect(),
            sort_by_field: self.sort.sort_field().to_string(),
            ascending: self.sort.ascending(),
        }
    }

    /// Cuts chip `index`'s token out of the search text.
    ///
    /// Returns `None` if there is no such chip. The caller re-runs the search.
    pub fn remove_chip(&mut self, index: usize) -> Option<SearchTransition> {
        let span = self.parsed.queries.get(index)?.chip().span.clone();
        if span.is_empty() || span.end > self.query.len() {
            return None;
        }
        let before = self.query[..span.start].trim_end();
        let after = self.query[span.end..].trim_start();
        let text = match (before.is_empty(), after.is_empty()) {
            (true, _) => after.to_string(),
            (_, true) => before.to_string(),
            _ => format!("{before} {after}"),
        };
        Some(self.set_query(&text))
    }

    pub fn filter_options(&self) -> Vec<FilterOption> {
        self.registry.filter_options()
    }

    /// Prepends `field:value` to the search text.
    pub fn fill_in_filter(&mut self, field: &str, value: &str) -> SearchTransition {
        let text = if self.query.is_empty() {
            format!("{field}:{value}")
        } else {
            format!("{field}:{value} {}", self.query)
        };
        self.set_query(&text)
    }

    /// Toggles a capability gate. Returns `true` if the state changed, in which
    /// case filters on newly gated fields are already gone from the parse.
    pub fn set_capability(&mut self, capability: &str, enabled: bool) -> bool {
        if !self.registry.set_capability(capability, enabled) {
            return false;
        }
        debug!(capability, enabled, "capability changed");
        self.reparse();
        true
    }

    fn reparse(&mut self) {
        self.parsed = parse_query(&self.query, &self.registry, &self.ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::QueryType;
    use crate::model::FieldValue;
    use std::borrow::Cow;

    #[derive(Debug, Clone)]
    struct User {
        id: &'static str,
        name: &'static str,
        admin: bool,
        telegram: &'static str,
    }

    impl Item for User {
        fn key(&self) -> &str {
            self.id
        }

        fn searchable_text(&self) -> Vec<Cow<'_, str>> {
            vec![Cow::Borrowed(self.name), Cow::Borrowed(self.telegram)]
        }
    }

    fn registry() -> FieldRegistry<User> {
        FieldRegistry::new()
            .register("name", QueryType::new("Name", "name").string(), |u: &User| {
                FieldValue::Text(u.name.to_string())
            })
            .register("admin", QueryType::new("Admin", "admin").bool(), |u: &User| {
                FieldValue::Bool(u.admin)
            })
            .register(
                "telegram",
                QueryType::new("Telegram", "telegram")
                    .bool()
                    .string()
                    .depends_on("telegram")
                    .local_only(),
                |u: &User| FieldValue::Text(u.telegram.to_string()),
            )
    }

    fn engine() -> SearchEngine<User> {
        let registry = registry();
        let sort = SortState::from_registry(&registry, &["name"]);
        SearchEngine::new(registry, sort, ParseContext::default())
    }

    fn store() -> ItemStore<User> {
        let mut store = ItemStore::new();
        store.replace_all(vec![
            User {
                id: "u1",
                name: "Alice",
                admin: true,
                telegram: "@alice",
            },
            User {
                id: "u2",
                name: "Bob",
                admin: false,
                telegram: "",
            },
        ]);
        store
    }

    fn run(engine: &mut SearchEngine<User>, text: &str) -> Vec<String> {
        engine.set_query(text);
        engine.search(&store())
    }

    #[test]
    fn bool_filter_scenario() {
        assert_eq!(run(&mut engine(), "admin:true"), vec!["u1"]);
    }

    #[test]
    fn quoted_string_filter_scenario() {
        assert_eq!(run(&mut engine(), "name:\"ali\""), vec!["u1"]);
    }

    #[test]
    fn plain_terms_must_all_match() {
        let mut e = engine();
        assert_eq!(run(&mut e, "BOB"), vec!["u2"]);
        assert!(run(&mut e, "alice bob").is_empty());
    }

    #[test]
    fn result_is_a_subset_and_idempotent() {
        let mut e = engine();
        let store = store();
        e.set_query("a");
        let first = e.search(&store);
        let second = e.search(&store);
        assert_eq!(first, second);
        assert!(first.len() <= store.len());
        for key in &first {
            assert!(store.get(key).unwrap().matches_search("a"));
        }
    }

    #[test]
    fn empty_query_returns_full_ordering() {
        assert_eq!(run(&mut engine(), ""), vec!["u1", "u2"]);
    }

    #[test]
    fn search_box_change_emits_chips_and_not_found() {
        let mut e = engine();
        let store = store();
        let mut events: Vec<ListEvent> = Vec::new();

        e.set_query("admin:false name:zed");
        let keys = e.on_search_box_change(&store, &mut events);
        assert!(keys.is_empty());
        assert!(e.in_search());
        match &events[0] {
            ListEvent::Filters(chips) => assert_eq!(chips.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[1], ListEvent::NotFound(true));

        e.set_query("");
        e.on_search_box_change(&store, &mut events);
        assert!(!e.in_search());
    }

    #[test]
    fn server_search_skips_terms_and_server_side_predicates() {
        let mut e = engine();
        e.registry.set_capability("telegram", true);
        e.set_query("zed admin:true telegram:true");
        assert_eq!(e.begin_server_search(), SearchTransition::EnteredServerSearch);

        // Only the local-only telegram filter applies: Bob has no handle.
        assert_eq!(e.search(&store()), vec!["u1"]);
        assert_eq!(e.chips().len(), 2);

        let params = e.server_search_params();
        assert_eq!(params.search_terms, vec!["zed"]);
        assert_eq!(params.queries.len(), 1);
        assert_eq!(params.queries[0].field, "admin");
    }

    #[test]
    fn editing_leaves_server_search() {
        let mut e = engine();
        e.set_query("bob");
        e.begin_server_search();
        assert_eq!(e.set_query("bob"), SearchTransition::Unchanged);
        assert_eq!(e.set_query("bo"), SearchTransition::ServerSearchCleared);
        assert!(!e.in_server_search());
        assert_eq!(e.set_query("b"), SearchTransition::Unchanged);
    }

    #[test]
    fn empty_query_cannot_enter_server_search() {
        let mut e = engine();
        assert_eq!(e.begin_server_search(), SearchTransition::Unchanged);
        assert!(!e.in_server_search());
    }

    #[test]
    fn removing_a_chip_rewrites_the_query() {
        let mut e = engine();
        e.set_query("alice  admin:true   name:\"al ice\" x");
        assert_eq!(e.remove_chip(0), Some(SearchTransition::Unchanged));
        assert_eq!(e.query(), "alice name:\"al ice\" x");
        e.remove_chip(0);
        assert_eq!(e.query(), "alice x");
        assert_eq!(e.remove_chip(0), None);
    }

    #[test]
    fn fill_in_filter_prepends() {
        let mut e = engine();
        e.set_query("bob");
        e.fill_in_filter("admin", "false");
        assert_eq!(e.query(), "admin:false bob");
        assert_eq!(e.parsed().queries.len(), 1);
    }

    #[test]
    fn disabling_capability_drops_gated_filters() {
        let mut e = engine();
        assert!(e.set_capability("telegram", true));
        e.set_query("telegram:alice");
        assert_eq!(e.search(&store()), vec!["u1"]);

        assert!(e.set_capability("telegram", false));
        assert!(e.chips().is_empty());
        assert_eq!(e.search(&store()), vec!["u1", "u2"]);
        assert!(!e.filter_options().iter().any(|o| o.key == "telegram"));
    }
}
