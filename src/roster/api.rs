//! # Session Facade
//!
//! [`ListSession`] is the synchronous driver for the sans-IO
//! [`PaginatedList`]. It owns a [`PageSource`] and a [`ListView`], sends every
//! request the controller issues, and feeds the outcome straight back until the
//! controller stops asking for more.
//!
//! Like the rest of the library it never writes to stdout or stderr. The CLI
//! and the integration tests are its clients; an async UI would drive
//! [`PaginatedList`] itself with the same three calls (issue, fetch, complete).
//!
//! ## Generic Over PageSource
//!
//! - Fixtures and tests: `ListSession<MemorySource<T>, T, V>`
//! - A remote endpoint: any type implementing [`PageSource`]

use crate::config::ListConfig;
use crate::fields::FieldRegistry;
use crate::list::{ListView, PaginatedList, PendingRequest};
use crate::model::Item;
use crate::render::{RenderDriver, Viewport};
use crate::search::SearchEngine;
use crate::sort::SortState;
use crate::source::PageSource;
use std::time::Instant;
use tracing::{debug, warn};

/// Builds a list controller from a registry, its sortable columns and the
/// configuration. Capabilities listed in the configuration are enabled.
pub fn build_list<T: Item>(
    mut registry: FieldRegistry<T>,
    columns: &[&str],
    config: &ListConfig,
    viewport: Viewport,
) -> PaginatedList<T> {
    for capability in &config.capabilities {
        registry.set_capability(capability.trim(), true);
    }
    let sort = SortState::from_registry(&registry, columns);
    let search = SearchEngine::new(registry, sort, config.parse_context());
    let render = RenderDriver::new(config.render_settings(), viewport);
    PaginatedList::new(search, render, config.list_settings())
}

pub struct ListSession<S, T, V> {
    list: PaginatedList<T>,
    source: S,
    view: V,
}

impl<S, T, V> ListSession<S, T, V>
where
    S: PageSource<T>,
    T: Item,
    V: ListView,
{
    pub fn new(list: PaginatedList<T>, source: S, view: V) -> Self {
        Self {
            list,
            source,
            view,
        }
    }

    /// First load: fetches the record count and the first page.
    pub fn open(&mut self) {
        self.update_total();
        let pending = self.list.reload(Instant::now());
        self.drive(Some(pending));
    }

    /// Sends `pending` and every follow-up the controller asks for.
    pub fn drive(&mut self, mut pending: Option<PendingRequest>) {
        while let Some(request) = pending.take() {
            debug!(
                ticket = ?request.ticket,
                page = request.request.page,
                limit = request.request.limit,
                "fetching"
            );
            let reload = request.is_reload();
            let result = self.source.fetch_page(&request.request);
            pending = self
                .list
                .complete(request.ticket, result, &mut self.view, Instant::now());
            if reload {
                self.update_total();
            }
        }
    }

    /// Types `text` into the search box.
    pub fn search(&mut self, text: &str) {
        let pending = self
            .list
            .on_search_input(text, &mut self.view, Instant::now());
        self.drive(pending);
    }

    /// Hands the current search to the backend.
    pub fn submit(&mut self) {
        let pending = self.list.submit_search(&mut self.view, Instant::now());
        self.drive(pending);
    }

    /// Runs `text` as a server search straight away.
    pub fn submit_query(&mut self, text: &str) {
        let pending = self
            .list
            .search_on_server(text, &mut self.view, Instant::now());
        self.drive(pending);
    }

    pub fn remove_chip(&mut self, index: usize) {
        let pending = self.list.remove_chip(index, &mut self.view, Instant::now());
        self.drive(pending);
    }

    pub fn fill_in_filter(&mut self, field: &str, value: &str) {
        let pending = self
            .list
            .fill_in_filter(field, value, &mut self.view, Instant::now());
        self.drive(pending);
    }

    pub fn set_capability(&mut self, capability: &str, enabled: bool) {
        let pending =
            self.list
                .set_capability(capability, enabled, &mut self.view, Instant::now());
        self.drive(pending);
    }

    pub fn click_column(&mut self, key: &str) {
        let pending = self.list.click_column(key, &mut self.view, Instant::now());
        self.drive(pending);
    }

    /// Sets the sort and reloads. Returns `false` for an unknown column.
    pub fn set_sort(&mut self, key: &str, ascending: bool) -> bool {
        let now = Instant::now();
        if !self.list.set_sort(key, ascending, &mut self.view, now) {
            return false;
        }
        if self.list.has_loaded() {
            let pending = self.list.reload(now);
            self.drive(Some(pending));
        }
        true
    }

    pub fn load_more(&mut self) {
        let pending = self.list.load_more(false, Instant::now());
        self.drive(pending);
    }

    /// Loads pages until the backend reports the last one.
    pub fn load_all(&mut self) {
        let pending = self.list.load_more(true, Instant::now());
        self.drive(pending);
    }

    /// Reloads unless the refresh cooldown is still running. Returns whether a
    /// reload happened.
    pub fn refresh(&mut self) -> bool {
        match self.list.refresh(Instant::now()) {
            Some(pending) => {
                self.drive(Some(pending));
                true
            }
            None => false,
        }
    }

    pub fn scroll(&mut self, viewport: Viewport) {
        let pending = self
            .list
            .on_scroll(viewport, &mut self.view, Instant::now());
        self.drive(pending);
    }

    pub fn upsert(&mut self, item: T) {
        self.list.upsert_item(item, &mut self.view, Instant::now());
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.list.remove_item(key, &mut self.view, Instant::now())
    }

    pub fn list(&self) -> &PaginatedList<T> {
        &self.list
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_view(self) -> V {
        self.view
    }

    fn update_total(&mut self) {
        match self.source.count() {
            Ok(total) => self.list.set_total(total, &mut self.view),
            Err(err) => warn!(error = %err, "could not count records"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;
    use crate::fields::QueryType;
    use crate::list::ListEvent;
    use crate::model::tests::{named, Named};
    use crate::model::FieldValue;
    use crate::source::MemorySource;

    fn registry() -> FieldRegistry<Named> {
        FieldRegistry::new().register(
            "name",
            QueryType::new("Name", "name").string(),
            |n: &Named| FieldValue::Text(n.name.clone()),
        )
    }

    type Session = ListSession<MemorySource<Named>, Named, Vec<ListEvent>>;

    fn session(n: usize, page_size: usize) -> Session {
        let items = (0..n)
            .map(|i| named(&format!("k{i:03}"), &format!("item {i:03}")))
            .collect();
        let config = ListConfig {
            page_size,
            ..Default::default()
        };
        let list = build_list(registry(), &["name"], &config, Viewport::rows(n.max(1)));
        ListSession::new(list, MemorySource::new(items, registry()), Vec::new())
    }

    #[test]
    fn open_loads_first_page_and_total() {
        let mut s = session(30, 10);
        s.open();
        assert_eq!(s.list().store().len(), 10);
        assert_eq!(s.list().counter().total, 30);
        assert!(!s.list().last_page());
    }

    #[test]
    fn load_all_reaches_the_last_page() {
        let mut s = session(25, 10);
        s.open();
        s.load_all();
        assert_eq!(s.list().store().len(), 25);
        assert!(s.list().last_page());
        assert_eq!(s.source().requests().len(), 3);
    }

    #[test]
    fn search_keeps_fetching_until_a_page_is_filled() {
        let mut s = session(40, 10);
        s.open();
        // Only item 035 matches; it lives on the fourth page.
        s.search("035");
        assert!(s.list().store().contains("k035"));
        assert!(s.list().last_page());
    }

    #[test]
    fn submitted_query_goes_straight_to_the_source() {
        let mut s = session(40, 10);
        s.open();
        s.submit_query("035");
        let requests = s.source().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].search_terms, vec!["035"]);
        assert_eq!(s.list().store().ordering(), &["k035"]);
    }

    #[test]
    fn count_failure_is_not_fatal() {
        struct NoCount(MemorySource<Named>);
        impl PageSource<Named> for NoCount {
            fn fetch_page(
                &self,
                request: &crate::source::PageRequest,
            ) -> crate::error::Result<crate::source::PageResponse<Named>> {
                self.0.fetch_page(request)
            }
            fn count(&self) -> crate::error::Result<usize> {
                Err(RosterError::Status(500))
            }
        }

        let list = build_list(registry(), &["name"], &ListConfig::default(), Viewport::default());
        let source = NoCount(MemorySource::new(vec![named("a", "A")], registry()));
        let mut s = ListSession::new(list, source, Vec::new());
        s.open();
        assert_eq!(s.list().store().len(), 1);
        assert_eq!(s.list().counter().total, 0);
    }

    #[test]
    fn failed_load_reaches_the_view() {
        let mut s = session(5, 10);
        s.source().fail_next(RosterError::Transport("connection reset".into()));
        s.open();
        assert!(s
            .view()
            .iter()
            .any(|e| matches!(e, ListEvent::LoadFailed(msg) if msg.contains("connection reset"))));
        assert!(!s.list().has_loaded());
    }

    #[test]
    fn set_sort_reloads_in_the_new_order() {
        let mut s = session(3, 10);
        s.open();
        assert!(s.set_sort("name", false));
        assert_eq!(s.list().store().ordering()[0], "k002");
        assert!(!s.set_sort("nope", true));
    }
}
