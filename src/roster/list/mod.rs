//! # The Paginated List Controller
//!
//! [`PaginatedList`] is a sans-IO state machine over pages of items. It never
//! performs a fetch itself: operations return a [`PendingRequest`] (a ticket plus
//! the [`PageRequest`] to send), and the driver hands the outcome back through
//! [`PaginatedList::complete`]. [`crate::api::ListSession`] is the synchronous
//! driver; an async one would call the same methods.
//!
//! ## Loads
//!
//! - **Reload** re-fetches everything loaded so far in one request
//!   (`limit = page_size × (page + 1)`, `page = 0`) and replaces the item set:
//!   known keys update in place, new keys are inserted, missing keys dropped.
//! - **Load more** fetches the next page and merges it by key, appending unseen
//!   keys to the ordering and keeping the rendered rows.
//!
//! Only one load is outstanding at a time. A reload supersedes an in-flight load;
//! load-more is refused while anything is in flight or once the last page has
//! been seen. A completion whose ticket is not the outstanding one is ignored,
//! so a slow stale response cannot corrupt the ordering.
//!
//! ## Keep Searching
//!
//! After every search evaluation, if fewer than a page of items is visible and
//! more pages exist (or "load all" was asked for), the controller fetches another
//! page. It stops once a fetched page leaves the visible count unchanged.
//!
//! ## Ownership
//!
//! The controller owns the [`ItemStore`] and is its only writer. The search engine
//! and render driver read it through shared borrows, and every write finishes
//! before any view event for it is emitted.

pub mod counter;

pub use counter::RecordCounter;

use crate::error::Result;
use crate::model::{Item, ItemStore};
use crate::query::FilterChip;
use crate::render::{RenderDriver, ScrollOutcome, Viewport};
use crate::search::{SearchEngine, SearchTransition};
use crate::source::{PageRequest, PageResponse};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something the list wants the view to reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// `keys` is the full materialized set. With `appended`, the leading keys
    /// are already rendered and must be kept.
    Visibility {
        keys: Vec<String>,
        visible: bool,
        appended: bool,
    },
    /// The current search matched nothing.
    NotFound(bool),
    /// The chips of the active filters.
    Filters(Vec<FilterChip>),
    /// Whether "load more" should be disabled.
    LastPage(bool),
    Counter(RecordCounter),
    LoadFailed(String),
}

/// Receives list events.
pub trait ListView {
    fn emit(&mut self, event: ListEvent);
}

impl ListView for Vec<ListEvent> {
    fn emit(&mut self, event: ListEvent) {
        self.push(event);
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Reload,
    More { load_all: bool, from_scroll: bool },
}

/// A request the driver should send, then answer with [`PaginatedList::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub kind: LoadKind,
    pub request: PageRequest,
}

impl PendingRequest {
    pub fn is_reload(&self) -> bool {
        self.kind == LoadKind::Reload
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: usize,
    /// Sort field sent when no column is active.
    pub default_sort_field: String,
    /// Minimum time between user-triggered refreshes.
    pub refresh_cooldown: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_sort_field: "name".to_string(),
            refresh_cooldown: Duration::from_secs(15),
        }
    }
}

pub struct PaginatedList<T> {
    settings: ListSettings,
    page: usize,
    last_page: bool,
    has_loaded: bool,
    outstanding: Option<(Ticket, LoadKind)>,
    next_ticket: u64,
    store: ItemStore<T>,
    search: SearchEngine<T>,
    render: RenderDriver,
    counter: RecordCounter,
    previous_page_size: usize,
    last_reload: Option<Instant>,
    last_load: Option<Instant>,
}

impl<T: Item> PaginatedList<T> {
    pub fn new(search: SearchEngine<T>, render: RenderDriver, settings: ListSettings) -> Self {
        Self {
            settings,
            page: 0,
            last_page: false,
            has_loaded: false,
            outstanding: None,
            next_ticket: 0,
            store: ItemStore::new(),
            search,
            render,
            counter: RecordCounter::default(),
            previous_page_size: 0,
            last_reload: None,
            last_load: None,
        }
    }

    pub fn store(&self) -> &ItemStore<T> {
        &self.store
    }

    pub fn search(&self) -> &SearchEngine<T> {
        &self.search
    }

    pub fn render(&self) -> &RenderDriver {
        &self.render
    }

    pub fn counter(&self) -> RecordCounter {
        self.counter
    }

    pub fn settings(&self) -> &ListSettings {
        &self.settings
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn last_page(&self) -> bool {
        self.last_page
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    /// When the last request of any kind was issued.
    pub fn last_load(&self) -> Option<Instant> {
        self.last_load
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Requests everything loaded so far again, replacing the item set.
    pub fn reload(&mut self, now: Instant) -> PendingRequest {
        let limit = self.settings.page_size * (self.page + 1);
        self.page = 0;
        self.last_page = false;
        self.last_reload = Some(now);
        self.last_load = Some(now);
        if let Some((_, kind)) = self.outstanding {
            debug!(?kind, "reload supersedes in-flight load");
            // The superseded completion will be dropped as stale.
            if matches!(kind, LoadKind::More { from_scroll: true, .. }) {
                self.render.cancel_scroll_fetch();
            }
        }
        self.issue(LoadKind::Reload, limit, 0)
    }

    /// Requests the next page. `None` once the last page has been seen or while
    /// a load is outstanding.
    pub fn load_more(&mut self, load_all: bool, now: Instant) -> Option<PendingRequest> {
        self.load_next(load_all, false, now)
    }

    fn load_next(
        &mut self,
        load_all: bool,
        from_scroll: bool,
        now: Instant,
    ) -> Option<PendingRequest> {
        if self.last_page || self.outstanding.is_some() {
            return None;
        }
        self.page += 1;
        self.last_load = Some(now);
        let kind = LoadKind::More {
            load_all,
            from_scroll,
        };
        Some(self.issue(kind, self.settings.page_size, self.page))
    }

    /// Whether the refresh affordance is out of its cooldown.
    pub fn can_refresh(&self, now: Instant) -> bool {
        self.last_reload.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.settings.refresh_cooldown
        })
    }

    /// A user-triggered reload, rate-limited by the refresh cooldown.
    pub fn refresh(&mut self, now: Instant) -> Option<PendingRequest> {
        self.can_refresh(now).then(|| self.reload(now))
    }

    /// Applies the outcome of a request. Returns a follow-up request when the
    /// list wants more: keep-searching, load-all, or a deferred scroll.
    pub fn complete<V: ListView + ?Sized>(
        &mut self,
        ticket: Ticket,
        result: Result<PageResponse<T>>,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let kind = match self.outstanding {
            Some((current, kind)) if current == ticket => kind,
            _ => {
                debug!(?ticket, "ignoring stale completion");
                return None;
            }
        };
        self.outstanding = None;

        let from_scroll = matches!(kind, LoadKind::More { from_scroll: true, .. });
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(page = self.page, error = %err, "page load failed");
                if from_scroll {
                    self.render.cancel_scroll_fetch();
                }
                view.emit(ListEvent::LoadFailed(err.to_string()));
                return None;
            }
        };

        self.set_last_page(response.last_page, view);
        let next = match kind {
            LoadKind::Reload => {
                self.has_loaded = true;
                let report = self.store.replace_all(response.items);
                debug!(
                    updated = report.updated,
                    inserted = report.inserted,
                    removed = report.removed.len(),
                    "reloaded"
                );
                let total = self.counter.total;
                self.counter.reset();
                self.counter.total = total;
                self.counter.loaded = self.store.len();
                self.rederive(true, false, false, true, view, now)
            }
            LoadKind::More { load_all, .. } => {
                let inserted = self.store.append(response.items);
                debug!(page = self.page, inserted, "loaded page");
                self.counter.loaded = self.store.len();
                let load_all = load_all && !self.last_page;
                let keep_searching = self.search.in_search() || load_all;
                self.rederive(true, load_all, true, keep_searching, view, now)
            }
        };

        if from_scroll && self.render.scroll_fetch_finished(view) == ScrollOutcome::FetchMore {
            if next.is_none() {
                return self.scroll_fetch(now);
            }
            self.render.cancel_scroll_fetch();
        }
        next
    }

    /// The search text changed.
    pub fn on_search_input<V: ListView + ?Sized>(
        &mut self,
        text: &str,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let transition = self.search.set_query(text);
        self.follow(transition, view, now)
    }

    /// The user asked the backend to run the search (the "enter" key).
    pub fn submit_search<V: ListView + ?Sized>(
        &mut self,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let transition = self.search.begin_server_search();
        self.follow(transition, view, now)
    }

    /// Sets the search text and hands it to the backend in one step, without
    /// evaluating it locally first.
    pub fn search_on_server<V: ListView + ?Sized>(
        &mut self,
        text: &str,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let edited = self.search.set_query(text);
        match self.search.begin_server_search() {
            SearchTransition::Unchanged => self.follow(edited, view, now),
            entered => self.follow(entered, view, now),
        }
    }

    /// Removes a filter chip from the search text and re-runs the search.
    pub fn remove_chip<V: ListView + ?Sized>(
        &mut self,
        index: usize,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let transition = self.search.remove_chip(index)?;
        self.follow(transition, view, now)
    }

    /// Prepends `field:value` to the search text and re-runs the search.
    pub fn fill_in_filter<V: ListView + ?Sized>(
        &mut self,
        field: &str,
        value: &str,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let transition = self.search.fill_in_filter(field, value);
        self.follow(transition, view, now)
    }

    /// Toggles a capability. Filters that lose their field are dropped and the
    /// search runs again at once; in server search that means a reload.
    pub fn set_capability<V: ListView + ?Sized>(
        &mut self,
        capability: &str,
        enabled: bool,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        if !self.search.set_capability(capability, enabled) {
            return None;
        }
        if self.search.in_server_search() {
            self.page = 0;
            return Some(self.reload(now));
        }
        self.rederive(false, false, false, true, view, now)
    }

    /// Clicks a column header: re-sorts locally, then reloads, since page
    /// boundaries depend on the sort.
    pub fn click_column<V: ListView + ?Sized>(
        &mut self,
        key: &str,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        if !self.search.sort_mut().click(key) {
            return None;
        }
        self.resort(view, now);
        Some(self.reload(now))
    }

    /// Sets the sort explicitly without clicking. Does not reload.
    pub fn set_sort<V: ListView + ?Sized>(
        &mut self,
        key: &str,
        ascending: bool,
        view: &mut V,
        now: Instant,
    ) -> bool {
        if !self.search.sort_mut().set_active(key, ascending) {
            return false;
        }
        self.resort(view, now);
        true
    }

    /// Applies a single-item create or edit.
    pub fn upsert_item<V: ListView + ?Sized>(&mut self, item: T, view: &mut V, now: Instant) {
        self.store.upsert_item(item);
        self.search.sort().apply(&mut self.store);
        self.counter.loaded = self.store.len();
        self.rederive(false, false, false, false, view, now);
    }

    /// Applies a single-item delete. Returns the removed item.
    pub fn remove_item<V: ListView + ?Sized>(
        &mut self,
        key: &str,
        view: &mut V,
        now: Instant,
    ) -> Option<T> {
        let removed = self.store.remove(key)?;
        self.counter.loaded = self.store.len();
        self.rederive(false, false, false, false, view, now);
        Some(removed)
    }

    /// Forwards a scroll to the render driver; returns a fetch when it asks for one.
    pub fn on_scroll<V: ListView + ?Sized>(
        &mut self,
        viewport: Viewport,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        if self.render.on_scroll(viewport, now, view) != ScrollOutcome::FetchMore {
            return None;
        }
        self.scroll_fetch(now)
    }

    /// Records the item-count side channel.
    pub fn set_total<V: ListView + ?Sized>(&mut self, total: usize, view: &mut V) {
        self.counter.total = total;
        view.emit(ListEvent::Counter(self.counter));
    }

    pub fn set_selected<V: ListView + ?Sized>(&mut self, selected: usize, view: &mut V) {
        self.counter.selected = selected;
        view.emit(ListEvent::Counter(self.counter));
    }

    fn scroll_fetch(&mut self, now: Instant) -> Option<PendingRequest> {
        if !self.has_loaded {
            self.render.cancel_scroll_fetch();
            return None;
        }
        let request = self.load_next(false, true, now);
        if request.is_none() {
            self.render.cancel_scroll_fetch();
        }
        request
    }

    fn follow<V: ListView + ?Sized>(
        &mut self,
        transition: SearchTransition,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        match transition {
            SearchTransition::EnteredServerSearch | SearchTransition::ServerSearchCleared => {
                self.page = 0;
                Some(self.reload(now))
            }
            SearchTransition::Unchanged => self.rederive(false, false, false, true, view, now),
        }
    }

    fn resort<V: ListView + ?Sized>(&mut self, view: &mut V, now: Instant) {
        self.search.sort().apply(&mut self.store);
        self.rederive(false, false, false, false, view, now);
    }

    /// Re-runs the search over the store and materializes the result.
    fn rederive<V: ListView + ?Sized>(
        &mut self,
        new_items: bool,
        load_all: bool,
        appended: bool,
        keep_searching: bool,
        view: &mut V,
        now: Instant,
    ) -> Option<PendingRequest> {
        let keys = self.search.on_search_box_change(&self.store, view);
        let visible = keys.len();
        self.render.show(keys, appended, view);
        self.counter.shown = visible;
        view.emit(ListEvent::Counter(self.counter));

        if !keep_searching {
            return None;
        }
        self.keep_searching(visible, new_items, load_all, now)
    }

    fn keep_searching(
        &mut self,
        visible: usize,
        new_items: bool,
        load_all: bool,
        now: Instant,
    ) -> Option<PendingRequest> {
        let wants_more = (visible < self.settings.page_size && !self.last_page) || load_all;
        let progressed = !new_items
            || self.previous_page_size != visible
            || (visible == 0 && !self.last_page)
            || load_all;
        self.previous_page_size = visible;
        if wants_more && progressed {
            self.load_more(load_all, now)
        } else {
            None
        }
    }

    fn set_last_page<V: ListView + ?Sized>(&mut self, last_page: bool, view: &mut V) {
        self.last_page = last_page;
        view.emit(ListEvent::LastPage(last_page));
    }

    fn issue(&mut self, kind: LoadKind, limit: usize, page: usize) -> PendingRequest {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding = Some((ticket, kind));
        PendingRequest {
            ticket,
            kind,
            request: self.request(limit, page),
        }
    }

    fn request(&self, limit: usize, page: usize) -> PageRequest {
        let mut request = PageRequest {
            limit,
            page,
            sort_by_field: self.search.sort().sort_field().to_string(),
            ascending: self.search.sort().ascending(),
            ..Default::default()
        };
        if self.search.in_server_search() {
            let params = self.search.server_search_params();
            request.search_terms = params.search_terms;
            request.queries = params.queries;
        }
        if request.sort_by_field.is_empty() {
            request.sort_by_field = self.settings.default_sort_field.clone();
            request.ascending = true;
        }
        request
    }
}
