//! # Virtualized Rendering
//!
//! Only a prefix of the visible key list is materialized: enough rows to fill
//! the viewport down to the current scroll position, plus some overscan.
//! Scrolling extends the prefix; reaching the bottom with everything
//! materialized asks the list controller for another page.
//!
//! Scroll handling is throttled to one evaluation per `scroll_interval`, and only
//! one scroll-triggered fetch is outstanding at a time. A scroll that wants
//! more while a fetch is in flight sets a catch-up flag, and the check runs again
//! once the fetch completes.

use crate::list::{ListEvent, ListView};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub overscan_rows: usize,
    pub scroll_interval: Duration,
    pub bottom_threshold_px: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            overscan_rows: 10,
            scroll_interval: Duration::from_millis(500),
            bottom_threshold_px: 50.0,
        }
    }
}

/// Scroll position and geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
    pub row_height: f64,
}

impl Viewport {
    /// A viewport measured in rows, as a terminal sees it.
    pub fn rows(rows: usize) -> Self {
        Self {
            scroll_top: 0.0,
            height: rows as f64,
            row_height: 1.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_top: 0.0,
            height: 800.0,
            row_height: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Dropped by the throttle.
    Throttled,
    /// Nothing to do.
    Idle,
    /// More rows were materialized.
    Extended,
    /// At the bottom with everything shown: fetch the next page.
    FetchMore,
    /// Wanted more, but a scroll fetch is already running.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct RenderDriver {
    settings: RenderSettings,
    keys: Vec<String>,
    materialized: usize,
    viewport: Viewport,
    last_scroll: Option<Instant>,
    fetching: bool,
    catch_up: bool,
}

impl RenderDriver {
    pub fn new(settings: RenderSettings, viewport: Viewport) -> Self {
        Self {
            settings,
            keys: Vec::new(),
            materialized: 0,
            viewport,
            last_scroll: None,
            fetching: false,
            catch_up: false,
        }
    }

    /// The full visible key list.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The materialized prefix of the visible list.
    pub fn materialized_keys(&self) -> &[String] {
        &self.keys[..self.materialized]
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// Rows needed to cover the viewport down to its bottom edge, plus overscan.
    pub fn required_rows(&self, viewport: &Viewport) -> usize {
        if viewport.row_height <= 0.0 {
            return self.settings.overscan_rows.max(1);
        }
        let bottom =
            (viewport.scroll_top.max(0.0) + viewport.height.max(0.0)) / viewport.row_height;
        (bottom.ceil() as usize).max(1) + self.settings.overscan_rows
    }

    /// Replaces the visible list and reports the materialized prefix.
    ///
    /// A fresh list (`appended == false`) materializes what the viewport needs.
    /// An appended list keeps what was already materialized and extends it.
    pub fn show<V: ListView + ?Sized>(&mut self, keys: Vec<String>, appended: bool, view: &mut V) {
        let required = self.required_rows(&self.viewport);
        let target = if appended {
            self.materialized.max(required)
        } else {
            required
        };
        self.keys = keys;
        self.materialized = target.min(self.keys.len());
        self.emit(appended, view);
    }

    /// Updates geometry without throttling, e.g. after a resize.
    pub fn set_viewport<V: ListView + ?Sized>(
        &mut self,
        viewport: Viewport,
        view: &mut V,
    ) -> ScrollOutcome {
        self.viewport = viewport;
        self.check(view)
    }

    pub fn on_scroll<V: ListView + ?Sized>(
        &mut self,
        viewport: Viewport,
        now: Instant,
        view: &mut V,
    ) -> ScrollOutcome {
        if let Some(last) = self.last_scroll {
            if now.saturating_duration_since(last) < self.settings.scroll_interval {
                return ScrollOutcome::Throttled;
            }
        }
        self.last_scroll = Some(now);
        self.viewport = viewport;
        self.check(view)
    }

    /// Releases the scroll-fetch guard and re-runs a deferred check.
    pub fn scroll_fetch_finished<V: ListView + ?Sized>(&mut self, view: &mut V) -> ScrollOutcome {
        self.fetching = false;
        if std::mem::take(&mut self.catch_up) {
            return self.check(view);
        }
        ScrollOutcome::Idle
    }

    /// Releases the guard without catching up, for fetches that never started.
    pub fn cancel_scroll_fetch(&mut self) {
        self.fetching = false;
        self.catch_up = false;
    }

    fn check<V: ListView + ?Sized>(&mut self, view: &mut V) -> ScrollOutcome {
        let mut outcome = ScrollOutcome::Idle;

        let required = self.required_rows(&self.viewport).min(self.keys.len());
        if required > self.materialized {
            self.materialized = required;
            self.emit(true, view);
            outcome = ScrollOutcome::Extended;
        }

        if self.materialized == self.keys.len() && self.near_bottom() {
            if self.fetching {
                self.catch_up = true;
                return ScrollOutcome::Deferred;
            }
            self.fetching = true;
            return ScrollOutcome::FetchMore;
        }
        outcome
    }

    fn near_bottom(&self) -> bool {
        let content = self.materialized as f64 * self.viewport.row_height;
        let bottom = self.viewport.scroll_top + self.viewport.height;
        content - bottom <= self.settings.bottom_threshold_px
    }

    fn emit<V: ListView + ?Sized>(&self, appended: bool, view: &mut V) {
        view.emit(ListEvent::Visibility {
            keys: self.materialized_keys().to_vec(),
            visible: true,
            appended,
        });
    }
}
