//! Page fetch coordination for one list screen.
//!
//! The coordinator owns a screen's filter store, its search debouncer and the
//! loaded item list. View intents (`apply_filters`, `set_search_text`,
//! `clear_filters`, `load_more`, `refresh`, scrolling) become request
//! descriptors, and each descriptor is planned as one of:
//!
//! - **Reset**: filters or search changed; fetch page 1 and replace the list
//! - **Append**: same filters, next page; fetch it and append
//! - **Suppress**: the identical request is already in flight
//!
//! Fetches run as spawned tasks and report back over a channel. Every dispatch
//! takes a fresh sequence number and only the completion carrying the latest
//! one is applied; anything older is discarded when it arrives.
//!
//! Must be used from within a tokio runtime.

use super::request::{PageResult, RequestDescriptor};
use crate::api::{ApiError, ListApi};
use crate::config::Config;
use crate::debounce::{Debouncer, DEFAULT_QUIET};
use crate::filter::{
    FilterError, FilterField, FilterOption, FilterPatch, FilterSpec, FilterStore,
};
use crate::scroll::{is_near_end, ScrollTracker, DEFAULT_END_THRESHOLD_PX};
use crate::screen::Screen;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Completion channel depth. Only the latest request is believed, so a small
/// buffer is enough even when the user out-types the network.
const COMPLETION_BUFFER: usize = 16;

// ============================================================================
// Public state types
// ============================================================================

/// Loading/error view of the coordinator.
#[derive(Debug, Clone)]
pub struct FetchState<F: FilterField> {
    pub loading: bool,
    pub error: Option<String>,
    /// Most recently dispatched request: the only one whose response is believed.
    pub last_descriptor: Option<RequestDescriptor<F>>,
}

impl<F: FilterField> Default for FetchState<F> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            last_descriptor: None,
        }
    }
}

/// How a request relates to what is loaded and in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fetch page 1 and replace the item list
    Reset,
    /// Fetch the next page and append it
    Append,
    /// The identical request is already loading
    Suppress,
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A fetch was started
    Issued { seq: u64, page: u32 },
    /// An identical fetch is already in flight
    Suppressed,
    /// Nothing to fetch (no change, nothing more to load, or busy)
    Skipped,
}

impl Dispatch {
    pub fn is_issued(&self) -> bool {
        matches!(self, Dispatch::Issued { .. })
    }
}

/// Result of one turn of [`PageCoordinator::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// Debounced search text settled
    SearchSettled { text: String, dispatch: Dispatch },
    /// The believed request succeeded
    PageLoaded {
        page: u32,
        appended: bool,
        received: usize,
    },
    /// The believed request failed; items are untouched
    PageFailed { page: u32, error: String },
    /// A superseded request completed and was ignored
    StaleDiscarded { seq: u64 },
}

/// Tunables for one coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorOptions {
    pub limit: u32,
    pub search_debounce: Duration,
    pub scroll_threshold_px: f64,
    pub end_threshold_px: f64,
}

impl CoordinatorOptions {
    pub fn for_screen<S: Screen>() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            search_debounce: DEFAULT_QUIET,
            scroll_threshold_px: S::SCROLL_THRESHOLD_PX,
            end_threshold_px: DEFAULT_END_THRESHOLD_PX,
        }
    }

    pub fn from_config<S: Screen>(config: &Config) -> Self {
        Self {
            limit: config.page_limit.max(1),
            search_debounce: config.search_debounce(),
            scroll_threshold_px: config.scroll_threshold(S::NAME, S::SCROLL_THRESHOLD_PX),
            end_threshold_px: DEFAULT_END_THRESHOLD_PX,
        }
    }
}

// ============================================================================
// Internal types
// ============================================================================

struct Completion<S: Screen> {
    seq: u64,
    request: RequestDescriptor<S::Field>,
    result: Result<PageResult<S::Item>, ApiError>,
}

struct InFlight<S: Screen> {
    seq: u64,
    request: RequestDescriptor<S::Field>,
    handle: JoinHandle<()>,
}

struct LoadedPage<S: Screen> {
    request: RequestDescriptor<S::Field>,
    full: bool,
}

enum Wake<S: Screen> {
    Settled(String),
    Completed(Completion<S>),
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct PageCoordinator<S: Screen, A: ListApi<S>> {
    api: Arc<A>,
    options: CoordinatorOptions,
    store: FilterStore<S::Field>,
    search: Debouncer<String>,
    scroll: ScrollTracker,

    items: Vec<S::Item>,
    total: u64,
    page: u32,
    pages: u32,

    state: FetchState<S::Field>,
    loaded: Option<LoadedPage<S>>,
    in_flight: Option<InFlight<S>>,
    seq: u64,

    completion_tx: mpsc::Sender<Completion<S>>,
    completion_rx: mpsc::Receiver<Completion<S>>,
}

impl<S: Screen, A: ListApi<S>> PageCoordinator<S, A> {
    pub fn new(api: Arc<A>, options: CoordinatorOptions) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_BUFFER);
        Self {
            api,
            options: CoordinatorOptions {
                limit: options.limit.max(1),
                ..options
            },
            store: FilterStore::new(S::cascades()),
            search: Debouncer::new(options.search_debounce, String::new()),
            scroll: ScrollTracker::new(options.scroll_threshold_px),
            items: Vec::new(),
            total: 0,
            page: 0,
            pages: 0,
            state: FetchState::default(),
            loaded: None,
            in_flight: None,
            seq: 0,
            completion_tx,
            completion_rx,
        }
    }

    // ------------------------------------------------------------------------
    // Observables
    // ------------------------------------------------------------------------

    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Last loaded page number; 0 before the first successful load.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn state(&self) -> &FetchState<S::Field> {
        &self.state
    }

    pub fn active_filter_count(&self) -> usize {
        self.store.active_count()
    }

    pub fn filters(&self) -> &FilterSpec<S::Field> {
        self.store.filters()
    }

    /// Raw search text as typed.
    pub fn search_text(&self) -> &str {
        self.store.search()
    }

    /// Search text as last settled by the debouncer.
    pub fn settled_search(&self) -> &str {
        self.search.current()
    }

    pub fn limit(&self) -> u32 {
        self.options.limit
    }

    pub fn scroll(&self) -> &ScrollTracker {
        &self.scroll
    }

    /// True when another page can be requested right now.
    pub fn has_more(&self) -> bool {
        self.next_page_request().is_some()
    }

    // ------------------------------------------------------------------------
    // Cascade option universes
    // ------------------------------------------------------------------------

    pub fn set_universe(&mut self, field: S::Field, options: Vec<FilterOption>) {
        self.store.set_universe(field, options);
    }

    pub fn allowed_values(&self, field: S::Field) -> Vec<&FilterOption> {
        self.store.allowed_values(field)
    }

    // ------------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------------

    /// Record typed search text. Nothing is fetched until it settles.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.store.set_search(text.clone());
        self.search.observe(text);
    }

    /// Merge filter edits; refetch page 1 if the filters changed.
    pub fn apply_filters(
        &mut self,
        patch: &FilterPatch<S::Field>,
    ) -> Result<Dispatch, FilterError> {
        if !self.store.apply(patch)? {
            return Ok(Dispatch::Skipped);
        }
        Ok(self.dispatch(self.first_page_request()))
    }

    /// Reset every filter and the search text, then load page 1.
    ///
    /// Always reloads, even when nothing was filtered, so the list returns to
    /// its first page.
    pub fn clear_filters(&mut self) -> Dispatch {
        self.store.clear();
        self.search.reset(String::new());
        tracing::debug!(screen = S::NAME, "Filters cleared");
        self.dispatch(self.first_page_request())
    }

    /// Fetch the page after the last loaded one, when there is one.
    pub fn load_more(&mut self) -> Dispatch {
        match self.next_page_request() {
            Some(request) => self.dispatch(request),
            None => Dispatch::Skipped,
        }
    }

    /// Refetch page 1 with the current filters and replace the list.
    pub fn refresh(&mut self) -> Dispatch {
        self.dispatch(self.first_page_request())
    }

    /// Feed a scroll position from the view; asks for the next page when the
    /// viewport is near the end of the content.
    pub fn on_scroll(
        &mut self,
        offset: f64,
        viewport_height: f64,
        content_height: f64,
    ) -> Dispatch {
        self.scroll.on_scroll(offset);
        if is_near_end(
            offset,
            viewport_height,
            content_height,
            self.options.end_threshold_px,
        ) {
            self.load_more()
        } else {
            Dispatch::Skipped
        }
    }

    /// Debounced search text settled.
    pub fn on_search_settled(&mut self, text: String) -> Dispatch {
        tracing::debug!(screen = S::NAME, search = %text, "Search settled");
        self.on_change()
    }

    /// Emit settled search text from a host-driven tick.
    pub fn poll_search(&mut self, now: Instant) -> Option<Dispatch> {
        let text = self.search.poll(now)?;
        Some(self.on_search_settled(text))
    }

    // ------------------------------------------------------------------------
    // Event loop integration
    // ------------------------------------------------------------------------

    /// Wait for the next settled search or fetch completion and apply it.
    ///
    /// Cancel-safe: dropping the future inside `select!` loses neither pending
    /// search text nor completions.
    pub async fn next_event(&mut self) -> CoordinatorEvent {
        let wake = tokio::select! {
            text = self.search.settled() => Wake::Settled(text),
            Some(done) = self.completion_rx.recv() => Wake::Completed(done),
        };
        match wake {
            Wake::Settled(text) => {
                let dispatch = self.on_search_settled(text.clone());
                CoordinatorEvent::SearchSettled { text, dispatch }
            }
            Wake::Completed(done) => self.complete(done),
        }
    }

    /// Apply every completion that has already arrived, without waiting.
    pub fn drain_completions(&mut self) -> Vec<CoordinatorEvent> {
        let mut events = Vec::new();
        while let Ok(done) = self.completion_rx.try_recv() {
            events.push(self.complete(done));
        }
        events
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    /// Classify `next` against the in-flight and last loaded requests.
    pub fn plan(&self, next: &RequestDescriptor<S::Field>) -> Transition {
        if self.in_flight.as_ref().is_some_and(|f| &f.request == next) {
            return Transition::Suppress;
        }
        match &self.loaded {
            Some(loaded)
                if next.is_filter_equivalent(&loaded.request)
                    && next.page == loaded.request.page + 1 =>
            {
                Transition::Append
            }
            _ => Transition::Reset,
        }
    }

    fn first_page_request(&self) -> RequestDescriptor<S::Field> {
        RequestDescriptor::build(
            self.store.filters(),
            self.search.current(),
            1,
            self.options.limit,
        )
    }

    fn next_page_request(&self) -> Option<RequestDescriptor<S::Field>> {
        if self.state.loading {
            return None;
        }
        let loaded = self.loaded.as_ref()?;
        if !loaded.full || loaded.request.page >= self.pages {
            return None;
        }
        // Filters moved on since this page loaded (and the reload failed)
        if !loaded.request.is_filter_equivalent(&self.first_page_request()) {
            return None;
        }
        Some(loaded.request.with_page(loaded.request.page + 1))
    }

    /// Filter or search change: fetch page 1 unless it is already what we have.
    fn on_change(&mut self) -> Dispatch {
        let request = self.first_page_request();
        let unchanged = self
            .state
            .last_descriptor
            .as_ref()
            .is_some_and(|last| last.is_filter_equivalent(&request));
        if unchanged && self.state.error.is_none() {
            tracing::trace!(screen = S::NAME, "Request unchanged, not refetching");
            return Dispatch::Skipped;
        }
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: RequestDescriptor<S::Field>) -> Dispatch {
        let request = match self.plan(&request) {
            Transition::Suppress => {
                tracing::debug!(
                    screen = S::NAME,
                    page = request.page,
                    "Identical request in flight, suppressed"
                );
                return Dispatch::Suppressed;
            }
            Transition::Reset => request.with_page(1),
            Transition::Append => request,
        };

        self.seq += 1;
        let seq = self.seq;
        let page = request.page;

        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(
                screen = S::NAME,
                superseded = previous.seq,
                seq = seq,
                "Superseding in-flight request"
            );
        }

        let api = Arc::clone(&self.api);
        let tx = self.completion_tx.clone();
        let task_request = request.clone();
        let handle = tokio::spawn(async move {
            let result = api.fetch_page(&task_request).await;
            let done = Completion {
                seq,
                request: task_request,
                result,
            };
            if tx.send(done).await.is_err() {
                tracing::debug!(seq = seq, "Completion dropped, coordinator gone");
            }
        });

        tracing::debug!(
            screen = S::NAME,
            seq = seq,
            page = page,
            search = %request.search,
            filters = request.filters.constrained_count(),
            "Dispatching page fetch"
        );

        self.in_flight = Some(InFlight {
            seq,
            request: request.clone(),
            handle,
        });
        self.state.loading = true;
        self.state.last_descriptor = Some(request);
        Dispatch::Issued { seq, page }
    }

    fn complete(&mut self, done: Completion<S>) -> CoordinatorEvent {
        let believed = self.in_flight.as_ref().map(|f| f.seq);
        if believed != Some(done.seq) {
            tracing::debug!(
                screen = S::NAME,
                seq = done.seq,
                latest = self.seq,
                "Discarding stale page response"
            );
            return CoordinatorEvent::StaleDiscarded { seq: done.seq };
        }

        self.in_flight = None;
        self.state.loading = false;
        let page = done.request.page;

        match done.result {
            Ok(result) => {
                let appended = page > 1;
                let received = result.items.len();
                let full = result.is_full(done.request.limit);
                if appended {
                    self.items.extend(result.items);
                } else {
                    self.items = result.items;
                }
                self.total = result.total;
                self.page = result.page;
                self.pages = result.pages;
                self.state.error = None;
                self.loaded = Some(LoadedPage {
                    request: done.request,
                    full,
                });
                tracing::debug!(
                    screen = S::NAME,
                    seq = done.seq,
                    page = page,
                    received = received,
                    loaded = self.items.len(),
                    total = self.total,
                    "Page loaded"
                );
                CoordinatorEvent::PageLoaded {
                    page,
                    appended,
                    received,
                }
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(
                    screen = S::NAME,
                    seq = done.seq,
                    page = page,
                    error = %error,
                    "Page fetch failed"
                );
                self.state.error = Some(error.clone());
                CoordinatorEvent::PageFailed { page, error }
            }
        }
    }
}

impl<S: Screen, A: ListApi<S>> Drop for PageCoordinator<S, A> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
            tracing::debug!(seq = in_flight.seq, "Aborted in-flight fetch on coordinator drop");
        }
    }
}
