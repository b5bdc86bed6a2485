//! Patient list state: search, status filter, ordering and pagination.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::api::PatientApi;
use crate::config::ClientConfig;
use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use crate::error::{CoreError, Result};
use crate::events::ViewEvent;
use crate::model::{Page, Patient, PatientStatus};

/// Rows per page requested from the API.
pub const PAGE_SIZE: u32 = 10;

/// Sort orders the list view offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ordering {
    #[default]
    NewestFirst,
    OldestFirst,
    NameAscending,
    NameDescending,
}

impl Ordering {
    pub const ALL: [Ordering; 4] = [
        Ordering::NewestFirst,
        Ordering::OldestFirst,
        Ordering::NameAscending,
        Ordering::NameDescending,
    ];

    /// Value of the `ordering` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::NewestFirst => "-created_at",
            Ordering::OldestFirst => "created_at",
            Ordering::NameAscending => "last_name",
            Ordering::NameDescending => "-last_name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Ordering::NewestFirst => "Newest First",
            Ordering::OldestFirst => "Oldest First",
            Ordering::NameAscending => "Name A-Z",
            Ordering::NameDescending => "Name Z-A",
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ordering {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Ordering::ALL
            .into_iter()
            .find(|o| o.as_str() == s.trim())
            .ok_or_else(|| {
                CoreError::configuration(format!(
                    "Unknown ordering '{s}'. Valid: -created_at, created_at, last_name, -last_name"
                ))
            })
    }
}

/// Status filter: every status, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PatientStatus),
}

impl StatusFilter {
    pub fn status(&self) -> Option<PatientStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(*status),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Query for `GET /patients/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientQuery {
    pub page: u32,
    pub page_size: u32,
    pub name: Option<String>,
    pub status: Option<PatientStatus>,
    pub ordering: Ordering,
}

impl PatientQuery {
    /// Query-string pairs in a stable order; absent filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs.push(("ordering", self.ordering.as_str().to_string()));
        pairs
    }
}

/// One entry of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub active: bool,
}

/// Handed out when a fetch starts; the response is accepted only if no
/// newer fetch or query change happened in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub query: PatientQuery,
}

/// Owns the list view's filters and the page currently shown.
#[derive(Debug)]
pub struct PatientListController {
    page_size: u32,
    search_text: String,
    name_filter: Debouncer<String>,
    // effective name the page and generation were last reconciled with
    applied_name: String,
    status: StatusFilter,
    ordering: Ordering,
    page: u32,
    generation: u64,
    results: Option<Page<Patient>>,
    accepted: Option<PatientQuery>,
    stale: bool,
    scroll_to_top: bool,
}

impl PatientListController {
    pub fn new() -> Self {
        Self::with_debounce(DEFAULT_DEBOUNCE)
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            ..Self::with_debounce(config.search_debounce)
        }
    }

    pub fn with_debounce(delay: Duration) -> Self {
        Self {
            page_size: PAGE_SIZE,
            search_text: String::new(),
            name_filter: Debouncer::new(String::new(), delay),
            applied_name: String::new(),
            status: StatusFilter::All,
            ordering: Ordering::default(),
            page: 1,
            generation: 0,
            results: None,
            accepted: None,
            stale: true,
            scroll_to_top: false,
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// The name filter actually used in queries.
    pub fn effective_name(&self) -> String {
        self.name_filter.current().clone()
    }

    /// Watch the effective name filter; fires once per debounced update.
    pub fn subscribe_name_filter(&self) -> tokio::sync::watch::Receiver<String> {
        self.name_filter.subscribe()
    }

    pub fn status(&self) -> StatusFilter {
        self.status
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    /// The page the next fetch asks for. A debounced name change that has
    /// not been reconciled yet already counts as a return to page 1.
    pub fn page(&self) -> u32 {
        if self.name_settled() {
            self.page
        } else {
            1
        }
    }

    /// Update the search box. The effective filter follows after the quiet
    /// period; further input within it restarts the wait.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.name_filter.schedule(self.search_text.clone());
    }

    /// Commit the search box to the effective filter right away.
    pub fn apply_search_now(&mut self) {
        self.name_filter.publish_now(self.search_text.clone());
        self.sync_name();
    }

    /// Whether a typed search is still waiting out the quiet period.
    pub fn search_pending(&self) -> bool {
        self.name_filter.is_pending()
    }

    /// Changing a filter goes back to the first page.
    pub fn set_status(&mut self, status: StatusFilter) {
        self.sync_name();
        if self.status != status {
            self.status = status;
            self.page = 1;
            self.invalidate();
        }
    }

    pub fn set_ordering(&mut self, ordering: Ordering) {
        self.sync_name();
        if self.ordering != ordering {
            self.ordering = ordering;
            self.page = 1;
            self.invalidate();
        }
    }

    pub fn build_query(&self) -> PatientQuery {
        let name = self.effective_name();
        PatientQuery {
            page: self.page(),
            page_size: self.page_size,
            name: (!name.is_empty()).then_some(name),
            status: self.status.status(),
            ordering: self.ordering,
        }
    }

    /// Total rows reported by the last accepted page.
    pub fn total_count(&self) -> u64 {
        self.results.as_ref().map_or(0, |page| page.count)
    }

    pub fn total_pages(&self) -> u32 {
        pages_for(self.total_count(), self.page_size)
    }

    pub fn results(&self) -> Option<&Page<Patient>> {
        self.results.as_ref()
    }

    /// Navigate to `page`. Outside `[1, total_pages]` this is a no-op and
    /// returns false.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        self.sync_name();
        if page < 1 || page > self.total_pages() {
            return false;
        }
        if page != self.page {
            self.page = page;
            self.invalidate();
        }
        self.scroll_to_top = true;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.has_next() && self.go_to_page(self.page() + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.has_previous() && self.go_to_page(self.page() - 1)
    }

    pub fn has_previous(&self) -> bool {
        self.page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.page() < self.total_pages()
    }

    pub fn page_links(&self) -> Vec<PageLink> {
        let current = self.page();
        (1..=self.total_pages())
            .map(|number| PageLink {
                number,
                active: number == current,
            })
            .collect()
    }

    /// Returns true once after each accepted page change.
    pub fn take_scroll_to_top(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }

    /// Whether the shown page no longer matches the filters or the server.
    pub fn needs_fetch(&self) -> bool {
        self.stale || self.accepted.as_ref() != Some(&self.build_query())
    }

    /// Start a fetch for the current query. Any older ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.sync_name();
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            query: self.build_query(),
        }
    }

    /// Accept `page` if `ticket` is still the latest fetch. Returns false
    /// when the response was superseded and discarded.
    pub fn finish_fetch(&mut self, ticket: &FetchTicket, page: Page<Patient>) -> bool {
        self.sync_name();
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                latest = self.generation,
                "discarding superseded patient page"
            );
            return false;
        }
        self.accepted = Some(ticket.query.clone());
        self.results = Some(page);
        self.stale = false;
        true
    }

    /// Fetch and accept the current page.
    pub async fn refresh(&mut self, api: &dyn PatientApi) -> Result<bool> {
        let ticket = self.begin_fetch();
        let page = api.list_patients(&ticket.query).await?;
        Ok(self.finish_fetch(&ticket, page))
    }

    /// React to a view event; returns true when a refetch is needed.
    pub fn handle_event(&mut self, event: &ViewEvent) -> bool {
        self.sync_name();
        if event.affects_patient_list() {
            self.stale = true;
        }
        self.needs_fetch()
    }

    fn name_settled(&self) -> bool {
        *self.name_filter.current() == self.applied_name
    }

    /// The debouncer publishes from its own task, so a new effective name
    /// is picked up here: back to page 1 and any in-flight fetch is stale.
    fn sync_name(&mut self) {
        if self.name_settled() {
            return;
        }
        self.applied_name = self.effective_name();
        self.page = 1;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.stale = true;
        // a response for the old query must not land on the new one
        self.generation += 1;
    }
}

impl Default for PatientListController {
    fn default() -> Self {
        Self::new()
    }
}

/// `ceil(count / PAGE_SIZE)`.
pub fn total_pages(count: u64) -> u32 {
    pages_for(count, PAGE_SIZE)
}

fn pages_for(count: u64, page_size: u32) -> u32 {
    u32::try_from(count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}
