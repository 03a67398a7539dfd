//! Relations panel: paged list of subgraph cards.
//!
//! Loads are split into [`RelationsPanel::begin_load`] and
//! [`RelationsPanel::finish_load`]. Each begin hands out a [`LoadTicket`] with
//! a fresh generation number; a response carrying an older generation is
//! dropped, so a slow page-2 answer cannot overwrite a newer page-3 one.

pub mod card;

pub use card::{RenderOutcome, SubgraphCard};

use crate::api::types::SubgraphPage;
use crate::api::{ApiClient, ApiError};

/// Source of subgraph pages. Implemented by [`ApiClient`].
#[allow(async_fn_in_trait)]
pub trait SubgraphSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<SubgraphPage, ApiError>;
}

impl SubgraphSource for ApiClient {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<SubgraphPage, ApiError> {
        self.fetch_subgraphs(page, page_size).await
    }
}

/// Page arithmetic for a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based current page.
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// `ceil(total / page_size)`.
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(self.total.div_ceil(size)).unwrap_or(u32::MAX)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }

    /// 1-based position of the `offset`-th item of the current page across all pages.
    pub fn global_index(&self, offset: usize) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize + offset + 1
    }

    /// Inverse of [`global_index`](Self::global_index): the page holding the
    /// 1-based `index` and its offset on that page. `None` for index 0 or a
    /// page number past `u32::MAX`.
    pub fn locate(&self, index: usize) -> Option<(u32, usize)> {
        let zero_based = index.checked_sub(1)?;
        let size = self.page_size.max(1) as usize;
        let page = u32::try_from(zero_based / size).ok()?.checked_add(1)?;
        Some((page, zero_based % size))
    }
}

/// Proof that a load was started; carries the generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub page: u32,
}

/// What happened to a load's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The fetch failed; prior data is untouched.
    Failed(String),
    /// A newer load was started after this one; the result was discarded.
    Stale,
}

#[derive(Debug)]
pub struct RelationsPanel {
    pagination: Pagination,
    cards: Vec<SubgraphCard>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    refresh_key: u64,
}

impl RelationsPanel {
    pub fn new(page_size: u32) -> Self {
        Self {
            pagination: Pagination::new(page_size),
            cards: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
            refresh_key: 0,
        }
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn cards(&self) -> &[SubgraphCard] {
        &self.cards
    }

    pub fn card_mut(&mut self, offset: usize) -> Option<&mut SubgraphCard> {
        self.cards.get_mut(offset)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    /// Start a load of `page` (clamped to at least 1). Supersedes any load in flight.
    pub fn begin_load(&mut self, page: u32) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        LoadTicket {
            generation: self.generation,
            page: page.max(1),
        }
    }

    /// Apply a load result if its ticket is still the latest.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SubgraphPage, ApiError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale subgraph page"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.pagination.page = ticket.page;
                self.pagination.total = page.total;
                let pagination = self.pagination;
                self.cards = page
                    .subgraphs
                    .into_iter()
                    .enumerate()
                    .map(|(offset, sg)| SubgraphCard::new(sg, pagination.global_index(offset)))
                    .collect();
                tracing::info!(
                    page = ticket.page,
                    total = self.pagination.total,
                    pages = self.pagination.total_pages(),
                    "subgraphs loaded"
                );
                LoadOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(page = ticket.page, error = %message, "failed to load subgraphs");
                self.error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Fetch and apply `page`.
    pub async fn load<S: SubgraphSource>(&mut self, source: &S, page: u32) -> LoadOutcome {
        let ticket = self.begin_load(page);
        let result = source.fetch_page(ticket.page, self.pagination.page_size).await;
        self.finish_load(ticket, result)
    }

    /// Go to the next page. `None` when already on the last page.
    pub async fn next<S: SubgraphSource>(&mut self, source: &S) -> Option<LoadOutcome> {
        let page = self.pagination.next_page()?;
        Some(self.load(source, page).await)
    }

    /// Go to the previous page. `None` when already on page 1.
    pub async fn prev<S: SubgraphSource>(&mut self, source: &S) -> Option<LoadOutcome> {
        let page = self.pagination.prev_page()?;
        Some(self.load(source, page).await)
    }

    /// Reload page 1 when `refresh_key` differs from the last one seen.
    pub async fn refresh<S: SubgraphSource>(
        &mut self,
        source: &S,
        refresh_key: u64,
    ) -> Option<LoadOutcome> {
        if refresh_key == self.refresh_key && self.generation > 0 {
            return None;
        }
        self.refresh_key = refresh_key;
        Some(self.load(source, 1).await)
    }
}
