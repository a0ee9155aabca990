use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration};
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::fetch::{FetchError, SanctionsBackend};
use crate::filters::FilterCatalog;
use crate::metrics;
use crate::query::{QueryState, ResultPage, SanctionedEntity, PAGE_SIZE};

/// User intents, as delivered by the presentation layer. Raw text edits are
/// the only event that does not immediately touch committed state.
#[derive(Debug, Clone)]
pub enum ExplorerEvent {
    SearchInput(String),
    /// Empty string selects all authorities.
    AuthoritySelected(String),
    NextPage,
    PrevPage,
}

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub debounce: Duration,
    pub page_size: u64,
}

impl ExplorerConfig {
    /// Env-tunable knobs: `SEARCH_DEBOUNCE_MS` (default 500) and
    /// `SEARCH_PAGE_SIZE` (default 50).
    pub fn from_env() -> Self {
        let debounce_ms: u64 = std::env::var("SEARCH_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);
        let page_size: u64 = std::env::var("SEARCH_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(PAGE_SIZE);
        Self {
            debounce: Duration::from_millis(debounce_ms),
            page_size: page_size.max(1),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            page_size: PAGE_SIZE,
        }
    }
}

/// Snapshot published after every state transition. The presentation layer
/// only ever reads these; it never reaches into the coordinator.
#[derive(Debug, Clone, Default)]
pub struct ExplorerView {
    pub raw_search: String,
    pub committed_search: String,
    pub authority: String,
    pub page_index: u64,
    pub page_size: u64,
    pub total: u64,
    pub items: Vec<SanctionedEntity>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub authorities: Vec<String>,
}

impl ExplorerView {
    /// Pages covering `total`; zero when there are no results.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    /// Page count for the "Page x of y" label, which never shows "of 0".
    pub fn display_total_pages(&self) -> u64 {
        self.total_pages().max(1)
    }
}

enum Internal {
    Fetched {
        epoch: u64,
        result: Result<ResultPage, FetchError>,
    },
    Catalog(FilterCatalog),
}

/// Single owner of query state, the request epoch, the filter catalog and
/// the latest accepted page. All mutation flows through its event inbox.
struct Explorer {
    query: QueryState,
    page: ResultPage,
    loading: bool,
    last_error: Option<FetchError>,
    epoch: u64,
    catalog: FilterCatalog,
    debouncer: Debouncer,
    backend: Arc<dyn SanctionsBackend>,
    internal_tx: mpsc::Sender<Internal>,
    view_tx: watch::Sender<ExplorerView>,
}

impl Explorer {
    fn on_event(&mut self, event: ExplorerEvent) {
        match event {
            ExplorerEvent::SearchInput(text) => {
                // The input echo updates immediately; only the settle timer
                // may promote it to committed state.
                self.query.raw_search = text;
                self.debouncer.touch();
            }
            ExplorerEvent::AuthoritySelected(authority) => {
                if self.query.select_authority(authority) {
                    self.dispatch();
                }
            }
            ExplorerEvent::NextPage => {
                if self.query.next_page(self.page.total, self.loading) {
                    self.dispatch();
                }
            }
            ExplorerEvent::PrevPage => {
                if self.query.prev_page(self.loading) {
                    self.dispatch();
                }
            }
        }
        self.publish();
    }

    fn on_debounce_fired(&mut self) {
        if !self.debouncer.take() {
            return;
        }
        metrics::inc_search_commit();
        if self.query.commit_search() {
            self.dispatch();
        }
        self.publish();
    }

    fn on_fetched(&mut self, epoch: u64, result: Result<ResultPage, FetchError>) {
        if epoch != self.epoch {
            // A newer request is already in flight or applied; last request
            // wins regardless of arrival order.
            metrics::inc_fetch_stale_dropped();
            debug!(
                target: "explorer",
                "dropped stale response: epoch {epoch}, current {}", self.epoch
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                metrics::set_results_total(page.total as f64);
                self.last_error = None;
                self.page = page;
            }
            Err(e) => {
                // Previous page stays on screen; the next user-driven state
                // change is the only retry.
                warn!(target: "explorer", "sanctions fetch failed: {e}");
                metrics::inc_fetch_failed(e.kind());
                self.last_error = Some(e);
            }
        }
        self.publish();
    }

    fn on_catalog(&mut self, catalog: FilterCatalog) {
        self.catalog = catalog;
        self.publish();
    }

    /// Issue a request for the current query snapshot under a fresh epoch.
    /// The loading flag flips synchronously, before any await.
    fn dispatch(&mut self) {
        self.epoch += 1;
        self.loading = true;
        metrics::inc_fetch_dispatched();
        let backend = self.backend.clone();
        let query = self.query.clone();
        let epoch = self.epoch;
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = backend.sanctions_page(&query).await;
            let _ = tx.send(Internal::Fetched { epoch, result }).await;
        });
    }

    fn publish(&self) {
        let view = ExplorerView {
            raw_search: self.query.raw_search.clone(),
            committed_search: self.query.committed_search.clone(),
            authority: self.query.authority.clone(),
            page_index: self.query.page_index,
            page_size: self.query.page_size,
            total: self.page.total,
            items: self.page.items.clone(),
            loading: self.loading,
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
            authorities: self.catalog.authorities().to_vec(),
        };
        let _ = self.view_tx.send(view);
    }
}

/// Run the explorer session until the event channel closes.
///
/// One logical thread: events, the debounce deadline and fetch completions
/// are multiplexed here, so every transition is applied in event order.
/// Fetches run as spawned tasks that report back with the epoch they were
/// dispatched under; the epoch gate in `on_fetched` stands in for request
/// cancellation.
pub async fn run(
    backend: Arc<dyn SanctionsBackend>,
    config: ExplorerConfig,
    mut events: mpsc::Receiver<ExplorerEvent>,
    view_tx: watch::Sender<ExplorerView>,
) -> Result<()> {
    let (internal_tx, mut internal_rx) = mpsc::channel(32);

    let mut explorer = Explorer {
        query: QueryState::new(config.page_size),
        page: ResultPage::default(),
        loading: false,
        last_error: None,
        epoch: 0,
        catalog: FilterCatalog::empty(),
        debouncer: Debouncer::new(config.debounce),
        backend: backend.clone(),
        internal_tx: internal_tx.clone(),
        view_tx,
    };

    // The catalog loads concurrently; search never waits on it.
    {
        let backend = backend.clone();
        let tx = internal_tx.clone();
        tokio::spawn(async move {
            let catalog = FilterCatalog::load(backend.as_ref()).await;
            let _ = tx.send(Internal::Catalog(catalog)).await;
        });
    }

    // Sessions open on the unfiltered first page.
    explorer.dispatch();
    explorer.publish();

    loop {
        let deadline = explorer.debouncer.deadline();
        let settle = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            maybe = events.recv() => match maybe {
                Some(event) => explorer.on_event(event),
                None => break, // presentation layer hung up; session over
            },
            _ = settle => explorer.on_debounce_fired(),
            Some(message) = internal_rx.recv() => match message {
                Internal::Fetched { epoch, result } => explorer.on_fetched(epoch, result),
                Internal::Catalog(catalog) => explorer.on_catalog(catalog),
            },
        }
    }

    Ok(())
}
