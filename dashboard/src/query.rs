use serde::{Deserialize, Serialize};

/// Rows shown per page. Mirrors the server's default `limit`.
pub const PAGE_SIZE: u64 = 50;

/// A blockchain address attached to a sanctioned entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionedAddress {
    pub address: String,
    pub chain: String,
    /// Listing date as reported upstream; absent for some registry rows.
    #[serde(default, rename = "date")]
    pub listed_date: Option<String>,
}

/// A sanctioned party as received from the registry. Immutable snapshot;
/// nothing client-side ever mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionedEntity {
    pub entity_id: String,
    pub name: String,
    pub program: String,
    pub authority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opencorporates_search_url: Option<String>,
    #[serde(default)]
    pub addresses: Vec<SanctionedAddress>,
}

/// One accepted page of results. `total` is the authoritative row count for
/// page-bound math; legacy servers that return a bare array get
/// `total = items.len()`, which under-reports and collapses navigation to
/// the current page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    pub items: Vec<SanctionedEntity>,
    pub total: u64,
}

/// The committed filter set plus the live input echo.
///
/// `raw_search` tracks every keystroke; `committed_search` only moves when
/// the debounce quiet period elapses. Any change to the committed text or
/// the authority lands back on page 0.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub raw_search: String,
    pub committed_search: String,
    /// Empty string selects all authorities.
    pub authority: String,
    pub page_index: u64,
    pub page_size: u64,
}

impl QueryState {
    pub fn new(page_size: u64) -> Self {
        Self {
            raw_search: String::new(),
            committed_search: String::new(),
            authority: String::new(),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Pages needed to cover `total` rows. Zero when there are no rows;
    /// presentation clamps to 1 for the "Page x of y" label.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }

    /// Accept the debounced text into authoritative state. Returns whether
    /// anything observable changed, i.e. whether a fetch is due.
    pub fn commit_search(&mut self) -> bool {
        let changed = self.committed_search != self.raw_search || self.page_index != 0;
        self.committed_search = self.raw_search.clone();
        self.page_index = 0;
        changed
    }

    /// Select an authority filter (empty string clears it). Returns whether
    /// a fetch is due.
    pub fn select_authority(&mut self, authority: String) -> bool {
        let changed = self.authority != authority || self.page_index != 0;
        self.authority = authority;
        self.page_index = 0;
        changed
    }

    /// Advance one page if a next page exists under `total` and nothing is
    /// in flight. Out-of-bound calls change nothing and trigger nothing.
    pub fn next_page(&mut self, total: u64, loading: bool) -> bool {
        let pages = self.total_pages(total);
        if loading || pages == 0 || self.page_index + 1 >= pages {
            return false;
        }
        self.page_index += 1;
        true
    }

    /// Step back one page if not already on the first and nothing is in
    /// flight.
    pub fn prev_page(&mut self, loading: bool) -> bool {
        if loading || self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Query-string pairs for `/risk/sanctions/latest`. Empty filters are
    /// omitted entirely rather than sent as empty values.
    pub fn request_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.page_size.to_string()),
            ("offset", (self.page_index * self.page_size).to_string()),
        ];
        if !self.committed_search.is_empty() {
            params.push(("search", self.committed_search.clone()));
        }
        if !self.authority.is_empty() {
            params.push(("authority", self.authority.clone()));
        }
        params
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}
