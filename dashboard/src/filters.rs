use tracing::warn;

use crate::fetch::SanctionsBackend;
use crate::metrics;

/// The authority filter options, in server order. Loaded once per session;
/// a failed load leaves filtering unavailable without touching search.
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    authorities: Vec<String>,
}

impl FilterCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_authorities(authorities: Vec<String>) -> Self {
        Self { authorities }
    }

    /// One-shot catalog fetch. Errors degrade to an empty catalog; there is
    /// no scheduled retry.
    pub async fn load(backend: &dyn SanctionsBackend) -> Self {
        match backend.authorities().await {
            Ok(authorities) => {
                metrics::set_catalog_size(authorities.len() as f64);
                Self { authorities }
            }
            Err(e) => {
                warn!(target: "catalog", "authority catalog load failed: {e}");
                Self::empty()
            }
        }
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }

    /// Selectable values: the implicit all-authorities entry (empty string)
    /// followed by the server-provided list.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        std::iter::once("").chain(self.authorities.iter().map(String::as_str))
    }
}
