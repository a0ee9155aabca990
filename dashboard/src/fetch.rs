use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::query::{QueryState, ResultPage, SanctionedEntity};

/// One shared connection pool for every upstream call in the process.
static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Everything that can go wrong between dispatching a request and holding a
/// usable payload. All variants are absorbed at the coordinator boundary;
/// none propagate past it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request failed before a response body was obtained.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// A response arrived with a non-success status.
    #[error("server responded {0}")]
    Http(StatusCode),
    /// The body matches neither recognised payload shape.
    #[error("unrecognised response body: {0}")]
    Shape(#[from] serde_json::Error),
}

impl FetchError {
    /// Stable label for the failure counter.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Http(_) => "http",
            FetchError::Shape(_) => "shape",
        }
    }
}

/// The sanctions endpoints the explorer consumes. `ApiClient` is the real
/// implementation; tests script their own to control response ordering.
#[async_trait]
pub trait SanctionsBackend: Send + Sync {
    async fn sanctions_page(&self, query: &QueryState) -> Result<ResultPage, FetchError>;
    async fn authorities(&self) -> Result<Vec<String>, FetchError>;
}

/// `/risk/sanctions/latest` body. Current servers wrap rows with a count;
/// legacy ones return the rows bare, in which case the page length stands in
/// for the count.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SanctionsPayload {
    Paged {
        items: Vec<SanctionedEntity>,
        total: u64,
    },
    Legacy(Vec<SanctionedEntity>),
}

impl From<SanctionsPayload> for ResultPage {
    fn from(payload: SanctionsPayload) -> Self {
        match payload {
            SanctionsPayload::Paged { items, total } => ResultPage { items, total },
            SanctionsPayload::Legacy(items) => {
                // Inexact but the only count a bare array offers.
                let total = items.len() as u64;
                ResultPage { items, total }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FiltersPayload {
    #[serde(default)]
    authorities: Vec<String>,
}

/// Thin client over the upstream observability API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// GET a JSON body and decode it, keeping transport, status and decode
    /// failures distinguishable.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base, path);
        let resp = HTTP.get(&url).query(params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SanctionsBackend for ApiClient {
    async fn sanctions_page(&self, query: &QueryState) -> Result<ResultPage, FetchError> {
        let payload: SanctionsPayload = self
            .get_json("/risk/sanctions/latest", &query.request_params())
            .await?;
        Ok(payload.into())
    }

    async fn authorities(&self) -> Result<Vec<String>, FetchError> {
        let payload: FiltersPayload = self.get_json("/risk/filters", &[]).await?;
        Ok(payload.authorities)
    }
}
