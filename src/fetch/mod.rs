// src/fetch/mod.rs

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

pub mod http;
pub mod pagination;

pub use http::HttpFetcher;
pub use pagination::PaginationDiscoverer;

/// Anything that can return the body of one URL. Implementations must be
/// safe to call concurrently and must not retry.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn get_text(&self, url: &Url) -> Result<String, FetchError>;
}

/// One fetched listing page, numbered by discovery order starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub seq: usize,
    pub url: Url,
    pub content: String,
}

/// Fetch `url` once and tag the body with its sequence number.
pub async fn fetch_page<S>(source: &S, seq: usize, url: Url) -> Result<RawPage, FetchError>
where
    S: PageSource + ?Sized,
{
    let content = source.get_text(&url).await?;
    Ok(RawPage { seq, url, content })
}
