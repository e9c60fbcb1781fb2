// src/collect.rs

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};
use tokio::{
    sync::Semaphore,
    task::{self, JoinSet},
    time::Instant,
};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{FetchError, ParseError, PipelineError, SinkError};
use crate::fetch::{fetch_page, PageSource, PaginationDiscoverer, RawPage};
use crate::process::{Dataset, Table, TableParser};
use crate::sink::{DocumentSink, RawArchiveSink};

/// What happened to one discovered page.
#[derive(Debug)]
pub enum PageOutcome {
    Parsed { page: RawPage, table: Table },
    Unparsed { page: RawPage, error: ParseError },
    FetchFailed { seq: usize, url: String, error: FetchError },
    /// The page's task panicked or was cancelled before producing an outcome.
    TaskFailed { seq: usize, url: String, reason: String },
}

impl PageOutcome {
    pub fn seq(&self) -> usize {
        match self {
            PageOutcome::Parsed { page, .. } | PageOutcome::Unparsed { page, .. } => page.seq,
            PageOutcome::FetchFailed { seq, .. } | PageOutcome::TaskFailed { seq, .. } => *seq,
        }
    }

    /// The fetched body, if the fetch succeeded.
    pub fn page(&self) -> Option<&RawPage> {
        match self {
            PageOutcome::Parsed { page, .. } | PageOutcome::Unparsed { page, .. } => Some(page),
            PageOutcome::FetchFailed { .. } | PageOutcome::TaskFailed { .. } => None,
        }
    }
}

/// Result of one `collect` call. Outcomes are sorted by sequence number.
#[derive(Debug)]
pub struct Collection {
    pub outcomes: Vec<PageOutcome>,
    pub dataset: Dataset,
    /// Pages whose header differs from the canonical (first parsed) one.
    pub header_mismatches: Vec<usize>,
}

impl Collection {
    pub fn discovered(&self) -> usize {
        self.outcomes.len()
    }

    pub fn parsed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::Parsed { .. }))
            .count()
    }

    pub fn pages(&self) -> impl Iterator<Item = &RawPage> {
        self.outcomes.iter().filter_map(PageOutcome::page)
    }

    pub fn summary(&self) -> RunSummary {
        let failures = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                PageOutcome::Parsed { .. } => None,
                PageOutcome::Unparsed { page, error } => Some(FailedPage {
                    seq: page.seq,
                    url: page.url.to_string(),
                    cause: error.to_string(),
                }),
                PageOutcome::FetchFailed { seq, url, error } => Some(FailedPage {
                    seq: *seq,
                    url: url.clone(),
                    cause: error.cause.to_string(),
                }),
                PageOutcome::TaskFailed { seq, url, reason } => Some(FailedPage {
                    seq: *seq,
                    url: url.clone(),
                    cause: reason.clone(),
                }),
            })
            .collect();
        RunSummary {
            discovered: self.discovered(),
            parsed: self.parsed(),
            rows: self.dataset.rows.len(),
            failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub seq: usize,
    pub url: String,
    pub cause: String,
}

/// Caller-visible report of a collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub parsed: usize,
    pub rows: usize,
    pub failures: Vec<FailedPage>,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            discovered = self.discovered,
            parsed = self.parsed,
            rows = self.rows,
            failed = self.failures.len(),
            "run summary"
        );
        for f in &self.failures {
            warn!(seq = f.seq, url = %f.url, cause = %f.cause, "page failed");
        }
    }
}

/// Discovers pages, fetches them all concurrently, parses each, and merges
/// rows in page order.
pub struct Collector<S> {
    source: Arc<S>,
    base: Url,
    discoverer: PaginationDiscoverer,
    parser: TableParser,
    limit: Option<Arc<Semaphore>>,
    fallback_to_landing: bool,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: Arc<S>, base: Url) -> Self {
        Self {
            source,
            base,
            discoverer: PaginationDiscoverer::default(),
            parser: TableParser::default(),
            limit: None,
            fallback_to_landing: true,
        }
    }

    pub fn with_discoverer(mut self, discoverer: PaginationDiscoverer) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn with_parser(mut self, parser: TableParser) -> Self {
        self.parser = parser;
        self
    }

    /// Bound the number of fetches in flight. `None` dispatches every page at once.
    pub fn with_max_in_flight(mut self, max: Option<NonZeroUsize>) -> Self {
        self.limit = max.map(|n| Arc::new(Semaphore::new(n.get())));
        self
    }

    pub fn with_fallback_to_landing(mut self, on: bool) -> Self {
        self.fallback_to_landing = on;
        self
    }

    #[instrument(level = "info", skip_all, fields(base = %self.base))]
    pub async fn collect(&self, landing: &str) -> Collection {
        let start = Instant::now();
        let hrefs = self.discoverer.discover(landing);
        info!(pages = hrefs.len(), "discovered page links");

        let mut outcomes = if hrefs.is_empty() && self.fallback_to_landing {
            info!("no pagination control; using landing page as page 1");
            let page = RawPage {
                seq: 1,
                url: self.base.clone(),
                content: landing.to_string(),
            };
            vec![parse_outcome(&self.parser, page)]
        } else {
            self.fetch_all(hrefs).await
        };
        outcomes.sort_by_key(PageOutcome::seq);

        let (dataset, header_mismatches) = merge(&outcomes);
        info!(
            rows = dataset.rows.len(),
            elapsed = ?start.elapsed(),
            "collection complete"
        );
        Collection {
            outcomes,
            dataset,
            header_mismatches,
        }
    }

    /// `collect`, then hand every fetched page to `archive` and the dataset
    /// to `document`. Sinks run only after all fetching and parsing is done.
    pub async fn collect_and_store(
        &self,
        landing: &str,
        archive: &mut dyn RawArchiveSink,
        document: &mut dyn DocumentSink,
    ) -> Result<Collection, PipelineError> {
        let collection = self.collect(landing).await;
        store(&collection, archive, document)?;
        Ok(collection)
    }

    /// One task per link; returns once every task has finished.
    async fn fetch_all(&self, hrefs: Vec<String>) -> Vec<PageOutcome> {
        let mut outcomes = Vec::with_capacity(hrefs.len());
        let mut tasks = JoinSet::new();
        // task id -> (seq, url), to attribute a panicked task to its page
        let mut pending: HashMap<task::Id, (usize, String)> = HashMap::new();

        for (i, href) in hrefs.into_iter().enumerate() {
            let seq = i + 1;
            let url = match self.base.join(&href) {
                Ok(u) => u,
                Err(e) => {
                    warn!(seq, href = %href, error = %e, "bad page link");
                    outcomes.push(PageOutcome::FetchFailed {
                        seq,
                        error: FetchError::new(href.as_str(), e),
                        url: href,
                    });
                    continue;
                }
            };

            let source = Arc::clone(&self.source);
            let parser = self.parser.clone();
            let limit = self.limit.clone();
            let page_url = url.to_string();
            let handle = tasks.spawn(async move {
                let _permit = match limit {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                debug!(seq, %url, "fetching");
                match fetch_page(source.as_ref(), seq, url.clone()).await {
                    Ok(page) => parse_outcome(&parser, page),
                    Err(error) => {
                        warn!(seq, %url, error = %error.cause, "fetch failed");
                        PageOutcome::FetchFailed {
                            seq,
                            url: url.to_string(),
                            error,
                        }
                    }
                }
            });
            pending.insert(handle.id(), (seq, page_url));
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    let Some((seq, url)) = pending.remove(&e.id()) else {
                        error!(error = %e, "unknown page task did not complete");
                        continue;
                    };
                    error!(seq, url = %url, error = %e, "page task did not complete");
                    outcomes.push(PageOutcome::TaskFailed {
                        seq,
                        url,
                        reason: e.to_string(),
                    });
                }
            }
        }
        outcomes
    }
}

/// Archive fetched pages in sequence order, then write the dataset.
pub fn store(
    collection: &Collection,
    archive: &mut dyn RawArchiveSink,
    document: &mut dyn DocumentSink,
) -> Result<(), SinkError> {
    for page in collection.pages() {
        archive.store_page(page.seq, &page.content)?;
    }
    archive.finish()?;
    document.write_dataset(&collection.dataset)
}

fn parse_outcome(parser: &TableParser, page: RawPage) -> PageOutcome {
    match parser.parse(&page.content) {
        Ok(table) => {
            debug!(seq = page.seq, rows = table.rows.len(), "parsed");
            PageOutcome::Parsed { page, table }
        }
        Err(error) => {
            warn!(seq = page.seq, url = %page.url, error = %error, "parse failed");
            PageOutcome::Unparsed { page, error }
        }
    }
}

/// Concatenate parsed rows in outcome order under the first parsed header.
fn merge(outcomes: &[PageOutcome]) -> (Dataset, Vec<usize>) {
    let mut headers: Option<&Vec<String>> = None;
    let mut rows = Vec::new();
    let mut mismatches = Vec::new();
    let mut ragged = 0usize;

    for outcome in outcomes {
        let PageOutcome::Parsed { page, table } = outcome else {
            continue;
        };
        match headers {
            None => headers = Some(&table.headers),
            Some(canon) if *canon != table.headers => {
                warn!(
                    seq = page.seq,
                    expected = ?canon,
                    found = ?table.headers,
                    "header differs from first page; appending rows unchanged"
                );
                mismatches.push(page.seq);
            }
            Some(_) => {}
        }
        let width = headers.map_or(0, Vec::len);
        ragged += table.rows.iter().filter(|r| r.len() != width).count();
        rows.extend(table.rows.iter().cloned());
    }

    if ragged > 0 {
        warn!(ragged, "rows whose cell count differs from the header");
    }
    let dataset = Dataset {
        headers: headers.cloned().unwrap_or_default(),
        rows,
    };
    (dataset, mismatches)
}
