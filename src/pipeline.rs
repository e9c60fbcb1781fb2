// src/pipeline.rs

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info, instrument};
use url::Url;

use crate::collect::{self, Collector, RunSummary};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetch::{HttpFetcher, PageSource, PaginationDiscoverer};
use crate::process::{aggregate, AggregateRow, TableParser};
use crate::sink::{DocumentSink, WorkbookSink, ZipArchiveSink};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub header_mismatches: Vec<usize>,
    pub aggregate: Vec<AggregateRow>,
}

/// Landing fetch → collect → archive + workbook → aggregate → workbook.
pub struct Pipeline<S> {
    config: PipelineConfig,
    source: Arc<S>,
    base: Url,
    collector: Collector<S>,
}

impl Pipeline<HttpFetcher> {
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http).context("building HTTP client")?;
        Self::new(config, Arc::new(fetcher))
    }
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(config: PipelineConfig, source: Arc<S>) -> Result<Self> {
        config.validate()?;
        let base = config.base_url()?;
        let collector = Collector::new(Arc::clone(&source), base.clone())
            .with_discoverer(PaginationDiscoverer::new(&config.source.pagination_selector)?)
            .with_parser(TableParser::new(&config.source.table_selector)?)
            .with_max_in_flight(config.concurrency.max_in_flight)
            .with_fallback_to_landing(config.source.fallback_to_landing);
        Ok(Self {
            config,
            source,
            base,
            collector,
        })
    }

    #[instrument(level = "info", skip(self), fields(base = %self.base))]
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let landing = self
            .source
            .get_text(&self.base)
            .await
            .map_err(PipelineError::Discovery)?;

        let collection = match self.config.concurrency.run_timeout() {
            Some(limit) => timeout(limit, self.collector.collect(&landing))
                .await
                .map_err(|_| PipelineError::Timeout(limit))?,
            None => self.collector.collect(&landing).await,
        };
        let summary = collection.summary();
        summary.log();

        let out = &self.config.output;
        let mut archive = ZipArchiveSink::create(&out.archive_path)?;
        let mut workbook = WorkbookSink::new(out, &self.config.aggregate);
        collect::store(&collection, &mut archive, &mut workbook)?;

        let cols = &self.config.aggregate;
        let rows = aggregate(
            &collection.dataset,
            &cols.group_column,
            &cols.label_column,
            &cols.value_column,
        )
        .map_err(|e| {
            error!(error = %e, "aggregation aborted; dataset already written");
            e
        })?;
        workbook.write_aggregate(&rows)?;
        info!(groups = rows.len(), "aggregate complete");

        Ok(RunReport {
            summary,
            header_mismatches: collection.header_mismatches,
            aggregate: rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use crate::fetch::fake::FakeSite;
    use std::fs::File;
    use std::path::Path;
    use tempfile::tempdir;
    use umya_spreadsheet::reader;

    const BASE: &str = "http://nhl.test/pages/forms/";

    fn landing() -> String {
        r#"<html><body>
            <ul class="pagination">
                <li><a href="?page_num=1">1</a></li>
                <li><a href="?page_num=2">2</a></li>
                <li><a href="?page_num=3">3</a></li>
                <li><a href="?page_num=2" aria-label="Next">&raquo;</a></li>
            </ul></body></html>"#
            .to_string()
    }

    fn page(rows: &[(&str, &str, &str)]) -> Result<String, u16> {
        let mut html = String::from(
            r#"<table class="table"><tr><th>Team Name</th><th>Year</th><th>Wins</th></tr>"#,
        );
        for (team, year, wins) in rows {
            html.push_str(&format!(
                "<tr><td>{team}</td><td>{year}</td><td>{wins}</td></tr>"
            ));
        }
        html.push_str("</table>");
        Ok(html)
    }

    fn config(dir: &Path) -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.source.base_url = BASE.to_string();
        cfg.output = OutputConfig {
            archive_path: dir.join("out").join("scraped_pages.zip"),
            workbook_path: dir.join("out").join("NHL_Stats.xlsx"),
            ..OutputConfig::default()
        };
        cfg
    }

    fn site(page2: Result<String, u16>) -> FakeSite {
        FakeSite::default()
            .page(BASE, 0, Ok(landing()))
            .page(
                &format!("{BASE}?page_num=1"),
                20,
                page(&[
                    ("Boston Bruins", "1990", "44"),
                    ("Buffalo Sabres", "1990", "31"),
                ]),
            )
            .page(&format!("{BASE}?page_num=2"), 0, page2)
            .page(
                &format!("{BASE}?page_num=3"),
                5,
                page(&[("Detroit Red Wings", "1991", "34")]),
            )
    }

    #[tokio::test]
    async fn end_to_end_writes_archive_and_both_sheets() {
        let tmp = tempdir().unwrap();
        let cfg = config(tmp.path());
        let pipeline = Pipeline::new(
            cfg.clone(),
            Arc::new(site(page(&[("Calgary Flames", "1991", "46")]))),
        )
        .unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.summary.discovered, 3);
        assert_eq!(report.summary.parsed, 3);
        assert_eq!(report.summary.rows, 4);
        assert_eq!(
            report.aggregate,
            vec![
                AggregateRow {
                    group: "1990".into(),
                    winner_label: "Boston Bruins".into(),
                    winner_value: 44,
                    loser_label: "Buffalo Sabres".into(),
                    loser_value: 31,
                },
                AggregateRow {
                    group: "1991".into(),
                    winner_label: "Calgary Flames".into(),
                    winner_value: 46,
                    loser_label: "Detroit Red Wings".into(),
                    loser_value: 34,
                },
            ]
        );

        let zip = zip::ZipArchive::new(File::open(&cfg.output.archive_path).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);

        let book = reader::xlsx::read(&cfg.output.workbook_path).unwrap();
        let data = book.get_sheet_by_name(&cfg.output.dataset_sheet).unwrap();
        assert_eq!(data.get_value((1u32, 1u32)), "Team Name");
        assert_eq!(data.get_value((1u32, 4u32)), "Calgary Flames");
        let agg = book.get_sheet_by_name(&cfg.output.aggregate_sheet).unwrap();
        assert_eq!(agg.get_value((2u32, 3u32)), "Calgary Flames");
    }

    #[tokio::test]
    async fn failed_page_is_summarised_and_run_continues() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(config(tmp.path()), Arc::new(site(Err(502)))).unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.summary.parsed, 2);
        assert_eq!(report.summary.failures.len(), 1);
        assert_eq!(report.summary.failures[0].url, format!("{BASE}?page_num=2"));
        assert_eq!(report.aggregate.len(), 2);
        assert_eq!(report.aggregate[1].winner_label, "Detroit Red Wings");
    }

    #[tokio::test]
    async fn unreachable_landing_page_aborts() {
        let tmp = tempdir().unwrap();
        let cfg = config(tmp.path());
        let pipeline = Pipeline::new(cfg.clone(), Arc::new(FakeSite::default())).unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Discovery(ref e) if e.url == BASE));
        assert!(!cfg.output.archive_path.exists());
        assert!(!cfg.output.workbook_path.exists());
    }

    #[tokio::test]
    async fn aggregation_failure_keeps_dataset_sheet() {
        let tmp = tempdir().unwrap();
        let mut cfg = config(tmp.path());
        cfg.aggregate.value_column = "Losses".to_string();
        let pipeline = Pipeline::new(cfg.clone(), Arc::new(site(Err(500)))).unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Aggregate(_)));

        let book = reader::xlsx::read(&cfg.output.workbook_path).unwrap();
        assert!(book.get_sheet_by_name(&cfg.output.dataset_sheet).is_some());
        assert!(book.get_sheet_by_name(&cfg.output.aggregate_sheet).is_none());
    }

    #[tokio::test]
    async fn slow_collection_times_out() {
        let tmp = tempdir().unwrap();
        let mut cfg = config(tmp.path());
        cfg.concurrency.run_timeout_secs = Some(1);
        let slow = FakeSite::default()
            .page(BASE, 0, Ok(landing()))
            .page(&format!("{BASE}?page_num=1"), 10_000, page(&[]));
        let pipeline = Pipeline::new(cfg.clone(), Arc::new(slow)).unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
        assert!(!cfg.output.workbook_path.exists());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.source.pagination_selector = "ul[".to_string();
        assert!(Pipeline::new(cfg, Arc::new(FakeSite::default())).is_err());
    }
}
