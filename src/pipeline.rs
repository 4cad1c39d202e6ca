use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use log::{error, info, warn};
use crate::config::RunConfig;
use crate::dedupe::dedupe;
use crate::delay_manager;
use crate::error::ConfigError;
use crate::filter::FilterChain;
use crate::query_builder::build_queries;
use crate::scraper::{PageFetcher, ProspectRecord, SignalExtractor};
use crate::search_engine::{SearchProvider, SearchResult};

const SEARCH_SHARE: usize = 30;

/// Shared abort flag, checked between stages, before each request and while waiting.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Search,
    Extraction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// 0..30 while searching, 30..=100 while visiting pages. Never decreases.
    pub percent: u8,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Fetch,
}

/// A recoverable per-item failure, reported at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub stage: Stage,
    /// Query and page for searches, URL for fetches.
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub queries: usize,
    pub pages_requested: usize,
    pub pages_failed: usize,
    pub raw_results: usize,
    pub deduped: usize,
    pub candidates: usize,
    pub fetch_failures: usize,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// In filtered-candidate order.
    pub prospects: Vec<ProspectRecord>,
    pub failures: Vec<RunFailure>,
    pub stats: RunStats,
    pub cancelled: bool,
}

type ProgressFn<'a> = Box<dyn Fn(ProgressEvent) + Send + Sync + 'a>;

struct ProgressState {
    visited: usize,
    last_percent: u8,
}

/// Search, dedupe, filter, then visit every surviving candidate.
pub struct Pipeline<'a, S: SearchProvider + ?Sized, F: PageFetcher + ?Sized> {
    config: &'a RunConfig,
    provider: &'a S,
    fetcher: &'a F,
    progress: Option<ProgressFn<'a>>,
    cancel: CancelToken,
    state: Mutex<ProgressState>,
}

impl<'a, S: SearchProvider + ?Sized, F: PageFetcher + ?Sized> Pipeline<'a, S, F> {
    pub fn new(config: &'a RunConfig, provider: &'a S, fetcher: &'a F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Pipeline {
            config,
            provider,
            fetcher,
            progress: None,
            cancel: CancelToken::new(),
            state: Mutex::new(ProgressState { visited: 0, last_percent: 0 }),
        })
    }

    pub fn with_progress(mut self, callback: impl Fn(ProgressEvent) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        let raw = self.search_phase(&mut report);
        report.stats.raw_results = raw.len();
        if report.cancelled {
            info!("Run cancelled during search phase.");
            return report;
        }

        let unique = dedupe(raw);
        report.stats.deduped = unique.len();

        let mut chain = FilterChain::new(&self.config.filter);
        let candidates = chain.filter(unique);
        report.stats.candidates = candidates.len();
        info!(
            "{} raw results, {} unique, {} candidates after filtering",
            report.stats.raw_results, report.stats.deduped, report.stats.candidates
        );

        self.extraction_phase(&candidates, &mut report);

        if report.cancelled {
            info!("Run cancelled after {} of {} page visits.", report.prospects.len(), candidates.len());
        } else {
            info!("Run complete: {} prospects, {} failures.", report.prospects.len(), report.failures.len());
        }
        report
    }

    fn search_phase(&self, report: &mut RunReport) -> Vec<SearchResult> {
        let queries = build_queries(&self.config.niche);
        let pages = self.config.pages_per_query;
        let total = (queries.len() * pages).max(1);
        let mut results = Vec::new();
        let mut step = 0;

        for query in &queries {
            report.stats.queries += 1;
            for page in 0..pages {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    return results;
                }
                self.emit(
                    Phase::Search,
                    step * SEARCH_SHARE / total,
                    format!("Searching {} (page {}/{})", query, page + 1, pages),
                );

                report.stats.pages_requested += 1;
                match self.provider.search(query, page, self.config.results_per_page) {
                    Ok(found) => results.extend(found),
                    Err(e) => {
                        warn!("Search failed for '{}' page {}: {}", query, page + 1, e);
                        report.stats.pages_failed += 1;
                        report.failures.push(RunFailure {
                            stage: Stage::Search,
                            target: format!("{} (page {})", query, page + 1),
                            message: e.to_string(),
                        });
                    }
                }
                step += 1;

                if !delay_manager::request_delay(self.config.delay, &self.cancel) {
                    report.cancelled = true;
                    return results;
                }
            }
        }
        results
    }

    fn extraction_phase(&self, candidates: &[SearchResult], report: &mut RunReport) {
        if candidates.is_empty() {
            self.emit(Phase::Extraction, 100, "No candidates to visit".to_string());
            return;
        }

        let next = AtomicUsize::new(0);
        let workers = self.config.concurrency.clamp(1, candidates.len());
        let mut visited: Vec<(usize, ProspectRecord)> = if workers == 1 {
            self.visit_worker(candidates, &next)
        } else {
            info!("Visiting {} pages with {} workers", candidates.len(), workers);
            let next = &next;
            thread::scope(|s| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| s.spawn(move || self.visit_worker(candidates, next)))
                    .collect();
                let mut all = Vec::with_capacity(candidates.len());
                for handle in handles {
                    match handle.join() {
                        Ok(part) => all.extend(part),
                        Err(_) => error!("A page-visit worker panicked; its pages are missing."),
                    }
                }
                all
            })
        };

        visited.sort_by_key(|(idx, _)| *idx);
        report.cancelled = self.cancel.is_cancelled() && visited.len() < candidates.len();

        for (_, record) in visited {
            if let Some(reason) = &record.fetch_failure {
                report.stats.fetch_failures += 1;
                report.failures.push(RunFailure {
                    stage: Stage::Fetch,
                    target: record.url.clone(),
                    message: reason.to_string(),
                });
            }
            report.prospects.push(record);
        }
    }

    /// Claims candidate indices until none are left or the run is cancelled.
    fn visit_worker(&self, candidates: &[SearchResult], next: &AtomicUsize) -> Vec<(usize, ProspectRecord)> {
        let extractor = SignalExtractor::new(self.fetcher);
        let total = candidates.len();
        let mut out = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let idx = next.fetch_add(1, Ordering::SeqCst);
            if idx >= total {
                break;
            }

            out.push((idx, extractor.extract(&candidates[idx])));
            self.visit_done(total);

            if !delay_manager::request_delay(self.config.delay, &self.cancel) {
                break;
            }
        }
        out
    }

    fn visit_done(&self, total: usize) {
        let visited = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.visited += 1;
            state.visited
        };
        self.emit(
            Phase::Extraction,
            SEARCH_SHARE + visited * (100 - SEARCH_SHARE) / total,
            format!("Visiting {}/{}", visited, total),
        );
    }

    fn emit(&self, phase: Phase, percent: usize, message: String) {
        let Some(callback) = &self.progress else { return };
        // Held across the callback so concurrent visits report in order.
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let percent = (percent.min(100) as u8).max(state.last_percent);
        state.last_percent = percent;
        callback(ProgressEvent { phase, percent, message });
    }
}
