use prospect_finder_lib::{logger, cli::Cli, pipeline::Stage};
use prospect_finder_lib::{CancelToken, ColumnSelection, HttpFetcher, Pipeline, Report, SerpApiSearch};

use clap::Parser;
use std::error::Error;
use log::{error, info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    let cli = Cli::parse();
    info!("Starting Prospect Finder...");

    let config = cli.to_run_config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    info!(
        "Niche '{}': {} pages x {} results per query, {:.1}s delay, {} worker(s)",
        config.niche.trim(),
        config.pages_per_query,
        config.results_per_page,
        config.delay.as_secs_f64(),
        config.concurrency
    );

    let search = SerpApiSearch::with_endpoint(&config.api_key, &cli.search_endpoint)?;
    let fetcher = HttpFetcher::new()?;

    // Stops the run between requests; whatever was collected is still exported.
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current request...");
        handler_token.cancel();
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let report = Pipeline::new(&config, &search, &fetcher)?
        .with_cancel(cancel)
        .with_progress(|event| info!("[{:>3}%] {}", event.percent, event.message))
        .run();

    if report.prospects.is_empty() {
        info!("No results after filtering. Try widening the include/exclude filters.");
    } else {
        let selection = if cli.show_snippets {
            ColumnSelection::with_title_snippet()
        } else {
            ColumnSelection::default()
        };
        println!("{}", Report::table(&report.prospects, selection));
    }

    let stats = &report.stats;
    info!(
        "Searched {} queries ({} of {} pages failed), {} raw results, {} unique, {} candidates",
        stats.queries, stats.pages_failed, stats.pages_requested, stats.raw_results, stats.deduped, stats.candidates
    );
    if !report.failures.is_empty() {
        warn!("{} requests failed ({} searches, {} page fetches):",
            report.failures.len(),
            report.failures.iter().filter(|f| f.stage == Stage::Search).count(),
            stats.fetch_failures,
        );
        for failure in &report.failures {
            warn!("  {:?} {}: {}", failure.stage, failure.target, failure.message);
        }
    }
    if report.cancelled {
        warn!("Run was cancelled; results are partial.");
    }

    Report::write_csv(&report.prospects, &cli.output)?;
    info!("Done! Collected {} prospects.", report.prospects.len());

    Ok(())
}
