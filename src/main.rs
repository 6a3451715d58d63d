#![deny(clippy::all)]
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use image_search_downloader::cli::Cli;
use image_search_downloader::logging;
use image_search_downloader::progress::SharedProgressListener;
use image_search_downloader::progress_bars::IndicatifProgressHandler;
use image_search_downloader::{Extractor, Queue, RunSummary, SearchEngine, Shutdown};
use log::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if !args.logger {
        logging::init_stderr()?;
    }

    let query = args.search_query();
    if query.is_empty() {
        bail!("No keywords given");
    }

    let extra_engines = match &args.engine_config {
        Some(path) => SearchEngine::load_table(path).await?,
        None => Vec::new(),
    };
    let engine = SearchEngine::resolve(&args.engine, &extra_engines)?;
    let extractor = Extractor::new(engine, args.timeout())?;

    let dirname =
        Queue::resolve_output_dir(&query, &args.base_dir()?, args.precise_output.as_deref());
    let output = match Queue::prepare_output(dirname.clone()).await {
        Ok(output) => output,
        Err(error) => {
            print_results(&RunSummary {
                output_dir: dirname,
                ..Default::default()
            });
            return Err(error.into());
        }
    };

    // Opened after the counter was seeded so it never shifts this run's numbering.
    if args.logger {
        let log_path = logging::init_file(&output.path)?;
        debug!("Logging to {}", log_path.display());
        output.log_state();
    }

    let shutdown = Shutdown::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.trigger();
            }
        }
    });

    let progress_handler: SharedProgressListener = Arc::new(IndicatifProgressHandler::default());

    let qw = Queue::new(extractor, args.queue_opts(), Some(progress_handler))?
        .with_shutdown(shutdown);

    match qw.run(&query, &output).await {
        Ok(summary) => {
            print_results(&summary);
            Ok(())
        }
        Err(failure) => {
            print_results(&failure.partial);
            Err(failure.into())
        }
    }
}

fn print_results(summary: &RunSummary) {
    let (count, elapsed) = summary.totals();

    println!(
        "{} {} {}",
        count.to_string().bold().blue(),
        "images downloaded in".bold(),
        format!("{:.2} seconds", elapsed).bold().blue()
    );

    if summary.failed() > 0 {
        println!(
            "{} {}",
            summary.failed().to_string().bold().red(),
            "images failed to download.".bold().red()
        );
    }

    if summary.cancelled {
        println!("{}", "Download cancelled".bold().yellow());
    }

    debug!(
        "{} candidates rejected by extension, files saved to {}",
        summary.rejected(),
        summary.output_dir.display()
    );
}
