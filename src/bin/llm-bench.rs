#[path = "llm-bench/args.rs"]
mod args;
#[path = "llm-bench/logging.rs"]
mod logging;

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use llm_bench::benchmark::Benchmark;
use llm_bench::config::load_config;
use llm_bench::BenchError;

use args::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    logging::init_logging(&args.log_level)?;

    let mut config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(results) = args.results {
        config.results_file = results;
    }
    if let Some(diagnostics) = args.diagnostics {
        config.diagnostics_file = diagnostics;
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, finishing current request");
            on_signal.cancel();
        }
    });

    let started = Instant::now();
    let bench = Benchmark::new(config)
        .with_cancellation(cancel)
        .show_progress(!args.quiet);
    let outcome = bench.run().await;
    println!(
        "Total execution time took {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    match outcome {
        Ok(results) => {
            log::info!(
                "{} results written to {}",
                results.len(),
                bench.config().results_file.display()
            );
            Ok(())
        }
        Err(BenchError::Cancelled) => {
            log::warn!("benchmark cancelled, partial results kept");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
