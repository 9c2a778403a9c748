use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use philosophers::config::{DEFAULT_MEALS, DEFAULT_PHILOSOPHERS};
use philosophers::{Dinner, DinnerConfig, RandomDelay, StdoutObserver};

#[derive(Parser)]
#[command(name = "philosophers")]
#[command(version)]
#[command(about = "Dining philosophers with a single acquisition gate")]
struct Cli {
    /// Number of philosophers (and forks) around the table
    #[arg(short = 'n', long, default_value_t = DEFAULT_PHILOSOPHERS)]
    philosophers: usize,

    /// Meals each philosopher eats before leaving
    #[arg(short, long, default_value_t = DEFAULT_MEALS)]
    meals: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 標準出力は哲学者の実況に使うので、ログは標準エラーへ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DinnerConfig::new(cli.philosophers, cli.meals);

    let dinner = Dinner::start(
        &config,
        Arc::new(RandomDelay::default()),
        Arc::new(StdoutObserver::new(config.meals)),
    )
    .context("failed to seat the philosophers")?;

    // Ctrl-C で全員を止める。フォークはガードの drop で返る
    let canceller = dinner.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted");
            canceller.cancel_all();
        }
    });

    let report = dinner.run().await.context("dinner failed")?;
    println!("{report}");

    if !report.all_done() {
        bail!(
            "dinner interrupted, cancelled philosophers: {:?}",
            report.cancelled()
        );
    }
    Ok(())
}
