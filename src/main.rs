use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Parser as _;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use launch_scout::traits::{clear_cache, search_all, search_page};
use launch_scout::{Config, Period, ProductSource, Scout};

mod cli;
mod logging;

use cli::{Cli, Command};

/// Leaderboard entries logged on each refresh in watch mode.
const WATCH_TOP: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init().context("init logging")?;

    let cli = Cli::parse();
    debug!(?cli, "parsed cli");

    let config = Config::from_env();
    let scout = Scout::from_config(&config).context("build http client")?;

    match cli.command {
        Command::Leaderboard(args) => {
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            let products = scout.get_leaderboard(args.period, date).await?;
            print_json(&products)?;
        }
        Command::Product { slug } => {
            let detail = scout.get_product_detail(&slug).await?;
            print_json(&detail)?;
        }
        Command::Category { slug } => {
            let page = scout.get_category_products(&slug).await?;
            print_json(&page)?;
        }
        Command::Search(args) => match args.page {
            Some(page) => print_json(&search_page(&scout, &args.query, page).await?)?,
            None => print_json(&search_all(&scout, &args.query).await?)?,
        },
        Command::Watch { period } => watch(scout, period, &config.cache_clear_cron).await?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize result")?;
    println!("{json}");
    Ok(())
}

/// Fetches today's leaderboard and logs the top entries.
async fn refresh(scout: &Scout, period: Period) -> launch_scout::Result<()> {
    let today = Local::now().date_naive();
    let products = scout.get_leaderboard(period, today).await?;

    info!("{period} leaderboard for {today}: {} products", products.len());
    for product in products.iter().take(WATCH_TOP) {
        info!(
            "#{} {} - {} ({} votes, {} comments)",
            product.rank, product.name, product.tagline, product.vote_count, product.comment_count
        );
    }
    Ok(())
}

/// Prints the leaderboard now, then clears the cache and refetches on every
/// tick of `cron` until a bot challenge or Ctrl-C stops it.
async fn watch(scout: Scout, period: Period, cron: &str) -> Result<()> {
    info!("Starting {period} leaderboard watch");

    match refresh(&scout, period).await {
        Err(e) if e.is_blocked() => return Err(e.into()),
        Err(e) => error!("Error during initial refresh: {e}"),
        Ok(()) => {}
    }

    let (stop_tx, mut stop_rx) = mpsc::channel::<launch_scout::Error>(1);
    let mut sched = JobScheduler::new().await?;

    let job_scout = scout.clone();
    sched
        .add(Job::new_async(cron, move |_uuid, _l| {
            let scout = job_scout.clone();
            let stop = stop_tx.clone();
            Box::pin(async move {
                if let Err(e) = clear_cache(&scout) {
                    warn!("Cache not cleared: {e}");
                }
                match refresh(&scout, period).await {
                    Ok(()) => {}
                    Err(e) if e.is_blocked() => {
                        let _ = stop.send(e).await;
                    }
                    Err(e) => error!("Error refreshing leaderboard: {e}"),
                }
            })
        })?)
        .await?;

    info!("Scheduler started - refreshing on '{cron}'");
    sched.start().await?;

    let outcome = tokio::select! {
        blocked = stop_rx.recv() => blocked.map_or(Ok(()), |e| Err(anyhow::Error::from(e))),
        signal = tokio::signal::ctrl_c() => {
            info!("Stopping watch");
            signal.context("listen for ctrl-c")
        }
    };

    sched.shutdown().await?;
    outcome
}
