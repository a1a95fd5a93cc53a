use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use launch_scout::Period;

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse Product Hunt launches from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ranked launches for a day, week or month.
    Leaderboard(LeaderboardArgs),
    /// Full detail of one product.
    Product {
        /// Product slug, as in `/products/{slug}`.
        slug: String,
    },
    /// Products of a category plus related categories.
    Category {
        /// Category slug, as in `/categories/{slug}`.
        slug: String,
    },
    /// Search products by keyword.
    Search(SearchArgs),
    /// Print the leaderboard, then refresh it on the cache-clear schedule.
    Watch {
        #[arg(long, default_value_t = Period::Daily)]
        period: Period,
    },
}

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// daily, weekly or monthly.
    #[arg(long, default_value_t = Period::Daily)]
    pub period: Period,

    /// Any date inside the period (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    /// Fetch only this result page instead of walking all pages.
    #[arg(long)]
    pub page: Option<u32>,
}
