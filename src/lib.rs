//! Product Hunt scraping library.
//!
//! [`Scout`] fetches leaderboard, product, category and search pages, reads
//! each one twice (rendered markup and the embedded hydration payload),
//! reconciles the two, and caches the typed result by request URL.

pub mod cache;
pub mod config;
pub mod error;
pub mod hydration;
pub mod markup;
pub mod models;
pub mod parse;
pub mod reconcile;
pub mod scout;
pub mod traits;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    CategoryLink, CategoryPage, Period, ProConTag, Product, ProductDetail, SearchPage,
};
pub use scout::Scout;
pub use traits::{CacheControl, Fetcher, ProductSource, SearchableSource};
pub use transport::HttpFetcher;
