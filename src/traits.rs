//! Traits for the data-access contract and its optional capabilities
//!
//! Front ends depend on [`ProductSource`] only. Search and cache control are
//! separate capabilities that a source may or may not offer; callers probe
//! for them through [`ProductSource::as_searchable`] and
//! [`ProductSource::as_cache_control`] and report "unsupported" otherwise.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CategoryPage, Period, Product, ProductDetail, SearchPage};
use crate::reconcile::position_rank;

/// Results per upstream search page; a shorter page is the last one.
pub const SEARCH_PAGE_SIZE: usize = 10;

/// Safety limit for the aggregate search walk.
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Issues a single GET and returns the raw body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// # Errors
    /// [`Error::Transport`] on network failure, [`Error::Status`] on any non-2xx response.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Required data-access contract.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Ranked leaderboard for the period containing `date`.
    async fn get_leaderboard(&self, period: Period, date: NaiveDate) -> Result<Vec<Product>>;

    async fn get_product_detail(&self, slug: &str) -> Result<ProductDetail>;

    /// Products of a category page in page order, plus related categories.
    async fn get_category_products(&self, slug: &str) -> Result<CategoryPage>;

    fn as_searchable(&self) -> Option<&dyn SearchableSource> {
        None
    }

    fn as_cache_control(&self) -> Option<&dyn CacheControl> {
        None
    }
}

/// Optional search capability.
#[async_trait]
pub trait SearchableSource: Send + Sync {
    /// One page of results; `page` below 1 is treated as 1.
    async fn search_products_page(&self, query: &str, page: u32) -> Result<SearchPage>;

    /// Walks result pages from 1 and returns every distinct product, ranked
    /// by aggregate position.
    ///
    /// Stops on an empty page, a page adding nothing new, a short page, a
    /// page without a next page, or after [`MAX_SEARCH_PAGES`]. An error on
    /// the first page is returned; a later failure ends the walk with what
    /// was collected so far.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut all: Vec<Product> = Vec::with_capacity(SEARCH_PAGE_SIZE);
        let mut seen = HashSet::new();

        for page in 1..=MAX_SEARCH_PAGES {
            let result = match self.search_products_page(query, page).await {
                Ok(result) => result,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!("Stopping search for '{query}' at page {page}: {e}");
                    break;
                }
            };

            let fetched = result.products.len();
            if fetched == 0 {
                break;
            }

            let mut added = 0;
            for product in result.products {
                if product.slug.is_empty() || !seen.insert(product.slug.clone()) {
                    continue;
                }
                let rank = position_rank(all.len());
                all.push(product.with_rank(rank));
                added += 1;
            }

            debug!("Search '{query}' page {page}: {fetched} results, {added} new");

            if added == 0 || fetched < SEARCH_PAGE_SIZE || !result.has_next_page {
                break;
            }
        }

        Ok(all)
    }
}

/// Optional cache administration capability.
pub trait CacheControl: Send + Sync {
    /// Drops every cached result at once.
    fn clear_cache(&self);
}

/// Fetches one search page, or [`Error::Unsupported`] if `source` cannot search.
pub async fn search_page(source: &dyn ProductSource, query: &str, page: u32) -> Result<SearchPage> {
    let searchable = source.as_searchable().ok_or(Error::Unsupported("search"))?;
    searchable.search_products_page(query, page).await
}

/// Aggregate search, or [`Error::Unsupported`] if `source` cannot search.
pub async fn search_all(source: &dyn ProductSource, query: &str) -> Result<Vec<Product>> {
    let searchable = source.as_searchable().ok_or(Error::Unsupported("search"))?;
    searchable.search_products(query).await
}

/// Clears the cache, or [`Error::Unsupported`] if `source` has none.
pub fn clear_cache(source: &dyn ProductSource) -> Result<()> {
    let control = source
        .as_cache_control()
        .ok_or(Error::Unsupported("cache clearing"))?;
    control.clear_cache();
    Ok(())
}
