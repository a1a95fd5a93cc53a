//! The orchestrator: URL, cache lookup, fetch, parse, cache store.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{CategoryPage, Period, Product, ProductDetail, SearchPage};
use crate::parse;
use crate::traits::{CacheControl, Fetcher, ProductSource, SearchableSource};
use crate::transport::HttpFetcher;

/// A reconciled result as stored in the cache.
#[derive(Debug, Clone)]
enum CachedPage {
    Leaderboard(Vec<Product>),
    Detail(Box<ProductDetail>),
    Category(CategoryPage),
    Search(SearchPage),
}

/// Moves a page result in and out of [`CachedPage`].
trait Cached: Sized {
    fn into_page(self) -> CachedPage;
    fn from_page(page: CachedPage) -> Option<Self>;
}

impl Cached for Vec<Product> {
    fn into_page(self) -> CachedPage {
        CachedPage::Leaderboard(self)
    }

    fn from_page(page: CachedPage) -> Option<Self> {
        match page {
            CachedPage::Leaderboard(products) => Some(products),
            _ => None,
        }
    }
}

impl Cached for ProductDetail {
    fn into_page(self) -> CachedPage {
        CachedPage::Detail(Box::new(self))
    }

    fn from_page(page: CachedPage) -> Option<Self> {
        match page {
            CachedPage::Detail(detail) => Some(*detail),
            _ => None,
        }
    }
}

impl Cached for CategoryPage {
    fn into_page(self) -> CachedPage {
        CachedPage::Category(self)
    }

    fn from_page(page: CachedPage) -> Option<Self> {
        match page {
            CachedPage::Category(category) => Some(category),
            _ => None,
        }
    }
}

impl Cached for SearchPage {
    fn into_page(self) -> CachedPage {
        CachedPage::Search(self)
    }

    fn from_page(page: CachedPage) -> Option<Self> {
        match page {
            CachedPage::Search(search) => Some(search),
            _ => None,
        }
    }
}

/// Product Hunt source with an in-memory cache keyed by request URL.
///
/// Clones share the cache, so one clone can clear what another filled.
#[derive(Clone)]
pub struct Scout<F = HttpFetcher> {
    fetcher: F,
    cache: Cache<CachedPage>,
    base_url: String,
}

impl Scout<HttpFetcher> {
    /// A scout over HTTP, configured by `config`.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Ok(Self::with_fetcher(
            HttpFetcher::from_config(config)?,
            &config.base_url,
        ))
    }
}

impl<F: Fetcher> Scout<F> {
    pub fn with_fetcher(fetcher: F, base_url: &str) -> Self {
        Self {
            fetcher,
            cache: Cache::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn leaderboard_url(&self, period: Period, date: NaiveDate) -> String {
        format!("{}{}", self.base_url, period.url_path(date))
    }

    pub fn product_url(&self, slug: &str) -> String {
        format!("{}/products/{}", self.base_url, slug.trim())
    }

    pub fn category_url(&self, slug: &str) -> String {
        format!("{}/categories/{}", self.base_url, slug.trim())
    }

    pub fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/search?q={}&page={}",
            self.base_url,
            urlencoding::encode(query.trim()),
            page.max(1)
        )
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Serves `url` from the cache, or fetches and parses it and caches the result.
    async fn cached_or_fetch<T, P>(&self, url: String, parse: P) -> Result<T>
    where
        T: Cached + Clone,
        P: FnOnce(&[u8]) -> Result<T>,
    {
        if let Some(hit) = self.cache.get(&url).and_then(T::from_page) {
            debug!("Cache hit for {url}");
            return Ok(hit);
        }

        let body = self.fetcher.fetch(&url).await?;
        let value = parse(&body).map_err(|e| e.at(&url))?;
        self.cache.put(url, value.clone().into_page());
        Ok(value)
    }
}

#[async_trait]
impl<F: Fetcher> ProductSource for Scout<F> {
    async fn get_leaderboard(&self, period: Period, date: NaiveDate) -> Result<Vec<Product>> {
        info!("Getting {period} leaderboard for {date}");
        let url = self.leaderboard_url(period, date);
        self.cached_or_fetch(url, parse::parse_leaderboard).await
    }

    async fn get_product_detail(&self, slug: &str) -> Result<ProductDetail> {
        let url = self.product_url(slug);
        let requested = slug.trim().to_string();
        self.cached_or_fetch(url, move |body| {
            let mut detail = parse::parse_product_detail(body)?;
            // Pages without a canonical link still belong to the requested product.
            if detail.product.slug.is_empty() {
                detail.product.slug = requested;
            }
            Ok(detail)
        })
        .await
    }

    async fn get_category_products(&self, slug: &str) -> Result<CategoryPage> {
        let url = self.category_url(slug);
        self.cached_or_fetch(url, parse::parse_category).await
    }

    fn as_searchable(&self) -> Option<&dyn SearchableSource> {
        Some(self)
    }

    fn as_cache_control(&self) -> Option<&dyn CacheControl> {
        Some(self)
    }
}

#[async_trait]
impl<F: Fetcher> SearchableSource for Scout<F> {
    async fn search_products_page(&self, query: &str, page: u32) -> Result<SearchPage> {
        let page = page.max(1);
        if query.trim().is_empty() {
            return Ok(SearchPage {
                current_page: page,
                has_prev_page: page > 1,
                ..SearchPage::default()
            });
        }

        let url = self.search_url(query, page);
        self.cached_or_fetch(url, |body| parse::parse_search_page(body, page))
            .await
    }
}

impl<F: Fetcher> CacheControl for Scout<F> {
    fn clear_cache(&self) {
        info!("Clearing {} cached results", self.cache.len());
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Barrier;

    use super::*;

    struct NoNetwork;

    #[async_trait]
    impl Fetcher for NoNetwork {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            panic!("unexpected fetch of {url}");
        }
    }

    fn scout() -> Scout<NoNetwork> {
        Scout::with_fetcher(NoNetwork, "https://www.producthunt.com/")
    }

    #[test]
    fn urls_follow_site_layout() {
        let scout = scout();
        let date = NaiveDate::from_ymd_opt(2025, 2, 18).unwrap();

        assert_eq!(
            scout.leaderboard_url(Period::Daily, date),
            "https://www.producthunt.com/leaderboard/daily/2025/2/18"
        );
        assert_eq!(
            scout.product_url("tanka"),
            "https://www.producthunt.com/products/tanka"
        );
        assert_eq!(
            scout.category_url("ai-agents"),
            "https://www.producthunt.com/categories/ai-agents"
        );
        assert_eq!(
            scout.search_url("note taking & docs", 0),
            "https://www.producthunt.com/search?q=note%20taking%20%26%20docs&page=1"
        );
    }

    #[tokio::test]
    async fn blank_search_does_not_fetch() {
        let scout = scout();
        let page = scout.search_products_page("   ", 2).await.unwrap();
        assert!(page.products.is_empty());
        assert_eq!(page.current_page, 2);
        assert!(scout.search_products("").await.unwrap().is_empty());
    }

    struct Rendezvous {
        barrier: Barrier,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for Rendezvous {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Both callers must be inside the fetch at once.
            self.barrier.wait().await;
            Ok(b"<html><body></body></html>".to_vec())
        }
    }

    #[tokio::test]
    async fn concurrent_misses_both_fetch() {
        let fetcher = Rendezvous {
            barrier: Barrier::new(2),
            fetches: AtomicUsize::new(0),
        };
        let scout = Scout::with_fetcher(fetcher, "https://ph.test");

        let (first, second) = tokio::join!(
            scout.get_category_products("ai"),
            scout.get_category_products("ai")
        );
        assert!(first.unwrap().products.is_empty());
        assert!(second.unwrap().products.is_empty());
        assert_eq!(scout.fetcher.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(scout.cache_len(), 1);
    }

    #[test]
    fn capabilities_are_offered() {
        let scout = scout();
        assert!(scout.as_searchable().is_some());
        assert!(scout.as_cache_control().is_some());
    }
}
