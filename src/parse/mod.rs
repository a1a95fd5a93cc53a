//! Page parsers: raw body in, reconciled result out.
//!
//! Each parser runs the markup extractors over the DOM and the hydration
//! miners over the raw text, then hands both to [`crate::reconcile`]. An
//! empty or unrelated page parses to an empty result; only a body that is
//! not text at all, or a bot-challenge page, is an error.

use std::borrow::Cow;

use scraper::Html;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{CategoryPage, Product, ProductDetail, SearchPage};
use crate::traits::SEARCH_PAGE_SIZE;
use crate::{hydration, markup, reconcile};

/// A body is not text when more than one character in this many fails to decode.
const MAX_REPLACEMENT_SHARE: usize = 4;

/// Decodes the body and rejects bot-challenge interstitials.
///
/// Stray invalid UTF-8 bytes decode to U+FFFD. A body with NUL bytes, or
/// where more than a quarter of the characters fail to decode, is not text.
/// Errors carry an empty URL; the caller fills it in with [`Error::at`].
fn document_text(body: &[u8]) -> Result<Cow<'_, str>> {
    if body.contains(&0) {
        return Err(Error::Unparseable {
            url: String::new(),
            reason: "body contains NUL bytes".to_string(),
        });
    }

    let raw = String::from_utf8_lossy(body);
    if let Cow::Owned(decoded) = &raw {
        let total = decoded.chars().count();
        let replaced = decoded.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
        if replaced * MAX_REPLACEMENT_SHARE > total {
            return Err(Error::Unparseable {
                url: String::new(),
                reason: format!("{replaced} of {total} characters are not valid UTF-8"),
            });
        }
        debug!("Decoded body with {replaced} invalid UTF-8 sequences replaced");
    }

    if hydration::is_challenge_page(&raw) {
        return Err(Error::Blocked { url: String::new() });
    }
    Ok(raw)
}

/// # Errors
/// [`Error::Unparseable`] for a non-text body, [`Error::Blocked`] for a challenge page.
pub fn parse_leaderboard(body: &[u8]) -> Result<Vec<Product>> {
    let raw = document_text(body)?;

    let cards = markup::leaderboard_cards(&Html::parse_document(&raw));
    let mined = hydration::leaderboard_records(&raw);
    debug!(
        "Leaderboard: {} rendered cards, {} mined posts",
        cards.len(),
        mined.len()
    );

    let products = reconcile::leaderboard(cards, mined);
    info!("Parsed {} leaderboard products", products.len());
    Ok(products)
}

/// # Errors
/// [`Error::Unparseable`] for a non-text body, [`Error::Blocked`] for a challenge page.
pub fn parse_product_detail(body: &[u8]) -> Result<ProductDetail> {
    let raw = document_text(body)?;

    let rendered = markup::product_detail(&Html::parse_document(&raw));
    let mined = hydration::detail_records(&raw);

    let detail = reconcile::product_detail(rendered, mined);
    info!(
        "Parsed product detail '{}' ({} pro/con tags)",
        detail.product.slug,
        detail.pro_con_tags.len()
    );
    Ok(detail)
}

/// # Errors
/// [`Error::Unparseable`] for a non-text body, [`Error::Blocked`] for a challenge page.
pub fn parse_category(body: &[u8]) -> Result<CategoryPage> {
    let raw = document_text(body)?;
    let document = Html::parse_document(&raw);

    let page = CategoryPage {
        products: reconcile::category(markup::category_products(&document)),
        related: markup::related_categories(&document),
    };
    info!(
        "Parsed {} category products and {} related categories",
        page.products.len(),
        page.related.len()
    );
    Ok(page)
}

/// Search results of one page, without pagination.
///
/// # Errors
/// [`Error::Unparseable`] for a non-text body, [`Error::Blocked`] for a challenge page.
pub fn parse_search(body: &[u8]) -> Result<Vec<Product>> {
    let raw = document_text(body)?;
    Ok(search_products(&raw))
}

/// Search results of one page with its pagination.
///
/// Pagination comes from the hydration payload when present. Otherwise
/// `requested_page` is taken as current, a previous page exists past page 1,
/// a full page implies a next one, and the page count is unknown (0).
///
/// # Errors
/// [`Error::Unparseable`] for a non-text body, [`Error::Blocked`] for a challenge page.
pub fn parse_search_page(body: &[u8], requested_page: u32) -> Result<SearchPage> {
    let raw = document_text(body)?;
    let products = search_products(&raw);

    let page = match hydration::search_page_info(&raw) {
        Some(info) => SearchPage {
            current_page: info.page,
            has_prev_page: info.has_prev,
            has_next_page: info.has_next,
            pages_count: info.pages_count,
            products,
        },
        None => {
            debug!("Search page {requested_page}: no page info, deriving it");
            let requested_page = requested_page.max(1);
            SearchPage {
                current_page: requested_page,
                has_prev_page: requested_page > 1,
                has_next_page: products.len() >= SEARCH_PAGE_SIZE,
                pages_count: 0,
                products,
            }
        }
    };
    Ok(page)
}

fn search_products(raw: &str) -> Vec<Product> {
    let mined = hydration::search_records(raw);
    let cards = if mined.is_empty() {
        markup::search_cards(&Html::parse_document(raw))
    } else {
        Vec::new()
    };
    debug!(
        "Search: {} mined results, {} rendered cards",
        mined.len(),
        cards.len()
    );

    let products = reconcile::search(mined, cards);
    info!("Parsed {} search results", products.len());
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_PAGES: [&str; 3] = [
        "",
        "<!DOCTYPE html><html><head><title>Test</title></head><body></body></html>",
        "<html><body><p>Nothing to see</p><a href='/about'>About</a></body></html>",
    ];

    #[test]
    fn empty_pages_parse_to_empty_results() {
        for page in EMPTY_PAGES {
            let body = page.as_bytes();
            assert!(parse_leaderboard(body).unwrap().is_empty());
            assert_eq!(parse_product_detail(body).unwrap(), ProductDetail::default());
            assert_eq!(parse_category(body).unwrap(), CategoryPage::default());
            assert!(parse_search(body).unwrap().is_empty());
        }
    }

    #[test]
    fn nul_bytes_are_unparseable() {
        let err = parse_leaderboard(&[0xff, 0xfe, 0x00, 0xc3]).unwrap_err();
        assert!(matches!(err, Error::Unparseable { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn stray_latin1_byte_still_parses() {
        let mut body = br#"<html><body><section data-test="post-item-1">
            <a href="/products/cafe">Cafe</a>
            <span class="text-secondary">Caf"#
            .to_vec();
        body.push(0xe9);
        body.extend_from_slice(b" for teams</span></section></body></html>");

        let products = parse_leaderboard(&body).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].slug, "cafe");
        assert_eq!(products[0].rank, 1);
        assert_eq!(products[0].tagline, "Caf\u{fffd} for teams");
    }

    #[test]
    fn mostly_undecodable_body_is_unparseable() {
        let err = parse_search(&[0xc3, 0x28, 0xa0, 0xa1, b'<', 0xff]).unwrap_err();
        assert!(matches!(err, Error::Unparseable { .. }));
    }

    #[test]
    fn challenge_page_is_blocked_everywhere() {
        let body = br#"<html><head><title>Just a moment...</title></head>
            <body><div id="cf-challenge-running"></div></body></html>"#;
        assert!(parse_leaderboard(body).unwrap_err().is_blocked());
        assert!(parse_product_detail(body).unwrap_err().is_blocked());
        assert!(parse_category(body).unwrap_err().is_blocked());
        assert!(parse_search_page(body, 1).unwrap_err().is_blocked());
    }

    #[test]
    fn search_page_without_page_info_is_derived() {
        let body = br#"<main>
            <div><a href="/products/alpha">Alpha</a><p>First</p></div>
            <div><a href="/products/beta">Beta</a><p>Second</p></div>
        </main>"#;
        let page = parse_search_page(body, 3).unwrap();

        assert_eq!(page.products.len(), 2);
        assert_eq!(page.current_page, 3);
        assert!(page.has_prev_page);
        assert!(!page.has_next_page);
        assert_eq!(page.pages_count, 0);
    }
}
