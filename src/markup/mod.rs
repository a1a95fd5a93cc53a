//! DOM extraction for the four page types.
//!
//! Every extractor is defensive: a missing element yields an empty string,
//! zero or an empty list, never an error. Card extraction runs an ordered
//! list of [`Strategy`] values and keeps the first that finds anything, so a
//! new tier can be appended when upstream markup drifts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub mod category;
pub mod leaderboard;
pub mod product;
pub mod search;

pub use category::{category_products, related_categories};
pub use leaderboard::leaderboard_cards;
pub use product::{DetailMarkup, product_detail};
pub use search::search_cards;

/// The source site's own domain, excluded from social links.
pub const SITE_DOMAIN: &str = "producthunt.com";

const PRODUCTS_PREFIX: &str = "/products/";

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hardcoded selector is valid")
}

static TOPIC_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href^='/topics/']"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("video"));
static REVIEWS_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s*reviews?").expect("hardcoded regex is valid"));

/// One named way of finding cards on a page.
pub(crate) struct Strategy<T> {
    pub name: &'static str,
    pub extract: fn(&Html) -> Vec<T>,
}

/// Runs `strategies` in order and returns the first non-empty result.
pub(crate) fn first_match<T>(page: &str, document: &Html, strategies: &[Strategy<T>]) -> Vec<T> {
    for strategy in strategies {
        let found = (strategy.extract)(document);
        if !found.is_empty() {
            debug!(
                "{page}: '{}' strategy matched {} cards",
                strategy.name,
                found.len()
            );
            return found;
        }
    }
    debug!("{page}: no card strategy matched");
    Vec::new()
}

/// Trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first match of `sel` under `scope`, or empty.
pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(text_of).unwrap_or_default()
}

/// Nearest element matching `sel`, starting with `element` itself.
pub(crate) fn closest<'a>(element: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|candidate| sel.matches(candidate))
}

/// Nearest ancestor matching `sel`, excluding `element` itself.
pub(crate) fn closest_ancestor<'a>(
    element: ElementRef<'a>,
    sel: &Selector,
) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|candidate| sel.matches(candidate))
}

pub(crate) fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

pub(crate) fn prev_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

pub(crate) fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Parses "1,234" style counts; anything else is 0.
pub fn parse_count(text: &str) -> u32 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Number from "155 reviews" style text, or 0.
pub(crate) fn review_count_in(text: &str) -> u32 {
    REVIEWS_TEXT
        .captures(text)
        .map_or(0, |caps| parse_count(&caps[1]))
}

/// Product slug from a `/products/{slug}[/...][?...]` href, or empty.
pub fn normalize_product_slug(href: &str) -> String {
    let Some(rest) = href.trim().strip_prefix(PRODUCTS_PREFIX) else {
        return String::new();
    };
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    path.trim_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Non-empty topic link texts under `scope`, in document order.
pub(crate) fn topic_names(scope: ElementRef<'_>) -> Vec<String> {
    scope
        .select(&TOPIC_LINK)
        .map(text_of)
        .filter(|name| !name.is_empty())
        .collect()
}

/// First image `src`, falling back to the first video `poster`.
pub(crate) fn thumbnail(scope: ElementRef<'_>) -> String {
    let src = scope
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default();
    if !src.is_empty() {
        return src.to_string();
    }
    scope
        .select(&VIDEO)
        .next()
        .and_then(|video| video.value().attr("poster"))
        .unwrap_or_default()
        .to_string()
}

/// First `p`/`span` text in `card` that is neither the name nor a `#tag`.
pub(crate) fn secondary_text(card: ElementRef<'_>, name: &str) -> String {
    static CANDIDATES: LazyLock<Selector> = LazyLock::new(|| selector("p,span"));

    let name = name.trim().to_lowercase();
    card.select(&CANDIDATES)
        .map(text_of)
        .find(|text| !text.is_empty() && text.to_lowercase() != name && !text.starts_with('#'))
        .unwrap_or_default()
}
