//! Category page product cards and related-category links.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{
    Strategy, closest_ancestor, first_match, first_text, normalize_product_slug, parent_element,
    review_count_in, secondary_text, selector, text_of,
};
use crate::models::{CategoryLink, Product};

static GRID_CARD: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[data-grid-span="1"][href^="/products/"]"#));
static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href^="/products/"]"#));
static SEMIBOLD: LazyLock<Selector> = LazyLock::new(|| selector("span.font-semibold"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static SECONDARY: LazyLock<Selector> = LazyLock::new(|| selector("span.text-secondary"));
static BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div,li,section,article"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static THUMBNAIL: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"img[data-test$="-thumbnail"]"#));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='canonical']"));
static CATEGORY_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[href^="/categories/"]"#));

const CATEGORIES_PREFIX: &str = "/categories/";

/// Query parameters that mark pagination, sorting or referral variants of a link.
const VARIANT_PARAMS: [&str; 3] = ["page", "order", "ref"];

const STRATEGIES: &[Strategy<Product>] = &[
    Strategy {
        name: "grid card",
        extract: grid_cards,
    },
    Strategy {
        name: "product link",
        extract: product_links,
    },
];

/// Category products in document order, unique by slug, unranked.
///
/// The review count of each card lands in `comment_count`.
pub fn category_products(document: &Html) -> Vec<Product> {
    first_match("category", document, STRATEGIES)
}

fn grid_cards(document: &Html) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for link in document.select(&GRID_CARD) {
        let slug = normalize_product_slug(link.value().attr("href").unwrap_or_default());
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }

        let mut name = first_text(link, &SEMIBOLD);
        if name.is_empty() {
            name = first_text(link, &SPAN);
        }
        if name.is_empty() {
            continue;
        }

        let review_count = closest_ancestor(link, &BLOCK).map_or(0, |row| review_count(row, &slug));

        seen.insert(slug.clone());
        products.push(Product {
            tagline: first_text(link, &SECONDARY),
            thumbnail_url: named_thumbnail(document, &name),
            comment_count: review_count,
            name,
            slug,
            ..Product::default()
        });
    }

    products
}

fn product_links(document: &Html) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for link in document.select(&PRODUCT_LINK) {
        let href = link.value().attr("href").unwrap_or_default();
        let slug = normalize_product_slug(href);
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }
        if href.contains("/reviews") || href.contains("?filter=") {
            continue;
        }

        // Shorter labels are icons or badges.
        let name = text_of(link);
        if name.chars().count() < 2 {
            continue;
        }

        let tagline = closest_ancestor(link, &BLOCK)
            .map(|card| secondary_text(card, &name))
            .unwrap_or_default();

        seen.insert(slug.clone());
        products.push(Product {
            name,
            tagline,
            slug,
            ..Product::default()
        });
    }

    products
}

/// "<N> reviews" from the exact reviews link of `slug`, looked up in `row`
/// and then in its parent.
fn review_count(row: ElementRef<'_>, slug: &str) -> u32 {
    let reviews_href = format!("/products/{slug}/reviews");
    let in_scope = |scope: ElementRef<'_>| {
        scope
            .select(&ANY_LINK)
            .filter(|a| a.value().attr("href") == Some(reviews_href.as_str()))
            .map(|a| review_count_in(&text_of(a)))
            .find(|&n| n > 0)
    };

    in_scope(row)
        .or_else(|| parent_element(row).and_then(in_scope))
        .unwrap_or(0)
}

fn named_thumbnail(document: &Html, name: &str) -> String {
    let marker = format!("{name}-thumbnail");
    document
        .select(&THUMBNAIL)
        .find(|img| img.value().attr("data-test") == Some(marker.as_str()))
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string()
}

/// Category links on the page other than the page's own category and its
/// paginated/sorted/referral variants, unique by slug.
pub fn related_categories(document: &Html) -> Vec<CategoryLink> {
    let current = document
        .select(&CANONICAL)
        .next()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| {
            href.find(CATEGORIES_PREFIX)
                .map(|idx| category_slug(&href[idx + CATEGORIES_PREFIX.len()..]))
        })
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut related = Vec::new();

    for link in document.select(&CATEGORY_LINK) {
        let href = link.value().attr("href").unwrap_or_default();
        if is_variant_link(href) {
            continue;
        }

        let slug = category_slug(&href[CATEGORIES_PREFIX.len()..]);
        if slug.is_empty() || slug == current || seen.contains(&slug) {
            continue;
        }

        let name = text_of(link);
        if name.is_empty() {
            continue;
        }

        seen.insert(slug.clone());
        related.push(CategoryLink { name, slug });
    }

    related
}

fn category_slug(path: &str) -> String {
    path.split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_matches('/')
        .to_string()
}

fn is_variant_link(href: &str) -> bool {
    let Some((_, query)) = href.split_once('?') else {
        return false;
    };
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').any(|pair| {
        let key = pair.split('=').next().unwrap_or_default();
        VARIANT_PARAMS.contains(&key)
    })
}
