//! Search results and pagination from the product search connection.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{JSON_STR, array_items, blocks, capture_u32, decode_json_str, find_block, pattern};
use crate::models::Product;

const CONNECTION_MARKER: &str = r#""productSearch":{"#;
const CONNECTION_TYPE: &str = r#""__typename":"ProductSearchConnection""#;
const EDGES_MARKER: &str = r#""edges":["#;
const PAGE_INFO_MARKER: &str = r#""pageInfo":{"#;

static NODE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r#""node":\{{"__typename":"Product","id":"[^"]*","name":"{JSON_STR}","tagline":"{JSON_STR}","slug":"{JSON_STR}""#
    ))
});
static REVIEWS: LazyLock<Regex> = LazyLock::new(|| pattern(r#""reviewsCount":(\d+)"#));
static LOGO: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r#""logoUuid":"{JSON_STR}""#)));
static PAGE: LazyLock<Regex> = LazyLock::new(|| pattern(r#""page":(\d+)"#));
static HAS_PREV: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#""hasPreviousPage":(true|false)"#));
static HAS_NEXT: LazyLock<Regex> = LazyLock::new(|| pattern(r#""hasNextPage":(true|false)"#));
static PAGES_COUNT: LazyLock<Regex> = LazyLock::new(|| pattern(r#""pagesCount":(\d+)"#));

/// Pagination reported alongside a search connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub pages_count: u32,
}

/// Search results in connection order, ranked by position.
///
/// The review count lands in `comment_count` and the logo identifier in
/// `thumbnail_url`.
pub fn search_records(raw: &str) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for connection in connections(raw) {
        let Some(edges) = find_block(connection, EDGES_MARKER) else {
            continue;
        };
        for edge in array_items(edges.inner) {
            let Some(mut product) = node_record(edge) else {
                continue;
            };
            if !seen.insert(product.slug.clone()) {
                continue;
            }
            product.rank = crate::reconcile::position_rank(products.len());
            products.push(product);
        }
    }

    products
}

/// Pagination of the first connection that reports it.
///
/// Page numbers and page counts below one are raised to one.
pub fn search_page_info(raw: &str) -> Option<PageInfo> {
    connections(raw).into_iter().find_map(page_info)
}

fn connections(raw: &str) -> Vec<&str> {
    blocks(raw, CONNECTION_MARKER)
        .into_iter()
        .map(|block| block.inner)
        .filter(|inner| inner.starts_with(CONNECTION_TYPE))
        .collect()
}

fn node_record(edge: &str) -> Option<Product> {
    let node = NODE.captures(edge)?;
    let record = &edge[node.get(0)?.start()..];

    let name = decode_json_str(&node[1]).trim().to_string();
    let slug = decode_json_str(&node[3]).trim().to_string();
    if name.is_empty() || slug.is_empty() {
        return None;
    }

    Some(Product {
        name,
        tagline: decode_json_str(&node[2]).trim().to_string(),
        comment_count: capture_u32(&REVIEWS, record),
        thumbnail_url: LOGO
            .captures(record)
            .map(|caps| decode_json_str(&caps[1]).trim().to_string())
            .unwrap_or_default(),
        slug,
        ..Product::default()
    })
}

fn page_info(connection: &str) -> Option<PageInfo> {
    let edges = find_block(connection, EDGES_MARKER)?;
    let rest = &connection[edges.end..];
    let info = find_block(rest, PAGE_INFO_MARKER)?;

    let page = PAGE.captures(info.inner)?[1].parse::<u32>().ok()?;
    let has_prev = &HAS_PREV.captures(info.inner)?[1] == "true";
    let has_next = &HAS_NEXT.captures(info.inner)?[1] == "true";
    let pages_count = capture_u32(&PAGES_COUNT, &rest[info.end..]);

    Some(PageInfo {
        page: page.max(1),
        has_prev,
        has_next,
        pages_count: pages_count.max(1),
    })
}
