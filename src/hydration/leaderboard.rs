//! Leaderboard posts from the home-feed connection edges.
//!
//! Each edge wraps one post record shaped like
//!
//! ```text
//! {"__typename":"Post","id":"..","name":"..","slug":"..","tagline":"..",
//!  "product":{"__typename":"Product","id":"..","slug":"product-slug",..},
//!  "dailyRank":"3","weeklyRank":"12","monthlyRank":null,
//!  "topics":{"__typename":"TopicConnection","edges":[..]},
//!  "latestScore":512,"commentsCount":40,..}
//! ```
//!
//! The cache dump may hold the connection more than once; records are unique
//! by product slug across all copies.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{JSON_STR, array_items, blocks, capture_u32, decode_json_str, find_block, pattern};
use crate::models::Product;

const EDGES_MARKER: &str =
    r#""homefeedItems":{"__typename":"HomefeedItemConnection","edges":["#;
const TOPICS_MARKER: &str = r#""topics":{"__typename":"TopicConnection","edges":["#;

static POST: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r#""__typename":"Post","id":"[^"]*","name":"{JSON_STR}","slug":"[^"]*","tagline":"{JSON_STR}""#
    ))
});
static PRODUCT_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r#""product":\{{"__typename":"Product","id":"[^"]*","slug":"{JSON_STR}""#
    ))
});
static DAILY_RANK: LazyLock<Regex> = LazyLock::new(|| pattern(r#""dailyRank":"?(\d+)"#));
static WEEKLY_RANK: LazyLock<Regex> = LazyLock::new(|| pattern(r#""weeklyRank":"?(\d+)"#));
static MONTHLY_RANK: LazyLock<Regex> = LazyLock::new(|| pattern(r#""monthlyRank":"?(\d+)"#));
static SCORE: LazyLock<Regex> = LazyLock::new(|| pattern(r#""latestScore":(\d+)"#));
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| pattern(r#""commentsCount":(\d+)"#));
static TOPIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r#""name":"{JSON_STR}""#)));

/// Ranked leaderboard records found in the hydration payload.
///
/// Records without a product slug, a name or a positive rank are dropped.
pub fn leaderboard_records(raw: &str) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for edges in blocks(raw, EDGES_MARKER) {
        for edge in array_items(edges.inner) {
            let Some(product) = post_record(edge) else {
                continue;
            };
            if seen.insert(product.slug.clone()) {
                products.push(product);
            }
        }
    }

    products
}

fn post_record(edge: &str) -> Option<Product> {
    let post = POST.captures(edge)?;
    let record = &edge[post.get(0)?.start()..];

    let name = decode_json_str(&post[1]).trim().to_string();
    let tagline = decode_json_str(&post[2]).trim().to_string();
    let slug = PRODUCT_SLUG
        .captures(record)
        .map(|caps| decode_json_str(&caps[1]))
        .unwrap_or_default();
    if name.is_empty() || slug.is_empty() {
        return None;
    }

    let rank = [&DAILY_RANK, &WEEKLY_RANK, &MONTHLY_RANK]
        .into_iter()
        .map(|re| capture_u32(re, record))
        .find(|&rank| rank > 0)?;

    Some(Product {
        name,
        tagline,
        categories: topics(record),
        vote_count: capture_u32(&SCORE, record),
        comment_count: capture_u32(&COMMENTS, record),
        slug,
        thumbnail_url: String::new(),
        rank,
    })
}

fn topics(record: &str) -> Vec<String> {
    let Some(edges) = find_block(record, TOPICS_MARKER) else {
        return Vec::new();
    };
    TOPIC_NAME
        .captures_iter(edges.inner)
        .map(|caps| decode_json_str(&caps[1]).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(name: &str, slug: &str, daily: &str, weekly: &str, score: u32) -> String {
        format!(
            r#"{{"__typename":"HomefeedItemEdge","node":{{"__typename":"Post","id":"p-{slug}","name":"{name}","slug":"{slug}-launch","tagline":"Tagline of {slug}","product":{{"__typename":"Product","id":"x","slug":"{slug}"}},"dailyRank":{daily},"weeklyRank":{weekly},"monthlyRank":null,"topics":{{"__typename":"TopicConnection","edges":[{{"node":{{"__typename":"Topic","id":"1","name":"Developer Tools"}}}},{{"node":{{"__typename":"Topic","id":"2","name":"AI"}}}}]}},"latestScore":{score},"commentsCount":7}}}}"#
        )
    }

    fn payload(edges: &[String]) -> String {
        format!(
            r#"<script>{{"homefeedItems":{{"__typename":"HomefeedItemConnection","edges":[{}],"pageInfo":{{"__typename":"PageInfo","hasNextPage":false}}}}}}</script>"#,
            edges.join(",")
        )
    }

    #[test]
    fn extracts_post_fields() {
        let raw = payload(&[edge("Alpha", "alpha", r#""2""#, "null", 310)]);
        let records = leaderboard_records(&raw);

        assert_eq!(records.len(), 1);
        let p = &records[0];
        assert_eq!(p.name, "Alpha");
        assert_eq!(p.tagline, "Tagline of alpha");
        assert_eq!(p.slug, "alpha");
        assert_eq!(p.rank, 2);
        assert_eq!(p.vote_count, 310);
        assert_eq!(p.comment_count, 7);
        assert_eq!(p.categories, vec!["Developer Tools", "AI"]);
    }

    #[test]
    fn rank_priority_daily_weekly_monthly() {
        let raw = payload(&[
            edge("Weekly Only", "weekly-only", "null", r#""5""#, 1),
            edge("Both", "both", "3", "9", 1),
            edge("Unranked", "unranked", r#""0""#, "null", 1),
        ]);
        let ranks: Vec<_> = leaderboard_records(&raw)
            .into_iter()
            .map(|p| (p.slug, p.rank))
            .collect();
        assert_eq!(
            ranks,
            vec![("weekly-only".to_string(), 5), ("both".to_string(), 3)]
        );
    }

    #[test]
    fn escapes_are_decoded() {
        let raw = payload(&[edge(r"Caf\u00e9 & Co", "cafe", "1", "null", 1)]);
        assert_eq!(leaderboard_records(&raw)[0].name, "Café & Co");
    }

    #[test]
    fn repeated_connections_dedup_by_slug() {
        let first = payload(&[edge("Alpha", "alpha", "1", "null", 10)]);
        let second = payload(&[
            edge("Alpha", "alpha", "1", "null", 99),
            edge("Beta", "beta", "2", "null", 5),
        ]);
        let records = leaderboard_records(&format!("{first}{second}"));

        let slugs: Vec<_> = records.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);
        assert_eq!(records[0].vote_count, 10);
    }

    #[test]
    fn no_payload_no_records() {
        assert!(leaderboard_records("<html><body></body></html>").is_empty());
        assert!(leaderboard_records(r#""homefeedItems":{"__typename":"HomefeedItemConnection","edges":[{"#).is_empty());
    }
}
