//! Launch date, AI pro/con tags and pricing mined from a detail page.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use super::{JSON_STR, decode_json_str, pattern};
use crate::models::ProConTag;

static FEATURED_AT: LazyLock<Regex> = LazyLock::new(|| pattern(r#""featuredAt":"([^"]+)""#));
static PRO_CON_TAG: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r#""__typename":"ReviewAiProConTag","id":"[^"]*","name":"{JSON_STR}","type":"(\w+)","count":(\d+)"#
    ))
});
static LD_JSON: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
});
static RAW_PRICE: LazyLock<Regex> = LazyLock::new(|| pattern(r#""price":(\d+)"#));

/// Detail fields only the hydration payload carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailHydration {
    pub launch_date: Option<DateTime<Utc>>,
    pub pro_con_tags: Vec<ProConTag>,
    pub pricing_info: String,
}

pub fn detail_records(raw: &str) -> DetailHydration {
    DetailHydration {
        launch_date: earliest_featured_at(raw),
        pro_con_tags: pro_con_tags(raw),
        pricing_info: lowest_price(raw).map(format_price).unwrap_or_default(),
    }
}

/// `0` is "Free", anything else is whole dollars.
pub fn format_price(price: u64) -> String {
    if price == 0 {
        "Free".to_string()
    } else {
        format!("${price}")
    }
}

/// The same launch shows up once per cached entity; the earliest wins.
fn earliest_featured_at(raw: &str) -> Option<DateTime<Utc>> {
    FEATURED_AT
        .captures_iter(raw)
        .filter_map(|caps| DateTime::parse_from_rfc3339(&caps[1]).ok())
        .map(|at| at.with_timezone(&Utc))
        .min()
}

fn pro_con_tags(raw: &str) -> Vec<ProConTag> {
    let mut tags: Vec<ProConTag> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for caps in PRO_CON_TAG.captures_iter(raw) {
        let name = decode_json_str(&caps[1]).trim().to_string();
        if name.is_empty() {
            continue;
        }
        let tag_type = caps[2].to_string();
        let count: u32 = caps[3].parse().unwrap_or(0);

        match index.get(&(name.clone(), tag_type.clone())) {
            Some(&at) => tags[at].count = tags[at].count.max(count),
            None => {
                index.insert((name.clone(), tag_type.clone()), tags.len());
                tags.push(ProConTag {
                    name,
                    tag_type,
                    count,
                });
            }
        }
    }

    tags.retain(|tag| tag.count > 0);
    tags
}

/// Structured offer pricing if any is present, else the raw price fields.
fn lowest_price(raw: &str) -> Option<u64> {
    let structured = LD_JSON
        .captures_iter(raw)
        .filter_map(|caps| serde_json::from_str::<Value>(caps[1].trim()).ok())
        .flat_map(|payload| {
            let mut prices = Vec::new();
            collect_offer_prices(&payload, &mut prices);
            prices
        })
        .min();

    structured.or_else(|| {
        RAW_PRICE
            .captures_iter(raw)
            .filter_map(|caps| caps[1].parse().ok())
            .min()
    })
}

fn collect_offer_prices(node: &Value, prices: &mut Vec<u64>) {
    match node {
        Value::Object(map) => {
            if map.get("@type").is_some_and(is_product_type) {
                prices.extend(map.get("offers").and_then(offer_price));
            }
            for child in map.values() {
                collect_offer_prices(child, prices);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_offer_prices(item, prices);
            }
        }
        _ => {}
    }
}

fn is_product_type(value: &Value) -> bool {
    match value {
        Value::String(kind) => kind == "Product",
        Value::Array(kinds) => kinds.iter().any(|kind| kind.as_str() == Some("Product")),
        _ => false,
    }
}

/// Price of a single offer object, or of the first priced offer in a list.
fn offer_price(offers: &Value) -> Option<u64> {
    match offers {
        Value::Object(offer) => offer.get("price").and_then(price_value),
        Value::Array(list) => list
            .iter()
            .filter_map(|offer| offer.get("price"))
            .find_map(price_value),
        _ => None,
    }
}

fn price_value(value: &Value) -> Option<u64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then(|| price.trunc() as u64)
}
