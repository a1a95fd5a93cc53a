//! Search result cards rendered in the main content region.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{
    closest_ancestor, first_text, normalize_product_slug, parent_element, secondary_text,
    selector, text_of, thumbnail, topic_names,
};
use crate::models::Product;

static MAIN_PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("main a[href^='/products/']"));
static CARD: LazyLock<Selector> = LazyLock::new(|| selector("article,section,li,div"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1,h2,h3,h4,[data-test*='name']"));

/// Search cards in document order, unique by slug, unranked.
pub fn search_cards(document: &Html) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for link in document.select(&MAIN_PRODUCT_LINK) {
        let slug = normalize_product_slug(link.value().attr("href").unwrap_or_default());
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }

        let Some(card) = closest_ancestor(link, &CARD).or_else(|| parent_element(link)) else {
            continue;
        };

        let mut name = text_of(link);
        if name.is_empty() {
            name = first_text(card, &HEADING);
        }
        if name.is_empty() {
            continue;
        }

        seen.insert(slug.clone());
        products.push(Product {
            tagline: secondary_text(card, &name),
            categories: topic_names(card),
            thumbnail_url: thumbnail(card),
            name,
            slug,
            ..Product::default()
        });
    }

    products
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_inside_main_only() {
        let products = search_cards(&Html::parse_document(
            r#"<!doctype html><html><body>
              <header><a href="/products/promo">Promo</a></header>
              <main><section>
                <article>
                  <a href="/products/alpha-ai"><h3>Alpha AI</h3></a>
                  <p>AI agent for support teams</p>
                  <a href="/topics/ai-agents">AI Agents</a>
                  <img src="https://img.test/alpha.png">
                </article>
                <article>
                  <a href="/products/beta-note?ref=search">Beta Note</a>
                  <span>#notes</span>
                  <span>Write docs fast</span>
                </article>
                <article>
                  <a href="/products/alpha-ai/reviews">Reviews</a>
                </article>
              </section></main>
            </body></html>"#,
        ));

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].slug, "alpha-ai");
        assert_eq!(products[0].name, "Alpha AI");
        assert_eq!(products[0].tagline, "AI agent for support teams");
        assert_eq!(products[0].categories, vec!["AI Agents"]);
        assert_eq!(products[0].thumbnail_url, "https://img.test/alpha.png");
        assert_eq!(products[1].slug, "beta-note");
        assert_eq!(products[1].tagline, "Write docs fast");
    }

    #[test]
    fn icon_links_use_card_heading() {
        let products = search_cards(&Html::parse_document(
            r#"<main><li>
                <a href="/products/gamma"><img src="g.png"></a>
                <h4>Gamma</h4>
                <p>Third letter</p>
            </li></main>"#,
        ));
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Gamma");
        assert_eq!(products[0].tagline, "Third letter");
    }

    #[test]
    fn no_main_region_no_cards() {
        let products = search_cards(&Html::parse_document(
            r#"<body><a href="/products/alpha">Alpha</a></body>"#,
        ));
        assert!(products.is_empty());
    }
}
