//! Leaderboard cards.
//!
//! Cards render under different tag names (section, article, div), so the
//! primary tier matches on the `data-test` marker only.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{
    Strategy, closest, closest_ancestor, first_match, first_text, normalize_product_slug,
    parent_element, parse_count, prev_element_sibling, selector, text_of, thumbnail, topic_names,
};
use crate::models::Product;

static POST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("[data-test^='post-item-']"));
static POST_NAME_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("[data-test^='post-name-'] a[href^='/products/']"));
static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href^='/products/']"));
static MAIN_PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("main a[href^='/products/']"));
static CARD_CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector("section,article,li"));
static LOOSE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector("section,article,li,div"));
static SECONDARY_TEXT: LazyLock<Selector> = LazyLock::new(|| selector("span.text-secondary"));
static VOTE_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| selector("button[data-test='vote-button']"));
static BUTTON_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("button p"));
static P: LazyLock<Selector> = LazyLock::new(|| selector("p"));

const STRATEGIES: &[Strategy<Product>] = &[
    Strategy {
        name: "post-item marker",
        extract: by_post_item,
    },
    Strategy {
        name: "post-name ancestor",
        extract: by_post_name,
    },
    Strategy {
        name: "main product link",
        extract: by_main_link,
    },
];

/// Unranked leaderboard cards in document order, unique by slug.
pub fn leaderboard_cards(document: &Html) -> Vec<Product> {
    first_match("leaderboard", document, STRATEGIES)
}

fn by_post_item(document: &Html) -> Vec<Product> {
    collect_unique(document.select(&POST_ITEM))
}

fn by_post_name(document: &Html) -> Vec<Product> {
    let cards = document.select(&POST_NAME_LINK).filter_map(|link| {
        closest(link, &POST_ITEM)
            .or_else(|| closest_ancestor(link, &CARD_CONTAINER))
            .or_else(|| parent_element(link))
    });
    collect_unique(cards)
}

// Requiring a secondary-text span keeps navigation links out.
fn by_main_link(document: &Html) -> Vec<Product> {
    let cards = document
        .select(&MAIN_PRODUCT_LINK)
        .filter_map(|link| closest_ancestor(link, &LOOSE_CONTAINER))
        .filter(|card| card.select(&SECONDARY_TEXT).next().is_some());
    collect_unique(cards)
}

fn collect_unique<'a>(cards: impl Iterator<Item = ElementRef<'a>>) -> Vec<Product> {
    let mut seen = HashSet::new();
    cards
        .filter_map(parse_card)
        .filter(|product| seen.insert(product.slug.clone()))
        .collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<Product> {
    let link = card
        .select(&POST_NAME_LINK)
        .next()
        .or_else(|| card.select(&PRODUCT_LINK).next())?;

    let name = text_of(link);
    let slug = normalize_product_slug(link.value().attr("href").unwrap_or_default());
    if name.is_empty() || slug.is_empty() {
        return None;
    }

    let (comment_count, vote_count) = counts(card);

    Some(Product {
        name,
        tagline: first_text(card, &SECONDARY_TEXT),
        categories: topic_names(card),
        vote_count,
        comment_count,
        slug,
        thumbnail_url: thumbnail(card),
        rank: 0,
    })
}

/// `(comments, votes)` from the vote button and the control just before it,
/// or from the last two positive button labels when there is no vote button.
fn counts(card: ElementRef<'_>) -> (u32, u32) {
    if let Some(vote_button) = card.select(&VOTE_BUTTON).next() {
        let votes = parse_count(&first_text(vote_button, &P));
        let comments = prev_element_sibling(vote_button)
            .map_or(0, |control| parse_count(&first_text(control, &P)));
        return (comments, votes);
    }

    let labels: Vec<u32> = card
        .select(&BUTTON_LABEL)
        .map(|p| parse_count(&text_of(p)))
        .filter(|&n| n > 0)
        .collect();
    match labels.as_slice() {
        [.., comments, votes] => (*comments, *votes),
        [votes] => (0, *votes),
        [] => (0, 0),
    }
}
