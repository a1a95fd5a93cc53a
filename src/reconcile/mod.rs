//! Merges markup and hydration output into the final page results.
//!
//! Every function here takes its inputs by value and returns a fresh result;
//! nothing is shared with the cache until the caller stores it.

use std::collections::{HashMap, HashSet};

use crate::hydration::DetailHydration;
use crate::markup::DetailMarkup;
use crate::models::{Product, ProductDetail};

/// One-based rank of the product at `index`.
pub fn position_rank(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn renumber(products: Vec<Product>) -> Vec<Product> {
    products
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.with_rank(position_rank(i)))
        .collect()
}

/// Leaderboard from rendered cards plus mined posts.
///
/// Cards keep their page order and are ranked by it. Mined posts fill blank
/// card fields, override counts and rank where they carry a positive value,
/// and are appended when their slug has no card. The result is sorted by rank
/// with unranked entries last, reduced to one entry per product name, and
/// renumbered `1..=N`.
pub fn leaderboard(cards: Vec<Product>, mined: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    let cards: Vec<Product> = cards
        .into_iter()
        .filter(|p| !p.slug.is_empty() && seen.insert(p.slug.clone()))
        .collect();
    let mut products = renumber(cards);

    let mut by_slug: HashMap<String, usize> = products
        .iter()
        .enumerate()
        .map(|(i, p)| (p.slug.clone(), i))
        .collect();

    for post in mined {
        if post.slug.is_empty() {
            continue;
        }
        match by_slug.get(&post.slug) {
            Some(&at) => fill_from_post(&mut products[at], post),
            None => {
                by_slug.insert(post.slug.clone(), products.len());
                products.push(post);
            }
        }
    }

    // Stable, so unranked entries keep their relative order.
    products.sort_by_key(|p| (p.rank == 0, p.rank));

    let mut names = HashSet::new();
    let products: Vec<Product> = products
        .into_iter()
        .filter(|p| names.insert(p.name.trim().to_lowercase()))
        .collect();

    renumber(products)
}

fn fill_from_post(card: &mut Product, post: Product) {
    if card.name.is_empty() {
        card.name = post.name;
    }
    if card.tagline.is_empty() {
        card.tagline = post.tagline;
    }
    if card.categories.is_empty() {
        card.categories = post.categories;
    }
    if card.thumbnail_url.is_empty() {
        card.thumbnail_url = post.thumbnail_url;
    }
    if post.vote_count > 0 {
        card.vote_count = post.vote_count;
    }
    if post.comment_count > 0 {
        card.comment_count = post.comment_count;
    }
    if post.rank > 0 {
        card.rank = post.rank;
    }
}

/// Detail page from its rendered fields and its mined fields.
pub fn product_detail(markup: DetailMarkup, mined: DetailHydration) -> ProductDetail {
    let DetailMarkup {
        name,
        tagline,
        slug,
        thumbnail_url,
        description,
        rating,
        review_count,
        follower_count,
        website_url,
        maker_comment,
        categories,
        social_links,
        maker_name,
        maker_profile_url,
    } = markup;

    ProductDetail {
        product: Product {
            name,
            tagline,
            slug,
            thumbnail_url,
            ..Product::default()
        },
        description,
        rating,
        review_count,
        follower_count,
        maker_comment,
        website_url,
        categories,
        social_links,
        launch_date: mined.launch_date,
        maker_name,
        maker_profile_url,
        pro_con_tags: mined.pro_con_tags,
        pricing_info: mined.pricing_info,
    }
}

/// Category cards ranked by page order.
pub fn category(cards: Vec<Product>) -> Vec<Product> {
    renumber(cards)
}

/// Mined results when there are any, otherwise the rendered cards.
pub fn search(mined: Vec<Product>, cards: Vec<Product>) -> Vec<Product> {
    if mined.is_empty() {
        renumber(cards)
    } else {
        renumber(mined)
    }
}
