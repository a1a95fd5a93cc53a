//! Product detail page header, maker comment, topics and links.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{
    SITE_DOMAIN, first_text, next_element_sibling, review_count_in, selector, text_of,
};

static HEADER: LazyLock<Selector> = LazyLock::new(|| selector("[data-test='header']"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static TAGLINE: LazyLock<Selector> = LazyLock::new(|| selector("h2.text-18"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='canonical']"));
static REVIEWS_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href*='/reviews']"));
static RATING: LazyLock<Selector> =
    LazyLock::new(|| selector("a[href*='/reviews'] span.text-14"));
static FOLLOWERS: LazyLock<Selector> = LazyLock::new(|| selector("p.text-14"));
static WEBSITE: LazyLock<Selector> =
    LazyLock::new(|| selector("a[data-test='visit-website-button']"));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("div.relative.text-16.font-normal.text-gray-700"));
static LABELLED_VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("video[aria-label]"));
static PROSE: LazyLock<Selector> = LazyLock::new(|| selector(".prose"));
static P: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static TOPIC_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href^='/topics/']"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static AUTHOR_META: LazyLock<Selector> = LazyLock::new(|| selector("meta[name='author']"));
static AUTHOR_LINK: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='author']"));

static FOLLOWER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([KM]?)\s*followers").expect("hardcoded regex is valid")
});

const SOCIAL_HOSTS: [&str; 3] = ["linkedin.com", "x.com", "twitter.com"];

/// What the rendered markup of a detail page shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailMarkup {
    pub name: String,
    pub tagline: String,
    pub slug: String,
    pub thumbnail_url: String,
    pub description: String,
    pub rating: f64,
    pub review_count: u32,
    pub follower_count: u32,
    pub website_url: String,
    pub maker_comment: String,
    pub categories: Vec<String>,
    pub social_links: Vec<String>,
    pub maker_name: String,
    pub maker_profile_url: String,
}

pub fn product_detail(document: &Html) -> DetailMarkup {
    // Header fields fall back to the whole page when the header marker is gone.
    let header = document
        .select(&HEADER)
        .next()
        .unwrap_or_else(|| document.root_element());

    let name = first_text(header, &H1);
    let thumbnail_url = labelled_video_poster(header, &name);

    DetailMarkup {
        tagline: first_text(header, &TAGLINE),
        slug: canonical_slug(document),
        thumbnail_url,
        description: first_text(header, &DESCRIPTION),
        rating: rating(header),
        review_count: header
            .select(&REVIEWS_LINK)
            .map(|link| review_count_in(&text_of(link)))
            .find(|&n| n > 0)
            .unwrap_or(0),
        follower_count: header
            .select(&FOLLOWERS)
            .find_map(|p| follower_count(&text_of(p)))
            .unwrap_or(0),
        website_url: attr_of(document, &WEBSITE, "href"),
        maker_comment: maker_comment(document),
        categories: unique_topics(document),
        social_links: social_links(document),
        maker_name: attr_of(document, &AUTHOR_META, "content"),
        maker_profile_url: attr_of(document, &AUTHOR_LINK, "href"),
        name,
    }
}

fn attr_of(document: &Html, sel: &Selector, attr: &str) -> String {
    document
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn canonical_slug(document: &Html) -> String {
    let href = attr_of(document, &CANONICAL, "href");
    href.split_once("/products/")
        .map(|(_, rest)| {
            rest.split(['/', '?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default()
}

fn rating(header: ElementRef<'_>) -> f64 {
    header
        .select(&RATING)
        .filter_map(|span| text_of(span).parse::<f64>().ok())
        .find(|r| r.is_finite() && *r > 0.0 && *r <= 5.0)
        .unwrap_or(0.0)
}

/// "2.6K followers" is 2600, "1.5M followers" is 1500000.
pub(crate) fn follower_count(text: &str) -> Option<u32> {
    let caps = FOLLOWER_TEXT.captures(text)?;
    let value: f64 = caps[1].replace(',', "").parse().ok()?;
    let scale = match caps[2].to_ascii_uppercase().as_str() {
        "K" => 1_000.0,
        "M" => 1_000_000.0,
        _ => 1.0,
    };
    let scaled = (value * scale).round();
    (scaled >= 0.0 && scaled <= f64::from(u32::MAX)).then_some(scaled as u32)
}

fn labelled_video_poster(header: ElementRef<'_>, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    header
        .select(&LABELLED_VIDEO)
        .find(|video| video.value().attr("aria-label") == Some(name))
        .and_then(|video| video.value().attr("poster"))
        .unwrap_or_default()
        .to_string()
}

fn maker_comment(document: &Html) -> String {
    document
        .select(&H2)
        .filter(|heading| text_of(*heading) == "Maker Comment")
        .find_map(|heading| {
            let thread = next_element_sibling(heading)?;
            let prose = thread.select(&PROSE).next()?;
            let paragraphs: Vec<String> = prose
                .select(&P)
                .map(text_of)
                .filter(|text| !text.is_empty())
                .collect();
            (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
        })
        .unwrap_or_default()
}

fn unique_topics(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(&TOPIC_LINK)
        .map(text_of)
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

fn social_links(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(&ANY_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_social_link(href))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Host of an absolute (`scheme://`) or protocol-relative (`//`) href.
fn link_host(href: &str) -> Option<String> {
    let rest = match href.strip_prefix("//") {
        Some(rest) => rest,
        None => {
            let (scheme, rest) = href.split_once("://")?;
            let mut chars = scheme.chars();
            let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return None;
            }
            rest
        }
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

fn is_social_link(href: &str) -> bool {
    let Some(host) = link_host(href) else {
        return false;
    };
    let on = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    !on(SITE_DOMAIN) && SOCIAL_HOSTS.iter().any(|&domain| on(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
      <link rel="canonical" href="https://www.producthunt.com/products/tanka">
      <meta name="author" content=" Vincent Zhu ">
      <link rel="author" href="https://www.producthunt.com/@vincent">
    </head><body>
      <div data-test="header">
        <h1>Tanka</h1>
        <h2 class="text-18">AI messenger with Smart Reply</h2>
        <video aria-label="Other" poster="https://img.test/other.jpg"></video>
        <video aria-label="Tanka" poster="https://img.test/tanka.jpg"></video>
        <a href="/products/tanka/reviews"><span class="text-14">4.4</span></a>
        <a href="/products/tanka/reviews">11 reviews</a>
        <p class="text-14">2.6K followers</p>
        <div class="relative text-16 font-normal text-gray-700">Team chat with memory.</div>
      </div>
      <a data-test="visit-website-button" href="https://tanka.ai?ref=producthunt">Visit</a>
      <a href="/topics/messaging">Messaging</a>
      <a href="/topics/ai">AI</a>
      <a href="/topics/messaging">Messaging</a>
      <a href="https://x.com/tanka">X</a>
      <a href="https://www.linkedin.com/company/tanka">LinkedIn</a>
      <a href="https://x.com/tanka">X again</a>
      <a href="https://www.producthunt.com/share?to=twitter.com">Share</a>
      <a href="https://dropbox.com/s/file">Dropbox</a>
      <h2>Maker Comment</h2>
      <div><div class="prose"><p>Hi hunters!</p><p></p><p>We built Tanka.</p></div></div>
    </body></html>"#;

    #[test]
    fn reads_every_header_field() {
        let detail = product_detail(&Html::parse_document(PAGE));

        assert_eq!(detail.name, "Tanka");
        assert_eq!(detail.tagline, "AI messenger with Smart Reply");
        assert_eq!(detail.slug, "tanka");
        assert_eq!(detail.thumbnail_url, "https://img.test/tanka.jpg");
        assert!((detail.rating - 4.4).abs() < f64::EPSILON);
        assert_eq!(detail.review_count, 11);
        assert_eq!(detail.follower_count, 2600);
        assert_eq!(detail.description, "Team chat with memory.");
        assert_eq!(detail.website_url, "https://tanka.ai?ref=producthunt");
        assert_eq!(detail.maker_name, "Vincent Zhu");
        assert_eq!(detail.maker_profile_url, "https://www.producthunt.com/@vincent");
    }

    #[test]
    fn maker_comment_joins_paragraphs() {
        let detail = product_detail(&Html::parse_document(PAGE));
        assert_eq!(detail.maker_comment, "Hi hunters!\n\nWe built Tanka.");
    }

    #[test]
    fn topics_and_social_links_are_deduplicated() {
        let detail = product_detail(&Html::parse_document(PAGE));
        assert_eq!(detail.categories, vec!["Messaging", "AI"]);
        assert_eq!(
            detail.social_links,
            vec!["https://x.com/tanka", "https://www.linkedin.com/company/tanka"]
        );
    }

    #[test]
    fn social_links_need_a_social_host() {
        let page = r#"<html><body>
          <a href="//twitter.com/tanka">Twitter</a>
          <a href="https://x.com/tanka">X</a>
          <a href="/out?to=https://www.linkedin.com/company/tanka">Redirect</a>
          <a href="mailto:hi@x.com">Mail</a>
        </body></html>"#;
        let detail = product_detail(&Html::parse_document(page));
        assert_eq!(
            detail.social_links,
            vec!["//twitter.com/tanka", "https://x.com/tanka"]
        );
    }

    #[test]
    fn link_hosts() {
        assert_eq!(link_host("https://www.LinkedIn.com/in/a").as_deref(), Some("www.linkedin.com"));
        assert_eq!(link_host("//x.com?ref=ph").as_deref(), Some("x.com"));
        assert_eq!(link_host("/out?to=https://x.com/a"), None);
        assert_eq!(link_host("x.com/tanka"), None);
    }

    #[test]
    fn follower_suffixes() {
        assert_eq!(follower_count("2.6K followers"), Some(2600));
        assert_eq!(follower_count("1.5M followers"), Some(1_500_000));
        assert_eq!(follower_count("42 followers"), Some(42));
        assert_eq!(follower_count("1,204 followers"), Some(1204));
        assert_eq!(follower_count("Follow"), None);
    }

    #[test]
    fn empty_page_is_all_defaults() {
        let detail = product_detail(&Html::parse_document("<html><body></body></html>"));
        assert_eq!(detail, DetailMarkup::default());
    }
}
