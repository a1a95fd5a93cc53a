//! Mining of the client-hydration payload embedded in server-rendered pages.
//!
//! The payload is a GraphQL-shaped cache dump inside a script element. It is
//! far too large and loosely delimited to deserialize whole, so each logical
//! block is isolated first: find a start marker that ends in `[` or `{`, walk
//! to its balanced closing delimiter (string-aware), and only then apply the
//! narrow field patterns to that slice.

use std::sync::LazyLock;

use regex::Regex;

pub mod leaderboard;
pub mod product;
pub mod search;

pub use leaderboard::leaderboard_records;
pub use product::{DetailHydration, detail_records, format_price};
pub use search::{PageInfo, search_page_info, search_records};

/// Regex fragment for the body of a JSON string literal, escapes included.
pub(crate) const JSON_STR: &str = r#"((?:[^"\\]|\\.)*)"#;

pub(crate) fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("hardcoded regex is valid")
}

static CHALLENGE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)<title>\s*just a moment\.\.\.\s*</title>"));

/// Whether `raw` is a bot-challenge interstitial rather than real content.
pub fn is_challenge_page(raw: &str) -> bool {
    if !CHALLENGE_TITLE.is_match(raw) {
        return false;
    }
    let lower = raw.to_ascii_lowercase();
    lower.contains("cf-challenge") || lower.contains("_cf_chl_opt")
}

/// A balanced block located in some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    /// Content between the opening and closing delimiters.
    pub inner: &'a str,
    /// Byte offset just past the closing delimiter.
    pub end: usize,
}

/// The first block opened by `marker` in `text`, if it is terminated.
pub(crate) fn find_block<'a>(text: &'a str, marker: &str) -> Option<Block<'a>> {
    let mut from = 0;
    while let Some(found) = text[from..].find(marker) {
        let open = from + found + marker.len() - 1;
        if let Some(block) = block_at(text, open) {
            return Some(block);
        }
        from = open + 1;
    }
    None
}

/// Every non-overlapping terminated block opened by `marker`.
pub(crate) fn blocks<'a>(text: &'a str, marker: &str) -> Vec<Block<'a>> {
    let mut found = Vec::new();
    let mut from = 0;
    while from < text.len() {
        let Some(block) = find_block(&text[from..], marker) else {
            break;
        };
        found.push(Block {
            inner: block.inner,
            end: from + block.end,
        });
        from += block.end;
    }
    found
}

/// Balanced block whose opening delimiter sits at byte `open`.
fn block_at(text: &str, open: usize) -> Option<Block<'_>> {
    let bytes = text.as_bytes();
    let closer = match bytes.get(open)? {
        b'[' => b']',
        b'{' => b'}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (b == closer).then(|| Block {
                        inner: &text[open + 1..i],
                        end: i + 1,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits the inside of a JSON array into its top-level elements.
pub(crate) fn array_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, b) in inner.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(inner[start..].trim());
    items.retain(|item| !item.is_empty());
    items
}

/// Decodes the escapes of a captured JSON string body; returns it unchanged
/// if it is not a valid JSON string.
pub(crate) fn decode_json_str(body: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{body}\"")).unwrap_or_else(|_| body.to_string())
}

/// First capture group of `re` in `text` as a count, or 0.
pub(crate) fn capture_u32(re: &Regex, text: &str) -> u32 {
    re.captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_detection_needs_title_and_script() {
        let page = r"<html><head><title>Just a moment...</title></head>
            <body><script>window._cf_chl_opt={};</script></body></html>";
        assert!(is_challenge_page(page));

        let only_title = "<html><head><title>Just a moment...</title></head></html>";
        assert!(!is_challenge_page(only_title));

        let only_script = r#"<title>Launches</title><div class="cf-challenge"></div>"#;
        assert!(!is_challenge_page(only_script));
    }

    #[test]
    fn block_respects_nesting_and_strings() {
        let text = r#"xx"edges":[{"a":"]}"},{"b":[1,2]}],"pageInfo":{}"#;
        let block = find_block(text, r#""edges":["#).unwrap();
        assert_eq!(block.inner, r#"{"a":"]}"},{"b":[1,2]}"#);
        assert_eq!(&text[block.end..], r#","pageInfo":{}"#);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r#""k":{"s":"say \"}\" now"}tail"#;
        let block = find_block(text, r#""k":{"#).unwrap();
        assert_eq!(block.inner, r#""s":"say \"}\" now""#);
    }

    #[test]
    fn unterminated_block_is_skipped() {
        let text = r#""k":[1,2"k":[3]"#;
        let all = blocks(text, r#""k":["#);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].inner, "3");
    }

    #[test]
    fn repeated_blocks_are_all_found() {
        let text = r#""k":[1] junk "k":[2,3] more "k":[]"#;
        let inners: Vec<_> = blocks(text, r#""k":["#).iter().map(|b| b.inner).collect();
        assert_eq!(inners, vec!["1", "2,3", ""]);
    }

    #[test]
    fn array_items_split_top_level_only() {
        let items = array_items(r#"{"a":[1,2]}, {"b":"x,y"} ,3"#);
        assert_eq!(items, vec![r#"{"a":[1,2]}"#, r#"{"b":"x,y"}"#, "3"]);
        assert!(array_items("  ").is_empty());
    }

    #[test]
    fn json_escapes_decode() {
        assert_eq!(decode_json_str(r"Anthropic\u2019s coder"), "Anthropic\u{2019}s coder");
        assert_eq!(decode_json_str(r#"say \"hi\""#), r#"say "hi""#);
        assert_eq!(decode_json_str(r"bad \x escape"), r"bad \x escape");
    }
}
