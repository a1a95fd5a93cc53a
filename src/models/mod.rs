//! Data models for leaderboard, detail, category and search listings

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A product entry as it appears on a leaderboard, category page or search page.
///
/// `rank` is 1-based within one listing; 0 means unranked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub tagline: String,
    pub categories: Vec<String>,
    pub vote_count: u32,
    pub comment_count: u32,
    pub slug: String,
    pub thumbnail_url: String,
    pub rank: u32,
}

impl Product {
    /// Returns the same product with a new rank.
    #[must_use]
    pub fn with_rank(self, rank: u32) -> Self {
        Self { rank, ..self }
    }
}

/// Everything a product detail page exposes on top of the base [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub description: String,
    /// 0.0 to 5.0, 0.0 when unknown.
    pub rating: f64,
    pub review_count: u32,
    pub follower_count: u32,
    pub maker_comment: String,
    pub website_url: String,
    /// Topic names on the detail page, independent of `product.categories`.
    pub categories: Vec<String>,
    pub social_links: Vec<String>,
    pub launch_date: Option<DateTime<Utc>>,
    pub maker_name: String,
    pub maker_profile_url: String,
    pub pro_con_tags: Vec<ProConTag>,
    /// `"Free"`, `"$N"`, or empty when unknown.
    pub pricing_info: String,
}

/// An AI-summarized review tag such as "smart replies" (Positive, 9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProConTag {
    pub name: String,
    pub tag_type: String,
    pub count: u32,
}

impl ProConTag {
    pub fn is_positive(&self) -> bool {
        self.tag_type == "Positive"
    }

    pub fn is_negative(&self) -> bool {
        self.tag_type == "Negative"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    pub name: String,
    pub slug: String,
}

/// Products of a category page plus the related categories it links to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPage {
    pub products: Vec<Product>,
    pub related: Vec<CategoryLink>,
}

/// One page of search results with its paging metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub products: Vec<Product>,
    pub current_page: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    /// 0 when the page did not report a total.
    pub pages_count: u32,
}

/// Leaderboard time period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Leaderboard path for `date`, month and day without leading zeros.
    ///
    /// The weekly path pairs the calendar year with the ISO week number.
    pub fn url_path(self, date: NaiveDate) -> String {
        let year = date.year();
        match self {
            Self::Daily => format!("/leaderboard/daily/{year}/{}/{}", date.month(), date.day()),
            Self::Weekly => format!("/leaderboard/weekly/{year}/{}", date.iso_week().week()),
            Self::Monthly => format!("/leaderboard/monthly/{year}/{}", date.month()),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!("unknown period: {other}")),
        }
    }
}
