//! Listing projection and chronological navigation over a post collection.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use time::{Date, OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

use super::entities::PostRecord;
use super::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const SHORT_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");
pub const FORM_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Listing order by publish date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewFirst,
    OldFirst,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::NewFirst => "new",
            SortOrder::OldFirst => "old",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "new" => Ok(SortOrder::NewFirst),
            "old" => Ok(SortOrder::OldFirst),
            other => Err(DomainError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Presentation hint for the listing; never affects membership or order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    List,
    Grid,
}

impl FromStr for LayoutMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "list" => Ok(LayoutMode::List),
            "grid" => Ok(LayoutMode::Grid),
            other => Err(DomainError::UnknownLayout(other.to_string())),
        }
    }
}

/// Inputs of a single listing re-projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionRequest {
    pub search: String,
    pub order: SortOrder,
    pub layout: LayoutMode,
}

impl ProjectionRequest {
    pub fn new(search: impl Into<String>, order: SortOrder) -> Self {
        Self {
            search: search.into(),
            order,
            layout: LayoutMode::default(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }
}

/// Filter `posts` by a case-insensitive substring of title or content and
/// order the matches by date.
///
/// The sort is stable, so records sharing a date keep their collection order.
/// Records without a date sort as the Unix epoch.
pub fn project<'a>(posts: &'a [PostRecord], search: &str, order: SortOrder) -> Vec<&'a PostRecord> {
    let term = search.to_lowercase();
    let mut matches: Vec<&PostRecord> = if term.is_empty() {
        posts.iter().collect()
    } else {
        posts
            .iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&term)
                    || post.content.to_lowercase().contains(&term)
            })
            .collect()
    };

    match order {
        SortOrder::NewFirst => matches.sort_by(|a, b| b.sort_key().cmp(&a.sort_key())),
        SortOrder::OldFirst => matches.sort_by_key(|post| post.sort_key()),
    }
    matches
}

/// Neighbours of a story in ascending chronological order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjacent<'a> {
    pub previous: Option<&'a PostRecord>,
    pub next: Option<&'a PostRecord>,
}

/// Locate the stories published immediately before and after `current_slug`.
///
/// Ordering is always oldest-first regardless of the listing order. The slug
/// comparison is exact; when several records share a slug the first one in
/// chronological order wins. Unknown slugs yield no neighbours.
pub fn find_adjacent<'a>(posts: &'a [PostRecord], current_slug: &str) -> Adjacent<'a> {
    let ordered = project(posts, "", SortOrder::OldFirst);
    let Some(index) = ordered.iter().position(|post| post.slug == current_slug) else {
        return Adjacent::default();
    };

    Adjacent {
        previous: index.checked_sub(1).map(|prev| ordered[prev]),
        next: ordered.get(index + 1).copied(),
    }
}

pub fn calendar_date(stamp: OffsetDateTime, offset: UtcOffset) -> Date {
    stamp.to_offset(offset).date()
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT).unwrap_or_default()
}

pub fn format_short_date(date: Date) -> String {
    date.format(SHORT_DATE_FORMAT).unwrap_or_default()
}

pub fn format_form_date(date: Date) -> String {
    date.format(FORM_DATE_FORMAT).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_form_date(input: &str) -> Result<Date, DomainError> {
    Date::parse(input.trim(), FORM_DATE_FORMAT).map_err(|_| DomainError::InvalidDate {
        input: input.to_string(),
    })
}
