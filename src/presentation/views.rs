//! Display-ready view models.
//!
//! Every function here is a pure mapping from domain records to plain
//! structs; markup is produced by whatever sink consumes them.

use serde::Serialize;
use time::UtcOffset;
use url::form_urlencoded;

use crate::domain::entities::PostRecord;
use crate::domain::posts::{
    self, Adjacent, LayoutMode, calendar_date, format_human_date, format_short_date,
};

pub const PREVIEW_LIMIT: usize = 160;
const PREVIEW_KEEP: usize = 157;
const UNTITLED: &str = "Untitled";
const DATE_UNAVAILABLE: &str = "DATE UNAVAILABLE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub slug: String,
    pub href: String,
    pub title: String,
    pub published: String,
    pub preview: String,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedView {
    pub layout: LayoutMode,
    pub search: String,
    pub order: posts::SortOrder,
    pub cards: Vec<PostCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryLink {
    pub href: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryDetail {
    pub slug: String,
    pub title: String,
    pub published: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub previous: Option<StoryLink>,
    pub next: Option<StoryLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRow {
    pub id: String,
    pub title: String,
    pub status_label: String,
    pub thumbnail_url: Option<String>,
}

pub fn story_href(slug: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    format!("story.html?slug={encoded}")
}

/// Content preview limited to [`PREVIEW_LIMIT`] characters.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LIMIT {
        let kept: String = content.chars().take(PREVIEW_KEEP).collect();
        format!("{kept}...")
    } else {
        content.to_string()
    }
}

fn display_title(record: &PostRecord) -> String {
    if record.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        record.title.clone()
    }
}

pub fn post_card(record: &PostRecord, offset: UtcOffset) -> PostCard {
    let slug = record.link_slug();
    PostCard {
        href: story_href(&slug),
        slug,
        title: display_title(record),
        published: record
            .date
            .map(|stamp| format_human_date(calendar_date(stamp, offset)))
            .unwrap_or_default(),
        preview: preview(&record.content),
        cover_image_url: record.cover_image_url.clone(),
    }
}

fn story_link(record: &PostRecord) -> StoryLink {
    StoryLink {
        href: story_href(&record.link_slug()),
        title: display_title(record),
    }
}

pub fn story_detail(record: &PostRecord, adjacent: Adjacent<'_>, offset: UtcOffset) -> StoryDetail {
    StoryDetail {
        slug: record.link_slug(),
        title: display_title(record),
        published: record
            .date
            .map(|stamp| format_human_date(calendar_date(stamp, offset)).to_uppercase())
            .unwrap_or_else(|| DATE_UNAVAILABLE.to_string()),
        content: record.content.clone(),
        cover_image_url: record.cover_image_url.clone(),
        previous: adjacent.previous.map(story_link),
        next: adjacent.next.map(story_link),
    }
}

pub fn admin_row(record: &PostRecord, offset: UtcOffset) -> AdminRow {
    let date = record
        .date
        .map(|stamp| format_short_date(calendar_date(stamp, offset)))
        .unwrap_or_default();
    let status_label = if record.published {
        format!("Published {date}")
    } else {
        format!("Draft \u{2022} {date}")
    };

    AdminRow {
        id: record.id.to_string(),
        title: display_title(record),
        status_label,
        thumbnail_url: record.cover_image_url.clone(),
    }
}
