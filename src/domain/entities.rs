//! Domain entities mirrored from the document store.

use serde::Serialize;
use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

pub const DEFAULT_SITE_TITLE: &str = "The People We Meet";
pub const DEFAULT_SITE_AUTHOR: &str = "Carla Schultz";

/// A single story as returned by the persistence layer.
///
/// `date` is `None` when the stored value is missing or could not be parsed;
/// such records are kept and ordered as if they were published at the Unix
/// epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub date: Option<OffsetDateTime>,
    pub published: bool,
    pub cover_image_url: Option<String>,
}

impl PostRecord {
    /// Sort key used by every chronological ordering in the crate.
    pub fn sort_key(&self) -> OffsetDateTime {
        self.date.unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Slug used in links; records stored without a slug fall back to their id.
    pub fn link_slug(&self) -> String {
        if self.slug.is_empty() {
            self.id.to_string()
        } else {
            self.slug.clone()
        }
    }
}

/// Write-side payload for creating or replacing a story.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDocument {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub published: bool,
    pub cover_image_url: Option<String>,
}

impl PostDocument {
    pub fn into_record(self, id: Uuid) -> PostRecord {
        PostRecord {
            id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            date: Some(self.date),
            published: self.published,
            cover_image_url: non_blank_url(self.cover_image_url),
        }
    }
}

/// Global site settings edited from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSettingsRecord {
    pub site_title: String,
    pub site_author: String,
    pub hero_image_url: Option<String>,
}

impl Default for SiteSettingsRecord {
    fn default() -> Self {
        Self {
            site_title: DEFAULT_SITE_TITLE.to_string(),
            site_author: DEFAULT_SITE_AUTHOR.to_string(),
            hero_image_url: None,
        }
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSettingsPatch {
    pub site_title: Option<String>,
    pub site_author: Option<String>,
    pub hero_image_url: Option<String>,
}

/// Stored image URLs may be empty strings when no image was chosen.
pub fn non_blank_url(url: Option<String>) -> Option<String> {
    url.filter(|url| !url.trim().is_empty())
}

/// Publish dates are stored as midnight of the chosen day in the site's offset.
pub fn local_midnight(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, offset};

    use super::*;

    #[test]
    fn local_midnight_keeps_calendar_day_in_site_offset() {
        let stamp = local_midnight(date!(2024 - 03 - 09), offset!(+2));
        assert_eq!(stamp.date(), date!(2024 - 03 - 09));
        assert_eq!(stamp.hour(), 0);
        assert_eq!(stamp.to_offset(UtcOffset::UTC).date(), date!(2024 - 03 - 08));
    }

    #[test]
    fn missing_date_sorts_as_epoch() {
        let record = PostRecord {
            id: Uuid::nil(),
            title: "Undated".into(),
            slug: String::new(),
            content: "body".into(),
            date: None,
            published: true,
            cover_image_url: None,
        };
        assert_eq!(record.sort_key(), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(record.link_slug(), Uuid::nil().to_string());
    }

    #[test]
    fn blank_cover_url_becomes_none() {
        let document = PostDocument {
            title: "Coverless".into(),
            slug: "coverless".into(),
            content: "body".into(),
            date: OffsetDateTime::UNIX_EPOCH,
            published: true,
            cover_image_url: Some("  ".into()),
        };
        assert_eq!(document.into_record(Uuid::nil()).cover_image_url, None);
        assert_eq!(
            non_blank_url(Some("https://cdn.example/a.jpg".into())).as_deref(),
            Some("https://cdn.example/a.jpg")
        );
    }
}
