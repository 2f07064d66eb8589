use std::sync::Arc;

use serde::Serialize;
use time::UtcOffset;
use tracing::{error, info, warn};

use crate::application::repos::PostsRepo;
use crate::domain::posts::find_adjacent;
use crate::presentation::views::{StoryDetail, story_detail};

/// What the single-story page should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoryPage {
    NotFound,
    Found(StoryDetail),
}

/// Detail page controller: fetch-by-slug plus a full fetch for navigation.
#[derive(Clone)]
pub struct StoryService {
    posts: Arc<dyn PostsRepo>,
    offset: UtcOffset,
}

impl StoryService {
    pub fn new(posts: Arc<dyn PostsRepo>, offset: UtcOffset) -> Self {
        Self { posts, offset }
    }

    /// Resolve the `slug` query parameter into a page.
    ///
    /// Lookup failures render as not found. A failed navigation fetch still
    /// shows the story, just without previous/next links.
    pub async fn open(&self, slug: Option<&str>) -> StoryPage {
        let Some(slug) = slug.filter(|value| !value.trim().is_empty()) else {
            return StoryPage::NotFound;
        };

        let record = match self.posts.fetch_by_slug(slug).await {
            Ok(Some(record)) if record.published => record,
            Ok(_) => {
                info!(target: "narrative::story", slug, "Story not found");
                return StoryPage::NotFound;
            }
            Err(err) => {
                error!(target: "narrative::story", slug, error = %err, "Failed to load story");
                return StoryPage::NotFound;
            }
        };

        let collection = match self.posts.fetch_published().await {
            Ok(mut posts) => {
                posts.retain(|post| post.published);
                posts
            }
            Err(err) => {
                warn!(
                    target: "narrative::story",
                    slug,
                    error = %err,
                    "Failed to load navigation; rendering without neighbours"
                );
                Vec::new()
            }
        };

        let adjacent = find_adjacent(&collection, slug);
        StoryPage::Found(story_detail(&record, adjacent, self.offset))
    }
}
