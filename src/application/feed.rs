use std::sync::Arc;

use serde::Serialize;
use time::UtcOffset;
use tracing::{debug, error};

use crate::application::collection::{FetchError, PostCollection};
use crate::domain::posts::{ProjectionRequest, project};
use crate::presentation::views::{FeedView, post_card};

pub const EMPTY_MESSAGE: &str = "No published posts yet.";
pub const NO_MATCHES_MESSAGE: &str = "No stories found.";
pub const ERROR_MESSAGE: &str = "Error loading posts.";

/// What the public listing should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedPage {
    Loading,
    Empty { message: &'static str },
    NoMatches { message: &'static str },
    Error { message: &'static str },
    Posts(FeedView),
}

/// Public listing controller over a cached published collection.
#[derive(Clone)]
pub struct FeedService {
    collection: Arc<PostCollection>,
    offset: UtcOffset,
}

impl FeedService {
    pub fn new(collection: Arc<PostCollection>, offset: UtcOffset) -> Self {
        Self { collection, offset }
    }

    /// Page-load entry point: fetch once, then render the default projection.
    pub async fn initialize(&self) -> FeedPage {
        match self.collection.load().await {
            Ok(posts) if posts.is_empty() => FeedPage::Empty {
                message: EMPTY_MESSAGE,
            },
            Ok(_) => self.render(&ProjectionRequest::default()),
            Err(FetchError::Superseded { .. }) => self.render(&ProjectionRequest::default()),
            Err(err) => {
                error!(target: "narrative::feed", error = %err, "Failed to load published posts");
                FeedPage::Error {
                    message: ERROR_MESSAGE,
                }
            }
        }
    }

    /// Re-project the cached collection; never touches the backend.
    pub fn render(&self, request: &ProjectionRequest) -> FeedPage {
        let Some(posts) = self.collection.posts() else {
            return FeedPage::Loading;
        };
        if posts.is_empty() {
            return FeedPage::Empty {
                message: EMPTY_MESSAGE,
            };
        }

        let projected = project(&posts, &request.search, request.order);
        debug!(
            target: "narrative::feed",
            search = %request.search,
            order = %request.order,
            matches = projected.len(),
            "Projected listing"
        );

        if projected.is_empty() {
            return FeedPage::NoMatches {
                message: NO_MATCHES_MESSAGE,
            };
        }

        FeedPage::Posts(FeedView {
            layout: request.layout,
            search: request.search.clone(),
            order: request.order,
            cards: projected
                .into_iter()
                .map(|record| post_card(record, self.offset))
                .collect(),
        })
    }
}
