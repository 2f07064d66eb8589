//! Request-scoped cache of the post collection.
//!
//! A [`PostCollection`] is populated by one fetch and then serves every
//! projection without further round-trips. Each load takes a monotonically
//! increasing token; only the load holding the newest token may commit, so a
//! slow response can never overwrite a newer one.

use std::sync::{Arc, Mutex};

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::util::lock::lock_or_recover;

const SOURCE: &str = "application::collection";

/// Monotonic identifier of a load request.
pub type RequestToken = u64;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("load {token} was superseded by a newer request")]
    Superseded { token: RequestToken },
}

/// Which records the collection mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Published records only; backs every public view.
    Public,
    /// Drafts included; backs the admin list.
    Admin,
}

impl CollectionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionScope::Public => "public",
            CollectionScope::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum CollectionState {
    #[default]
    Empty,
    Loading {
        token: RequestToken,
    },
    Loaded {
        token: RequestToken,
        posts: Arc<[PostRecord]>,
    },
    Failed {
        token: RequestToken,
        message: String,
    },
}

impl CollectionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, CollectionState::Loading { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    issued: RequestToken,
    state: CollectionState,
}

pub struct PostCollection {
    repo: Arc<dyn PostsRepo>,
    scope: CollectionScope,
    inner: Mutex<Inner>,
}

impl PostCollection {
    pub fn new(repo: Arc<dyn PostsRepo>, scope: CollectionScope) -> Self {
        Self {
            repo,
            scope,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn scope(&self) -> CollectionScope {
        self.scope
    }

    /// Fetch the collection and replace the cache wholesale.
    ///
    /// Returns [`FetchError::Superseded`] when a newer load or an
    /// invalidation started while this one was in flight; the newer request
    /// owns the cache state in that case.
    pub async fn load(&self) -> Result<Arc<[PostRecord]>, FetchError> {
        let token = self.begin_load();
        counter!("narrative_collection_load_total", "scope" => self.scope.as_str()).increment(1);
        debug!(target: "narrative::collection", token, scope = self.scope.as_str(), "Loading collection");

        let fetched = match self.scope {
            CollectionScope::Public => self.repo.fetch_published().await,
            CollectionScope::Admin => self.repo.fetch_all().await,
        };

        let mut inner = lock_or_recover(&self.inner, SOURCE, "load.commit");
        if inner.issued != token {
            counter!("narrative_collection_superseded_total", "scope" => self.scope.as_str())
                .increment(1);
            info!(
                target: "narrative::collection",
                token,
                newest = inner.issued,
                "Discarding superseded collection load"
            );
            return Err(FetchError::Superseded { token });
        }

        match fetched {
            Ok(records) => {
                let posts: Arc<[PostRecord]> = self.retain_visible(records).into();
                info!(
                    target: "narrative::collection",
                    token,
                    scope = self.scope.as_str(),
                    count = posts.len(),
                    "Collection loaded"
                );
                inner.state = CollectionState::Loaded {
                    token,
                    posts: posts.clone(),
                };
                Ok(posts)
            }
            Err(err) => {
                counter!("narrative_collection_failed_total", "scope" => self.scope.as_str())
                    .increment(1);
                warn!(target: "narrative::collection", token, error = %err, "Collection load failed");
                inner.state = CollectionState::Failed {
                    token,
                    message: err.to_string(),
                };
                Err(FetchError::Repo(err))
            }
        }
    }

    /// Drop cached records and supersede any in-flight load.
    pub fn invalidate(&self) {
        let mut inner = lock_or_recover(&self.inner, SOURCE, "invalidate");
        inner.issued += 1;
        inner.state = CollectionState::Empty;
        debug!(target: "narrative::collection", issued = inner.issued, "Collection invalidated");
    }

    pub async fn reload(&self) -> Result<Arc<[PostRecord]>, FetchError> {
        self.invalidate();
        self.load().await
    }

    pub fn snapshot(&self) -> CollectionState {
        lock_or_recover(&self.inner, SOURCE, "snapshot").state.clone()
    }

    /// Committed records, or `None` unless the cache is loaded.
    pub fn posts(&self) -> Option<Arc<[PostRecord]>> {
        match &lock_or_recover(&self.inner, SOURCE, "posts").state {
            CollectionState::Loaded { posts, .. } => Some(posts.clone()),
            _ => None,
        }
    }

    fn begin_load(&self) -> RequestToken {
        let mut inner = lock_or_recover(&self.inner, SOURCE, "load.begin");
        inner.issued += 1;
        let token = inner.issued;
        inner.state = CollectionState::Loading { token };
        token
    }

    fn retain_visible(&self, mut records: Vec<PostRecord>) -> Vec<PostRecord> {
        if self.scope == CollectionScope::Public {
            let before = records.len();
            records.retain(|post| post.published);
            let dropped = before - records.len();
            if dropped > 0 {
                warn!(
                    target: "narrative::collection",
                    dropped,
                    "Published fetch returned unpublished records; dropping them"
                );
            }
        }
        records
    }
}
