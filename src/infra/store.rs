//! Single-file JSON document store for stories and site settings.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{PostsRepo, PostsWriteRepo, RepoError, SettingsRepo};
use crate::domain::entities::{
    DEFAULT_SITE_AUTHOR, DEFAULT_SITE_TITLE, PostDocument, PostRecord, SiteSettingsPatch,
    SiteSettingsRecord, non_blank_url,
};

use super::error::InfraError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoreDocument {
    posts: Vec<StoredPost>,
    settings: Option<StoredSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPost {
    id: Uuid,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredSettings {
    site_title: Option<String>,
    site_author: Option<String>,
    hero_image_url: Option<String>,
}

impl StoredPost {
    fn to_record(&self) -> PostRecord {
        PostRecord {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            content: self.content.clone(),
            date: self.date.as_deref().and_then(|raw| parse_stamp(self.id, raw)),
            published: self.published,
            cover_image_url: non_blank_url(self.cover_image_url.clone()),
        }
    }

    fn apply(&mut self, document: PostDocument, now: &str) {
        self.title = document.title;
        self.slug = document.slug;
        self.content = document.content;
        self.date = Some(format_stamp(document.date));
        self.published = document.published;
        self.cover_image_url = non_blank_url(document.cover_image_url);
        self.updated_at = Some(now.to_string());
    }
}

impl StoredSettings {
    fn to_record(&self) -> SiteSettingsRecord {
        SiteSettingsRecord {
            site_title: self
                .site_title
                .clone()
                .unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
            site_author: self
                .site_author
                .clone()
                .unwrap_or_else(|| DEFAULT_SITE_AUTHOR.to_string()),
            hero_image_url: non_blank_url(self.hero_image_url.clone()),
        }
    }
}

fn parse_stamp(id: Uuid, raw: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(stamp) => Some(stamp),
        Err(err) => {
            debug!(target: "narrative::store", %id, raw, error = %err, "Ignoring unparseable story date");
            None
        }
    }
}

fn format_stamp(stamp: OffsetDateTime) -> String {
    stamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| stamp.unix_timestamp().to_string())
}

/// JSON document database. Every write replaces the file atomically; readers
/// see the last committed document.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    state: RwLock<StoreDocument>,
}

impl JsonStore {
    /// Open the store at `path`. A missing file starts an empty store that is
    /// created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let path = path.into();
        let document = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreDocument>(&bytes).map_err(|source| {
                InfraError::CorruptStore {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(err) => return Err(InfraError::read(&path)(err)),
        };

        info!(
            target: "narrative::store",
            path = %path.display(),
            posts = document.posts.len(),
            "Story store opened"
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(document),
        })
    }

    /// Store without a backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreDocument::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn read_records(&self, keep: impl Fn(&StoredPost) -> bool) -> Vec<PostRecord> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .filter(|post| keep(post))
            .map(StoredPost::to_record)
            .collect()
    }

    /// Apply `change` to a copy of the document, persist it, then commit.
    async fn write<T>(
        &self,
        change: impl FnOnce(&mut StoreDocument) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let output = change(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(output)
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), RepoError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let payload = serde_json::to_vec_pretty(document).map_err(RepoError::from_persistence)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(RepoError::from_persistence)?;
        }

        let staging = staging_path(path);
        fs::write(&staging, &payload)
            .await
            .map_err(RepoError::from_persistence)?;
        if let Err(err) = fs::rename(&staging, path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(RepoError::from_persistence(err));
        }

        counter!("narrative_store_write_total").increment(1);
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn now_stamp() -> String {
    format_stamp(OffsetDateTime::now_utc())
}

#[async_trait]
impl PostsRepo for JsonStore {
    async fn fetch_published(&self) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.read_records(|post| post.published).await)
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        // Duplicate slugs resolve to the chronologically first record.
        let matches = self
            .read_records(|post| post.published && post.slug == slug)
            .await;
        Ok(matches.into_iter().min_by_key(PostRecord::sort_key))
    }

    async fn fetch_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.read_records(|_| true).await)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.read_records(|post| post.id == id).await.into_iter().next())
    }
}

#[async_trait]
impl PostsWriteRepo for JsonStore {
    async fn create_post(&self, document: PostDocument) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        let now = now_stamp();
        self.write(|state| {
            let mut stored = StoredPost {
                id,
                title: String::new(),
                slug: String::new(),
                content: String::new(),
                date: None,
                published: false,
                cover_image_url: None,
                created_at: Some(now.clone()),
                updated_at: None,
            };
            stored.apply(document, &now);
            state.posts.push(stored);
            Ok(id)
        })
        .await
    }

    async fn update_post(&self, id: Uuid, document: PostDocument) -> Result<(), RepoError> {
        let now = now_stamp();
        self.write(|state| {
            let stored = state
                .posts
                .iter_mut()
                .find(|post| post.id == id)
                .ok_or(RepoError::NotFound)?;
            stored.apply(document, &now);
            Ok(())
        })
        .await
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        self.write(|state| {
            let before = state.posts.len();
            state.posts.retain(|post| post.id != id);
            if state.posts.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SettingsRepo for JsonStore {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.settings.as_ref().map(StoredSettings::to_record))
    }

    async fn merge_site_settings(&self, patch: SiteSettingsPatch) -> Result<(), RepoError> {
        self.write(|state| {
            let settings = state.settings.get_or_insert_with(StoredSettings::default);
            if let Some(title) = patch.site_title {
                settings.site_title = Some(title);
            }
            if let Some(author) = patch.site_author {
                settings.site_author = Some(author);
            }
            if let Some(url) = patch.hero_image_url {
                settings.hero_image_url = Some(url);
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn document(title: &str, slug: &str, date: OffsetDateTime, published: bool) -> PostDocument {
        PostDocument {
            title: title.into(),
            slug: slug.into(),
            content: format!("{title} body"),
            date,
            published,
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/narrative.json");

        let store = JsonStore::open(&path).await.expect("open");
        let id = store
            .create_post(document("Alpha", "alpha", datetime!(2024-01-01 0:00 UTC), true))
            .await
            .expect("create");
        store
            .merge_site_settings(SiteSettingsPatch {
                site_title: Some("Faces".into()),
                ..SiteSettingsPatch::default()
            })
            .await
            .expect("settings");

        assert!(!staging_path(&path).exists());

        let reopened = JsonStore::open(&path).await.expect("reopen");
        let record = reopened.find_by_id(id).await.unwrap().expect("record");
        assert_eq!(record.title, "Alpha");
        assert_eq!(record.date, Some(datetime!(2024-01-01 0:00 UTC)));

        let settings = reopened.load_site_settings().await.unwrap().expect("settings");
        assert_eq!(settings.site_title, "Faces");
        assert_eq!(settings.site_author, DEFAULT_SITE_AUTHOR);
    }

    #[tokio::test]
    async fn unparseable_dates_load_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("narrative.json");
        let id = Uuid::new_v4();
        let raw = serde_json::json!({
            "posts": [{
                "id": id,
                "title": "Legacy",
                "slug": "legacy",
                "content": "old",
                "date": "last tuesday",
                "published": true
            }]
        });
        std::fs::write(&path, raw.to_string()).expect("seed");

        let store = JsonStore::open(&path).await.expect("open");
        let record = store.fetch_by_slug("legacy").await.unwrap().expect("record");
        assert_eq!(record.date, None);
    }

    #[tokio::test]
    async fn blank_image_urls_load_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("narrative.json");
        let raw = serde_json::json!({
            "posts": [{
                "id": Uuid::new_v4(),
                "title": "No Cover",
                "slug": "no-cover",
                "content": "plain",
                "date": "2024-03-02T00:00:00Z",
                "published": true,
                "cover_image_url": ""
            }],
            "settings": { "hero_image_url": "" }
        });
        std::fs::write(&path, raw.to_string()).expect("seed");

        let store = JsonStore::open(&path).await.expect("open");
        let posts = store.fetch_published().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].cover_image_url, None);

        let settings = store.load_site_settings().await.unwrap().expect("settings");
        assert_eq!(settings.hero_image_url, None);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("narrative.json");
        std::fs::write(&path, "{ not json").expect("seed");

        let err = JsonStore::open(&path).await.unwrap_err();
        assert!(matches!(err, InfraError::CorruptStore { .. }));
    }

    #[tokio::test]
    async fn slug_lookup_ignores_drafts_and_prefers_oldest_duplicate() {
        let store = JsonStore::in_memory();
        store
            .create_post(document("Draft", "market", datetime!(2023-01-01 0:00 UTC), false))
            .await
            .unwrap();
        store
            .create_post(document("Newer", "market", datetime!(2024-06-01 0:00 UTC), true))
            .await
            .unwrap();
        store
            .create_post(document("Older", "market", datetime!(2024-02-01 0:00 UTC), true))
            .await
            .unwrap();

        let found = store.fetch_by_slug("market").await.unwrap().expect("found");
        assert_eq!(found.title, "Older");
        assert_eq!(store.fetch_published().await.unwrap().len(), 2);
        assert_eq!(store.fetch_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_records() {
        let store = JsonStore::in_memory();
        let missing = Uuid::new_v4();
        let doc = document("Ghost", "ghost", datetime!(2024-01-01 0:00 UTC), true);

        assert!(matches!(
            store.update_post(missing, doc).await,
            Err(RepoError::NotFound)
        ));
        assert!(matches!(
            store.delete_post(missing).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_replaces_fields_in_place() {
        let store = JsonStore::in_memory();
        let id = store
            .create_post(document("First", "first", datetime!(2024-01-01 0:00 UTC), false))
            .await
            .unwrap();

        let mut edited = document("First, edited", "first", datetime!(2024-01-02 0:00 UTC), true);
        edited.cover_image_url = Some("https://cdn.example/a.jpg".into());
        store.update_post(id, edited).await.unwrap();

        let record = store.find_by_id(id).await.unwrap().expect("record");
        assert_eq!(record.title, "First, edited");
        assert!(record.published);
        assert_eq!(record.cover_image_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }
}
