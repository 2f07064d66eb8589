use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use time::{Date, UtcOffset};
use tracing::{error, info};
use uuid::Uuid;

use crate::application::auth::AdminSession;
use crate::application::collection::{CollectionScope, PostCollection};
use crate::application::repos::{FileStorage, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::{PostDocument, PostRecord, local_midnight};
use crate::domain::posts::{SortOrder, calendar_date, format_form_date, project};
use crate::domain::slug::{SlugError, derive_slug};
use crate::presentation::views::{AdminRow, admin_row};

use super::settings::sanitize_file_name;
use super::{WriteError, ensure_non_empty, unix_millis};

pub const EMPTY_LIST_MESSAGE: &str = "No stories yet. Click \"New Narrative\" to create one.";
pub const LIST_ERROR_MESSAGE: &str = "Error loading stories.";

/// Image selected in the story form.
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Story form submission. `id` is set when editing an existing story.
#[derive(Debug, Clone, Default)]
pub struct SavePostCommand {
    pub id: Option<Uuid>,
    pub title: String,
    pub date: Option<Date>,
    pub content: String,
    pub published: bool,
    pub cover: Option<CoverUpload>,
}

/// Values used to pre-fill the edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostForm {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub date: String,
    pub content: String,
    pub published: bool,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdminListPage {
    Empty { message: &'static str },
    Error { message: &'static str },
    Rows { rows: Vec<AdminRow> },
}

#[derive(Clone)]
pub struct AdminPostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    storage: Arc<dyn FileStorage>,
    collection: Arc<PostCollection>,
    offset: UtcOffset,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        storage: Arc<dyn FileStorage>,
        offset: UtcOffset,
    ) -> Self {
        let collection = Arc::new(PostCollection::new(reader.clone(), CollectionScope::Admin));
        Self {
            reader,
            writer,
            storage,
            collection,
            offset,
        }
    }

    /// Reload every story, drafts included, newest first.
    pub async fn list(&self, session: &AdminSession) -> AdminListPage {
        match self.collection.reload().await {
            Ok(posts) if posts.is_empty() => AdminListPage::Empty {
                message: EMPTY_LIST_MESSAGE,
            },
            Ok(posts) => AdminListPage::Rows {
                rows: project(&posts, "", SortOrder::NewFirst)
                    .into_iter()
                    .map(|record| admin_row(record, self.offset))
                    .collect(),
            },
            Err(err) => {
                error!(
                    target: "narrative::admin::posts",
                    actor = %session.email,
                    error = %err,
                    "Failed to load stories"
                );
                AdminListPage::Error {
                    message: LIST_ERROR_MESSAGE,
                }
            }
        }
    }

    pub async fn edit_form(&self, _session: &AdminSession, id: Uuid) -> Result<PostForm, WriteError> {
        let record = self.find(id, WriteError::Load).await?;
        Ok(PostForm {
            id: record.id,
            date: record
                .date
                .map(|stamp| format_form_date(calendar_date(stamp, self.offset)))
                .unwrap_or_default(),
            title: record.title,
            slug: record.slug,
            content: record.content,
            published: record.published,
            cover_image_url: record.cover_image_url,
        })
    }

    /// Create a story, or update it when `command.id` is set.
    ///
    /// Slugs are derived on create only; edits keep the stored permalink even
    /// when the title changes.
    pub async fn save(
        &self,
        session: &AdminSession,
        command: SavePostCommand,
    ) -> Result<PostRecord, WriteError> {
        let title = command.title.trim().to_string();
        let content = command.content.trim().to_string();
        ensure_non_empty(&title, "Please enter a title")?;
        let date = command
            .date
            .ok_or(WriteError::Validation("Please select a date"))?;
        ensure_non_empty(&content, "Please enter story content")?;

        let existing = match command.id {
            Some(id) => Some(self.find(id, WriteError::Save).await?),
            None => None,
        };

        let slug = match &existing {
            Some(record) if !record.slug.is_empty() => record.slug.clone(),
            _ => slug_for(&title)?,
        };

        let cover_image_url = match command.cover {
            Some(cover) => Some(self.upload_cover(&slug, cover).await?),
            None => existing
                .as_ref()
                .and_then(|record| record.cover_image_url.clone()),
        };

        let document = PostDocument {
            title,
            slug,
            content,
            date: local_midnight(date, self.offset),
            published: command.published,
            cover_image_url,
        };

        let record = match existing {
            Some(record) => {
                self.writer
                    .update_post(record.id, document.clone())
                    .await
                    .map_err(WriteError::Save)?;
                info!(
                    target: "narrative::admin::posts",
                    actor = %session.email,
                    id = %record.id,
                    slug = %document.slug,
                    "Story updated"
                );
                document.into_record(record.id)
            }
            None => {
                let id = self
                    .writer
                    .create_post(document.clone())
                    .await
                    .map_err(WriteError::Save)?;
                info!(
                    target: "narrative::admin::posts",
                    actor = %session.email,
                    id = %id,
                    slug = %document.slug,
                    "Story created"
                );
                document.into_record(id)
            }
        };

        self.refresh_list().await;
        Ok(record)
    }

    pub async fn delete(&self, session: &AdminSession, id: Uuid) -> Result<(), WriteError> {
        self.writer.delete_post(id).await.map_err(WriteError::Delete)?;
        info!(target: "narrative::admin::posts", actor = %session.email, id = %id, "Story deleted");
        self.refresh_list().await;
        Ok(())
    }

    async fn find(
        &self,
        id: Uuid,
        on_error: fn(RepoError) -> WriteError,
    ) -> Result<PostRecord, WriteError> {
        self.reader
            .find_by_id(id)
            .await
            .map_err(on_error)?
            .ok_or(WriteError::NotFound(id))
    }

    async fn upload_cover(&self, slug: &str, cover: CoverUpload) -> Result<String, WriteError> {
        let path = format!(
            "post-images/{slug}/{}-{}",
            unix_millis(),
            sanitize_file_name(&cover.file_name)
        );
        let url = self
            .storage
            .upload(&path, cover.bytes)
            .await
            .map_err(|err| WriteError::Upload(err.to_string()))?;
        Ok(url.to_string())
    }

    async fn refresh_list(&self) {
        if let Err(err) = self.collection.reload().await {
            error!(target: "narrative::admin::posts", error = %err, "Failed to reload stories list");
        }
    }
}

fn slug_for(title: &str) -> Result<String, WriteError> {
    derive_slug(title).map_err(|err| match err {
        SlugError::EmptyInput => WriteError::Validation("Please enter a title"),
        SlugError::Unrepresentable { .. } => {
            WriteError::Validation("Title must contain at least one letter or digit")
        }
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::infra::store::JsonStore;
    use crate::infra::uploads::UploadStorage;

    struct Fixture {
        service: AdminPostService,
        store: Arc<JsonStore>,
        _uploads: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(JsonStore::in_memory());
        let uploads = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(
            uploads.path().to_path_buf(),
            url::Url::parse("https://cdn.example/files/").expect("url"),
        )
        .expect("storage");
        let service = AdminPostService::new(
            store.clone(),
            store.clone(),
            Arc::new(storage),
            UtcOffset::UTC,
        );
        Fixture {
            service,
            store,
            _uploads: uploads,
        }
    }

    fn command(title: &str) -> SavePostCommand {
        SavePostCommand {
            id: None,
            title: title.to_string(),
            date: Some(date!(2024 - 04 - 12)),
            content: "We met by the fountain.".to_string(),
            published: true,
            cover: None,
        }
    }

    fn session() -> AdminSession {
        AdminSession::new("carla@example.com")
    }

    #[tokio::test]
    async fn validation_runs_in_form_order() {
        let fx = fixture();
        let mut cmd = command("  ");
        cmd.date = None;
        cmd.content.clear();
        let err = fx.service.save(&session(), cmd).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a title");

        let mut cmd = command("Fountain");
        cmd.date = None;
        cmd.content.clear();
        let err = fx.service.save(&session(), cmd).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a date");

        let mut cmd = command("Fountain");
        cmd.content = "   ".into();
        let err = fx.service.save(&session(), cmd).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter story content");
    }

    #[tokio::test]
    async fn create_derives_slug_and_stores_local_midnight() {
        let fx = fixture();
        let record = fx
            .service
            .save(&session(), command("The Fountain, Again"))
            .await
            .expect("created");

        assert_eq!(record.slug, "the-fountain-again");
        let stored = fx.store.find_by_id(record.id).await.unwrap().expect("stored");
        assert_eq!(stored.date.map(|d| d.date()), Some(date!(2024 - 04 - 12)));
        assert_eq!(stored.date.map(|d| d.hour()), Some(0));
    }

    #[tokio::test]
    async fn edit_keeps_permalink_and_existing_cover() {
        let fx = fixture();
        let mut first = command("Original Title");
        first.cover = Some(CoverUpload {
            file_name: "cover.jpg".into(),
            bytes: Bytes::from_static(b"jpeg"),
        });
        let created = fx.service.save(&session(), first).await.expect("created");
        let cover = created.cover_image_url.clone().expect("cover uploaded");
        assert!(cover.starts_with("https://cdn.example/files/post-images/original-title/"));
        assert!(cover.ends_with("-cover.jpg"));

        let mut edit = command("Renamed Title");
        edit.id = Some(created.id);
        edit.published = false;
        let updated = fx.service.save(&session(), edit).await.expect("updated");

        assert_eq!(updated.slug, "original-title");
        assert_eq!(updated.title, "Renamed Title");
        assert_eq!(updated.cover_image_url, Some(cover));
        assert!(!updated.published);
    }

    #[tokio::test]
    async fn editing_unknown_story_is_not_found() {
        let fx = fixture();
        let mut edit = command("Ghost");
        let id = Uuid::new_v4();
        edit.id = Some(id);
        assert!(matches!(
            fx.service.save(&session(), edit).await,
            Err(WriteError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn list_includes_drafts_newest_first_and_reflects_deletes() {
        let fx = fixture();
        assert_eq!(
            fx.service.list(&session()).await,
            AdminListPage::Empty {
                message: EMPTY_LIST_MESSAGE
            }
        );

        let older = fx.service.save(&session(), command("Older")).await.expect("older");
        let mut draft = command("Newer Draft");
        draft.date = Some(date!(2024 - 05 - 01));
        draft.published = false;
        fx.service.save(&session(), draft).await.expect("draft");

        let AdminListPage::Rows { rows } = fx.service.list(&session()).await else {
            panic!("expected rows");
        };
        let labels: Vec<_> = rows.iter().map(|row| row.status_label.as_str()).collect();
        assert_eq!(labels, ["Draft \u{2022} May 1, 2024", "Published Apr 12, 2024"]);

        fx.service.delete(&session(), older.id).await.expect("deleted");
        let AdminListPage::Rows { rows } = fx.service.list(&session()).await else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Newer Draft");
    }

    #[tokio::test]
    async fn failed_delete_reports_the_backend_message() {
        let fx = fixture();
        let err = fx
            .service
            .delete(&session(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Delete(RepoError::NotFound)));
        assert_eq!(err.to_string(), "Error deleting post: resource not found");
    }

    #[tokio::test]
    async fn edit_form_formats_date_for_input() {
        let fx = fixture();
        let created = fx.service.save(&session(), command("Form Test")).await.expect("created");
        let form = fx.service.edit_form(&session(), created.id).await.expect("form");
        assert_eq!(form.date, "2024-04-12");
        assert_eq!(form.slug, "form-test");
    }
}
