use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info};
use url::Url;

use crate::application::auth::AdminSession;
use crate::application::repos::{FileStorage, SettingsRepo};
use crate::domain::entities::{SiteSettingsPatch, SiteSettingsRecord};

use super::{WriteError, unix_millis};

#[derive(Clone)]
pub struct AdminSettingsService {
    repo: Arc<dyn SettingsRepo>,
    storage: Arc<dyn FileStorage>,
}

impl AdminSettingsService {
    pub fn new(repo: Arc<dyn SettingsRepo>, storage: Arc<dyn FileStorage>) -> Self {
        Self { repo, storage }
    }

    /// Current settings, falling back to the built-in defaults when nothing is
    /// stored or the store cannot be read.
    pub async fn load(&self) -> SiteSettingsRecord {
        match self.repo.load_site_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => SiteSettingsRecord::default(),
            Err(err) => {
                error!(target: "narrative::admin::settings", error = %err, "Failed to load site settings");
                SiteSettingsRecord::default()
            }
        }
    }

    /// Merge title and author into the stored settings; the hero image is untouched.
    pub async fn save(
        &self,
        session: &AdminSession,
        site_title: &str,
        site_author: &str,
    ) -> Result<SiteSettingsRecord, WriteError> {
        let patch = SiteSettingsPatch {
            site_title: Some(site_title.trim().to_string()),
            site_author: Some(site_author.trim().to_string()),
            hero_image_url: None,
        };
        self.repo
            .merge_site_settings(patch)
            .await
            .map_err(WriteError::Settings)?;
        info!(target: "narrative::admin::settings", actor = %session.email, "Site settings saved");
        Ok(self.load().await)
    }

    /// Upload a new hero image and point the settings at it.
    pub async fn replace_hero(
        &self,
        session: &AdminSession,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<Url, WriteError> {
        if bytes.is_empty() {
            return Err(WriteError::Validation("Please choose an image"));
        }

        let path = format!(
            "site/hero/{}-{}",
            unix_millis(),
            sanitize_file_name(file_name)
        );
        let url = self
            .storage
            .upload(&path, bytes)
            .await
            .map_err(|err| WriteError::Upload(err.to_string()))?;

        let patch = SiteSettingsPatch {
            hero_image_url: Some(url.to_string()),
            ..SiteSettingsPatch::default()
        };
        self.repo
            .merge_site_settings(patch)
            .await
            .map_err(WriteError::Settings)?;
        info!(
            target: "narrative::admin::settings",
            actor = %session.email,
            url = %url,
            "Hero image replaced"
        );
        Ok(url)
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DEFAULT_SITE_AUTHOR, DEFAULT_SITE_TITLE};
    use crate::infra::store::JsonStore;
    use crate::infra::uploads::UploadStorage;

    fn service() -> (AdminSettingsService, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(
            dir.path().to_path_buf(),
            Url::parse("http://127.0.0.1:3000/uploads/").expect("url"),
        )
        .expect("storage");
        let service =
            AdminSettingsService::new(Arc::new(JsonStore::in_memory()), Arc::new(storage));
        (service, dir)
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("my photo (1).JPG"), "my_photo__1_.JPG");
        assert_eq!(sanitize_file_name("../../etc"), ".._.._etc");
        assert_eq!(sanitize_file_name("plaża.png"), "pla_a.png");
    }

    #[tokio::test]
    async fn load_defaults_when_nothing_stored() {
        let (service, _dir) = service();
        let settings = service.load().await;
        assert_eq!(settings.site_title, DEFAULT_SITE_TITLE);
        assert_eq!(settings.site_author, DEFAULT_SITE_AUTHOR);
        assert!(settings.hero_image_url.is_none());
    }

    #[tokio::test]
    async fn save_trims_and_preserves_hero() {
        let (service, dir) = service();
        let session = AdminSession::new("carla@example.com");

        let url = service
            .replace_hero(&session, "sunset beach.png", Bytes::from_static(b"png"))
            .await
            .expect("hero uploaded");
        assert!(url.path().starts_with("/uploads/site/hero/"));
        assert!(url.path().ends_with("-sunset_beach.png"));
        let relative = url.path().trim_start_matches("/uploads/");
        assert!(dir.path().join(relative).exists());

        let saved = service
            .save(&session, "  Faces of the Market ", " C. Schultz ")
            .await
            .expect("saved");
        assert_eq!(saved.site_title, "Faces of the Market");
        assert_eq!(saved.site_author, "C. Schultz");
        assert_eq!(saved.hero_image_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn empty_hero_upload_is_rejected() {
        let (service, _dir) = service();
        let session = AdminSession::new("carla@example.com");
        let err = service
            .replace_hero(&session, "empty.png", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please choose an image");
    }
}
