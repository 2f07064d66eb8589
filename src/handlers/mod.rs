pub mod admin;
pub mod public;

use std::sync::Arc;

use narrative::application::error::AppError;
use narrative::application::repos::SettingsRepo;
use narrative::config::Settings;
use narrative::domain::entities::SiteSettingsRecord;
use narrative::infra::{error::InfraError, store::JsonStore, uploads::UploadStorage};
use tracing::warn;

/// Adapters shared by every command.
pub struct Ctx {
    pub settings: Settings,
    pub store: Arc<JsonStore>,
}

impl Ctx {
    pub async fn open(settings: Settings) -> Result<Self, AppError> {
        let store = JsonStore::open(settings.store.path.clone()).await?;
        Ok(Self {
            settings,
            store: Arc::new(store),
        })
    }

    pub fn uploads(&self) -> Result<Arc<UploadStorage>, AppError> {
        let storage = UploadStorage::new(
            self.settings.uploads.directory.clone(),
            self.settings.uploads.public_base_url.clone(),
        )
        .map_err(|err| InfraError::configuration(format!("upload storage: {err}")))?;
        Ok(Arc::new(storage))
    }

    pub async fn site_settings(&self) -> SiteSettingsRecord {
        match self.store.load_site_settings().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                warn!(target: "narrative::cli", error = %err, "Falling back to default site settings");
                SiteSettingsRecord::default()
            }
        }
    }
}
