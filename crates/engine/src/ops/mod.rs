use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{LocalStorage, MediaStorage, ResultEngine};

mod catalog;
mod plugins;
mod ratings;
mod search;
mod submissions;
mod suggestions;
mod users;

pub use catalog::{CatalogListing, CatalogQuery, CategoryNode, SubcategoryNode};
pub use plugins::{AudioDemo, LinkedPlugin, PluginDetail, SubcategoryLabel};
pub use ratings::RatingStats;
pub use search::{SearchHit, UNCATEGORIZED_LABEL};
pub use submissions::{DemoUpload, MAX_DEMOS, PluginSubmission, Upload};
pub use suggestions::{NewSuggestion, Suggestion, SuggestionStatus};
pub use users::{Actor, NewUser, User};

/// Fallback image used when a plugin has none or the stored file is gone.
pub const DEFAULT_PLUGIN_IMAGE: &str = "/static/images/default_plugin.png";

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    storage: Arc<dyn MediaStorage>,
    default_image: String,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn storage(&self) -> &dyn MediaStorage {
        self.storage.as_ref()
    }

    /// Public URL of a plugin image, falling back to the default asset when
    /// no image is set or the stored file no longer exists.
    pub async fn image_url(&self, image: Option<&str>) -> String {
        match image {
            Some(path) if self.storage.exists(path).await => self.storage.url(path),
            _ => self.default_image.clone(),
        }
    }

    /// Remove files that were stored for a write that did not commit, or
    /// that belonged to a deleted plugin.
    async fn discard_files(&self, paths: &[String]) {
        for path in paths {
            if let Err(err) = self.storage.remove(path).await {
                tracing::warn!("failed to remove stored file {path}: {err}");
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    storage: Option<Arc<dyn MediaStorage>>,
    default_image: Option<String>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Storage backend for uploads. Defaults to [`LocalStorage::default`].
    pub fn storage(mut self, storage: Arc<dyn MediaStorage>) -> EngineBuilder {
        self.storage = Some(storage);
        self
    }

    /// Image URL used when a plugin has no usable image.
    pub fn default_image(mut self, url: impl Into<String>) -> EngineBuilder {
        self.default_image = Some(url.into());
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(LocalStorage::default())),
            default_image: self
                .default_image
                .unwrap_or_else(|| DEFAULT_PLUGIN_IMAGE.to_string()),
        })
    }
}
