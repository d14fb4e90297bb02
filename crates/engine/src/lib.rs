//! Catalog engine for audio plugins.
//!
//! [`Engine`] owns the database connection and a [`MediaStorage`] backend and
//! exposes the catalog query, search, rating, submission and suggestion
//! operations. Pro and Alternative plugins live in separate tables and are
//! addressed through [`PluginRef`].

pub use error::EngineError;
pub use ops::{
    Actor, AudioDemo, CatalogListing, CatalogQuery, CategoryNode, DEFAULT_PLUGIN_IMAGE, DemoUpload,
    Engine, EngineBuilder, LinkedPlugin, MAX_DEMOS, NewSuggestion, NewUser, PluginDetail,
    PluginSubmission, RatingStats, SearchHit, SubcategoryLabel, SubcategoryNode, Suggestion,
    SuggestionStatus, UNCATEGORIZED_LABEL, Upload, User,
};
pub use plugin::{Plugin, PluginKind, PluginRef};
pub use storage::{AUDIO_FOLDER, IMAGE_FOLDER, LocalStorage, MediaStorage};
pub use util::{format_size, slugify};

mod alt_plugin_subcategories;
mod alt_plugins;
mod audio_demos;
mod categories;
mod error;
mod ops;
mod plugin;
mod plugin_suggestions;
mod pro_plugin_alternatives;
mod pro_plugin_subcategories;
mod pro_plugins;
mod ratings;
mod storage;
mod subcategories;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
