//! The two plugin kinds and the typed handle that points at either of them.
//!
//! Pro and Alternative plugins are stored in separate tables with the same
//! shape. Everything outside the entity modules addresses a plugin through
//! [`PluginRef`], so every branch on the kind is an exhaustive `match`.

use chrono::NaiveDate;
use sea_orm::EntityTrait;

use crate::{EngineError, alt_plugins, pro_plugins};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PluginKind {
    #[default]
    Pro,
    Alt,
}

impl PluginKind {
    /// Canonical tag used in URLs and in the `ratings.target_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pro => "pro",
            Self::Alt => "alt",
        }
    }

    /// Human readable label shown next to search results.
    pub fn type_label(self) -> &'static str {
        match self {
            Self::Pro => "Pro/Paid",
            Self::Alt => "Free",
        }
    }

    /// Resolve the catalog `tab` parameter. Anything unrecognized means Pro.
    pub fn from_tab(tab: Option<&str>) -> Self {
        match tab.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("alt") => Self::Alt,
            _ => Self::Pro,
        }
    }
}

impl TryFrom<&str> for PluginKind {
    type Error = EngineError;

    /// Accepts the URL tags (`pro`, `alt`) and the form choices (`PRO`, `ALT`).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pro" => Ok(Self::Pro),
            "alt" => Ok(Self::Alt),
            other => Err(EngineError::InvalidKind(format!(
                "unknown plugin type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plugin of either kind, identified by its row id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PluginRef {
    Pro(i32),
    Alt(i32),
}

impl PluginRef {
    pub fn new(kind: PluginKind, id: i32) -> Self {
        match kind {
            PluginKind::Pro => Self::Pro(id),
            PluginKind::Alt => Self::Alt(id),
        }
    }

    pub fn kind(self) -> PluginKind {
        match self {
            Self::Pro(_) => PluginKind::Pro,
            Self::Alt(_) => PluginKind::Alt,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Self::Pro(id) | Self::Alt(id) => id,
        }
    }

    /// Path of the detail page.
    pub fn detail_url(self) -> String {
        format!("/plugins/{}/{}", self.kind().as_str(), self.id())
    }
}

/// A plugin listing, independent of the table it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct Plugin {
    pub key: PluginRef,
    pub submitter_id: Option<i32>,
    pub name: String,
    pub date_released: NaiveDate,
    pub price: i32,
    pub description: String,
    /// Size in megabytes.
    pub size: f64,
    pub download_link: String,
    /// Storage path of the image, if one was uploaded.
    pub image: Option<String>,
    /// Cached mean of every rating of this plugin.
    pub rating: f64,
}

impl Plugin {
    pub fn kind(&self) -> PluginKind {
        self.key.kind()
    }

    pub fn id(&self) -> i32 {
        self.key.id()
    }
}

macro_rules! impl_plugin_from_model {
    ($module:ident, $variant:ident) => {
        impl From<$module::Model> for Plugin {
            fn from(model: $module::Model) -> Self {
                Self {
                    key: PluginRef::$variant(model.id),
                    submitter_id: model.submitter_id,
                    name: model.name,
                    date_released: model.date_released,
                    price: model.price,
                    description: model.description,
                    size: model.size,
                    download_link: model.download_link,
                    image: model.image,
                    rating: model.rating,
                }
            }
        }
    };
}

impl_plugin_from_model!(pro_plugins, Pro);
impl_plugin_from_model!(alt_plugins, Alt);

/// Table-level capabilities shared by both plugin entities.
///
/// Generic query code (catalog filters, search, rating recompute) is written
/// once against this trait and instantiated for each kind.
pub(crate) trait PluginTable: EntityTrait<Model: Into<Plugin>> {
    const KIND: PluginKind;
    /// Subcategory link table, with `plugin_id` and `subcategory_id` columns.
    const SUBCATEGORY_LINK: &'static str;

    fn id_column() -> Self::Column;
    fn rating_column() -> Self::Column;
    fn name_norm_column() -> Self::Column;
}

impl PluginTable for pro_plugins::Entity {
    const KIND: PluginKind = PluginKind::Pro;
    const SUBCATEGORY_LINK: &'static str = "pro_plugin_subcategories";

    fn id_column() -> Self::Column {
        pro_plugins::Column::Id
    }

    fn rating_column() -> Self::Column {
        pro_plugins::Column::Rating
    }

    fn name_norm_column() -> Self::Column {
        pro_plugins::Column::NameNorm
    }
}

impl PluginTable for alt_plugins::Entity {
    const KIND: PluginKind = PluginKind::Alt;
    const SUBCATEGORY_LINK: &'static str = "alt_plugin_subcategories";

    fn id_column() -> Self::Column {
        alt_plugins::Column::Id
    }

    fn rating_column() -> Self::Column {
        alt_plugins::Column::Rating
    }

    fn name_norm_column() -> Self::Column {
        alt_plugins::Column::NameNorm
    }
}

/// Name of the `plugin_id` column of both subcategory link tables.
pub(crate) fn link_plugin_column() -> sea_orm::sea_query::Alias {
    sea_orm::sea_query::Alias::new("plugin_id")
}

/// Name of the `subcategory_id` column of both subcategory link tables.
pub(crate) fn link_subcategory_column() -> sea_orm::sea_query::Alias {
    sea_orm::sea_query::Alias::new("subcategory_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_defaults_to_pro() {
        assert_eq!(PluginKind::from_tab(None), PluginKind::Pro);
        assert_eq!(PluginKind::from_tab(Some("bogus")), PluginKind::Pro);
        assert_eq!(PluginKind::from_tab(Some("alt")), PluginKind::Alt);
        assert_eq!(PluginKind::from_tab(Some("ALT")), PluginKind::Alt);
    }

    #[test]
    fn kind_parses_url_tags_and_form_choices() {
        assert_eq!(PluginKind::try_from("pro").ok(), Some(PluginKind::Pro));
        assert_eq!(PluginKind::try_from("ALT").ok(), Some(PluginKind::Alt));
        assert!(matches!(
            PluginKind::try_from("synth"),
            Err(EngineError::InvalidKind(_))
        ));
    }

    #[test]
    fn plugin_ref_round_trips_kind_and_id() {
        let key = PluginRef::new(PluginKind::Alt, 7);
        assert_eq!(key, PluginRef::Alt(7));
        assert_eq!(key.kind(), PluginKind::Alt);
        assert_eq!(key.id(), 7);
        assert_eq!(key.detail_url(), "/plugins/alt/7");
    }
}
