use sea_orm::{QueryFilter, QueryOrder, QuerySelect};

use crate::{
    Plugin, ResultEngine, alt_plugins,
    plugin::PluginTable,
    pro_plugins,
};

use super::{Engine, catalog::name_contains};

/// Placeholder shown for plugins without any subcategory.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

const HITS_PER_KIND: u64 = 3;

/// One row of the live search dropdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub name: String,
    /// Subcategory names joined with `, `, ordered by parent then name.
    pub category: String,
    /// `Free` or `Pro/Paid`.
    pub type_label: String,
    pub image: String,
    pub url: String,
}

impl Engine {
    /// Live search over plugin names.
    ///
    /// Returns up to three free and three paid matches, free first. Queries
    /// of one character or less return nothing.
    pub async fn search(&self, q: &str) -> ResultEngine<Vec<SearchHit>> {
        let q = q.trim();
        if q.chars().count() <= 1 {
            return Ok(Vec::new());
        }

        let mut hits = self.search_kind::<alt_plugins::Entity>(q).await?;
        hits.extend(self.search_kind::<pro_plugins::Entity>(q).await?);
        Ok(hits)
    }

    async fn search_kind<E: PluginTable>(&self, q: &str) -> ResultEngine<Vec<SearchHit>> {
        let plugins: Vec<Plugin> = E::find()
            .filter(name_contains::<E>(q))
            .order_by_asc(E::id_column())
            .limit(HITS_PER_KIND)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let ids: Vec<i32> = plugins.iter().map(Plugin::id).collect();
        let mut labels = self.subcategory_labels::<E>(&ids).await?;

        let mut hits = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            let category = match labels.remove(&plugin.id()) {
                Some(found) if !found.is_empty() => found
                    .iter()
                    .map(|label| label.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => UNCATEGORIZED_LABEL.to_string(),
            };
            hits.push(SearchHit {
                image: self.image_url(plugin.image.as_deref()).await,
                url: plugin.key.detail_url(),
                type_label: E::KIND.type_label().to_string(),
                category,
                name: plugin.name,
            });
        }
        Ok(hits)
    }
}
