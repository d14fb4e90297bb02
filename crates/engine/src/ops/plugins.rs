use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, Statement, prelude::*};

use crate::{
    EngineError, Plugin, PluginRef, ResultEngine, alt_plugins, audio_demos,
    plugin::PluginTable, pro_plugin_alternatives, pro_plugins,
};

use super::Engine;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubcategoryLabel {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub category_name: String,
    pub category_slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioDemo {
    pub id: i32,
    pub title: String,
    /// Storage path of the audio file.
    pub file: String,
    pub url: String,
}

/// A plugin on the other side of the Pro ↔ Alternative link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedPlugin {
    pub key: PluginRef,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PluginDetail {
    pub plugin: Plugin,
    pub image_url: String,
    pub subcategories: Vec<SubcategoryLabel>,
    pub demos: Vec<AudioDemo>,
    /// Alternatives of a Pro plugin, or the Pro plugins an Alternative replaces.
    pub linked: Vec<LinkedPlugin>,
    /// The viewer's own score, when a viewer was given and has rated.
    pub user_rating: Option<f64>,
    pub rating_count: u64,
}

/// Load a plugin of either kind.
pub(crate) async fn find_plugin<C: ConnectionTrait>(db: &C, key: PluginRef) -> ResultEngine<Plugin> {
    let found: Option<Plugin> = match key {
        PluginRef::Pro(id) => pro_plugins::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Into::into),
        PluginRef::Alt(id) => alt_plugins::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Into::into),
    };
    found.ok_or_else(|| EngineError::KeyNotFound(format!("{} plugin {}", key.kind(), key.id())))
}

impl Engine {
    /// Everything the detail page shows for one plugin.
    pub async fn plugin_detail(&self, key: PluginRef, viewer: Option<i32>) -> ResultEngine<PluginDetail> {
        let plugin = find_plugin(&self.database, key).await?;

        let subcategories = match key {
            PluginRef::Pro(id) => self.subcategory_labels::<pro_plugins::Entity>(&[id]).await?,
            PluginRef::Alt(id) => self.subcategory_labels::<alt_plugins::Entity>(&[id]).await?,
        }
        .remove(&key.id())
        .unwrap_or_default();

        let demo_filter = match key {
            PluginRef::Pro(id) => audio_demos::Column::ProPluginId.eq(id),
            PluginRef::Alt(id) => audio_demos::Column::AltPluginId.eq(id),
        };
        let demos = audio_demos::Entity::find()
            .filter(demo_filter)
            .order_by_asc(audio_demos::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|demo| AudioDemo {
                url: self.storage.url(&demo.file),
                id: demo.id,
                title: demo.title,
                file: demo.file,
            })
            .collect();

        let linked = self.linked_plugins(key).await?;
        let user_rating = match viewer {
            Some(user_id) => self.user_rating(user_id, key).await?,
            None => None,
        };
        let rating_count = self.rating_stats(key).await?.count;

        Ok(PluginDetail {
            image_url: self.image_url(plugin.image.as_deref()).await,
            plugin,
            subcategories,
            demos,
            linked,
            user_rating,
            rating_count,
        })
    }

    async fn linked_plugins(&self, key: PluginRef) -> ResultEngine<Vec<LinkedPlugin>> {
        let linked = match key {
            PluginRef::Pro(id) => {
                let links = pro_plugin_alternatives::Entity::find()
                    .filter(pro_plugin_alternatives::Column::ProPluginId.eq(id))
                    .all(&self.database)
                    .await?;
                alt_plugins::Entity::find()
                    .filter(
                        alt_plugins::Column::Id
                            .is_in(links.iter().map(|link| link.alt_plugin_id)),
                    )
                    .order_by_asc(alt_plugins::Column::Name)
                    .all(&self.database)
                    .await?
                    .into_iter()
                    .map(|model| LinkedPlugin {
                        key: PluginRef::Alt(model.id),
                        name: model.name,
                    })
                    .collect()
            }
            PluginRef::Alt(id) => {
                let links = pro_plugin_alternatives::Entity::find()
                    .filter(pro_plugin_alternatives::Column::AltPluginId.eq(id))
                    .all(&self.database)
                    .await?;
                pro_plugins::Entity::find()
                    .filter(
                        pro_plugins::Column::Id
                            .is_in(links.iter().map(|link| link.pro_plugin_id)),
                    )
                    .order_by_asc(pro_plugins::Column::Name)
                    .all(&self.database)
                    .await?
                    .into_iter()
                    .map(|model| LinkedPlugin {
                        key: PluginRef::Pro(model.id),
                        name: model.name,
                    })
                    .collect()
            }
        };
        Ok(linked)
    }

    /// Pro plugins ordered by name, the choices for linking an Alternative.
    pub async fn pro_plugins_by_name(&self) -> ResultEngine<Vec<Plugin>> {
        Ok(pro_plugins::Entity::find()
            .order_by_asc(pro_plugins::Column::Name)
            .order_by_asc(pro_plugins::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Plugins of both kinds submitted by `user_id`, Pro first.
    pub async fn plugins_by_submitter(&self, user_id: i32) -> ResultEngine<Vec<Plugin>> {
        let mut plugins: Vec<Plugin> = pro_plugins::Entity::find()
            .filter(pro_plugins::Column::SubmitterId.eq(user_id))
            .order_by_asc(pro_plugins::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        plugins.extend(
            alt_plugins::Entity::find()
                .filter(alt_plugins::Column::SubmitterId.eq(user_id))
                .order_by_asc(alt_plugins::Column::Id)
                .all(&self.database)
                .await?
                .into_iter()
                .map(Plugin::from),
        );
        Ok(plugins)
    }

    /// Subcategories of every plugin in `ids`, fetched in a single query and
    /// ordered by parent name then name.
    pub(super) async fn subcategory_labels<E: PluginTable>(
        &self,
        ids: &[i32],
    ) -> ResultEngine<HashMap<i32, Vec<SubcategoryLabel>>> {
        let mut labels: HashMap<i32, Vec<SubcategoryLabel>> = HashMap::new();
        if ids.is_empty() {
            return Ok(labels);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            format!(
                "SELECT l.plugin_id AS plugin_id, s.id AS id, s.name AS name, s.slug AS slug, \
                        c.name AS category_name, c.slug AS category_slug \
                 FROM {link} l \
                 JOIN subcategories s ON s.id = l.subcategory_id \
                 JOIN categories c ON c.id = s.category_id \
                 WHERE l.plugin_id IN ({placeholders}) \
                 ORDER BY c.name, s.name, s.id",
                link = E::SUBCATEGORY_LINK,
            ),
            ids.iter().map(|id| Value::from(*id)).collect::<Vec<_>>(),
        );

        for row in self.database.query_all(stmt).await? {
            let plugin_id: i32 = row.try_get("", "plugin_id")?;
            labels.entry(plugin_id).or_default().push(SubcategoryLabel {
                id: row.try_get("", "id")?,
                name: row.try_get("", "name")?,
                slug: row.try_get("", "slug")?,
                category_name: row.try_get("", "category_name")?,
                category_slug: row.try_get("", "category_slug")?,
            });
        }
        Ok(labels)
    }
}
