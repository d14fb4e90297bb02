use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder,
    prelude::*,
    sea_query::{Alias, Expr, LikeExpr, Query, SelectStatement, SimpleExpr},
};

use crate::{
    EngineError, Plugin, PluginKind, ResultEngine, alt_plugins, categories,
    plugin::{PluginTable, link_plugin_column, link_subcategory_column},
    pro_plugins, subcategories,
    util::{like_contains_pattern, required_text, slugify},
};

use super::Engine;

/// Parameters of a catalog listing request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub tab: PluginKind,
    /// A category or subcategory slug.
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogListing {
    pub kind: PluginKind,
    pub plugins: Vec<Plugin>,
    /// The slug that was applied as a filter, if it resolved.
    pub category: Option<String>,
    /// Slug of the top-level category to highlight.
    pub active_parent: Option<String>,
    pub q: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubcategoryNode {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub subcategories: Vec<SubcategoryNode>,
}

/// A resolved `category` parameter.
#[derive(Clone, Copy, Debug)]
enum CategoryFilter {
    Category(i32),
    Subcategory(i32),
}

/// Plugin ids of `E` reachable through the subcategory link table.
fn linked_plugin_ids<E: PluginTable>(filter: CategoryFilter) -> SelectStatement {
    let link = Alias::new(E::SUBCATEGORY_LINK);
    let mut query = Query::select();
    query
        .column((link.clone(), link_plugin_column()))
        .from(link.clone());
    match filter {
        CategoryFilter::Subcategory(id) => {
            query.and_where(Expr::col((link, link_subcategory_column())).eq(id));
        }
        CategoryFilter::Category(id) => {
            query
                .inner_join(
                    subcategories::Entity,
                    Expr::col((subcategories::Entity, subcategories::Column::Id))
                        .equals((link, link_subcategory_column())),
                )
                .and_where(
                    Expr::col((subcategories::Entity, subcategories::Column::CategoryId)).eq(id),
                );
        }
    }
    query.to_owned()
}

impl Engine {
    /// Build a catalog listing.
    ///
    /// The `category` slug is tried as a category first and as a subcategory
    /// second. A slug matching neither is ignored. Plugins are returned once
    /// each, in insertion order.
    pub async fn list_plugins(&self, query: CatalogQuery) -> ResultEngine<CatalogListing> {
        let slug = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let resolved = match slug {
            Some(slug) => self.resolve_category_filter(slug).await?,
            None => None,
        };
        let q = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        let filter = resolved.as_ref().map(|(filter, _)| *filter);
        let plugins = match query.tab {
            PluginKind::Pro => {
                self.filtered_plugins::<pro_plugins::Entity>(filter, q.as_deref())
                    .await?
            }
            PluginKind::Alt => {
                self.filtered_plugins::<alt_plugins::Entity>(filter, q.as_deref())
                    .await?
            }
        };

        let (category, active_parent) = match resolved {
            Some((_, parent)) => (slug.map(ToString::to_string), Some(parent)),
            None => (None, None),
        };

        Ok(CatalogListing {
            kind: query.tab,
            plugins,
            category,
            active_parent,
            q,
        })
    }

    /// Resolve a slug to a filter plus the slug of the category to highlight.
    async fn resolve_category_filter(
        &self,
        slug: &str,
    ) -> ResultEngine<Option<(CategoryFilter, String)>> {
        if let Some(category) = categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.database)
            .await?
        {
            return Ok(Some((
                CategoryFilter::Category(category.id),
                category.slug,
            )));
        }

        // Subcategory slugs are only unique per parent; the oldest one wins.
        let found = subcategories::Entity::find()
            .filter(subcategories::Column::Slug.eq(slug))
            .order_by_asc(subcategories::Column::Id)
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?;
        Ok(match found {
            Some((subcategory, Some(parent))) => {
                Some((CategoryFilter::Subcategory(subcategory.id), parent.slug))
            }
            _ => None,
        })
    }

    async fn filtered_plugins<E: PluginTable>(
        &self,
        filter: Option<CategoryFilter>,
        q: Option<&str>,
    ) -> ResultEngine<Vec<Plugin>> {
        let mut select = E::find();
        if let Some(filter) = filter {
            select = select.filter(E::id_column().in_subquery(linked_plugin_ids::<E>(filter)));
        }
        if let Some(q) = q {
            select = select.filter(name_contains::<E>(q));
        }
        let models = select
            .order_by_asc(E::id_column())
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Every category with its subcategories, both ordered by name.
    pub async fn category_tree(&self) -> ResultEngine<Vec<CategoryNode>> {
        let parents = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?;
        let children = subcategories::Entity::find()
            .order_by_asc(subcategories::Column::Name)
            .order_by_asc(subcategories::Column::Id)
            .all(&self.database)
            .await?;

        Ok(parents
            .into_iter()
            .map(|parent| CategoryNode {
                subcategories: children
                    .iter()
                    .filter(|child| child.category_id == parent.id)
                    .map(|child| SubcategoryNode {
                        id: child.id,
                        name: child.name.clone(),
                        slug: child.slug.clone(),
                    })
                    .collect(),
                id: parent.id,
                name: parent.name,
                slug: parent.slug,
            })
            .collect())
    }

    /// Create a top-level category. The slug is derived from the name when
    /// not given.
    pub async fn create_category(&self, name: &str, slug: Option<&str>) -> ResultEngine<CategoryNode> {
        let name = required_text(name, "category name", None)?;
        let slug = resolve_slug(&name, slug)?;
        if categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug.clone()))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(slug));
        }

        let model = categories::ActiveModel {
            name: ActiveValue::Set(name),
            slug: ActiveValue::Set(slug),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        tracing::info!("created category {}", model.slug);

        Ok(CategoryNode {
            id: model.id,
            name: model.name,
            slug: model.slug,
            subcategories: Vec::new(),
        })
    }

    /// Create a subcategory under the category with slug `category_slug`.
    pub async fn create_subcategory(
        &self,
        category_slug: &str,
        name: &str,
        slug: Option<&str>,
    ) -> ResultEngine<SubcategoryNode> {
        let parent = categories::Entity::find()
            .filter(categories::Column::Slug.eq(category_slug.trim()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(category_slug.to_string()))?;
        let name = required_text(name, "subcategory name", None)?;
        let slug = resolve_slug(&name, slug)?;
        if subcategories::Entity::find()
            .filter(subcategories::Column::CategoryId.eq(parent.id))
            .filter(subcategories::Column::Slug.eq(slug.clone()))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(format!("{}/{slug}", parent.slug)));
        }

        let model = subcategories::ActiveModel {
            category_id: ActiveValue::Set(parent.id),
            name: ActiveValue::Set(name),
            slug: ActiveValue::Set(slug),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        tracing::info!("created subcategory {}/{}", parent.slug, model.slug);

        Ok(SubcategoryNode {
            id: model.id,
            name: model.name,
            slug: model.slug,
        })
    }
}

/// Case-insensitive substring match on the folded plugin name.
pub(super) fn name_contains<E: PluginTable>(q: &str) -> SimpleExpr {
    Expr::col((E::default(), E::name_norm_column()))
        .like(LikeExpr::new(like_contains_pattern(q)).escape('\\'))
}

fn resolve_slug(name: &str, slug: Option<&str>) -> ResultEngine<String> {
    let source = slug.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(name);
    slugify(source)
        .ok_or_else(|| EngineError::InvalidField(format!("cannot derive a slug from '{source}'")))
}
