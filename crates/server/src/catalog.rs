//! Catalog listing, plugin detail and live search endpoints.

use api_types::{
    PluginType,
    catalog::{
        AudioDemo, CatalogPage, CatalogParams, CategoryItem, LinkedPlugin, PluginDetail,
        PluginSummary, SubcategoryItem, SubcategoryLabel,
    },
    search::{SearchParams, SearchResponse, SearchResult},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use engine::{CatalogQuery, CategoryNode, Engine, Plugin, PluginKind, PluginRef, format_size};

use crate::{ServerError, server::ServerState, server::Viewer};

/// Header set by the front end on asynchronous fetches.
const REQUESTED_WITH: &str = "x-requested-with";

pub(crate) fn map_kind(kind: PluginKind) -> PluginType {
    match kind {
        PluginKind::Pro => PluginType::Pro,
        PluginKind::Alt => PluginType::Alt,
    }
}

pub(crate) fn unmap_kind(kind: PluginType) -> PluginKind {
    match kind {
        PluginType::Pro => PluginKind::Pro,
        PluginType::Alt => PluginKind::Alt,
    }
}

pub(crate) async fn map_plugin(engine: &Engine, plugin: Plugin) -> PluginSummary {
    PluginSummary {
        id: plugin.id(),
        kind: map_kind(plugin.kind()),
        image: engine.image_url(plugin.image.as_deref()).await,
        url: plugin.key.detail_url(),
        size_display: format_size(plugin.size),
        name: plugin.name,
        date_released: plugin.date_released,
        price: plugin.price,
        description: plugin.description,
        size: plugin.size,
        download_link: plugin.download_link,
        rating: plugin.rating,
    }
}

pub(crate) async fn map_plugins(engine: &Engine, plugins: Vec<Plugin>) -> Vec<PluginSummary> {
    let mut out = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        out.push(map_plugin(engine, plugin).await);
    }
    out
}

pub(crate) fn map_categories(tree: Vec<CategoryNode>) -> Vec<CategoryItem> {
    tree.into_iter()
        .map(|category| CategoryItem {
            id: category.id,
            name: category.name,
            slug: category.slug,
            subcategories: category
                .subcategories
                .into_iter()
                .map(|sub| SubcategoryItem {
                    id: sub.id,
                    name: sub.name,
                    slug: sub.slug,
                })
                .collect(),
        })
        .collect()
}

fn is_async_fetch(headers: &HeaderMap) -> bool {
    headers
        .get(REQUESTED_WITH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// `GET /plugins`
pub async fn list(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(params): Query<CatalogParams>,
) -> Result<Json<CatalogPage>, ServerError> {
    let listing = state
        .engine
        .list_plugins(CatalogQuery {
            tab: PluginKind::from_tab(params.tab.as_deref()),
            category: params.category,
            q: params.q,
        })
        .await?;

    let partial = is_async_fetch(&headers);
    let categories = if partial {
        None
    } else {
        Some(map_categories(state.engine.category_tree().await?))
    };

    Ok(Json(CatalogPage {
        tab: map_kind(listing.kind),
        category: listing.category,
        active_parent: listing.active_parent,
        q: listing.q,
        partial,
        plugins: map_plugins(&state.engine, listing.plugins).await,
        categories,
    }))
}

/// `GET /plugins/pro/{id}`
pub async fn pro_detail(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<PluginDetail>, ServerError> {
    detail(&state.engine, PluginRef::Pro(id), &viewer).await
}

/// `GET /plugins/alt/{id}`
pub async fn alt_detail(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<PluginDetail>, ServerError> {
    detail(&state.engine, PluginRef::Alt(id), &viewer).await
}

async fn detail(engine: &Engine, key: PluginRef, viewer: &Viewer) -> Result<Json<PluginDetail>, ServerError> {
    let detail = engine.plugin_detail(key, viewer.user_id()).await?;

    Ok(Json(PluginDetail {
        subcategories: detail
            .subcategories
            .into_iter()
            .map(|label| SubcategoryLabel {
                name: label.name,
                slug: label.slug,
                category: label.category_name,
            })
            .collect(),
        demos: detail
            .demos
            .into_iter()
            .map(|demo| AudioDemo {
                title: demo.title,
                url: demo.url,
            })
            .collect(),
        linked: detail
            .linked
            .into_iter()
            .map(|linked| LinkedPlugin {
                kind: map_kind(linked.key.kind()),
                id: linked.key.id(),
                url: linked.key.detail_url(),
                name: linked.name,
            })
            .collect(),
        user_rating: detail.user_rating,
        rating_count: detail.rating_count,
        plugin: map_plugin(engine, detail.plugin).await,
    }))
}

/// `GET /ajax/search`
pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ServerError> {
    let hits = state
        .engine
        .search(params.q.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SearchResponse {
        results: hits
            .into_iter()
            .map(|hit| SearchResult {
                name: hit.name,
                category: hit.category,
                kind: hit.type_label,
                image: hit.image,
                url: hit.url,
            })
            .collect(),
    }))
}
