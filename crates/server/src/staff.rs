//! Staff dashboard: plugin submission, suggestion review and deletion.

use api_types::{
    profile::Suggestion,
    staff::{
        Dashboard, DashboardAction, DashboardResponse, DeletePlugin, DeleteResponse, PluginChoice,
        PluginForm, Upload,
    },
};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::{DemoUpload, PluginRef, PluginSubmission};

use crate::{
    ServerError,
    catalog::{map_categories, map_plugins, unmap_kind},
    profile::map_suggestion,
    server::{ServerState, Viewer},
};

fn decode_upload(upload: Upload) -> Result<engine::Upload, ServerError> {
    let bytes = STANDARD
        .decode(upload.content_base64.trim())
        .map_err(|err| ServerError::Generic(format!("invalid upload {}: {err}", upload.file_name)))?;
    Ok(engine::Upload {
        file_name: upload.file_name,
        bytes,
    })
}

fn map_submission(form: PluginForm) -> Result<PluginSubmission, ServerError> {
    let image = form.image.map(decode_upload).transpose()?;
    let demos = form
        .audio_demos
        .into_iter()
        .map(|slot| {
            Ok(DemoUpload {
                title: slot.title,
                file: slot.file.map(decode_upload).transpose()?,
            })
        })
        .collect::<Result<Vec<_>, ServerError>>()?;

    Ok(PluginSubmission {
        kind: unmap_kind(form.plugin_type),
        name: form.plugin_name,
        date_released: form.date_released,
        subcategories: form.subcategory,
        price: form.price,
        description: form.description,
        size: form.size,
        download_link: form.download_link,
        image,
        link_to_pro_plugins: form.link_to_pro_plugins,
        demos,
        suggestion_id: form.suggestion_id,
    })
}

/// `GET /staff/dashboard`
pub async fn dashboard(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
) -> Result<Json<Dashboard>, ServerError> {
    let user = viewer.require_staff()?;

    let categories = map_categories(state.engine.category_tree().await?);
    let pro_plugins = state
        .engine
        .pro_plugins_by_name()
        .await?
        .into_iter()
        .map(|plugin| PluginChoice {
            id: plugin.id(),
            name: plugin.name,
        })
        .collect();
    let pending_suggestions: Vec<Suggestion> = state
        .engine
        .pending_suggestions()
        .await?
        .into_iter()
        .map(map_suggestion)
        .collect();
    let mine = state.engine.plugins_by_submitter(user.id).await?;

    Ok(Json(Dashboard {
        categories,
        pro_plugins,
        pending_suggestions,
        my_plugins: map_plugins(&state.engine, mine).await,
    }))
}

/// `POST /staff/dashboard`
pub async fn dashboard_action(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    payload: Result<Json<DashboardAction>, JsonRejection>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let actor = viewer.require_staff()?.actor();
    let Json(payload) = payload?;

    match payload {
        DashboardAction::SubmitPlugin(form) => {
            let submission = map_submission(form)?;
            let key = state.engine.submit_plugin(&actor, submission).await?;
            Ok(Json(DashboardResponse {
                success: true,
                message: format!("{} plugin submitted", key.kind().type_label()),
                plugin_id: Some(key.id()),
            }))
        }
        DashboardAction::RejectSuggestion { suggestion_id } => {
            let suggestion = state
                .engine
                .reject_suggestion(&actor, suggestion_id)
                .await?;
            Ok(Json(DashboardResponse {
                success: true,
                message: format!("suggestion '{}' rejected", suggestion.name),
                plugin_id: None,
            }))
        }
    }
}

/// `POST /delete_plugin`
pub async fn delete_plugin(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    payload: Result<Json<DeletePlugin>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let actor = viewer.actor()?;
    let Json(payload) = payload?;
    let key = PluginRef::new(unmap_kind(payload.plugin_type), payload.plugin_id);
    state.engine.delete_plugin(&actor, key).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "plugin deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_are_base64_decoded() {
        let upload = decode_upload(Upload {
            file_name: "demo.wav".to_string(),
            content_base64: "UklGRg==".to_string(),
        })
        .ok()
        .unwrap();
        assert_eq!(upload.bytes, b"RIFF");
    }

    #[test]
    fn bad_base64_is_a_client_error() {
        let result = decode_upload(Upload {
            file_name: "demo.wav".to_string(),
            content_base64: "not base64!".to_string(),
        });
        assert!(matches!(result, Err(ServerError::Generic(_))));
    }
}
