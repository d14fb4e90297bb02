//! Rating endpoint.

use api_types::rating::{RateRequest, RateResponse};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use engine::{EngineError, PluginKind, PluginRef};

use crate::{ServerError, server::ServerState, server::Viewer};

/// `POST /rate/{kind}/{id}`
///
/// Unparseable bodies and non-numeric scores are reported as invalid scores.
pub async fn rate(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, i32)>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<RateResponse>, ServerError> {
    let user = viewer.require_user()?;
    let key = PluginRef::new(PluginKind::try_from(kind.as_str())?, id);

    let score = payload
        .ok()
        .and_then(|Json(body)| body.score)
        .and_then(|score| score.value())
        .ok_or_else(|| EngineError::InvalidScore("score must be a number".to_string()))?;

    let new_average = state.engine.submit_rating(user.id, key, score).await?;

    Ok(Json(RateResponse {
        success: true,
        new_average,
    }))
}
