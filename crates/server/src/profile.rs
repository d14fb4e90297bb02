//! Profile endpoints: a user's suggestions.

use api_types::profile::{Profile, Suggestion, SuggestionCreated, SuggestionNew};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::NewSuggestion;

use crate::{
    ServerError,
    catalog::{map_kind, unmap_kind},
    server::{ServerState, Viewer},
};

pub(crate) fn map_suggestion(suggestion: engine::Suggestion) -> Suggestion {
    Suggestion {
        id: suggestion.id,
        name: suggestion.name,
        suggested_type: map_kind(suggestion.suggested_type),
        link: suggestion.link,
        description: suggestion.description,
        status: suggestion.status.as_str().to_string(),
        submitted_at: suggestion.submitted_at,
    }
}

/// `GET /profile`
pub async fn profile(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
) -> Result<Json<Profile>, ServerError> {
    let user = viewer.require_user()?;
    let suggestions = state.engine.suggestions_for_user(user.id).await?;

    Ok(Json(Profile {
        username: user.username.clone(),
        suggestions: suggestions.into_iter().map(map_suggestion).collect(),
    }))
}

/// `POST /profile`
pub async fn suggestion_new(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    payload: Result<Json<SuggestionNew>, JsonRejection>,
) -> Result<(StatusCode, Json<SuggestionCreated>), ServerError> {
    let user = viewer.require_user()?;
    let Json(payload) = payload?;
    let suggestion = state
        .engine
        .create_suggestion(
            user.id,
            NewSuggestion {
                name: payload.name,
                suggested_type: unmap_kind(payload.suggested_type),
                link: payload.link,
                description: payload.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuggestionCreated {
            success: true,
            suggestion: map_suggestion(suggestion),
        }),
    ))
}
