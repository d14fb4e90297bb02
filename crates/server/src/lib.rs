use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, Viewer, router, run_with_listener};

mod catalog;
mod profile;
mod ratings;
mod server;
mod staff;

pub mod types {
    pub mod catalog {
        pub use api_types::catalog::{
            AudioDemo, CatalogPage, CatalogParams, CategoryItem, LinkedPlugin, PluginDetail,
            PluginSummary, SubcategoryItem, SubcategoryLabel,
        };
    }

    pub mod search {
        pub use api_types::search::{SearchParams, SearchResponse, SearchResult};
    }

    pub mod rating {
        pub use api_types::rating::{RateRequest, RateResponse, ScoreInput};
    }

    pub mod staff {
        pub use api_types::staff::{
            Dashboard, DashboardAction, DashboardResponse, DeletePlugin, DeleteResponse,
            DemoSlot, PluginChoice, PluginForm, Upload,
        };
    }

    pub mod profile {
        pub use api_types::profile::{Profile, Suggestion, SuggestionCreated, SuggestionNew};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// A JSON body that did not parse into the expected shape.
    Body(JsonRejection),
    Unauthorized,
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::InvalidState(_) => StatusCode::CONFLICT,
        EngineError::Storage(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidScore(_) | EngineError::InvalidKind(_) | EngineError::InvalidField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Storage(msg) => {
            tracing::error!("storage error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Body(value)
    }
}
