use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{ServerError, catalog, profile, ratings, staff};
use engine::{Actor, Engine, EngineError, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// The user behind a request, if it carried valid Basic credentials.
#[derive(Clone, Debug)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.id)
    }

    /// The authenticated user, or 401.
    pub fn require_user(&self) -> Result<&User, ServerError> {
        self.0.as_ref().ok_or(ServerError::Unauthorized)
    }

    /// The authenticated user's actor, or 401.
    pub fn actor(&self) -> Result<Actor, ServerError> {
        self.require_user().map(User::actor)
    }

    /// An authenticated staff member, or 401 / 403.
    pub fn require_staff(&self) -> Result<&User, ServerError> {
        let user = self.require_user()?;
        if user.is_staff || user.is_superuser {
            Ok(user)
        } else {
            tracing::warn!("user {} denied staff access", user.username);
            Err(EngineError::Forbidden("staff access required".to_string()).into())
        }
    }
}

/// Resolve Basic credentials into a [`Viewer`].
///
/// Requests without credentials pass through anonymously; wrong credentials
/// are refused.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let viewer = match auth_header {
        None => None,
        Some(TypedHeader(credentials)) => {
            if credentials.username().is_empty() || credentials.password().is_empty() {
                return Err(StatusCode::UNAUTHORIZED);
            }
            match state
                .engine
                .authenticate(credentials.username(), credentials.password())
                .await
            {
                Ok(Some(user)) => Some(user),
                Ok(None) => {
                    tracing::warn!("rejected credentials for {}", credentials.username());
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Err(err) => {
                    tracing::error!("authentication failed: {err}");
                    return Err(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        }
    };

    request.extensions_mut().insert(Viewer(viewer));
    Ok(next.run(request).await)
}

/// Build the application router around `engine`.
pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/plugins", get(catalog::list))
        .route("/plugins/pro/{id}", get(catalog::pro_detail))
        .route("/plugins/alt/{id}", get(catalog::alt_detail))
        .route("/ajax/search", get(catalog::search))
        .route("/rate/{kind}/{id}", post(ratings::rate))
        .route(
            "/staff/dashboard",
            get(staff::dashboard).post(staff::dashboard_action),
        )
        .route("/delete_plugin", post(staff::delete_plugin))
        .route(
            "/profile",
            get(profile::profile).post(profile::suggestion_new),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}
