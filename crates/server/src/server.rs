use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{categories, expenses, groups, users};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve the bearer token to its user and stash the model in the
/// request extensions for the handlers behind the guard.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user = state
        .engine
        .user_by_token(auth_header.token())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = if let Some(user) = user {
        user
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Build the application router for the given engine.
///
/// Registration and login stay outside the token guard; everything else
/// requires a valid bearer token.
pub fn app(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    let open = Router::new()
        .route("/api/users", post(users::register))
        .route("/api/users/login", post(users::login));

    let guarded = Router::new()
        .route(
            "/api/users/current",
            get(users::current).patch(users::update_profile),
        )
        .route("/api/users/logout", delete(users::logout))
        .route("/api/groups", post(groups::create).get(groups::list))
        .route(
            "/api/groups/{group_id}",
            get(groups::get).put(groups::update).delete(groups::remove),
        )
        .route(
            "/api/groups/{group_id}/categories",
            post(categories::create).get(categories::list),
        )
        .route(
            "/api/groups/{group_id}/categories/{category_id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::remove),
        )
        .route("/api/expenses", post(expenses::create).get(expenses::list))
        .route(
            "/api/expenses/{expense_id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    open.merge(guarded).with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
