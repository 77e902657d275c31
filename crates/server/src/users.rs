//! User API endpoints

use api_types::Message;
use api_types::user::{Login, ProfileUpdate, Register, Token, UserView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_user(user: users::Model) -> UserView {
    UserView {
        username: user.username,
        name: user.name,
        email: user.email,
    }
}

/// Handle requests for registering a new user
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .register(
            &payload.username,
            &payload.password,
            &payload.name,
            &payload.email,
        )
        .await?;

    Ok(Json(map_user(user)))
}

/// Handle requests for logging in and issuing a bearer token
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Token>, ServerError> {
    let token = state
        .engine
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(Token { token }))
}

/// Handle requests for the authenticated user's profile
pub async fn current(Extension(user): Extension<users::Model>) -> Json<UserView> {
    Json(map_user(user))
}

/// Handle requests for updating the authenticated user's profile
pub async fn update_profile(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_profile(
            &user.username,
            payload.name.as_deref(),
            payload.password.as_deref(),
        )
        .await?;

    Ok(Json(map_user(user)))
}

/// Handle requests for invalidating the current bearer token
pub async fn logout(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Message>, ServerError> {
    state.engine.logout(&user.username).await?;

    Ok(Json(Message::new("Logged out")))
}
