//! Group API endpoints

use api_types::Message;
use api_types::group::{GroupNew, GroupUpdate, GroupView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, parse_id, server::ServerState};
use engine::{groups, users};

fn map_group(group: groups::Model) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }
}

/// Handle requests for creating a new group
pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .new_group(&user.username, &payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(map_group(group))))
}

/// Handle requests for one of the user's groups
pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let group = state.engine.group(&user.username, group_id).await?;

    Ok(Json(map_group(group)))
}

/// Handle requests for updating a group
pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let group = state
        .engine
        .update_group(
            &user.username,
            group_id,
            payload.name.as_deref(),
            payload.description.as_deref(),
        )
        .await?;

    Ok(Json(map_group(group)))
}

/// Handle requests for deleting an empty group
pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    state.engine.delete_group(&user.username, group_id).await?;

    Ok(Json(Message::new("Group deleted")))
}

/// Handle requests for listing the user's groups
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupView>>, ServerError> {
    let groups = state.engine.groups(&user.username).await?;

    Ok(Json(groups.into_iter().map(map_group).collect()))
}
