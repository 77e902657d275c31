//! Category API endpoints.

use api_types::Message;
use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, parse_id, server::ServerState};
use engine::{categories, users};

fn map_category(category: categories::Model) -> CategoryView {
    CategoryView {
        id: category.id,
        group_id: category.group_id,
        name: category.name,
        note: category.note,
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

/// Handle requests for creating a new category under a group
pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let category = state
        .engine
        .new_category(
            &user.username,
            group_id,
            &payload.name,
            payload.note.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_category(category))))
}

/// Handle requests for one category under a group
pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((group_id, category_id)): Path<(String, String)>,
) -> Result<Json<CategoryView>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let category_id = parse_id(&category_id, "category")?;
    let category = state
        .engine
        .category(&user.username, group_id, category_id)
        .await?;

    Ok(Json(map_category(category)))
}

/// Handle requests for updating a category
pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((group_id, category_id)): Path<(String, String)>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let category_id = parse_id(&category_id, "category")?;
    let category = state
        .engine
        .update_category(
            &user.username,
            group_id,
            category_id,
            payload.name.as_deref(),
            payload.note.as_deref(),
        )
        .await?;

    Ok(Json(map_category(category)))
}

/// Handle requests for deleting a category with no expenses
pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((group_id, category_id)): Path<(String, String)>,
) -> Result<Json<Message>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let category_id = parse_id(&category_id, "category")?;
    state
        .engine
        .delete_category(&user.username, group_id, category_id)
        .await?;

    Ok(Json(Message::new("Category deleted")))
}

/// Handle requests for listing a group's categories
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let group_id = parse_id(&group_id, "group")?;
    let categories = state.engine.categories(&user.username, group_id).await?;

    Ok(Json(categories.into_iter().map(map_category).collect()))
}
