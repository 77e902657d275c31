use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use uuid::Uuid;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod categories;
mod expenses;
mod groups;
mod server;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{Login, ProfileUpdate, Register, Token, UserView};
    }

    pub mod group {
        pub use api_types::group::{GroupNew, GroupUpdate, GroupView};
    }

    pub mod category {
        pub use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseList, ExpenseNew, ExpensePage, ExpenseUpdate, ExpenseView, PageMeta,
        };
    }

    pub use api_types::{Amount, Message};
}

/// Engine failures surfaced over HTTP. One translation point for every
/// handler.
pub struct ServerError(EngineError);

//TODO: move this into api_types so clients can share the shape
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::InUse(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

/// Parse a path id and return a labeled validation error on failure. Keeps
/// malformed ids on the same JSON error channel as every other client error.
fn parse_id(value: &str, label: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(value)
        .map_err(|_| ServerError(EngineError::Validation(format!("invalid {label} id"))))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError(err) = self;
        let status = status_for_engine_error(&err);
        let error = message_for_engine_error(err);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_400() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_credentials_map_to_401() {
        let res = ServerError::from(EngineError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_in_use_maps_to_409() {
        let res = ServerError::from(EngineError::InUse("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_database_maps_to_500() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("boom".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_id_maps_to_400() {
        let res = parse_id("not-a-uuid", "group").unwrap_err().into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn well_formed_id_parses() {
        let id = parse_id("00000000-0000-0000-0000-000000000000", "group").ok();
        assert_eq!(id, Some(Uuid::nil()));
    }
}
