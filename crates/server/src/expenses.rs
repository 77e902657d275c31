//! Expense API endpoints.

use api_types::{Amount, Message};
use api_types::expense::{
    ExpenseList, ExpenseNew, ExpensePage, ExpenseUpdate, ExpenseView, PageMeta,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, parse_id, server::ServerState};
use engine::{ExpenseChanges, ExpenseDraft, ExpenseListFilter, expenses, users};

fn map_expense(expense: expenses::Model) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        group_id: expense.group_id,
        category_id: expense.category_id,
        date: expense.date,
        title: expense.title,
        amount: Amount::from_minor(expense.amount_minor),
        note: expense.note,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

/// Handle requests for creating a new expense
pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let draft = ExpenseDraft {
        group_id: payload.group_id,
        category_id: payload.category_id,
        date: payload.date.with_timezone(&Utc),
        title: payload.title,
        amount_minor: payload.amount.minor(),
        note: payload.note,
    };

    let expense = state.engine.new_expense(&user.username, draft).await?;

    Ok((StatusCode::CREATED, Json(map_expense(expense))))
}

/// Handle requests for one of the user's expenses
pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense_id = parse_id(&expense_id, "expense")?;
    let expense = state.engine.expense(&user.username, expense_id).await?;

    Ok(Json(map_expense(expense)))
}

/// Handle requests for updating an expense
pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense_id = parse_id(&expense_id, "expense")?;
    let changes = ExpenseChanges {
        group_id: payload.group_id,
        category_id: payload.category_id,
        date: payload.date.map(|date| date.with_timezone(&Utc)),
        title: payload.title,
        amount_minor: payload.amount.map(Amount::minor),
        note: payload.note,
    };

    let expense = state
        .engine
        .update_expense(&user.username, expense_id, changes)
        .await?;

    Ok(Json(map_expense(expense)))
}

/// Handle requests for deleting an expense
pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    let expense_id = parse_id(&expense_id, "expense")?;
    state.engine.delete_expense(&user.username, expense_id).await?;

    Ok(Json(Message::new("Expense deleted")))
}

/// Handle requests for listing expenses with filters and pagination
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseList>,
) -> Result<Json<ExpensePage>, ServerError> {
    let filter = ExpenseListFilter {
        group_id: query.group_id,
        category_id: query.category_id,
        start: query.start.map(|date| date.with_timezone(&Utc)),
        end: query.end.map(|date| date.with_timezone(&Utc)),
        page: query.page,
        limit: query.limit,
    };

    let page = state.engine.list_expenses(&user.username, &filter).await?;

    Ok(Json(ExpensePage {
        data: page.items.into_iter().map(map_expense).collect(),
        meta: PageMeta {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        },
    }))
}
