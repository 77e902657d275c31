use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::validation::Violations;
use crate::{EngineError, ResultEngine, expenses};

use super::{Engine, with_tx};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

/// Input for creating an expense.
#[derive(Clone, Debug)]
pub struct ExpenseDraft {
    pub group_id: Uuid,
    pub category_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub title: String,
    /// Signed amount in minor units (hundredths).
    pub amount_minor: i64,
    pub note: Option<String>,
}

/// Partial changes for an expense.
///
/// `category_id` and `note` carry a double `Option`: the outer level means
/// "change this field", the inner level is the new value (`None` clears it).
#[derive(Clone, Debug, Default)]
pub struct ExpenseChanges {
    pub group_id: Option<Uuid>,
    pub category_id: Option<Option<Uuid>>,
    pub date: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub amount_minor: Option<i64>,
    pub note: Option<Option<String>>,
}

/// Filters for listing expenses.
///
/// `start` and `end` are inclusive (`[start, end]`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub group_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// 1-based page number, defaults to 1. Values below 1 are coerced up.
    pub page: Option<i64>,
    /// Page size, defaults to 10. Values below 1 are coerced up.
    pub limit: Option<i64>,
}

fn validate_list_filter(filter: &ExpenseListFilter) -> ResultEngine<()> {
    if let (Some(start), Some(end)) = (filter.start, filter.end)
        && start > end
    {
        return Err(EngineError::Validation(
            "invalid range: start must be <= end".to_string(),
        ));
    }
    Ok(())
}

trait ApplyExpenseFilters: QueryFilter + Sized {
    fn apply_expense_filters(self, filter: &ExpenseListFilter) -> Self;
}

impl<T> ApplyExpenseFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_expense_filters(mut self, filter: &ExpenseListFilter) -> Self {
        if let Some(group_id) = filter.group_id {
            self = self.filter(expenses::Column::GroupId.eq(group_id));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(start) = filter.start {
            self = self.filter(expenses::Column::Date.gte(start));
        }
        if let Some(end) = filter.end {
            self = self.filter(expenses::Column::Date.lte(end));
        }
        self
    }
}

/// One page of expenses plus the numbers needed to render pagination.
#[derive(Clone, Debug)]
pub struct ExpensePage {
    pub items: Vec<expenses::Model>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Engine {
    /// Add a new expense.
    ///
    /// The referenced group must belong to the user and the category, when
    /// given, must belong to that group.
    pub async fn new_expense(
        &self,
        user_id: &str,
        draft: ExpenseDraft,
    ) -> ResultEngine<expenses::Model> {
        let mut check = Violations::new();
        let title = check.required_text(&draft.title, "title", 255);
        let note = check.optional_text(draft.note.as_deref(), "note", 255);
        check.into_result()?;

        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, draft.group_id)
                .await?;
            if let Some(category_id) = draft.category_id {
                self.require_category_in_group(&db_tx, draft.group_id, category_id)
                    .await?;
            }

            let now = Utc::now();
            let expense = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_username: ActiveValue::Set(user_id.to_string()),
                group_id: ActiveValue::Set(draft.group_id),
                category_id: ActiveValue::Set(draft.category_id),
                date: ActiveValue::Set(draft.date),
                title: ActiveValue::Set(title),
                amount_minor: ActiveValue::Set(draft.amount_minor),
                note: ActiveValue::Set(note),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            Ok(expense.insert(&db_tx).await?)
        })
    }

    /// Return one expense owned by the user.
    pub async fn expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<expenses::Model> {
        with_tx!(self, |db_tx| {
            self.require_expense_owned(&db_tx, user_id, expense_id).await
        })
    }

    /// Apply partial changes to an expense.
    ///
    /// When the group and/or category change, the effective pair is
    /// re-checked: the new group must belong to the user and the effective
    /// category must live under the effective group.
    pub async fn update_expense(
        &self,
        user_id: &str,
        expense_id: Uuid,
        changes: ExpenseChanges,
    ) -> ResultEngine<expenses::Model> {
        let mut check = Violations::new();
        let title = changes
            .title
            .as_deref()
            .map(|value| check.required_text(value, "title", 255));
        let note = changes
            .note
            .as_ref()
            .map(|value| check.optional_text(value.as_deref(), "note", 255));
        check.into_result()?;

        with_tx!(self, |db_tx| {
            let expense = self.require_expense_owned(&db_tx, user_id, expense_id).await?;

            let group_id = match changes.group_id {
                Some(group_id) => {
                    self.require_group_owned(&db_tx, user_id, group_id).await?;
                    group_id
                }
                None => expense.group_id,
            };
            let category_id = match changes.category_id {
                Some(category_id) => category_id,
                None => expense.category_id,
            };
            if (changes.group_id.is_some() || changes.category_id.is_some())
                && let Some(category_id) = category_id
            {
                self.require_category_in_group(&db_tx, group_id, category_id)
                    .await?;
            }

            let mut expense: expenses::ActiveModel = expense.into();
            expense.group_id = ActiveValue::Set(group_id);
            expense.category_id = ActiveValue::Set(category_id);
            if let Some(date) = changes.date {
                expense.date = ActiveValue::Set(date);
            }
            if let Some(title) = title {
                expense.title = ActiveValue::Set(title);
            }
            if let Some(amount_minor) = changes.amount_minor {
                expense.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(note) = note {
                expense.note = ActiveValue::Set(note);
            }
            expense.updated_at = ActiveValue::Set(Utc::now());
            Ok(expense.update(&db_tx).await?)
        })
    }

    /// Delete an expense owned by the user.
    pub async fn delete_expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let expense = self.require_expense_owned(&db_tx, user_id, expense_id).await?;
            expense.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// List the user's expenses, newest first, as an offset-paginated page.
    ///
    /// Ordering is `(date DESC, id DESC)` so pages stay stable across equal
    /// dates.
    pub async fn list_expenses(
        &self,
        user_id: &str,
        filter: &ExpenseListFilter,
    ) -> ResultEngine<ExpensePage> {
        validate_list_filter(filter)?;
        let page = filter.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).max(1);
        let offset = (page - 1).saturating_mul(limit);

        with_tx!(self, |db_tx| {
            let total = expenses::Entity::find()
                .filter(expenses::Column::UserUsername.eq(user_id))
                .apply_expense_filters(filter)
                .count(&db_tx)
                .await? as i64;

            let items = expenses::Entity::find()
                .filter(expenses::Column::UserUsername.eq(user_id))
                .apply_expense_filters(filter)
                .order_by_desc(expenses::Column::Date)
                .order_by_desc(expenses::Column::Id)
                .offset(offset as u64)
                .limit(limit as u64)
                .all(&db_tx)
                .await?;

            Ok(ExpensePage {
                items,
                page,
                limit,
                total,
                total_pages: (total + limit - 1) / limit,
            })
        })
    }
}
