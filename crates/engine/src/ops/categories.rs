use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::validation::Violations;
use crate::{EngineError, ResultEngine, categories, expenses};

use super::{Engine, unique_conflict, with_tx};

/// Category operations. Every one of them resolves the parent group against
/// the calling user first, so a category is only ever reachable through a
/// group its owner controls.
impl Engine {
    /// Add a new category under one of the user's groups.
    pub async fn new_category(
        &self,
        user_id: &str,
        group_id: Uuid,
        name: &str,
        note: Option<&str>,
    ) -> ResultEngine<categories::Model> {
        let mut check = Violations::new();
        let name = check.required_text(name, "name", 100);
        let note = check.optional_text(note, "note", 255);
        check.into_result()?;

        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await?;

            // Category names are unique within their group, case-insensitively.
            // SQLite's LOWER folds ASCII only, so the folding happens in Rust.
            let folded = name.to_lowercase();
            let exists = categories::Entity::find()
                .filter(categories::Column::GroupId.eq(group_id))
                .all(&db_tx)
                .await?
                .iter()
                .any(|other| other.name.to_lowercase() == folded);
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let now = Utc::now();
            let category = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                group_id: ActiveValue::Set(group_id),
                name: ActiveValue::Set(name.clone()),
                note: ActiveValue::Set(note),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            category
                .insert(&db_tx)
                .await
                .map_err(|err| unique_conflict(err, name))
        })
    }

    /// Return one category under one of the user's groups.
    pub async fn category(
        &self,
        user_id: &str,
        group_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await?;
            self.require_category_in_group(&db_tx, group_id, category_id)
                .await
        })
    }

    /// Update name and/or note; absent fields are left untouched.
    pub async fn update_category(
        &self,
        user_id: &str,
        group_id: Uuid,
        category_id: Uuid,
        name: Option<&str>,
        note: Option<&str>,
    ) -> ResultEngine<categories::Model> {
        let mut check = Violations::new();
        let name = name.map(|value| check.required_text(value, "name", 100));
        let note = check.optional_text(note, "note", 255);
        check.into_result()?;

        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await?;
            let category = self
                .require_category_in_group(&db_tx, group_id, category_id)
                .await?;

            if let Some(name) = &name {
                let folded = name.to_lowercase();
                let taken = categories::Entity::find()
                    .filter(categories::Column::GroupId.eq(group_id))
                    .filter(categories::Column::Id.ne(category_id))
                    .all(&db_tx)
                    .await?
                    .iter()
                    .any(|other| other.name.to_lowercase() == folded);
                if taken {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let new_name = name.clone().unwrap_or_else(|| category.name.clone());
            let mut category: categories::ActiveModel = category.into();
            if let Some(name) = name {
                category.name = ActiveValue::Set(name);
            }
            if let Some(note) = note {
                category.note = ActiveValue::Set(Some(note));
            }
            category.updated_at = ActiveValue::Set(Utc::now());
            category
                .update(&db_tx)
                .await
                .map_err(|err| unique_conflict(err, new_name))
        })
    }

    /// Delete a category. Refused while expenses still point at it.
    pub async fn delete_category(
        &self,
        user_id: &str,
        group_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await?;
            let category = self
                .require_category_in_group(&db_tx, group_id, category_id)
                .await?;

            let expenses = expenses::Entity::find()
                .filter(expenses::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if expenses > 0 {
                return Err(EngineError::InUse(
                    "Category still has expenses".to_string(),
                ));
            }

            category.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// All categories under one of the user's groups, ordered by name.
    pub async fn categories(
        &self,
        user_id: &str,
        group_id: Uuid,
    ) -> ResultEngine<Vec<categories::Model>> {
        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await?;
            categories::Entity::find()
                .filter(categories::Column::GroupId.eq(group_id))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await
                .map_err(Into::into)
        })
    }
}
