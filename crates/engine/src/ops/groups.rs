use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::validation::Violations;
use crate::{EngineError, ResultEngine, categories, expenses, groups};

use super::{Engine, unique_conflict, with_tx};

impl Engine {
    /// Add a new group for the user.
    pub async fn new_group(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> ResultEngine<groups::Model> {
        let mut check = Violations::new();
        let name = check.required_text(name, "name", 100);
        let description = check.optional_text(description, "description", 255);
        check.into_result()?;

        with_tx!(self, |db_tx| {
            // Group names are unique per owner, compared case-insensitively.
            // SQLite's LOWER folds ASCII only, so the folding happens in Rust.
            let folded = name.to_lowercase();
            let exists = groups::Entity::find()
                .filter(groups::Column::UserUsername.eq(user_id))
                .all(&db_tx)
                .await?
                .iter()
                .any(|other| other.name.to_lowercase() == folded);
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let now = Utc::now();
            let group = groups::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_username: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name.clone()),
                description: ActiveValue::Set(description),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            group
                .insert(&db_tx)
                .await
                .map_err(|err| unique_conflict(err, name))
        })
    }

    /// Return one group owned by the user.
    pub async fn group(&self, user_id: &str, group_id: Uuid) -> ResultEngine<groups::Model> {
        with_tx!(self, |db_tx| {
            self.require_group_owned(&db_tx, user_id, group_id).await
        })
    }

    /// Update name and/or description; absent fields are left untouched.
    pub async fn update_group(
        &self,
        user_id: &str,
        group_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ResultEngine<groups::Model> {
        let mut check = Violations::new();
        let name = name.map(|value| check.required_text(value, "name", 100));
        let description = check.optional_text(description, "description", 255);
        check.into_result()?;

        with_tx!(self, |db_tx| {
            let group = self.require_group_owned(&db_tx, user_id, group_id).await?;

            if let Some(name) = &name {
                let folded = name.to_lowercase();
                let taken = groups::Entity::find()
                    .filter(groups::Column::UserUsername.eq(user_id))
                    .filter(groups::Column::Id.ne(group_id))
                    .all(&db_tx)
                    .await?
                    .iter()
                    .any(|other| other.name.to_lowercase() == folded);
                if taken {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let new_name = name.clone().unwrap_or_else(|| group.name.clone());
            let mut group: groups::ActiveModel = group.into();
            if let Some(name) = name {
                group.name = ActiveValue::Set(name);
            }
            if let Some(description) = description {
                group.description = ActiveValue::Set(Some(description));
            }
            group.updated_at = ActiveValue::Set(Utc::now());
            group
                .update(&db_tx)
                .await
                .map_err(|err| unique_conflict(err, new_name))
        })
    }

    /// Delete a group. Refused while categories or expenses still point at it.
    pub async fn delete_group(&self, user_id: &str, group_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_owned(&db_tx, user_id, group_id).await?;

            let categories = categories::Entity::find()
                .filter(categories::Column::GroupId.eq(group_id))
                .count(&db_tx)
                .await?;
            let expenses = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group_id))
                .count(&db_tx)
                .await?;
            if categories > 0 || expenses > 0 {
                return Err(EngineError::InUse(
                    "Group still has categories or expenses".to_string(),
                ));
            }

            group.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// All groups owned by the user, ordered by name. No pagination.
    pub async fn groups(&self, user_id: &str) -> ResultEngine<Vec<groups::Model>> {
        groups::Entity::find()
            .filter(groups::Column::UserUsername.eq(user_id))
            .order_by_asc(groups::Column::Name)
            .all(&self.database)
            .await
            .map_err(Into::into)
    }
}
