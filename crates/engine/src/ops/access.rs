use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, categories, expenses, groups};

use super::Engine;

/// Generates an ownership-scoped `require_*` lookup for a target entity:
/// fetch by id filtered by the owning scope column, or fail as not found.
///
/// There is no unscoped "find by id" anywhere in the engine, so a
/// cross-tenant lookup is indistinguishable from a missing row.
macro_rules! impl_scoped_lookup {
    ($require_fn:ident, $entity:path, $model:ty, $scope_col:expr, $scope_ty:ty, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            scope: $scope_ty,
            target_id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(target_id)
                .filter($scope_col.eq(scope))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_scoped_lookup!(
        require_group_owned,
        groups::Entity,
        groups::Model,
        groups::Column::UserUsername,
        &str,
        "Group not found"
    );

    impl_scoped_lookup!(
        require_category_in_group,
        categories::Entity,
        categories::Model,
        categories::Column::GroupId,
        Uuid,
        "Category not found"
    );

    impl_scoped_lookup!(
        require_expense_owned,
        expenses::Entity,
        expenses::Model,
        expenses::Column::UserUsername,
        &str,
        "Expense not found"
    );
}
