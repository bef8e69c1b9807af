//! Category business logic - Handles listing, creating, hiding and seeding categories.
//!
//! Categories are either shared (seeded from config.toml, `created_by == "system"`) or
//! created by a user. Listing applies the per-user visibility mask from
//! [`crate::core::visibility`].

use crate::{
    config::SeedCategory,
    core::visibility::{self, DeleteAction, HIDE_ATTEMPTS},
    entities::{Category, RecordType, SYSTEM_OWNER, UserIdSet, category},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// Label shown for records whose category is gone or hidden.
pub const DELETED_CATEGORY_LABEL: &str = "Deleted category";

/// Retrieves the categories `user_id` can see, optionally only those of one record type.
///
/// Shared categories come first, then the user's own, each group alphabetical.
pub async fn list_visible_categories(
    db: &DatabaseConnection,
    user_id: &str,
    record_type: Option<RecordType>,
) -> Result<Vec<category::Model>> {
    let mut query = Category::find().filter(
        Condition::any()
            .add(category::Column::CreatedBy.eq(SYSTEM_OWNER))
            .add(category::Column::CreatedBy.eq(user_id)),
    );
    if let Some(record_type) = record_type {
        query = query.filter(category::Column::RecordType.eq(record_type.as_str()));
    }
    let categories = query
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;

    Ok(visibility::visible_items(categories, user_id))
}

/// Finds a category by id regardless of who can see it.
pub async fn get_category_by_id(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by id, returning `CategoryNotFound` unless `user_id` can see it.
pub async fn get_visible_category(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: i64,
) -> Result<category::Model> {
    get_category_by_id(db, category_id)
        .await?
        .filter(|c| visibility::is_visible_to(c, user_id))
        .ok_or(Error::CategoryNotFound { id: category_id })
}

/// Creates a category owned by `user_id`.
///
/// The name is trimmed and must not be empty. An empty icon falls back to `"tag"`.
pub async fn create_category(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    icon: &str,
    record_type: RecordType,
) -> Result<category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "Category name cannot be empty".to_string(),
        });
    }
    let icon = match icon.trim() {
        "" => "tag",
        other => other,
    };

    let category = category::ActiveModel {
        name: Set(name.to_string()),
        icon: Set(icon.to_string()),
        record_type: Set(record_type.as_str().to_string()),
        created_by: Set(user_id.to_string()),
        deleted_by: Set(UserIdSet::default()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = category.insert(db).await?;
    debug!(id = result.id, user_id, name, "category created");
    Ok(result)
}

/// Deletes a category for `user_id`.
///
/// A shared category is hidden for this user only; a category the user created is removed.
/// Records filed under it keep their `category_id` and are labelled
/// [`DELETED_CATEGORY_LABEL`] from then on.
pub async fn delete_category(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: i64,
) -> Result<DeleteAction> {
    let category = get_category_by_id(db, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let action = visibility::delete_action(&category, user_id)
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    match action {
        DeleteAction::Hide => hide_for_user(db, user_id, category_id).await?,
        DeleteAction::Remove => {
            category.delete(db).await?;
        }
    }
    debug!(category_id, user_id, ?action, "category deleted");
    Ok(action)
}

/// Adds `user_id` to the category's `deleted_by` set.
///
/// The read and the write share a transaction, and the write only applies while the set
/// is still the one that was read. Concurrent hides by different users therefore all
/// land. A user who already hid the category causes no write.
async fn hide_for_user(db: &DatabaseConnection, user_id: &str, category_id: i64) -> Result<()> {
    for _ in 0..HIDE_ATTEMPTS {
        let txn = db.begin().await?;
        let current = Category::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or(Error::CategoryNotFound { id: category_id })?;

        let mut deleted_by = current.deleted_by.clone();
        if !deleted_by.insert(user_id) {
            txn.rollback().await?;
            return Ok(());
        }

        let result = Category::update_many()
            .col_expr(category::Column::DeletedBy, Expr::value(deleted_by))
            .filter(category::Column::Id.eq(category_id))
            .filter(category::Column::DeletedBy.eq(current.deleted_by))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if result.rows_affected == 1 {
            return Ok(());
        }
        debug!(category_id, user_id, "deleted_by changed underneath, retrying hide");
    }
    Err(Error::Database {
        message: format!("category {category_id} kept changing while hiding it"),
    })
}

/// Maps the ids of the categories `user_id` can see to their names.
pub async fn category_labels(db: &DatabaseConnection, user_id: &str) -> Result<HashMap<i64, String>> {
    Ok(list_visible_categories(db, user_id, None)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

/// Inserts the shared categories from config.toml that do not exist yet.
///
/// Returns the number of categories inserted.
pub async fn seed_system_categories(
    db: &DatabaseConnection,
    seeds: &[SeedCategory],
) -> Result<usize> {
    let mut inserted = 0;
    for seed in seeds {
        let record_type: RecordType = seed.record_type.parse()?;
        let exists = Category::find()
            .filter(category::Column::CreatedBy.eq(SYSTEM_OWNER))
            .filter(category::Column::Name.eq(seed.name.trim()))
            .filter(category::Column::RecordType.eq(record_type.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        create_category(db, SYSTEM_OWNER, &seed.name, &seed.icon, record_type).await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!("Seeded {inserted} shared categories");
    }
    Ok(inserted)
}
