//! Account business logic - Handles listing, creating, hiding and seeding accounts.
//!
//! Accounts follow the same sharing rules as categories: seeded accounts are visible to
//! everyone until a user hides them, user-created accounts belong to their creator.

use crate::{
    config::SeedAccount,
    core::visibility::{self, DeleteAction, HIDE_ATTEMPTS},
    entities::{Account, SYSTEM_OWNER, UserIdSet, account},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// Label shown for records whose account is gone or hidden.
pub const DELETED_ACCOUNT_LABEL: &str = "Deleted account";

/// Retrieves the accounts `user_id` can see, shared accounts first.
pub async fn list_visible_accounts(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<account::Model>> {
    let accounts = Account::find()
        .filter(
            Condition::any()
                .add(account::Column::CreatedBy.eq(SYSTEM_OWNER))
                .add(account::Column::CreatedBy.eq(user_id)),
        )
        .order_by_asc(account::Column::Name)
        .all(db)
        .await?;

    Ok(visibility::visible_items(accounts, user_id))
}

/// Finds an account by id regardless of who can see it.
pub async fn get_account_by_id(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Option<account::Model>> {
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an account by id, returning `AccountNotFound` unless `user_id` can see it.
pub async fn get_visible_account(
    db: &DatabaseConnection,
    user_id: &str,
    account_id: i64,
) -> Result<account::Model> {
    get_account_by_id(db, account_id)
        .await?
        .filter(|a| visibility::is_visible_to(a, user_id))
        .ok_or(Error::AccountNotFound { id: account_id })
}

/// Creates an account owned by `user_id`, validating and trimming the name.
pub async fn create_account(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    account_type: &str,
) -> Result<account::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "Account name cannot be empty".to_string(),
        });
    }
    let account_type = account_type.trim();
    if account_type.is_empty() {
        return Err(Error::Validation {
            field: "account_type",
            message: "Account type cannot be empty".to_string(),
        });
    }

    let account = account::ActiveModel {
        name: Set(name.to_string()),
        account_type: Set(account_type.to_ascii_lowercase()),
        created_by: Set(user_id.to_string()),
        deleted_by: Set(UserIdSet::default()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = account.insert(db).await?;
    debug!(id = result.id, user_id, name, "account created");
    Ok(result)
}

/// Deletes an account for `user_id`: hides a shared one, removes an owned one.
pub async fn delete_account(
    db: &DatabaseConnection,
    user_id: &str,
    account_id: i64,
) -> Result<DeleteAction> {
    let account = get_account_by_id(db, account_id)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let action = visibility::delete_action(&account, user_id)
        .ok_or(Error::AccountNotFound { id: account_id })?;

    match action {
        DeleteAction::Hide => hide_for_user(db, user_id, account_id).await?,
        DeleteAction::Remove => {
            account.delete(db).await?;
        }
    }
    debug!(account_id, user_id, ?action, "account deleted");
    Ok(action)
}

/// Adds `user_id` to the account's `deleted_by` set.
///
/// The read and the write share a transaction, and the write only applies while the set
/// is still the one that was read. Concurrent hides by different users therefore all
/// land. A user who already hid the account causes no write.
async fn hide_for_user(db: &DatabaseConnection, user_id: &str, account_id: i64) -> Result<()> {
    for _ in 0..HIDE_ATTEMPTS {
        let txn = db.begin().await?;
        let current = Account::find_by_id(account_id)
            .one(&txn)
            .await?
            .ok_or(Error::AccountNotFound { id: account_id })?;

        let mut deleted_by = current.deleted_by.clone();
        if !deleted_by.insert(user_id) {
            txn.rollback().await?;
            return Ok(());
        }

        let result = Account::update_many()
            .col_expr(account::Column::DeletedBy, Expr::value(deleted_by))
            .filter(account::Column::Id.eq(account_id))
            .filter(account::Column::DeletedBy.eq(current.deleted_by))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if result.rows_affected == 1 {
            return Ok(());
        }
        debug!(account_id, user_id, "deleted_by changed underneath, retrying hide");
    }
    Err(Error::Database {
        message: format!("account {account_id} kept changing while hiding it"),
    })
}

/// Maps the ids of the accounts `user_id` can see to their names.
pub async fn account_labels(db: &DatabaseConnection, user_id: &str) -> Result<HashMap<i64, String>> {
    Ok(list_visible_accounts(db, user_id)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect())
}

/// Inserts the shared accounts from config.toml that do not exist yet.
pub async fn seed_system_accounts(db: &DatabaseConnection, seeds: &[SeedAccount]) -> Result<usize> {
    let mut inserted = 0;
    for seed in seeds {
        let exists = Account::find()
            .filter(account::Column::CreatedBy.eq(SYSTEM_OWNER))
            .filter(account::Column::Name.eq(seed.name.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        create_account(db, SYSTEM_OWNER, &seed.name, &seed.account_type).await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!("Seeded {inserted} shared accounts");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_account_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_account(&db, "alice", "", "cash").await;
        assert!(matches!(result, Err(Error::Validation { field: "name", .. })));

        let result = create_account(&db, "alice", "Wallet", "  ").await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "account_type",
                ..
            })
        ));

        let account = create_account(&db, "alice", "  Savings ", "Bank").await?;
        assert_eq!(account.name, "Savings");
        assert_eq!(account.account_type, "bank");
        assert_eq!(account.created_by, "alice");

        Ok(())
    }

    #[tokio::test]
    async fn test_hidden_shared_account_visible_to_others() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_items(&db).await?;
        let cash = find_account(&db, "Cash").await?;

        assert_eq!(delete_account(&db, "alice", cash.id).await?, DeleteAction::Hide);

        let alice = list_visible_accounts(&db, "alice").await?;
        assert!(alice.iter().all(|a| a.id != cash.id));
        let bob = list_visible_accounts(&db, "bob").await?;
        assert!(bob.iter().any(|a| a.id == cash.id));

        let stored = get_account_by_id(&db, cash.id).await?.unwrap();
        assert!(stored.deleted_by.contains("alice"));
        assert!(!stored.deleted_by.contains("bob"));

        Ok(())
    }

    #[tokio::test]
    async fn test_hide_accumulates_users() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_items(&db).await?;
        let cash = find_account(&db, "Cash").await?;

        delete_account(&db, "alice", cash.id).await?;
        delete_account(&db, "bob", cash.id).await?;

        let stored = get_account_by_id(&db, cash.id).await?.unwrap();
        assert_eq!(stored.deleted_by.0.len(), 2);
        assert!(list_visible_accounts(&db, "carol").await?.iter().any(|a| a.id == cash.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_hides_keep_both_users() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_items(&db).await?;
        let cash = find_account(&db, "Cash").await?;

        let (alice, bob) = tokio::join!(
            delete_account(&db, "alice", cash.id),
            delete_account(&db, "bob", cash.id)
        );
        assert_eq!(alice?, DeleteAction::Hide);
        assert_eq!(bob?, DeleteAction::Hide);

        let stored = get_account_by_id(&db, cash.id).await?.unwrap();
        assert_eq!(stored.deleted_by.0.len(), 2);
        assert!(list_visible_accounts(&db, "alice").await?.iter().all(|a| a.id != cash.id));
        assert!(list_visible_accounts(&db, "bob").await?.iter().all(|a| a.id != cash.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_hiding_twice_succeeds() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_items(&db).await?;
        let cash = find_account(&db, "Cash").await?;

        assert_eq!(delete_account(&db, "alice", cash.id).await?, DeleteAction::Hide);
        assert_eq!(delete_account(&db, "alice", cash.id).await?, DeleteAction::Hide);

        let stored = get_account_by_id(&db, cash.id).await?.unwrap();
        assert_eq!(stored.deleted_by.0.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_owned_account_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let card = create_account(&db, "alice", "Visa", "credit_card").await?;

        assert!(get_visible_account(&db, "bob", card.id).await.is_err());
        assert_eq!(get_visible_account(&db, "alice", card.id).await?.id, card.id);

        assert_eq!(
            delete_account(&db, "alice", card.id).await?,
            DeleteAction::Remove
        );
        assert!(matches!(
            delete_account(&db, "alice", card.id).await,
            Err(Error::AccountNotFound { .. })
        ));

        Ok(())
    }
}
