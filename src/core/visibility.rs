//! Visibility rules for shared and user-owned categories and accounts.
//!
//! A shared item (`created_by == "system"`) is visible to every user except those listed
//! in its `deleted_by` set. A user-owned item is visible only to its owner. Deleting a
//! shared item hides it for the caller; deleting an owned item removes it.

use crate::entities::{UserIdSet, account, category, SYSTEM_OWNER};

/// Common view over the categories and accounts tables.
pub trait SharedItem {
    /// `"system"` or the owning user id.
    fn created_by(&self) -> &str;
    /// Users who hid this item.
    fn deleted_by(&self) -> &UserIdSet;
    /// Display label.
    fn name(&self) -> &str;

    /// Whether this is a seeded item shared by everyone.
    fn is_system(&self) -> bool {
        self.created_by() == SYSTEM_OWNER
    }
}

impl SharedItem for category::Model {
    fn created_by(&self) -> &str {
        &self.created_by
    }

    fn deleted_by(&self) -> &UserIdSet {
        &self.deleted_by
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl SharedItem for account::Model {
    fn created_by(&self) -> &str {
        &self.created_by
    }

    fn deleted_by(&self) -> &UserIdSet {
        &self.deleted_by
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// What deleting an item means for a given user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Add the user to `deleted_by`; the row stays for everyone else
    Hide,
    /// Remove the row
    Remove,
}

/// Whether `user_id` can see `item`.
pub fn is_visible_to<T: SharedItem>(item: &T, user_id: &str) -> bool {
    (item.is_system() || item.created_by() == user_id) && !item.deleted_by().contains(user_id)
}

/// Keeps the items `user_id` can see, shared items first, then alphabetically.
pub fn visible_items<T: SharedItem>(items: Vec<T>, user_id: &str) -> Vec<T> {
    let mut visible: Vec<T> = items
        .into_iter()
        .filter(|item| is_visible_to(item, user_id))
        .collect();
    visible.sort_by(|a, b| {
        b.is_system()
            .cmp(&a.is_system())
            .then_with(|| a.name().cmp(b.name()))
    });
    visible
}

/// How a delete request by `user_id` applies to `item`; `None` when the user may not
/// touch it (another user's item).
///
/// Hiding a shared item the user already hid is still `Hide`, so repeated requests
/// succeed.
pub fn delete_action<T: SharedItem>(item: &T, user_id: &str) -> Option<DeleteAction> {
    if item.is_system() {
        Some(DeleteAction::Hide)
    } else if item.created_by() == user_id {
        Some(DeleteAction::Remove)
    } else {
        None
    }
}

/// Attempts at the guarded `deleted_by` update before giving up.
pub(crate) const HIDE_ATTEMPTS: usize = 5;
