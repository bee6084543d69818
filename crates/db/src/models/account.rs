//! Admin account model and DTOs.

use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `admin_accounts` table.
///
/// Carries the password hash, so it is never serialized. Responses use
/// [`AccountView`].
#[derive(Debug, Clone, FromRow)]
pub struct AdminAccount {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AdminAccount {
    /// Whether a lockout is still running at `now`.
    pub fn is_locked_at(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// What an API client may see of an account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub last_login_at: Option<Timestamp>,
}

impl From<&AdminAccount> for AccountView {
    fn from(account: &AdminAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role.clone(),
            last_login_at: account.last_login_at,
        }
    }
}

/// Values written for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Result of recording a rejected password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct LoginFailure {
    /// Consecutive failures since the last success or lockout.
    pub failed_login_count: i32,
    /// Set when this failure started a lockout.
    pub locked_until: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn account(locked_until: Option<Timestamp>) -> AdminAccount {
        let now = Utc::now();
        AdminAccount {
            id: 1,
            username: "owner".into(),
            email: "owner@example.com".into(),
            password_hash: "$argon2id$...".into(),
            role: "admin".into(),
            is_active: true,
            failed_login_count: 0,
            locked_until,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lock_expires() {
        let now = Utc::now();
        assert!(account(Some(now + Duration::minutes(5))).is_locked_at(now));
        assert!(!account(Some(now - Duration::seconds(1))).is_locked_at(now));
        assert!(!account(None).is_locked_at(now));
    }

    #[test]
    fn view_omits_hash() {
        let json = serde_json::to_value(AccountView::from(&account(None))).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "owner");
    }
}
