//! Account role names.

/// The only role. Must match `chk_admin_accounts_role`.
pub const ROLE_ADMIN: &str = "admin";
