//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`client_ip::ClientIp`] -- The client address used for rate limiting.

pub mod auth;
pub mod client_ip;
pub mod rbac;
