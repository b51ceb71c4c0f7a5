//! Bearer token validation for studylog.
//!
//! Tokens are minted by the platform's login component (or the `token`
//! subcommand) and carry the caller's user id and role.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::JwtManager;
