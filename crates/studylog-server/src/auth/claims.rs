//! JWT claims structure for studylog auth.

use serde::{Deserialize, Serialize};

use crate::storage::Role;

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID).
    pub sub: String,
    /// Platform role of the subject.
    pub role: Role,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller is `user_id` or an administrator.
    pub fn is_self_or_admin(&self, user_id: &str) -> bool {
        self.sub == user_id || self.is_admin()
    }
}
