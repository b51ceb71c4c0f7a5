//! JWT token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use studylog_core::db::unix_timestamp;

use super::claims::Claims;
use crate::storage::Role;

/// Manages JWT token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret.
    pub fn new(secret: &[u8], access_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
        }
    }

    /// Issue an access token for the given user. Returns the token and its
    /// expiry timestamp.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let now = unix_timestamp();
        let exp = now + self.access_ttl_secs;

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            role,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, exp))
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate_access_token() {
        let jwt = test_jwt();
        let (token, exp) = jwt.issue_access_token("user-1", Role::Student).unwrap();
        assert!(exp > unix_timestamp());

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Student);
        assert!(!claims.is_admin());
        assert!(claims.is_self_or_admin("user-1"));
        assert!(!claims.is_self_or_admin("user-2"));
    }

    #[test]
    fn admin_claims_cover_everyone() {
        let jwt = test_jwt();
        let (token, _) = jwt.issue_access_token("root", Role::Admin).unwrap();
        let claims = jwt.validate(&token).unwrap();
        assert!(claims.is_self_or_admin("someone-else"));
    }

    #[test]
    fn invalid_token_fails_validation() {
        let jwt = test_jwt();
        assert!(jwt.validate("not-a-valid-token").is_err());
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret", 3600);

        let (token, _) = jwt1.issue_access_token("user-1", Role::Admin).unwrap();
        assert!(jwt2.validate(&token).is_err());
    }

    #[test]
    fn expired_token_fails_validation() {
        // Past the default 60s leeway.
        let jwt = JwtManager::new(b"test-secret-key-for-testing", -600);
        let (token, _) = jwt.issue_access_token("user-1", Role::Student).unwrap();
        assert!(jwt.validate(&token).is_err());
    }
}
