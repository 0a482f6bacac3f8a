use axum::{
    extract::FromRef,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use database::entities::users;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::error;
use models::role::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Signing configuration for bearer tokens
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    token_ttl_hours: i64,
}

/// JWT payload: the verified user id and role carried on every request
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl AuthConfig {
    pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

    pub fn new(secret: String, token_ttl_hours: i64) -> Self {
        Self {
            secret,
            token_ttl_hours,
        }
    }

    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours
    }

    pub fn issue_token(
        &self,
        user: &users::Model,
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_ttl_hours)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| {
            error!("failed to sign token: {err}");
            ApiError::Internal
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|err| {
        error!("failed to hash password: {err}");
        ApiError::Internal
    })
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, password_hash).map_err(|err| {
        error!("failed to verify password: {err}");
        ApiError::Internal
    })
}

/// The authenticated caller, extracted from the bearer token
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    pub fn require_instructor(&self) -> Result<(), ApiError> {
        if self.role == UserRole::Instructor {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Instructor access required".to_string(),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;

        let claims = state.auth.verify_token(token)?;

        Ok(CurrentUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{AuthConfig, CurrentUser, hash_password, verify_password};
    use chrono::{Duration, Utc};
    use database::entities::users;
    use models::role::UserRole;
    use uuid::Uuid;

    fn user_fixture(role: UserRole) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Uuid::new_v4(),
            email: "member@example.com".to_string(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            role,
            is_active: true,
            is_verified: true,
            bio: String::new(),
            profile_picture: None,
            date_joined: now,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = AuthConfig::new("test-secret".to_string(), 24);
        let user = user_fixture(UserRole::Instructor);

        let token = config.issue_token(&user, Utc::now()).unwrap();
        let claims = config.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Instructor);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = AuthConfig::new("test-secret".to_string(), 1);
        let user = user_fixture(UserRole::User);

        let token = config
            .issue_token(&user, Utc::now() - Duration::hours(3))
            .unwrap();

        assert!(config.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let config = AuthConfig::new("test-secret".to_string(), 24);
        let other = AuthConfig::new("other-secret".to_string(), 24);
        let user = user_fixture(UserRole::User);

        let token = other.issue_token(&user, Utc::now()).unwrap();

        assert!(config.verify_token(&token).is_err());
    }

    #[test]
    fn test_role_guards() {
        let admin = CurrentUser {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
        };
        let member = CurrentUser {
            id: Uuid::new_v4(),
            role: UserRole::User,
        };

        assert!(admin.require_admin().is_ok());
        assert!(member.require_admin().is_err());
        assert!(member.require_instructor().is_err());
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();

        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }
}
