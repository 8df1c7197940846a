//! User JWT authentication for the API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserStatus};
use shared::util::now_millis;

use crate::db::Store;
use crate::state::AppState;

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: String,
    #[serde(default)]
    pub nickname: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub nickname: String,
}

const JWT_EXPIRY_HOURS: i64 = 24 * 7;

/// Create a signed token for a user
pub fn create_token(
    user_id: &str,
    nickname: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        nickname: nickname.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and return its claims
pub fn verify_token(token: &str, secret: &str) -> Result<UserClaims, AppError> {
    jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })
}

/// Load the token's user, creating the row on first sight
async fn resolve_user(store: &dyn Store, claims: &UserClaims) -> Result<User, AppError> {
    let lookup_failed = |e: crate::db::StoreError| {
        tracing::error!(user_id = %claims.sub, error = %e, "User lookup failed");
        AppError::new(ErrorCode::InternalError)
    };

    if let Some(user) = store.find_user(&claims.sub).await.map_err(lookup_failed)? {
        return Ok(user);
    }

    let user = User {
        id: claims.sub.clone(),
        nickname: claims.nickname.clone(),
        avatar_url: None,
        status: UserStatus::Enabled,
        created_at: now_millis(),
    };
    match store.insert_user(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "User provisioned from token");
            Ok(user)
        }
        // Concurrent first request from the same user
        Err(e) if e.is_duplicate() => store
            .find_user(&claims.sub)
            .await
            .map_err(lookup_failed)?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound)),
        Err(e) => Err(lookup_failed(e)),
    }
}

/// Middleware that verifies the bearer token and injects [`UserIdentity`]
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::with_message(ErrorCode::TokenInvalid, "Invalid Authorization format")
            .into_response()
    })?;

    let claims = verify_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;
    let user = resolve_user(state.store.as_ref(), &claims)
        .await
        .map_err(IntoResponse::into_response)?;
    if !user.is_enabled() {
        return Err(AppError::new(ErrorCode::AccountDisabled).into_response());
    }

    request.extensions_mut().insert(UserIdentity {
        user_id: user.id,
        nickname: user.nickname,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token("u1", "Alice", "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.nickname, "Alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("u1", "Alice", "secret").unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let past = chrono::Utc::now() - chrono::Duration::hours(2);
        let claims = UserClaims {
            sub: "u1".into(),
            nickname: String::new(),
            exp: past.timestamp() as usize,
            iat: (past - chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = verify_token(&token, "secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }
}
