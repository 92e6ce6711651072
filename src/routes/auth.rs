/**
 * Authentication Routes
 * JWT-based admin authentication with login, verify, refresh, and logout
 */
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, net::SocketAddr};
use tokio::sync::RwLock;

use crate::error::{respond, ApiError};
use crate::state::AppState;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// Access token expiry in minutes
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiry in days
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Role carried by every admin token
const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_email: String,
    /// bcrypt hash; login is refused while unset
    pub admin_password_hash: Option<String>,
    /// One login attempt per IP per window; 0 disables the limit
    pub login_window_secs: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let admin_password_hash = if let Ok(hash) = std::env::var("ADMIN_HASH_PASSWORD") {
            Some(hash)
        } else if let Ok(plain) = std::env::var("ADMIN_PASSWORD") {
            hash(&plain, DEFAULT_COST).ok()
        } else {
            None
        };

        Self {
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password_hash,
            login_window_secs: std::env::var("LOGIN_RATE_LIMIT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // Admin email
    pub email: String, // Admin email
    pub role: String,  // Role
    pub exp: i64,      // Expiry timestamp
    pub iat: i64,      // Issued at timestamp
}

/// Stored refresh token data
#[derive(Debug, Clone)]
pub struct RefreshTokenData {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub expires_at: i64,
    pub revoked: bool,
}

/// User info returned to the admin panel
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

/// Token issuing, verification and refresh-token bookkeeping.
pub struct AuthService {
    config: AuthConfig,
    /// Keyed by SHA-256 of the refresh token
    refresh_tokens: RwLock<HashMap<String, RefreshTokenData>>,
    /// IP -> last login attempt timestamp
    rate_limit: RwLock<HashMap<String, i64>>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: Option<UserInfo>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub revoked: usize,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Generate a random refresh token
fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Refresh tokens are only ever stored as their SHA-256 digest.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            refresh_tokens: RwLock::new(HashMap::new()),
            rate_limit: RwLock::new(HashMap::new()),
        }
    }

    /// Create access token
    pub fn create_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
    }

    /// Verify and decode access token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Claims of the bearer token, or 401.
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<Claims, ApiError> {
        let token = extract_bearer_token(headers)
            .ok_or(ApiError::Unauthorized("Authorization required"))?;
        self.verify_access_token(&token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))
    }

    /// Check rate limit for an IP.
    ///
    /// Also removes stale entries from the map on every write so the HashMap
    /// does not grow without bound as unique IPs accumulate over time.
    async fn check_rate_limit(&self, ip: &str) -> bool {
        let window = self.config.login_window_secs;
        if window <= 0 {
            return true;
        }

        let now = Utc::now().timestamp();
        let mut limits = self.rate_limit.write().await;
        limits.retain(|_, last| now - *last < window);

        if limits.contains_key(ip) {
            return false;
        }

        limits.insert(ip.to_string(), now);
        true
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> bool {
        let Some(password_hash) = self.config.admin_password_hash.clone() else {
            tracing::warn!("Login attempted but no admin password is configured");
            return false;
        };
        if email.to_lowercase() != self.config.admin_email.to_lowercase() {
            return false;
        }

        // bcrypt is CPU-bound; keep the async executor free.
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    /// Issue an access token plus a fresh refresh token for `user`.
    async fn issue_tokens(&self, user: UserInfo) -> Result<TokenPair, ApiError> {
        let access_token = self
            .create_access_token(&user.user_id, &user.email, &user.role)
            .map_err(|e| ApiError::Internal(format!("failed to create access token: {}", e)))?;

        let refresh_token = generate_refresh_token();
        let now = Utc::now();
        let expires_at = now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);

        let mut tokens = self.refresh_tokens.write().await;
        tokens.retain(|_, data| !data.revoked && data.expires_at > now.timestamp());
        tokens.insert(
            hash_refresh_token(&refresh_token),
            RefreshTokenData {
                user_id: user.user_id.clone(),
                email: user.email.clone(),
                role: user.role.clone(),
                expires_at: expires_at.timestamp(),
                revoked: false,
            },
        );
        drop(tokens);

        Ok(TokenPair {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a live refresh token for a new pair; the old one is consumed.
    async fn rotate(&self, refresh_token: &str) -> Result<Option<TokenPair>, ApiError> {
        let token_hash = hash_refresh_token(refresh_token);
        let now = Utc::now().timestamp();

        let data = {
            let mut tokens = self.refresh_tokens.write().await;
            match tokens.remove(&token_hash) {
                Some(data) if !data.revoked && data.expires_at > now => data,
                _ => return Ok(None),
            }
        };

        let pair = self
            .issue_tokens(UserInfo {
                user_id: data.user_id,
                email: data.email,
                role: data.role,
            })
            .await?;
        Ok(Some(pair))
    }

    /// Revoke one refresh token and/or every token of `subject`.
    async fn revoke(&self, refresh_token: Option<&str>, subject: Option<&str>) -> usize {
        let mut tokens = self.refresh_tokens.write().await;
        let target = refresh_token.map(hash_refresh_token);
        let mut revoked = 0;

        for (hash, data) in tokens.iter_mut() {
            let hit = target.as_deref() == Some(hash.as_str())
                || subject.is_some_and(|s| s == data.user_id);
            if hit && !data.revoked {
                data.revoked = true;
                revoked += 1;
            }
        }

        // Expired or revoked tokens are never valid again
        let now = Utc::now().timestamp();
        tokens.retain(|_, data| !data.revoked && data.expires_at > now);
        revoked
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Authenticate the admin and return tokens
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let ip = addr.ip().to_string();

    if !state.auth.check_rate_limit(&ip).await {
        tracing::warn!(ip = %ip, "login rate limited");
        return Err(ApiError::RateLimited);
    }

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    if !state
        .auth
        .verify_credentials(&payload.email, &payload.password)
        .await
    {
        tracing::warn!("Failed login attempt for: {}", payload.email);
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let email = state.auth.config.admin_email.clone();
    let pair = state
        .auth
        .issue_tokens(UserInfo {
            user_id: email.clone(),
            email,
            role: ADMIN_ROLE.to_string(),
        })
        .await?;

    tracing::info!("Successful login for user: {}", pair.user.email);
    Ok(respond(StatusCode::OK, pair))
}

/// POST /api/auth/verify
/// Verify access token and return user info
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = extract_bearer_token(&headers)
        .and_then(|token| match state.auth.verify_access_token(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                None
            }
        })
        .map(|claims| UserInfo {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        });

    respond(
        StatusCode::OK,
        VerifyResponse {
            valid: user.is_some(),
            user,
        },
    )
}

/// POST /api/auth/refresh
/// Rotate the refresh token and issue a new access token
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    if payload.refresh_token.is_empty() {
        return Err(ApiError::BadRequest(
            "Refresh token is required".to_string(),
        ));
    }

    match state.auth.rotate(&payload.refresh_token).await? {
        Some(pair) => Ok(respond(StatusCode::OK, pair)),
        None => Err(ApiError::Unauthorized("Invalid or expired refresh token")),
    }
}

/// POST /api/auth/logout
/// Revoke the given refresh token, and every token of the bearer's subject.
/// The body is optional; a bearer header alone is enough.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice::<LogoutRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid logout body: {}", e)))?
    };

    let subject = payload
        .access_token
        .or_else(|| extract_bearer_token(&headers))
        .and_then(|token| state.auth.verify_access_token(&token).ok())
        .map(|claims| claims.sub);

    let revoked = state
        .auth
        .revoke(payload.refresh_token.as_deref(), subject.as_deref())
        .await;

    // Logout is idempotent
    Ok(respond(StatusCode::OK, LogoutResponse { revoked }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Envelope;
    use crate::state::test_support::{test_auth_config, test_state, ADMIN_EMAIL, ADMIN_PASSWORD};
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn auth_router(state: AppState) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/verify", post(verify_token))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
            .with_state(state)
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
        bearer: Option<&str>,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let mut req = Request::post(uri).header("content-type", "application/json");
        if let Some(token) = bearer {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let res = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    async fn login_ok(app: Router) -> TokenPair {
        let (status, bytes) = post_json(
            app,
            "/api/auth/login",
            &LoginRequest {
                email: ADMIN_EMAIL.to_uppercase(),
                password: ADMIN_PASSWORD.to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice::<Envelope<TokenPair>>(&bytes).unwrap().data
    }

    #[test]
    fn test_verify_access_token_invalid_returns_err() {
        let auth = AuthService::new(test_auth_config());
        assert!(auth.verify_access_token("invalid.jwt.token").is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let auth = AuthService::new(test_auth_config());
        let other = AuthService::new(AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..test_auth_config()
        });
        let token = other.create_access_token("a", "a@b.c", ADMIN_ROLE).unwrap();
        assert!(auth.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_require_admin_reads_bearer_header() {
        let auth = AuthService::new(test_auth_config());
        let token = auth.create_access_token("a", "a@b.c", ADMIN_ROLE).unwrap();

        let mut headers = HeaderMap::new();
        assert!(matches!(
            auth.require_admin(&headers),
            Err(ApiError::Unauthorized("Authorization required"))
        ));

        headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());
        assert_eq!(auth.require_admin(&headers).unwrap().email, "a@b.c");
    }

    #[test]
    fn test_default_secret_detected() {
        let config = AuthConfig {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            ..test_auth_config()
        };
        assert!(config.uses_default_secret());
        assert!(!test_auth_config().uses_default_secret());
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_second_attempt_in_window() {
        let auth = AuthService::new(AuthConfig {
            login_window_secs: 60,
            ..test_auth_config()
        });
        assert!(auth.check_rate_limit("10.0.0.1").await);
        assert!(!auth.check_rate_limit("10.0.0.1").await);
        assert!(auth.check_rate_limit("10.0.0.2").await);
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state()),
            "/api/auth/login",
            &LoginRequest {
                email: "".to_string(),
                password: "whatever".to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state()),
            "/api/auth/login",
            &LoginRequest {
                email: "no-at-sign".to_string(),
                password: "whatever".to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_returns_unauthorized() {
        let (status, _) = post_json(
            auth_router(test_state()),
            "/api/auth/login",
            &LoginRequest {
                email: ADMIN_EMAIL.to_string(),
                password: "wrongpassword".to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_without_configured_password_is_refused() {
        let mut state = test_state();
        state.auth = std::sync::Arc::new(AuthService::new(AuthConfig {
            admin_password_hash: None,
            ..test_auth_config()
        }));
        let (status, _) = post_json(
            auth_router(state),
            "/api/auth/login",
            &LoginRequest {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_verify() {
        let app = auth_router(test_state());
        let pair = login_ok(app.clone()).await;
        assert_eq!(pair.user.email, ADMIN_EMAIL);

        let (status, bytes) =
            post_json(app, "/api/auth/verify", &serde_json::json!({}), Some(&pair.access_token))
                .await;
        assert_eq!(status, StatusCode::OK);
        let body: Envelope<VerifyResponse> = serde_json::from_slice(&bytes).unwrap();
        assert!(body.data.valid);
        assert_eq!(body.data.user.unwrap().role, ADMIN_ROLE);
    }

    #[tokio::test]
    async fn test_verify_no_token_is_not_valid() {
        let (status, bytes) = post_json(
            auth_router(test_state()),
            "/api/auth/verify",
            &serde_json::json!({}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Envelope<VerifyResponse> = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.data.valid);
        assert!(body.data.user.is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let app = auth_router(test_state());
        let pair = login_ok(app.clone()).await;
        let request = RefreshRequest {
            refresh_token: pair.refresh_token.clone(),
        };

        let (status, bytes) = post_json(app.clone(), "/api/auth/refresh", &request, None).await;
        assert_eq!(status, StatusCode::OK);
        let rotated = serde_json::from_slice::<Envelope<TokenPair>>(&bytes).unwrap().data;
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // the old token was consumed by the rotation
        let (status, _) = post_json(app, "/api/auth/refresh", &request, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_empty_token_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state()),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: "".to_string(),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let app = auth_router(test_state());
        let pair = login_ok(app.clone()).await;

        let (status, bytes) = post_json(
            app.clone(),
            "/api/auth/logout",
            &LogoutRequest {
                access_token: None,
                refresh_token: Some(pair.refresh_token.clone()),
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Envelope<LogoutResponse> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.data.revoked, 1);

        let (status, _) = post_json(
            app,
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: pair.refresh_token,
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_returns_success_without_tokens() {
        let (status, bytes) = post_json(
            auth_router(test_state()),
            "/api/auth/logout",
            &LogoutRequest {
                access_token: None,
                refresh_token: None,
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Envelope<LogoutResponse> = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);
        assert_eq!(body.data.revoked, 0);
    }

    async fn post_raw(
        app: Router,
        uri: &str,
        body: &'static str,
        bearer: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::post(uri);
        if !body.is_empty() {
            req = req.header("content-type", "application/json");
        }
        if let Some(token) = bearer {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let res = app.oneshot(req.body(Body::from(body)).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_logout_with_bearer_only_revokes_subject_tokens() {
        let app = auth_router(test_state());
        let pair = login_ok(app.clone()).await;

        let (status, value) =
            post_raw(app.clone(), "/api/auth/logout", "", Some(&pair.access_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["revoked"], 1);

        let (status, _) = post_json(
            app,
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: pair.refresh_token,
            },
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_bodies_return_error_envelope() {
        for uri in ["/api/auth/login", "/api/auth/refresh", "/api/auth/logout"] {
            let (status, value) = post_raw(auth_router(test_state()), uri, "{bad", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(value["success"], false, "{uri}");
            assert_eq!(value["error"], "Bad request", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_rotation_does_not_accumulate_tokens() {
        let auth = AuthService::new(test_auth_config());
        let user = UserInfo {
            user_id: ADMIN_EMAIL.to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: ADMIN_ROLE.to_string(),
        };
        let mut pair = auth.issue_tokens(user.clone()).await.unwrap();
        for _ in 0..5 {
            pair = auth.rotate(&pair.refresh_token).await.unwrap().unwrap();
        }
        assert_eq!(auth.refresh_tokens.read().await.len(), 1);

        // revoked entries are dropped on the next issue
        auth.refresh_tokens
            .write()
            .await
            .values_mut()
            .for_each(|data| data.revoked = true);
        let fresh = auth.issue_tokens(user).await.unwrap();
        let tokens = auth.refresh_tokens.read().await;
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains_key(&hash_refresh_token(&fresh.refresh_token)));
    }
}
