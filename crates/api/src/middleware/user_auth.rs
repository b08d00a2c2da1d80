//! JWT authentication middleware.
//!
//! Tokens are issued by the society's identity service and verified here
//! against the configured RSA public key. Authenticated user information is
//! stored in request extensions for downstream handlers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use shared::jwt::{extract_user_id, JwtConfig, Role};

/// Authenticated user information extracted from a verified JWT.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// Role claim used for endpoint authorization.
    pub role: Role,
    /// JWT ID (jti) for session tracking.
    pub jti: String,
}

impl UserAuth {
    /// Validates a bearer token and returns user authentication info.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt_config
            .validate_token(token)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let user_id =
            extract_user_id(&claims).map_err(|_| "Invalid user ID in token".to_string())?;

        Ok(UserAuth {
            user_id,
            role: claims.role,
            jti: claims.jti,
        })
    }

    /// Creates a JwtConfig from JwtAuthConfig.
    pub fn create_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, String> {
        JwtConfig::with_leeway(
            &config.private_key,
            &config.public_key,
            config.token_expiry_secs,
            config.leeway_secs,
        )
        .map_err(|e| format!("Failed to initialize JWT config: {}", e))
    }
}

/// Middleware that requires a valid JWT on the route.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match authenticate(&state, &req) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Middleware that requires a valid JWT carrying the admin role.
pub async fn require_admin_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match authenticate(&state, &req) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    if !auth.role.is_admin() {
        return forbidden_response("Admin access required");
    }

    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Shared bearer-token extraction and validation.
fn authenticate(state: &AppState, req: &Request<Body>) -> Result<UserAuth, Response> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return Err(unauthorized_response(
                "Missing or invalid Authorization header",
            ));
        }
    };

    let jwt_config = match UserAuth::create_jwt_config(&state.config.jwt) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to create JWT config: {}", e);
            return Err(internal_error_response("Authentication service unavailable"));
        }
    };

    UserAuth::validate(&jwt_config, token).map_err(|e| {
        tracing::debug!("JWT validation failed: {}", e);
        unauthorized_response("Invalid or expired token")
    })
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Missing or invalid Authorization header");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_response() {
        let response = forbidden_response("Admin access required");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_error_response() {
        let response = internal_error_response("Authentication service unavailable");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_create_jwt_config_rejects_bad_keys() {
        let config = JwtAuthConfig {
            private_key: "not-a-pem".to_string(),
            public_key: "not-a-pem".to_string(),
            token_expiry_secs: 3600,
            leeway_secs: 30,
        };
        assert!(UserAuth::create_jwt_config(&config).is_err());
    }

    #[test]
    fn test_user_auth_clone() {
        let auth = UserAuth {
            user_id: Uuid::new_v4(),
            role: Role::Member,
            jti: "test_jti".to_string(),
        };
        let cloned = auth.clone();
        assert_eq!(auth.user_id, cloned.user_id);
        assert_eq!(auth.jti, cloned.jti);
    }
}
