use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin_auth,
    require_user_auth, security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{checkin, coupons, events, health, registrations, stats};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Rate limiting is enabled when rate_limit_per_minute > 0
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Member routes (require a valid member token)
    // Middleware order: auth runs first, then rate limiting (which needs the user id)
    let member_routes = Router::new()
        .route(
            "/api/v1/events/:event_id/register",
            post(registrations::register),
        )
        // Rate limiting runs after auth (needs the user id from auth)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Auth runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Admin routes (require an admin token)
    let admin_routes = Router::new()
        .route("/api/v1/events", post(events::create_event))
        .route(
            "/api/v1/events/:event_id/register/bulk",
            post(registrations::register_bulk),
        )
        .route(
            "/api/v1/events/:event_id/registrations",
            get(registrations::list_registrations),
        )
        .route("/api/v1/events/:event_id/stats", get(stats::event_stats))
        .route(
            "/api/v1/events/:event_id/coupons",
            post(coupons::create_coupon).get(coupons::list_coupons),
        )
        .route("/api/v1/coupons/:coupon_id", delete(coupons::delete_coupon))
        .route("/api/v1/check-in", post(checkin::check_in))
        .route(
            "/api/v1/check-in/validate/:token",
            get(checkin::validate_ticket),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Admin auth runs first
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_auth,
        ));

    // Public routes (no authentication required; price quotes accept an
    // optional token and fall back to the regular tier without one)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route("/api/v1/events/:event_id/price", get(events::get_event_price))
        .route(
            "/api/v1/events/:event_id/apply-coupon",
            post(events::apply_coupon),
        );

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware)) // Security headers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
