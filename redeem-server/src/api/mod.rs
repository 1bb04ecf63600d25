//! API routes for redeem-server

pub mod admin;
pub mod health;
pub mod packages;
pub mod redeem;
pub mod share_codes;
pub mod stocks;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admin_auth::admin_auth_middleware;
use crate::state::AppState;

/// Handler result: JSON body or an error the response layer renders.
pub type ApiResult<T> = Result<axum::Json<T>, shared::error::AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Management API (JWT authenticated)
    let admin = Router::new()
        .route("/api/admin/me", get(admin::me))
        .route("/api/packages", get(packages::list).post(packages::create))
        .route(
            "/api/packages/{id}",
            get(packages::get).put(packages::update).delete(packages::remove),
        )
        .route(
            "/api/packages/{id}/stocks",
            get(stocks::list_stocks)
                .post(stocks::create_stock_batch)
                .delete(stocks::delete_stock),
        )
        .route("/api/stocks/{stock_id}", put(stocks::update_stock))
        .route("/api/stocks/{stock_id}/link", post(stocks::generate_share_link))
        .route(
            "/api/share-codes",
            get(share_codes::list).post(share_codes::create),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    // Public endpoints (no auth)
    let public = Router::new()
        .route("/api/admin/login", post(admin::login))
        .route("/api/redeem", post(redeem::resolve_share_code));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
