//! Route definitions for the Medfast patient portal

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - patient portal
        .nest("/api/patient", patient_routes(state))
}

/// Authentication routes; only logout needs a token
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/signup", post(handlers::sign_up))
        .route("/signin", post(handlers::sign_in))
        .route("/refresh", post(handlers::refresh))
        .route("/verify", post(handlers::verify))
        .route("/reverify", post(handlers::reverify))
        .route("/otp", post(handlers::send_otp))
        .route("/otp/verify", post(handlers::verify_otp))
        .route("/password/reset", post(handlers::reset_password))
        .merge(protected)
}

/// Patient portal routes (protected)
fn patient_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/appointments", get(handlers::get_appointments))
        .route("/tests", get(handlers::get_tests))
        .route("/tests/create", post(handlers::create_test))
        .route("/tests/result", get(handlers::get_test_result))
        .route("/tests/generate", post(handlers::generate_test_result))
        .route("/settings/password/change", post(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
