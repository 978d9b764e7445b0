use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// User Router Module
///
/// Pages for signed-in job seekers. The gate only lets a token with the `user` role
/// reach these handlers.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/applied-jobs", get(handlers::applied_jobs))
        .route("/subscriptions", get(handlers::subscriptions))
        .route("/notifications", get(handlers::notifications))
        // POST /notifications/{id}/read
        .route(
            "/notifications/{id}/read",
            post(handlers::mark_notification_read),
        )
        // GET/PUT /profile
        .route(
            "/profile",
            get(handlers::profile).put(handlers::update_profile),
        )
}
