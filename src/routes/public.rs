use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Pages any visitor may open, signed in or not. The access gate lets these through
/// without looking at the role; data that needs a session is still guarded by the
/// backend, whose 401 clears the visitor's token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page with the first page of jobs.
        .route("/", get(handlers::home))
        // GET /job?page=...&search=...
        .route("/job", get(handlers::job_board))
        .route("/job/{id}", get(handlers::job_details))
        // POST /job/{id}/apply
        // Submits an application; the backend rejects anonymous visitors.
        .route("/job/{id}/apply", post(handlers::apply_to_job))
        .route("/companies", get(handlers::companies))
        // POST/DELETE /companies/{id}/subscribe
        .route(
            "/companies/{id}/subscribe",
            post(handlers::subscribe_company).delete(handlers::unsubscribe_company),
        )
        // Gate redirect targets.
        .route("/authentication", get(handlers::authentication))
        .route("/not-authorized", get(handlers::not_authorized))
        .route("/admin/not-authorized", get(handlers::admin_not_authorized))
}
