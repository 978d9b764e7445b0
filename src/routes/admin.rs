use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Back-office pages under `/admin`. The gate only lets a token with the
/// `admin` role reach these handlers; the backend re-checks the role on every call.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        // Headline counters and the latest postings.
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .route("/admin/jobs", get(handlers::admin_jobs))
        .route("/admin/companies", get(handlers::admin_companies))
        .route("/admin/users", get(handlers::admin_users))
        // GET/POST /admin/skills
        .route(
            "/admin/skills",
            get(handlers::admin_skills).post(handlers::create_skill),
        )
        // GET/POST /admin/interviews
        // Lists scheduled interviews and schedules a new one for an application.
        .route(
            "/admin/interviews",
            get(handlers::admin_interviews).post(handlers::schedule_interview),
        )
}
