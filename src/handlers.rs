use axum::{
    Json,
    extract::{Path, Query},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{self, JobQuery},
    broker::BrokerError,
    models::{
        Application, Company, CreateSkillRequest, DashboardStats, Interview, Job, Notification,
        Page, PortalUser, Profile, ProfileUpdate, ScheduleInterviewRequest, Skill,
    },
    routes::AUTHENTICATION_PATH,
    session::PortalSession,
};

// --- Page View Models ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HomePage {
    pub signed_in: bool,
    pub featured_jobs: Vec<Job>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobBoardPage {
    pub query_page: u32,
    pub search: Option<String>,
    pub jobs: Page<Job>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoticePage {
    pub title: String,
    pub message: String,
    pub sign_in_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminDashboardPage {
    pub stats: DashboardStats,
    pub recent_jobs: Page<Job>,
}

/// PageQuery
///
/// `?page=` on the paginated back-office listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
}

// --- Public Pages ---

/// home
///
/// [Public Page] Landing page: the first page of jobs. Visitors with a session get
/// the same data; `signed_in` only toggles navigation affordances.
pub async fn home(session: PortalSession) -> Response {
    let broker = session.ready().await;
    let result = api::featured_jobs(broker).await.map(|jobs| HomePage {
        signed_in: session.is_signed_in(),
        featured_jobs: jobs.results,
    });
    session.respond(result)
}

/// job_board
///
/// [Public Page] Paginated, searchable job listing (`/job?page=2&search=rust`).
pub async fn job_board(session: PortalSession, Query(query): Query<JobQuery>) -> Response {
    let broker = session.ready().await;
    let result = api::list_jobs(broker, &query).await.map(|jobs| JobBoardPage {
        query_page: query.page.unwrap_or(1),
        search: query.search.clone(),
        jobs,
    });
    session.respond(result)
}

pub async fn job_details(session: PortalSession, Path(id): Path<i64>) -> Response {
    let broker = session.ready().await;
    session.respond(api::get_job(broker, id).await)
}

/// apply_to_job
///
/// Submits an application. The page is public, so a signed-out visitor reaches this
/// handler and the backend answers 401.
pub async fn apply_to_job(
    session: PortalSession,
    Path(id): Path<i64>,
    payload: Option<Json<ApplyRequest>>,
) -> Response {
    let cover_letter = payload.and_then(|Json(req)| req.cover_letter);
    let broker = session.ready().await;
    session.respond::<Application>(api::apply_to_job(broker, id, cover_letter).await)
}

pub async fn companies(session: PortalSession, Query(query): Query<PageQuery>) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Company>>(api::list_companies(broker, query.page).await)
}

pub async fn subscribe_company(session: PortalSession, Path(id): Path<i64>) -> Response {
    let broker = session.ready().await;
    session.respond(api::subscribe_company(broker, id).await)
}

pub async fn unsubscribe_company(session: PortalSession, Path(id): Path<i64>) -> Response {
    let broker = session.ready().await;
    session.respond(api::unsubscribe_company(broker, id).await)
}

/// authentication
///
/// [Public Page] Login entry. No backend data: signing in happens against the backend
/// directly, and the gate sends visitors with a decodable role elsewhere first.
pub async fn authentication(session: PortalSession) -> Response {
    session.respond(Ok::<_, BrokerError>(NoticePage {
        title: "Sign in".to_string(),
        message: "Sign in or create an account to apply for jobs.".to_string(),
        sign_in_path: None,
    }))
}

pub async fn not_authorized(session: PortalSession) -> Response {
    session.respond(Ok::<_, BrokerError>(NoticePage {
        title: "Not authorized".to_string(),
        message: "Your account cannot open this page.".to_string(),
        sign_in_path: Some(AUTHENTICATION_PATH.to_string()),
    }))
}

pub async fn admin_not_authorized(session: PortalSession) -> Response {
    session.respond(Ok::<_, BrokerError>(NoticePage {
        title: "Not authorized".to_string(),
        message: "The back office is restricted to administrators.".to_string(),
        sign_in_path: Some(AUTHENTICATION_PATH.to_string()),
    }))
}

// --- User Pages ---

pub async fn applied_jobs(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Application>>(api::applied_jobs(broker).await)
}

pub async fn subscriptions(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Company>>(api::subscriptions(broker).await)
}

pub async fn notifications(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Notification>>(api::notifications(broker).await)
}

pub async fn mark_notification_read(session: PortalSession, Path(id): Path<i64>) -> Response {
    let broker = session.ready().await;
    session.respond(api::mark_notification_read(broker, id).await)
}

pub async fn profile(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Profile>(api::profile(broker).await)
}

pub async fn update_profile(session: PortalSession, Json(update): Json<ProfileUpdate>) -> Response {
    let broker = session.ready().await;
    session.respond(api::update_profile(broker, &update).await)
}

// --- Admin Pages ---

/// admin_dashboard
///
/// [Admin Page] Headline counters plus the latest postings, fetched concurrently.
pub async fn admin_dashboard(session: PortalSession) -> Response {
    let broker = session.ready().await;
    let (stats, recent_jobs) =
        tokio::join!(api::dashboard_stats(broker), api::admin_jobs(broker, None));
    let result = stats
        .and_then(|stats| recent_jobs.map(|recent_jobs| AdminDashboardPage { stats, recent_jobs }));
    session.respond(result)
}

pub async fn admin_jobs(session: PortalSession, Query(query): Query<PageQuery>) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Job>>(api::admin_jobs(broker, query.page).await)
}

pub async fn admin_companies(session: PortalSession, Query(query): Query<PageQuery>) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Company>>(api::admin_companies(broker, query.page).await)
}

pub async fn admin_users(session: PortalSession, Query(query): Query<PageQuery>) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<PortalUser>>(api::admin_users(broker, query.page).await)
}

pub async fn admin_skills(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Skill>>(api::admin_skills(broker).await)
}

pub async fn create_skill(session: PortalSession, Json(req): Json<CreateSkillRequest>) -> Response {
    let broker = session.ready().await;
    session.respond(api::create_skill(broker, &req).await)
}

pub async fn admin_interviews(session: PortalSession) -> Response {
    let broker = session.ready().await;
    session.respond::<Page<Interview>>(api::admin_interviews(broker).await)
}

pub async fn schedule_interview(
    session: PortalSession,
    Json(req): Json<ScheduleInterviewRequest>,
) -> Response {
    let broker = session.ready().await;
    session.respond(api::schedule_interview(broker, &req).await)
}
