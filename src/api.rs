//! Typed bindings for the REST backend, layered over [`RequestBroker`].
//!
//! Reads go through the broker's dedup; mutations invalidate the pending reads of
//! the resource they touch so that a read started before the write is not joined by
//! callers expecting fresh data.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{
    broker::{BrokerError, RequestBroker, decode_body},
    models::{
        Application, Company, CreateSkillRequest, DashboardStats, Interview, Job, Listing,
        Notification, Page, PortalUser, Profile, ProfileUpdate, ScheduleInterviewRequest, Skill,
    },
};

pub const JOBS: &str = "/api/job/";
pub const COMPANIES: &str = "/api/company/";
pub const SUBSCRIPTIONS: &str = "/api/company/subscriptions/";
pub const APPLICATIONS: &str = "/api/application/";
pub const NOTIFICATIONS: &str = "/api/notification/";
pub const PROFILE: &str = "/api/user/profile/";
pub const ADMIN_DASHBOARD: &str = "/api/admin/dashboard/";
pub const ADMIN_JOBS: &str = "/api/admin/job/";
pub const ADMIN_COMPANIES: &str = "/api/admin/company/";
pub const ADMIN_USERS: &str = "/api/admin/user/";
pub const ADMIN_SKILLS: &str = "/api/admin/skill/";
pub const ADMIN_INTERVIEWS: &str = "/api/admin/interview/";

/// Filters accepted by the job board listing.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct JobQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
}

impl JobQuery {
    fn params(&self) -> Value {
        json!({ "page": self.page.unwrap_or(1), "search": self.search })
    }
}

fn page_params(page: Option<u32>) -> Option<Value> {
    Some(json!({ "page": page.unwrap_or(1) }))
}

async fn list<T: DeserializeOwned>(
    broker: &RequestBroker,
    url: &str,
    params: Option<Value>,
) -> Result<Page<T>, BrokerError> {
    let listing: Listing<T> = broker.get_as(url, params).await?;
    Ok(listing.into())
}

// --- Job Board ---

pub async fn list_jobs(broker: &RequestBroker, query: &JobQuery) -> Result<Page<Job>, BrokerError> {
    list(broker, JOBS, Some(query.params())).await
}

/// The first page of active jobs, used on the landing page.
pub async fn featured_jobs(broker: &RequestBroker) -> Result<Page<Job>, BrokerError> {
    list(broker, JOBS, Some(json!({ "page": 1 }))).await
}

pub async fn get_job(broker: &RequestBroker, id: i64) -> Result<Job, BrokerError> {
    broker.get_as(&format!("{JOBS}{id}/"), None).await
}

pub async fn apply_to_job(
    broker: &RequestBroker,
    job_id: i64,
    cover_letter: Option<String>,
) -> Result<Application, BrokerError> {
    let body = broker
        .post(APPLICATIONS, json!({ "job": job_id, "cover_letter": cover_letter }))
        .await?;
    broker.invalidate(Some(APPLICATIONS));
    decode_body(body)
}

pub async fn applied_jobs(broker: &RequestBroker) -> Result<Page<Application>, BrokerError> {
    list(broker, APPLICATIONS, None).await
}

// --- Companies ---

pub async fn list_companies(
    broker: &RequestBroker,
    page: Option<u32>,
) -> Result<Page<Company>, BrokerError> {
    list(broker, COMPANIES, page_params(page)).await
}

pub async fn subscriptions(broker: &RequestBroker) -> Result<Page<Company>, BrokerError> {
    list(broker, SUBSCRIPTIONS, None).await
}

pub async fn subscribe_company(broker: &RequestBroker, id: i64) -> Result<Value, BrokerError> {
    let body = broker
        .post(&format!("{COMPANIES}{id}/subscribe/"), Value::Null)
        .await?;
    broker.invalidate(Some(COMPANIES));
    Ok(body)
}

pub async fn unsubscribe_company(broker: &RequestBroker, id: i64) -> Result<Value, BrokerError> {
    let body = broker
        .delete(&format!("{COMPANIES}{id}/subscribe/"), None)
        .await?;
    broker.invalidate(Some(COMPANIES));
    Ok(body)
}

// --- Notifications & Profile ---

pub async fn notifications(broker: &RequestBroker) -> Result<Page<Notification>, BrokerError> {
    list(broker, NOTIFICATIONS, None).await
}

pub async fn mark_notification_read(
    broker: &RequestBroker,
    id: i64,
) -> Result<Notification, BrokerError> {
    let body = broker
        .put(&format!("{NOTIFICATIONS}{id}/"), json!({ "is_read": true }))
        .await?;
    broker.invalidate(Some(NOTIFICATIONS));
    decode_body(body)
}

pub async fn profile(broker: &RequestBroker) -> Result<Profile, BrokerError> {
    broker.get_as(PROFILE, None).await
}

pub async fn update_profile(
    broker: &RequestBroker,
    update: &ProfileUpdate,
) -> Result<Profile, BrokerError> {
    let body = serde_json::to_value(update).map_err(|e| BrokerError::Decode(e.to_string()))?;
    let body = broker.put(PROFILE, body).await?;
    broker.invalidate(Some(PROFILE));
    decode_body(body)
}

// --- Back Office ---

pub async fn dashboard_stats(broker: &RequestBroker) -> Result<DashboardStats, BrokerError> {
    broker.get_as(ADMIN_DASHBOARD, None).await
}

pub async fn admin_jobs(broker: &RequestBroker, page: Option<u32>) -> Result<Page<Job>, BrokerError> {
    list(broker, ADMIN_JOBS, page_params(page)).await
}

pub async fn admin_companies(
    broker: &RequestBroker,
    page: Option<u32>,
) -> Result<Page<Company>, BrokerError> {
    list(broker, ADMIN_COMPANIES, page_params(page)).await
}

pub async fn admin_users(
    broker: &RequestBroker,
    page: Option<u32>,
) -> Result<Page<PortalUser>, BrokerError> {
    list(broker, ADMIN_USERS, page_params(page)).await
}

pub async fn admin_skills(broker: &RequestBroker) -> Result<Page<Skill>, BrokerError> {
    list(broker, ADMIN_SKILLS, None).await
}

pub async fn create_skill(
    broker: &RequestBroker,
    request: &CreateSkillRequest,
) -> Result<Skill, BrokerError> {
    let body = broker.post(ADMIN_SKILLS, json!({ "name": request.name })).await?;
    broker.invalidate(Some(ADMIN_SKILLS));
    decode_body(body)
}

pub async fn admin_interviews(broker: &RequestBroker) -> Result<Page<Interview>, BrokerError> {
    list(broker, ADMIN_INTERVIEWS, None).await
}

pub async fn schedule_interview(
    broker: &RequestBroker,
    request: &ScheduleInterviewRequest,
) -> Result<Interview, BrokerError> {
    let body = serde_json::to_value(request).map_err(|e| BrokerError::Decode(e.to_string()))?;
    let body = broker.post(ADMIN_INTERVIEWS, body).await?;
    broker.invalidate(Some(ADMIN_INTERVIEWS));
    decode_body(body)
}
