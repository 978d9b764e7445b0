use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Backend Resources (JSON returned by the REST API) ---
//
// Every struct tolerates missing fields: the backend omits what a given endpoint
// does not serialize, and unknown fields are ignored.

/// Job
///
/// A job posting as listed on the public board and in the back office.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub skills: Vec<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    // Whether the requesting user follows this company.
    pub is_subscribed: bool,
}

/// Application
///
/// A user's application to a job, with its review status (`pending`, `shortlisted`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub id: i64,
    pub job: Option<Job>,
    pub job_id: Option<i64>,
    pub status: String,
    pub cover_letter: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub resume: Option<String>,
    pub skills: Vec<String>,
}

/// ProfileUpdate
///
/// Partial profile update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

// --- Back Office ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_jobs: u64,
    pub total_companies: u64,
    pub total_users: u64,
    pub total_applications: u64,
    pub upcoming_interviews: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub user_role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interview {
    pub id: i64,
    pub application: i64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: String,
}

/// ScheduleInterviewRequest
///
/// Body of `POST /admin/interviews`, forwarded to the backend as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub application: i64,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
}

// --- Pagination ---

/// Page
///
/// One page of a paginated listing (`count` / `next` / `previous` / `results`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// Listing
///
/// Some endpoints paginate and some return a bare array; both decode into a [`Page`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Paged {
                count,
                next,
                previous,
                results,
            } => Page {
                count: count.unwrap_or(results.len() as u64),
                next,
                previous,
                results,
            },
            Listing::Plain(results) => Page {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}
