/// Router Module Index
///
/// Page routes are split by access category. The split mirrors [`classify`], which the
/// access gate consults before any of these handlers run.

/// Pages reachable without a session.
pub mod public;

/// Pages for signed-in users with the `user` role.
pub mod user;

/// Back-office pages for the `admin` role.
pub mod admin;

pub const AUTHENTICATION_PATH: &str = "/authentication";
pub const SITE_ROOT_PATH: &str = "/";
pub const ADMIN_PREFIX: &str = "/admin";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";
pub const NOT_AUTHORIZED_PATH: &str = "/not-authorized";
pub const ADMIN_NOT_AUTHORIZED_PATH: &str = "/admin/not-authorized";

/// Public pages. `/` matches only itself; every other entry also covers its sub-paths
/// (`/job/42` is public, `/jobs` is not).
pub const PUBLIC_PATHS: &[&str] = &[
    SITE_ROOT_PATH,
    "/companies",
    "/job",
    AUTHENTICATION_PATH,
    NOT_AUTHORIZED_PATH,
    ADMIN_NOT_AUTHORIZED_PATH,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    Public,
    Admin,
    User,
}

/// Classifies a request path. Pure function of the path string.
pub fn classify(path: &str) -> RouteCategory {
    if is_public(path) {
        RouteCategory::Public
    } else if is_admin(path) {
        RouteCategory::Admin
    } else {
        RouteCategory::User
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| {
        if *public == SITE_ROOT_PATH {
            path == SITE_ROOT_PATH
        } else {
            under(path, public)
        }
    })
}

/// The login page, with or without a trailing segment.
pub fn is_login_page(path: &str) -> bool {
    under(path, AUTHENTICATION_PATH)
}

pub fn is_admin(path: &str) -> bool {
    under(path, ADMIN_PREFIX)
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
