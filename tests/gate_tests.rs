mod common;

use axum::http::StatusCode;
use common::{admin_token, app_with, location, send, token_with, user_token};
use job_portal_edge::{
    AccessGate, GateDecision, MockTransport,
    claims::{Claims, ClaimsDecoder, Role},
    routes::{PUBLIC_PATHS, RouteCategory, classify},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn gate() -> AccessGate {
    AccessGate::new("token", ClaimsDecoder::Unverified)
}

fn redirect(target: &'static str) -> GateDecision {
    GateDecision::Redirect(target)
}

// --- Classification ---

#[test]
fn test_classification_table() {
    assert_eq!(classify("/"), RouteCategory::Public);
    assert_eq!(classify("/companies"), RouteCategory::Public);
    assert_eq!(classify("/job"), RouteCategory::Public);
    assert_eq!(classify("/job/42"), RouteCategory::Public);
    assert_eq!(classify("/authentication"), RouteCategory::Public);
    assert_eq!(classify("/not-authorized"), RouteCategory::Public);
    assert_eq!(classify("/admin/not-authorized"), RouteCategory::Public);

    assert_eq!(classify("/admin"), RouteCategory::Admin);
    assert_eq!(classify("/admin/jobs"), RouteCategory::Admin);

    assert_eq!(classify("/applied-jobs"), RouteCategory::User);
    assert_eq!(classify("/jobs"), RouteCategory::User);
    assert_eq!(classify("/administrator"), RouteCategory::User);
}

// --- Scenarios ---

#[test]
fn test_admin_token_on_admin_path_is_allowed() {
    assert_eq!(gate().decide("/admin/jobs", Some(&admin_token())), GateDecision::Allow);
}

#[test]
fn test_user_token_on_admin_path_is_sent_to_admin_not_authorized() {
    assert_eq!(
        gate().decide("/admin/jobs", Some(&user_token())),
        redirect("/admin/not-authorized")
    );
}

#[test]
fn test_missing_token_on_user_path_is_sent_to_login() {
    assert_eq!(gate().decide("/applied-jobs", None), redirect("/authentication"));
}

#[test]
fn test_signed_in_visitors_skip_the_login_page() {
    assert_eq!(
        gate().decide("/authentication", Some(&admin_token())),
        redirect("/admin/dashboard")
    );
    assert_eq!(gate().decide("/authentication", Some(&user_token())), redirect("/"));
}

#[test]
fn test_malformed_token_on_login_page_shows_login() {
    assert_eq!(gate().decide("/authentication", Some("garbage")), GateDecision::Allow);
    assert_eq!(gate().decide("/authentication", Some("a.%%%.c")), GateDecision::Allow);
}

#[test]
fn test_unknown_role_on_login_page_falls_through_to_public() {
    let token = token_with(json!({ "user_role": "recruiter" }));
    assert_eq!(gate().decide("/authentication", Some(&token)), GateDecision::Allow);

    let token = token_with(json!({ "user_id": 3 }));
    assert_eq!(gate().decide("/authentication", Some(&token)), GateDecision::Allow);
}

#[test]
fn test_admin_token_on_user_path_is_sent_to_not_authorized() {
    assert_eq!(
        gate().decide("/applied-jobs", Some(&admin_token())),
        redirect("/not-authorized")
    );
}

#[test]
fn test_unknown_role_on_user_path_is_sent_to_not_authorized() {
    let token = token_with(json!({ "user_role": "recruiter" }));
    assert_eq!(gate().decide("/profile", Some(&token)), redirect("/not-authorized"));
    assert_eq!(
        gate().decide("/admin/users", Some(&token)),
        redirect("/admin/not-authorized")
    );
}

#[test]
fn test_token_without_role_is_sent_to_login() {
    let token = token_with(json!({ "user_id": 3 }));
    assert_eq!(gate().decide("/profile", Some(&token)), redirect("/authentication"));
    assert_eq!(gate().decide("/admin/jobs", Some(&token)), redirect("/authentication"));
}

// --- Properties ---

#[test]
fn test_public_paths_pass_for_every_credential() {
    let tokens = [
        None,
        Some("garbage".to_string()),
        Some(token_with(json!({ "user_role": "recruiter" }))),
        Some(admin_token()),
        Some(user_token()),
    ];

    for path in PUBLIC_PATHS.iter().filter(|p| **p != "/authentication") {
        for token in &tokens {
            assert_eq!(
                gate().decide(path, token.as_deref()),
                GateDecision::Allow,
                "{path} with {token:?}"
            );
        }
    }
}

#[test]
fn test_admin_paths_pass_only_for_admin_role() {
    for path in ["/admin", "/admin/dashboard", "/admin/interviews"] {
        assert_eq!(gate().decide(path, Some(&admin_token())), GateDecision::Allow);
        assert_ne!(gate().decide(path, Some(&user_token())), GateDecision::Allow);
        assert_ne!(gate().decide(path, Some("garbage")), GateDecision::Allow);
        assert_ne!(gate().decide(path, None), GateDecision::Allow);
    }
}

#[test]
fn test_user_paths_pass_only_for_user_role() {
    for path in ["/applied-jobs", "/profile", "/notifications", "/jobs"] {
        assert_eq!(gate().decide(path, Some(&user_token())), GateDecision::Allow);
        assert_ne!(gate().decide(path, Some(&admin_token())), GateDecision::Allow);
        assert_ne!(gate().decide(path, Some("garbage")), GateDecision::Allow);
        assert_ne!(gate().decide(path, None), GateDecision::Allow);
    }
}

#[test]
fn test_undecodable_token_is_the_same_as_no_token() {
    let malformed = ["garbage", "a.b", "a.!!!.c", "a.bm90LWpzb24.c", "a.b.c.d"];
    for path in ["/", "/job/7", "/profile", "/admin/jobs", "/admin/not-authorized"] {
        for token in malformed {
            assert_eq!(gate().decide(path, Some(token)), gate().decide(path, None), "{path}");
        }
    }
}

// --- Claims ---

#[test]
fn test_claims_accept_standard_and_url_safe_alphabets() {
    let decoder = ClaimsDecoder::Unverified;
    // {"user_role":"admin","n":"?>x"} in the standard alphabet, padded.
    let padded = "h.eyJ1c2VyX3JvbGUiOiJhZG1pbiIsIm4iOiI/PngifQ==.s";
    assert_eq!(decoder.decode(padded).unwrap().role(), Some(Role::Admin));

    let claims = decoder.decode(&user_token()).unwrap();
    assert_eq!(claims.user_role.as_deref(), Some("user"));
}

#[test]
fn test_verified_decoder_checks_signature() {
    let claims = Claims {
        user_role: Some("admin".to_string()),
        exp: None,
    };
    let signed = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    let gate = AccessGate::new("token", ClaimsDecoder::from_secret(Some(TEST_JWT_SECRET)));
    assert_eq!(gate.decide("/admin/jobs", Some(&signed)), GateDecision::Allow);
    assert_eq!(gate.decide("/admin/jobs", Some(&forged)), redirect("/authentication"));
    // Unsigned tokens carry no valid signature at all.
    assert_eq!(gate.decide("/admin/jobs", Some(&admin_token())), redirect("/authentication"));
}

#[test]
fn test_verified_decoder_accepts_audience_claim() {
    let signed = encode(
        &Header::default(),
        &json!({ "user_role": "admin", "aud": "portal" }),
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let gate = AccessGate::new("token", ClaimsDecoder::from_secret(Some(TEST_JWT_SECRET)));
    assert_eq!(gate.decide("/admin/jobs", Some(&signed)), GateDecision::Allow);
}

#[test]
fn test_non_string_role_is_an_unknown_role() {
    let token = token_with(json!({ "user_role": 5 }));
    assert_eq!(
        gate().decide("/profile", Some(&token)),
        redirect("/not-authorized")
    );
    assert_eq!(
        ClaimsDecoder::Unverified.decode(&token).unwrap().role(),
        Some(Role::Other("5".to_string()))
    );

    let token = token_with(json!({ "user_role": null }));
    assert_eq!(gate().decide("/profile", Some(&token)), redirect("/authentication"));
}

#[test]
fn test_login_page_with_trailing_slash_redirects_signed_in_visitors() {
    assert_eq!(
        gate().decide("/authentication/", Some(&admin_token())),
        redirect("/admin/dashboard")
    );
    assert_eq!(gate().decide("/authentication/", Some(&user_token())), redirect("/"));
    assert_eq!(gate().decide("/authentication/", None), GateDecision::Allow);
}

// --- Middleware ---

#[tokio::test]
async fn test_middleware_redirects_before_page_code_runs() {
    let mock = MockTransport::new();
    let response = send(app_with(&mock), "GET", "/applied-jobs", None, None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/authentication"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_middleware_ignores_role_hint_cookie() {
    // The helper always sends `user_role=user`; the admin claim still decides.
    let mock = MockTransport::new();
    let response = send(app_with(&mock), "GET", "/profile", Some(&admin_token()), None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/not-authorized"));
}

#[tokio::test]
async fn test_unknown_paths_are_gated_too() {
    let mock = MockTransport::new();

    let response = send(app_with(&mock), "GET", "/no-such-page", None, None).await;
    assert_eq!(location(&response), Some("/authentication"));

    let response = send(app_with(&mock), "GET", "/no-such-page", Some(&user_token()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_outside_the_gate() {
    let mock = MockTransport::new();
    let response = send(app_with(&mock), "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
