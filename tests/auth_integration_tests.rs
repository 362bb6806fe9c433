use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, Request, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::SystemTime;
use storefront_gate::{
    AppConfig, AppState, GateDecision, RedirectReason,
    auth::{Claims, SessionCheck, SessionStatus, session_token},
};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Token issued at `iat` seconds from now, valid for `ttl` seconds after that.
fn create_token(secret: &str, issued_offset: i64, ttl: u64) -> String {
    let iat = (now() as i64 + issued_offset) as u64;
    let claims = Claims {
        sub: "customer-42".to_string(),
        iat: iat as usize,
        exp: (iat + ttl) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(session_check: SessionCheck) -> AppState {
    let mut config = AppConfig::default();
    config.gate.session_check = session_check;
    AppState::new(config)
}

fn headers_with_cookie(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
}

fn get_request_parts(uri: Uri, cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Cookie Extraction ---

#[test]
fn test_session_token_found_among_other_cookies() {
    let headers = headers_with_cookie("theme=dark; token=abc; lang=id");
    assert_eq!(session_token(&headers, "token"), Some("abc"));
}

#[test]
fn test_session_token_across_multiple_cookie_headers() {
    let mut headers = headers_with_cookie("theme=dark");
    headers.append(header::COOKIE, HeaderValue::from_static("token=\"quoted\""));
    assert_eq!(session_token(&headers, "token"), Some("quoted"));
}

#[test]
fn test_session_token_missing_or_empty() {
    assert_eq!(session_token(&HeaderMap::new(), "token"), None);
    assert_eq!(session_token(&headers_with_cookie("token="), "token"), None);
    assert_eq!(session_token(&headers_with_cookie("token=\"\""), "token"), None);
    // Name match is exact.
    assert_eq!(session_token(&headers_with_cookie("xtoken=abc; tokens=abc"), "token"), None);
}

#[test]
fn test_session_token_skips_empty_duplicates() {
    let headers = headers_with_cookie("token=; theme=dark; token=abc");
    assert_eq!(session_token(&headers, "token"), Some("abc"));

    let mut headers = headers_with_cookie("token=");
    headers.append(header::COOKIE, HeaderValue::from_static("token=abc"));
    assert_eq!(session_token(&headers, "token"), Some("abc"));
}

// --- Presence Check ---

#[test]
fn test_presence_check_accepts_any_value() {
    let check = SessionCheck::Presence;
    assert_eq!(check.evaluate(Some("abc")), SessionStatus::Authenticated);
    assert_eq!(check.evaluate(Some("not-a-jwt")), SessionStatus::Authenticated);
    assert_eq!(check.evaluate(Some("")), SessionStatus::Anonymous);
    assert_eq!(check.evaluate(None), SessionStatus::Anonymous);
}

// --- JWT Verification ---

#[test]
fn test_jwt_check_accepts_valid_token() {
    let check = SessionCheck::Jwt {
        secret: TEST_JWT_SECRET.to_string(),
    };
    let token = create_token(TEST_JWT_SECRET, 0, 3600);
    assert_eq!(check.evaluate(Some(&token)), SessionStatus::Authenticated);
}

#[test]
fn test_jwt_check_rejects_forged_expired_and_opaque_tokens() {
    let check = SessionCheck::Jwt {
        secret: TEST_JWT_SECRET.to_string(),
    };

    let forged = create_token("some-other-secret", 0, 3600);
    assert_eq!(check.evaluate(Some(&forged)), SessionStatus::Anonymous);

    // Issued two hours ago, expired one hour ago (well past the default leeway).
    let expired = create_token(TEST_JWT_SECRET, -7200, 3600);
    assert_eq!(check.evaluate(Some(&expired)), SessionStatus::Anonymous);

    assert_eq!(check.evaluate(Some("abc")), SessionStatus::Anonymous);
}

#[test]
fn test_jwt_secret_is_redacted_in_debug_output() {
    let check = SessionCheck::Jwt {
        secret: TEST_JWT_SECRET.to_string(),
    };
    assert!(!format!("{check:?}").contains(TEST_JWT_SECRET));
}

// --- Gate With Verification ---

#[test]
fn test_gate_treats_rejected_token_as_missing() {
    let state = create_app_state(SessionCheck::Jwt {
        secret: TEST_JWT_SECRET.to_string(),
    });

    let forged = format!("token={}", create_token("wrong", 0, 3600));
    let decision = state
        .gate
        .handle(&"/id/profile".parse().unwrap(), &headers_with_cookie(&forged));
    assert_eq!(
        decision,
        GateDecision::Redirect {
            location: "/id/auth/login".to_string(),
            reason: RedirectReason::LoginRequired,
        }
    );

    let valid = format!("token={}", create_token(TEST_JWT_SECRET, 0, 3600));
    let decision = state
        .gate
        .handle(&"/id/profile".parse().unwrap(), &headers_with_cookie(&valid));
    assert!(matches!(decision, GateDecision::Continue(Some(_))));
}

// --- Extractor ---

#[tokio::test]
async fn test_session_extractor_uses_gate_policy() {
    let app_state = create_app_state(SessionCheck::Presence);

    let mut parts = get_request_parts("/id/about".parse().unwrap(), Some("token=abc"));
    let session = SessionStatus::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(session.unwrap(), SessionStatus::Authenticated);

    let mut parts = get_request_parts("/id/about".parse().unwrap(), None);
    let session = SessionStatus::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(session.unwrap(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn test_session_extractor_honours_custom_cookie_name() {
    let mut config = AppConfig::default();
    config.gate.session_cookie = "sid".to_string();
    let app_state = AppState::new(config);

    let mut parts = get_request_parts("/".parse().unwrap(), Some("token=abc"));
    let session = SessionStatus::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(session.unwrap(), SessionStatus::Anonymous);

    let mut parts = get_request_parts("/".parse().unwrap(), Some("sid=abc"));
    let session = SessionStatus::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(session.unwrap(), SessionStatus::Authenticated);
}
