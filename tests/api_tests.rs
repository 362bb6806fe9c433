use reqwest::{StatusCode, header, redirect::Policy};
use storefront_gate::{AppConfig, AppState, create_router, models::PageContext};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let router = create_router(AppState::new(AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// Client that reports redirects instead of following them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_anonymous_visit_to_profile() {
    let app = spawn_app().await;
    let client = client();

    let response = client
        .get(format!("{}/profile", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/id/profile");

    let response = client
        .get(format!("{}{}", app.address, location(&response)))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/id/auth/login");
}

#[tokio::test]
async fn test_following_redirects_lands_on_login_page() {
    let app = spawn_app().await;

    // Default client follows redirects all the way to the login page.
    let response = reqwest::Client::new()
        .get(format!("{}/wishlist", app.address))
        .header(header::ACCEPT_LANGUAGE, "en")
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.url().path().ends_with("/en/auth/login"));
    let page: PageContext = response.json().await.expect("page context");
    assert_eq!(page.locale, "en");
    assert_eq!(page.route, "/auth/login");
    assert!(!page.authenticated);
}

#[tokio::test]
async fn test_logged_in_visitor_sent_home_from_register() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/en/auth/register", app.address))
        .header(header::COOKIE, "token=abc")
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/en");
}
