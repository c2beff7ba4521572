//! End-to-end tests of the REST surface against mocked Google endpoints.

use std::net::SocketAddr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{redirect, StatusCode};
use serde_json::{json, Value};
use swipemail_gateway::{router, AppState, GatewayConfig};
use swipemail_protocol::SESSION_COOKIE;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GMAIL: &str = "/gmail/v1/users/me";
const CLIENT_URL: &str = "http://localhost:5173";

struct Harness {
    base: String,
    http: reqwest::Client,
    google: MockServer,
}

impl Harness {
    async fn start() -> Self {
        let google = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test",
                "refresh_token": "1//refresh",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .mount(&google)
            .await;

        let token_endpoint = format!("{}/token", google.uri());
        let gmail_base = format!("{}/gmail/v1", google.uri());
        let vars = [
            ("GOOGLE_CLIENT_ID", "cid"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("CLIENT_URL", CLIENT_URL),
            ("GOOGLE_TOKEN_ENDPOINT", token_endpoint.as_str()),
            ("GMAIL_API_BASE", gmail_base.as_str()),
        ];
        let config = GatewayConfig::from_lookup(
            |key| {
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            },
            None,
        )
        .unwrap();

        let app = router(AppState::new(config).unwrap()).unwrap();
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base: format!("http://{}", addr),
            http,
            google,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.http.get(self.url(path));
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        req.send().await.unwrap()
    }

    async fn post(&self, path: &str, cookie: Option<&str>, body: Option<Value>) -> reqwest::Response {
        let mut req = self.http.post(self.url(path));
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        req.send().await.unwrap()
    }

    /// Run the consent round-trip and return the session cookie.
    async fn sign_in(&self) -> String {
        let resp = self.get("/auth/google", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = cookie_pair(&resp);
        let body: Value = resp.json().await.unwrap();
        let consent_url = body["url"].as_str().unwrap().to_string();

        let resp = self
            .get(
                &format!(
                    "/auth/google/callback?code=auth-code&state={}",
                    state_param(&consent_url)
                ),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers()[LOCATION].to_str().unwrap(),
            format!("{}?auth=success", CLIENT_URL)
        );
        assert_eq!(cookie_pair(&resp), cookie);
        cookie
    }

    async fn mount_labels(&self, labels: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/labels", GMAIL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": labels })))
            .mount(&self.google)
            .await;
    }
}

fn cookie_pair(resp: &reqwest::Response) -> String {
    resp.headers()[SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn state_param(url: &str) -> String {
    url.split_once('?')
        .unwrap()
        .1
        .split('&')
        .find_map(|pair| pair.strip_prefix("state="))
        .unwrap()
        .to_string()
}

fn draft_json(id: &str, message_id: &str, labels: &[&str], subject: &str) -> Value {
    json!({
        "id": id,
        "message": {
            "id": message_id,
            "labelIds": labels,
            "snippet": "snippet",
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    { "name": "To", "value": "a@b.com" },
                    { "name": "Subject", "value": subject }
                ],
                "body": { "data": URL_SAFE_NO_PAD.encode("Hello there") }
            }
        }
    })
}

#[tokio::test]
async fn health_check() {
    let h = Harness::start().await;
    let resp = h.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn signed_out_by_default() {
    let h = Harness::start().await;

    let status: Value = h.get("/auth/status", None).await.json().await.unwrap();
    assert_eq!(status, json!({ "authenticated": false }));

    let resp = h.get("/api/drafts", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Not authenticated" }));

    let resp = h.post("/api/drafts/r-1/send", Some("swipemail_session=forged"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn consent_url_requests_gmail_scopes() {
    let h = Harness::start().await;
    let resp = h.get("/auth/google", None).await;
    let set_cookie = resp.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("HttpOnly"));

    let body: Value = resp.json().await.unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.contains("client_id=cid"));
    assert!(url.contains("gmail.send"));
    assert!(url.contains("gmail.modify"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(!state_param(url).is_empty());
}

#[tokio::test]
async fn callback_failures_redirect_with_error() {
    let h = Harness::start().await;
    let error_target = format!("{}?auth=error", CLIENT_URL);

    for query in [
        "?code=abc&state=never-issued",
        "?error=access_denied",
        "?code=abc",
    ] {
        let resp = h.get(&format!("/auth/google/callback{}", query), None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", query);
        assert_eq!(resp.headers()[LOCATION].to_str().unwrap(), error_target);
    }
}

#[tokio::test]
async fn sign_in_then_logout() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;

    let status: Value = h.get("/auth/status", Some(&cookie)).await.json().await.unwrap();
    assert_eq!(status["authenticated"], true);

    // Another client is unaffected
    let other: Value = h.get("/auth/status", None).await.json().await.unwrap();
    assert_eq!(other["authenticated"], false);

    let resp = h.post("/auth/logout", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)), "{}", cleared);
    assert!(cleared.contains("Max-Age=0"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    assert_eq!(
        h.get("/api/drafts", Some(&cookie)).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn missing_review_label_is_not_an_error() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    h.mount_labels(json!([{ "id": "INBOX", "name": "INBOX" }])).await;

    let resp = h.get("/api/drafts", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["drafts"], json!([]));
    assert_eq!(
        body["message"],
        "No \"Review\" label found. Please create a label named \"Review\" in Gmail."
    );
}

#[tokio::test]
async fn lists_only_review_drafts() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    h.mount_labels(json!([{ "id": "Label_1", "name": "Review" }])).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/drafts", GMAIL)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "drafts": [{ "id": "r-1" }, { "id": "r-2" }]
        })))
        .mount(&h.google)
        .await;
    for (id, mid, labels) in [("r-1", "m-1", vec!["Label_1"]), ("r-2", "m-2", vec!["DRAFT"])] {
        Mock::given(method("GET"))
            .and(path(format!("{}/drafts/{}", GMAIL, id)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(draft_json(id, mid, &labels, "Hi")),
            )
            .mount(&h.google)
            .await;
    }

    let body: Value = h.get("/api/drafts", Some(&cookie)).await.json().await.unwrap();
    assert!(body.get("message").is_none());
    assert_eq!(
        body["drafts"],
        json!([{
            "id": "r-1",
            "messageId": "m-1",
            "to": "a@b.com",
            "from": "",
            "subject": "Hi",
            "body": "Hello there",
            "snippet": "snippet",
            "date": ""
        }])
    );
}

#[tokio::test]
async fn provider_failure_hides_details() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/labels", GMAIL)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Insufficient Permission" }
        })))
        .mount(&h.google)
        .await;

    let resp = h.get("/api/drafts", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Failed to fetch drafts" }));
}

#[tokio::test]
async fn send_calls_drafts_send_only() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/drafts/send", GMAIL)))
        .and(body_json(json!({ "id": "r-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m-1", "threadId": "t-1", "labelIds": ["SENT"]
        })))
        .expect(1)
        .mount(&h.google)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/messages/m-1/modify", GMAIL)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.google)
        .await;

    let resp = h.post("/api/drafts/r-1/send", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "message": "Email sent successfully!" })
    );
}

#[tokio::test]
async fn send_failure_is_reported() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/drafts/send", GMAIL)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid To header" }
        })))
        .mount(&h.google)
        .await;

    let resp = h.post("/api/drafts/r-1/send", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Failed to send draft" }));
}

#[tokio::test]
async fn flag_moves_message_from_review_to_flagged() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    h.mount_labels(json!([
        { "id": "Label_1", "name": "Review" },
        { "id": "Label_2", "name": "Flagged" }
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/messages/m-1/modify", GMAIL)))
        .and(body_json(json!({
            "addLabelIds": ["Label_2", "STARRED"],
            "removeLabelIds": ["Label_1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m-1" })))
        .expect(1)
        .mount(&h.google)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/drafts/send", GMAIL)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.google)
        .await;

    let resp = h
        .post(
            "/api/drafts/r-1/flag",
            Some(&cookie),
            Some(json!({ "messageId": "m-1", "reviewLabelId": "Label_1" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "message": "Draft flagged for your review!" })
    );
}

#[tokio::test]
async fn flag_without_body_resolves_message() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    h.mount_labels(json!([
        { "id": "Label_1", "name": "review" },
        { "id": "Label_2", "name": "FLAGGED" }
    ]))
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/drafts/r-4", GMAIL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(draft_json("r-4", "m-4", &["Label_1"], "x")),
        )
        .mount(&h.google)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/messages/m-4/modify", GMAIL)))
        .and(body_json(json!({
            "addLabelIds": ["Label_2", "STARRED"],
            "removeLabelIds": ["Label_1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m-4" })))
        .expect(1)
        .mount(&h.google)
        .await;

    let resp = h.post("/api/drafts/r-4/flag", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn flag_failure_is_reported() {
    let h = Harness::start().await;
    let cookie = h.sign_in().await;
    h.mount_labels(json!([{ "id": "Label_2", "name": "Flagged" }])).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/messages/m-1/modify", GMAIL)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found." }
        })))
        .mount(&h.google)
        .await;

    let resp = h
        .post(
            "/api/drafts/r-1/flag",
            Some(&cookie),
            Some(json!({ "messageId": "m-1" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Failed to flag draft" }));
}
