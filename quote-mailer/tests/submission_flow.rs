//! End-to-end submission scenarios against the real router.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use common::{client, spawn_app, spawn_state, RecordingMailer};
use hdconnect::guard::{RateLimitRecord, RateLimitStore};
use hdconnect::{AppState, Config};

const SITE: &str = "https://hdconnect.fr";

async fn setup() -> (String, Arc<RecordingMailer>) {
    setup_with(Config::default(), RecordingMailer::default()).await
}

async fn setup_with(config: Config, mailer: RecordingMailer) -> (String, Arc<RecordingMailer>) {
    let mailer = Arc::new(mailer);
    let addr = spawn_app(config, mailer.clone()).await;
    (format!("http://{}/", addr), mailer)
}

fn post(client: &Client, url: &str, ip: &str, body: &Value) -> reqwest::RequestBuilder {
    client
        .post(url)
        .header("origin", SITE)
        .header("x-forwarded-for", ip)
        .json(body)
}

#[tokio::test]
async fn test_quote_submission_is_sent() {
    let (url, mailer) = setup().await;
    let client = client();

    let response = post(
        &client,
        &url,
        "203.0.113.1",
        &json!({
            "requestType": "quote",
            "selectedService": "Alarme",
            "clientInfo": {"name": "Jean Dupont", "email": "jean@example.com", "phone": "0612345678"}
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "success", "message": "Email envoyé avec succès"}));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.subject, "[HD Connect - Demande] Devis: Alarme");
    assert_eq!(email.from, "onboarding@resend.dev");
    assert_eq!(email.to, vec!["kamal@hdconnect.fr".to_string()]);
    assert_eq!(email.reply_to.as_deref(), Some("jean@example.com"));
    assert!(email.text.contains("Service: Alarme\n"));
    assert!(email.text.contains("Nom: Jean Dupont\n"));
    assert!(email.text.contains("Email: jean@example.com\n"));
    assert!(email.text.contains("IP Client: 203.0.113.1\n"));
    assert!(email.text.contains("Origine: https://hdconnect.fr\n"));
}

#[tokio::test]
async fn test_invalid_email_is_rejected_without_delivery() {
    let (url, mailer) = setup().await;

    let response = post(&client(), &url, "203.0.113.2", &json!({"email": "bad-email"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Format d'email invalide"}));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_invalid_phone_is_rejected() {
    let (url, mailer) = setup().await;

    let response = post(&client(), &url, "203.0.113.3", &json!({"phone": "call me"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Format de téléphone invalide");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_sixth_request_is_rate_limited() {
    let (url, mailer) = setup().await;
    let client = client();
    let body = json!({"name": "Jean"});

    for expected in ["4", "3", "2", "1", "0"] {
        let response = post(&client, &url, "198.51.100.9", &body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-remaining"], expected);
    }

    let response = post(&client, &url, "198.51.100.9", &body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "3600");
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["message"], "Trop de demandes. Veuillez réessayer plus tard.");

    // Another client is unaffected.
    let response = post(&client, &url, "198.51.100.10", &body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(mailer.sent().len(), 6);
}

#[tokio::test]
async fn test_identical_submissions_are_not_deduplicated() {
    let (url, mailer) = setup().await;
    let client = client();
    let body = json!({"name": "Jean", "message": "Bonjour"});

    for _ in 0..2 {
        let response = post(&client, &url, "198.51.100.20", &body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_oversized_content_length_is_rejected() {
    let (url, mailer) = setup().await;
    let padding = "x".repeat(60 * 1024);

    let response = post(&client(), &url, "203.0.113.4", &json!({"message": padding}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Requête trop volumineuse");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_invalid_json_is_generic_failure() {
    let (url, mailer) = setup().await;

    let response = client()
        .post(&url)
        .header("x-forwarded-for", "203.0.113.5")
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Unknown origin falls back to the default allowed origin.
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"status": "error", "message": "Erreur lors de l'envoi de l'email. Veuillez réessayer."})
    );
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_provider_failure_is_generic_failure() {
    let (url, _mailer) = setup_with(Config::default(), RecordingMailer::failing(503)).await;

    let response = post(&client(), &url, "203.0.113.6", &json!({"name": "Jean"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.text().await.unwrap().parse().unwrap();
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().contains("provider down"));
}

#[tokio::test]
async fn test_preflight_returns_cors_headers_only() {
    let (url, mailer) = setup().await;

    let response = client()
        .request(reqwest::Method::OPTIONS, &url)
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
    assert!(response.text().await.unwrap().is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let (url, _mailer) = setup().await;

    let response = client()
        .get(&url)
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Method Not Allowed"}));
}

#[tokio::test]
async fn test_markup_never_reaches_email_unescaped() {
    let (url, mailer) = setup().await;

    let response = post(
        &client(),
        &url,
        "203.0.113.7",
        &json!({
            "name": "<b>Jean</b> & \"Marie\"",
            "message": "<script>alert(1)</script> javascript:alert(1) <img onClick=x>"
        }),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = &mailer.sent()[0].text;
    assert!(text.contains("Nom: bJean/b &amp; &quot;Marie&quot;\n"));
    assert!(!text.contains('<'));
    assert!(!text.contains('>'));
    assert!(!text.contains("javascript:"));
    assert!(!text.to_lowercase().contains("onclick="));
}

#[tokio::test]
async fn test_health() {
    let (url, _mailer) = setup().await;

    let response = client().get(format!("{url}health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_health_path_other_methods_use_submission_endpoint() {
    let (url, mailer) = setup().await;
    let client = client();

    let response = client
        .post(format!("{url}health"))
        .header("origin", SITE)
        .json(&json!({"name": "Jean"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);

    let response = client
        .put(format!("{url}health"))
        .header("origin", SITE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Method Not Allowed"}));

    let response = client
        .request(reqwest::Method::OPTIONS, format!("{url}health"))
        .header("origin", SITE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], SITE);
    assert!(response.headers().contains_key("access-control-allow-headers"));
    assert!(response.text().await.unwrap().is_empty());

    assert_eq!(mailer.sent().len(), 1);
}

/// Store that counts accesses, standing in for a shared external store.
#[derive(Default)]
struct CountingStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl RateLimitStore for CountingStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().get(key).copied()
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().insert(key.to_string(), record);
    }
}

#[tokio::test]
async fn test_injected_rate_limit_store_is_used() {
    let store = Arc::new(CountingStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::with_store(Config::default(), mailer.clone(), store.clone());
    let url = format!("http://{}/", spawn_state(state).await);
    let client = client();

    let response = post(&client, &url, "192.0.2.44", &json!({"name": "Jean"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    assert_eq!(store.sets.load(Ordering::SeqCst), 1);
    assert_eq!(store.records.lock().unwrap()["192.0.2.44"].count, 1);

    let response = post(&client, &url, "192.0.2.44", &json!({"name": "Jean"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-ratelimit-remaining"], "3");
    assert_eq!(store.records.lock().unwrap()["192.0.2.44"].count, 2);
    assert_eq!(mailer.sent().len(), 2);
}
