use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{Engine as _, engine::general_purpose};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

// The tests run against a live instance (cargo run) sharing the same
// SECRET_KEY, so they drive the real sealed protocol end to end.
static SECRET: Lazy<[u8; 32]> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    let key_hex = std::env::var("SECRET_KEY").expect("SECRET_KEY must be set for e2e tests");
    hex::decode(key_hex)
        .expect("SECRET_KEY must be valid hexadecimal")
        .try_into()
        .expect("SECRET_KEY must be 32 bytes")
});

fn seal(value: &Value) -> String {
    let cipher = Aes256Gcm::new((&*SECRET).into());
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(&Nonce::from(nonce), serde_json::to_vec(value).unwrap().as_slice())
        .unwrap();
    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    general_purpose::STANDARD.encode(sealed)
}

fn open(sealed: &str) -> Value {
    let bytes = general_purpose::STANDARD.decode(sealed).unwrap();
    let (nonce, ciphertext) = bytes.split_at(12);
    let cipher = Aes256Gcm::new((&*SECRET).into());
    let plaintext = cipher.decrypt(Nonce::from_slice(nonce), ciphertext).unwrap();
    serde_json::from_slice(&plaintext).unwrap()
}

// Shared test context
#[derive(Clone)]
struct TestContext {
    client: reqwest::Client,
    base_url: String,
}

impl TestContext {
    fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: std::env::var("E2E_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string()),
        }
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    /// Seals the payload, sends it, and opens the sealed response body.
    async fn send(&self, method: reqwest::Method, path: &str, payload: &Value) -> (u16, Value) {
        let response = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .json(&json!({ "body": seal(payload) }))
            .send()
            .await
            .unwrap();

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap();
        let opened = open(body["body"].as_str().expect("response body must be sealed"));
        (status, opened)
    }

    async fn create_schedule(&self, course: &str, unit: &str, date: &str, time: &str) -> (u16, Value) {
        self.send(
            reqwest::Method::POST,
            "/api/schedules",
            &json!({
                "courseCode": course,
                "unitCode": unit,
                "scheduledDate": date,
                "scheduledTime": time
            }),
        )
        .await
    }

    async fn issue_token(&self, course: &str, unit: &str, lecturer: &str, date: &str, time: &str) -> (u16, Value) {
        self.send(
            reqwest::Method::POST,
            "/api/qr",
            &json!({
                "courseCode": course,
                "unitCode": unit,
                "lecturer": lecturer,
                "date": date,
                "time": time
            }),
        )
        .await
    }

    async fn redeem(&self, token: &str, student: &str) -> (u16, Value) {
        self.send(
            reqwest::Method::PUT,
            "/api/qr",
            &json!({
                "rawSealedToken": token,
                "studentId": student
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "2024-05-01";
    const TIME: &str = "09:00";

    #[tokio::test]
    async fn test_issue_redeem_and_duplicate_student() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}a", timestamp);
        let unit = format!("cs{}a", timestamp);

        let (status, body) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 201, "Schedule creation failed");
        assert_eq!(body["message"], "Schedule added successfully");

        let (status, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        assert_eq!(status, 201, "Token issuance failed");
        assert_eq!(body["success"], true);
        let token = body["token"].as_str().expect("issued token").to_string();

        let (status, body) = context.redeem(&token, "s1").await;
        assert_eq!(status, 200, "First redemption failed");
        assert_eq!(body["message"], "Attendance Confirmed");

        // Same student again: exactly one ledger entry survives.
        let (status, body) = context.redeem(&token, "s1").await;
        assert_eq!(status, 409);
        assert_eq!(body["message"], "Attendance already marked");

        // Case-insensitive duplicate.
        let (status, body) = context.redeem(&token, "S1").await;
        assert_eq!(status, 409);
        assert_eq!(body["message"], "Attendance already marked");

        let (status, body) = context
            .send(reqwest::Method::PUT, "/api/schedules", &json!({ "courseCode": course }))
            .await;
        assert_eq!(status, 200);
        let schedules = body["schedules"].as_array().unwrap();
        assert_eq!(schedules.len(), 1);
        let attendance = schedules[0]["attendance"].as_array().unwrap();
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance[0]["student"], "s1");
    }

    #[tokio::test]
    async fn test_reissue_permanently_invalidates_prior_token() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}b", timestamp);
        let unit = format!("cs{}b", timestamp);

        let (status, _) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 201);

        let (_, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        let token_a = body["token"].as_str().unwrap().to_string();

        let (_, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        let token_b = body["token"].as_str().unwrap().to_string();
        assert_ne!(token_a, token_b);

        // The session is unchanged, but token A no longer resolves.
        let (status, body) = context.redeem(&token_a, "s2").await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Invalid QR Code");

        let (status, body) = context.redeem(&token_b, "s2").await;
        assert_eq!(status, 200);
        assert_eq!(body["message"], "Attendance Confirmed");
    }

    #[tokio::test]
    async fn test_garbage_and_missing_fields_rejected() {
        let context = TestContext::new();

        let (status, body) = context.redeem("garbage", "s3").await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Malformed encrypted payload");

        let (status, body) = context
            .send(
                reqwest::Method::POST,
                "/api/qr",
                &json!({
                    "courseCode": "course1",
                    "unitCode": "cs101",
                    "date": DATE,
                    "time": TIME
                }),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "lecturer is required");
    }

    #[tokio::test]
    async fn test_token_without_schedule_is_invalid_schedule() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}c", timestamp);
        let unit = format!("cs{}c", timestamp);

        // Issuance succeeds without a session; redemption hits the
        // Session Directory gate.
        let (status, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        assert_eq!(status, 201);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = context.redeem(&token, "s4").await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Invalid schedule");
    }

    #[tokio::test]
    async fn test_schedule_deletion_invalidates_outstanding_token() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}d", timestamp);
        let unit = format!("cs{}d", timestamp);

        let (status, _) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 201);

        let (_, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = context
            .send(
                reqwest::Method::DELETE,
                "/api/schedules",
                &json!({
                    "unitCode": unit,
                    "scheduledDate": DATE,
                    "scheduledTime": TIME
                }),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["message"], "Schedule removed successfully");

        // The unused token was revoked with its session.
        let (status, body) = context.redeem(&token, "s5").await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Invalid QR Code");
    }

    #[tokio::test]
    async fn test_duplicate_schedule_identity_rejected() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}e", timestamp);
        let unit = format!("cs{}e", timestamp);

        let (status, _) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 201);

        let (status, body) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 400);
        assert!(
            body["message"].as_str().unwrap().starts_with("Schedule already found"),
            "unexpected message: {}",
            body["message"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_distinct_students_all_recorded() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let course = format!("course{}f", timestamp);
        let unit = format!("cs{}f", timestamp);

        let (status, _) = context.create_schedule(&course, &unit, DATE, TIME).await;
        assert_eq!(status, 201);

        let (_, body) = context.issue_token(&course, &unit, "lec001", DATE, TIME).await;
        let token = body["token"].as_str().unwrap().to_string();

        let mut handles = Vec::new();
        for i in 0..5 {
            let context = context.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                context.redeem(&token, &format!("student{}", i)).await
            }));
        }

        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, 200, "concurrent redemption failed: {}", body["message"]);
        }

        let (status, body) = context
            .send(reqwest::Method::PUT, "/api/schedules", &json!({ "courseCode": course }))
            .await;
        assert_eq!(status, 200);
        let attendance = body["schedules"][0]["attendance"].as_array().unwrap();
        assert_eq!(attendance.len(), 5);
    }
}
