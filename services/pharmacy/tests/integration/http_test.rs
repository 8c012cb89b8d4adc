use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};
use tower::ServiceExt;

use rxdesk_domain::user::UserRole;
use rxdesk_pharmacy::config::RateLimit;
use rxdesk_pharmacy::handlers::validation::MAX_BODY_BYTES;
use rxdesk_pharmacy::router::build_router;
use rxdesk_pharmacy::state::AppState;
use rxdesk_testing::auth::{MockAuth, test_token_keys};

use crate::helpers::test_db;

async fn server() -> TestServer {
    let state = AppState::new(test_db().await, test_token_keys());
    TestServer::new(build_router(
        state,
        &["http://localhost:3000".to_owned()],
        None,
    ))
    .unwrap()
}

fn admin() -> MockAuth {
    MockAuth::with_role(UserRole::Admin)
}

fn doctor_body(email: &str, license: &str) -> Value {
    json!({
        "email": email,
        "password": "secret123",
        "firstName": "Anita",
        "lastName": "Desai",
        "phone": "+91 98765 43210",
        "specialization": "Cardiology",
        "licenseNumber": license,
        "consultationFee": 800
    })
}

fn config_body(name: &str) -> Value {
    let day = json!({ "open": "09:00", "close": "21:00" });
    json!({
        "pharmacyName": name,
        "address": "12 Market Road, Pune",
        "phone": "+91 20 5555 0100",
        "email": "store@example.com",
        "licenseNumber": "LIC-00042",
        "registrationNumber": "REG-00042",
        "ownerName": "Asha Rao",
        "workingHours": {
            "monday": day, "tuesday": day, "wednesday": day, "thursday": day,
            "friday": day, "saturday": day,
            "sunday": { "open": "00:00", "close": "00:00", "closed": true }
        },
        "currency": "INR",
        "taxRate": 18
    })
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_login_and_read_profile() {
    let server = server().await;

    let registered = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "meera@example.com",
            "password": "secret123",
            "firstName": "Meera",
            "lastName": "Iyer"
        }))
        .await;
    assert_eq!(registered.status_code(), StatusCode::CREATED);
    let body: Value = registered.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["role"], "patient");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "meera@example.com", "password": "secret123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let body: Value = login.json();
    assert_eq!(body["message"], "Login successful");
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let profile = server
        .get("/api/v1/auth/profile")
        .add_header(AUTHORIZATION, format!("Bearer {token}").parse::<axum::http::HeaderValue>().unwrap())
        .await;
    assert_eq!(profile.status_code(), StatusCode::OK);
    let body: Value = profile.json();
    assert_eq!(body["message"], "Profile retrieved successfully");
    assert_eq!(body["data"]["email"], "meera@example.com");
    assert_eq!(body["data"]["firstName"], "Meera");
}

#[tokio::test]
async fn should_accept_single_letter_names_on_register() {
    let server = server().await;
    let credentials = json!({ "email": "a@x.com", "password": "secret1" });

    let registered = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "a@x.com",
            "password": "secret1",
            "firstName": "A",
            "lastName": "B",
            "role": "patient"
        }))
        .await;
    assert_eq!(registered.status_code(), StatusCode::CREATED);
    let body: Value = registered.json();
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["data"]["user"].get("password").is_none());

    let login = server.post("/api/v1/auth/login").json(&credentials).await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let token = login.json::<Value>()["data"]["token"]
        .as_str()
        .unwrap()
        .to_owned();
    assert!(test_token_keys().verify(&token).is_ok());
}

#[tokio::test]
async fn should_reject_wrong_password_with_generic_message() {
    let server = server().await;
    server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "a@example.com",
            "password": "secret123",
            "firstName": "Arun",
            "lastName": "Nair"
        }))
        .await;

    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "a@example.com", "password": "wrong-pass" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = login.json();
    assert_eq!(body["message"], "Login failed");
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn should_join_validation_messages() {
    let server = server().await;
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "123", "firstName": "Al", "lastName": "Bo" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["error"],
        "Please provide a valid email address, Password must be at least 6 characters long"
    );
}

#[tokio::test]
async fn should_refuse_self_registered_admin() {
    let server = server().await;
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "boss@example.com",
            "password": "secret123",
            "firstName": "Big",
            "lastName": "Boss",
            "role": "admin"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Validation failed");
}

#[tokio::test]
async fn should_require_token_for_profile() {
    let server = server().await;
    let response = server.get("/api/v1/auth/profile").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Access token is required");
    assert!(body.get("error").is_none());
}

// ── Admin guard ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_guard_admin_routes() {
    let server = server().await;

    let anonymous = server.get("/api/v1/admin/users/doctor").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = MockAuth::with_role(UserRole::Doctor).header();
    let doctor = server
        .get("/api/v1/admin/users/doctor")
        .add_header(name, value)
        .await;
    assert_eq!(doctor.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(doctor.json::<Value>()["message"], "Insufficient permissions");

    let forged = server
        .get("/api/v1/admin/users/doctor")
        .add_header(AUTHORIZATION, axum::http::HeaderValue::from_static("Bearer not.a.jwt"))
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(forged.json::<Value>()["message"], "Invalid or expired token");
}

// ── Provisioning ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_add_doctor_and_reject_duplicate_license() {
    let server = server().await;
    let (name, value) = admin().header();

    let created = server
        .post("/api/v1/admin/doctors")
        .add_header(name.clone(), value.clone())
        .json(&doctor_body("dr.a@example.com", "MD100"))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["message"], "Doctor added successfully");
    assert_eq!(body["data"]["role"], "doctor");
    assert_eq!(body["data"]["licenseNumber"], "MD100");
    assert_eq!(body["data"]["isAvailable"], true);

    let duplicate = server
        .post("/api/v1/admin/doctors")
        .add_header(name.clone(), value.clone())
        .json(&doctor_body("dr.b@example.com", "MD100"))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = duplicate.json();
    assert_eq!(body["message"], "Failed to add doctor");
    assert_eq!(body["error"], "Doctor with this license number already exists");

    let listed = server
        .get("/api/v1/admin/users/doctor")
        .add_header(name, value)
        .await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    let body: Value = listed.json();
    assert_eq!(body["message"], "doctors retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn should_validate_provisioning_bodies() {
    let server = server().await;
    let (name, value) = admin().header();

    let response = server
        .post("/api/v1/admin/partners")
        .add_header(name, value)
        .json(&json!({
            "email": "p@example.com",
            "password": "secret123",
            "firstName": "Pia",
            "lastName": "Roy",
            "profitSharePercentage": 0,
            "investmentAmount": 1000
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Profit share must be between 0.01% and 100%"
    );
}

#[tokio::test]
async fn should_cap_partner_shares_at_one_hundred_percent() {
    let server = server().await;
    let (name, value) = admin().header();
    let partner = |email: &str, share: f64| {
        json!({
            "email": email,
            "password": "secret123",
            "firstName": "Pia",
            "lastName": "Roy",
            "profitSharePercentage": share,
            "investmentAmount": 100000
        })
    };

    let first = server
        .post("/api/v1/admin/partners")
        .add_header(name.clone(), value.clone())
        .json(&partner("a@example.com", 60.0))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    assert_eq!(first.json::<Value>()["message"], "Partner added successfully");

    let over = server
        .post("/api/v1/admin/partners")
        .add_header(name.clone(), value.clone())
        .json(&partner("b@example.com", 45.0))
        .await;
    assert_eq!(over.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = over.json();
    assert_eq!(body["message"], "Failed to add partner");
    assert_eq!(
        body["error"],
        "Total profit share would exceed 100%. Current total: 60%"
    );

    let exact = server
        .post("/api/v1/admin/partners")
        .add_header(name, value)
        .json(&partner("c@example.com", 40.0))
        .await;
    assert_eq!(exact.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn should_add_employee_as_pharmacist() {
    let server = server().await;
    let (name, value) = admin().header();

    let created = server
        .post("/api/v1/admin/employees")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "email": "ravi@example.com",
            "password": "secret123",
            "firstName": "Ravi",
            "lastName": "Kumar",
            "employeeId": "EMP001",
            "department": "Dispensary",
            "salary": 32000
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["message"], "Employee added successfully");
    assert_eq!(body["data"]["role"], "pharmacist");
    assert_eq!(body["data"]["employeeId"], "EMP001");

    let listed = server
        .get("/api/v1/admin/users/pharmacist")
        .add_header(name, value)
        .await;
    assert_eq!(listed.json::<Value>()["message"], "pharmacists retrieved successfully");
}

// ── User management ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_unknown_role_in_listing() {
    let server = server().await;
    let (name, value) = admin().header();
    let response = server
        .get("/api/v1/admin/users/nurse")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Failed to retrieve users");
}

#[tokio::test]
async fn should_update_user_and_keep_other_fields() {
    let server = server().await;
    let (name, value) = admin().header();
    let created: Value = server
        .post("/api/v1/admin/doctors")
        .add_header(name.clone(), value.clone())
        .json(&doctor_body("dr.a@example.com", "MD100"))
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_owned();

    let updated = server
        .put(&format!("/api/v1/admin/users/{id}"))
        .add_header(name, value)
        .json(&json!({ "firstName": "Anjali" }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let body: Value = updated.json();
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["data"]["firstName"], "Anjali");
    assert_eq!(body["data"]["lastName"], "Desai");
    assert_eq!(body["data"]["specialization"], "Cardiology");
    assert_eq!(body["data"]["consultationFee"], 800.0);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_user() {
    let server = server().await;
    let (name, value) = admin().header();

    let update = server
        .put("/api/v1/admin/users/00000000-0000-0000-0000-000000000000")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "firstName": "Nobody" }))
        .await;
    assert_eq!(update.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(update.json::<Value>()["error"], "User not found");

    let activate = server
        .patch("/api/v1/admin/users/not-a-uuid/activate")
        .add_header(name, value)
        .await;
    assert_eq!(activate.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(activate.json::<Value>()["message"], "Failed to activate user");
}

#[tokio::test]
async fn should_block_login_after_deactivation() {
    let server = server().await;
    let (name, value) = admin().header();
    let created: Value = server
        .post("/api/v1/admin/doctors")
        .add_header(name.clone(), value.clone())
        .json(&doctor_body("dr.a@example.com", "MD100"))
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_owned();

    let deactivated = server
        .patch(&format!("/api/v1/admin/users/{id}/deactivate"))
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(deactivated.status_code(), StatusCode::OK);
    let body: Value = deactivated.json();
    assert_eq!(body["message"], "User deactivated successfully");
    assert!(body.get("data").is_none());

    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "dr.a@example.com", "password": "secret123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);

    server
        .patch(&format!("/api/v1/admin/users/{id}/activate"))
        .add_header(name, value)
        .await
        .assert_status_ok();
    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "dr.a@example.com", "password": "secret123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
}

// ── Pharmacy configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn should_save_and_read_pharmacy_config() {
    let server = server().await;
    let (name, value) = admin().header();

    let missing = server
        .get("/api/v1/admin/config/pharmacy")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["error"], "Pharmacy configuration not found");

    let created = server
        .post("/api/v1/admin/config/pharmacy")
        .add_header(name.clone(), value.clone())
        .json(&config_body("City Pharmacy"))
        .await;
    assert_eq!(created.status_code(), StatusCode::OK);
    assert_eq!(
        created.json::<Value>()["message"],
        "Pharmacy configuration updated successfully"
    );

    let updated = server
        .put("/api/v1/admin/config/pharmacy")
        .add_header(name.clone(), value.clone())
        .json(&config_body("Town Pharmacy"))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);

    let loaded = server
        .get("/api/v1/admin/config/pharmacy")
        .add_header(name, value)
        .await;
    let body: Value = loaded.json();
    assert_eq!(body["message"], "Pharmacy configuration retrieved successfully");
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["pharmacyName"], "Town Pharmacy");
    assert_eq!(body["data"]["workingHours"]["sunday"]["closed"], true);
    assert!(body["data"]["workingHours"]["monday"].get("closed").is_none());
}

#[tokio::test]
async fn should_reject_invalid_working_hours() {
    let server = server().await;
    let (name, value) = admin().header();
    let mut body = config_body("City Pharmacy");
    body["workingHours"]["friday"]["close"] = json!("25:00");

    let response = server
        .put("/api/v1/admin/config/pharmacy")
        .add_header(name, value)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Validation failed");
}

// ── System ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_serve_probes_banner_and_fallback() {
    let server = server().await;

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "OK");

    server.get("/readyz").await.assert_status_ok();

    let banner: Value = server.get("/api/v1").await.json();
    assert_eq!(banner["message"], "Pharmacy Management System API");

    let missing = server.get("/api/v1/nope").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["message"], "Route /api/v1/nope not found");
}

#[tokio::test]
async fn should_stamp_security_headers_on_every_response() {
    let server = server().await;

    for response in [
        server.get("/health").await,
        server.get("/api/v1/auth/profile").await,
        server.get("/api/v1/nope").await,
    ] {
        assert_eq!(response.header(X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(response.header(X_FRAME_OPTIONS), "SAMEORIGIN");
        assert_eq!(response.header("referrer-policy"), "no-referrer");
        assert!(response.maybe_header("content-security-policy").is_some());
    }
}

#[tokio::test]
async fn should_accept_bodies_up_to_ten_mebibytes() {
    let server = server().await;

    // Above axum's 2 MB default, so this reaches validation.
    let large = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "a".repeat(3 * 1024 * 1024) }))
        .await;
    assert_eq!(large.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(large.json::<Value>()["message"], "Validation failed");

    let too_large = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "a".repeat(MAX_BODY_BYTES + 1) }))
        .await;
    assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = too_large.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Request entity too large");
}

#[tokio::test]
async fn should_store_currency_code_uppercased() {
    let server = server().await;
    let (name, value) = admin().header();
    let mut body = config_body("City Pharmacy");
    body["currency"] = json!("inr");

    let response = server
        .post("/api/v1/admin/config/pharmacy")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["currency"], "INR");
}

// ── Rate limiting ────────────────────────────────────────────────────────────

fn from_peer(uri: &str, ip: [u8; 4]) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from((ip, 41_000))))
        .body(Body::empty())
        .unwrap()
}

async fn status_of(app: &Router, request: Request<Body>) -> StatusCode {
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn should_throttle_api_requests_per_client_address() {
    let state = AppState::new(test_db().await, test_token_keys());
    let limit = RateLimit {
        max_requests: 2,
        window: Duration::from_secs(900),
    };
    let app = build_router(state, &[], Some(limit));

    assert_eq!(status_of(&app, from_peer("/api/v1", [10, 0, 0, 1])).await, StatusCode::OK);
    assert_eq!(status_of(&app, from_peer("/api/v1", [10, 0, 0, 1])).await, StatusCode::OK);
    assert_eq!(
        status_of(&app, from_peer("/api/v1", [10, 0, 0, 1])).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Other clients and the probes keep working.
    assert_eq!(status_of(&app, from_peer("/api/v1", [10, 0, 0, 2])).await, StatusCode::OK);
    assert_eq!(status_of(&app, from_peer("/health", [10, 0, 0, 1])).await, StatusCode::OK);
}
