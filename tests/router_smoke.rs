use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use hiring_search::{app::build_app, config::AppConfig, state::AppState};

fn app() -> Router {
    build_app(AppState::in_memory(AppConfig::in_memory("smoke-secret")))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn signup(app: &Router, body: Value) -> String {
    let (status, json) = call(app, Method::POST, "/api/v1/auth/signup", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_auth_required() {
    let app = app();
    let res = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, json) = call(&app, Method::GET, "/api/v1/hr/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn signup_search_and_role_checks() {
    let app = app();
    let student = signup(
        &app,
        json!({ "name": "Ada Lovelace", "email": "ada@example.com", "password": "secret1", "role": "student" }),
    )
    .await;

    let (status, json) = call(
        &app,
        Method::PUT,
        "/api/v1/student/skills",
        Some(&student),
        Some(json!({ "skills": ["Python", " SQL ", "python"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["profile"]["skills"], json!(["Python", "SQL"]));
    assert_eq!(json["profileCompleted"], false);

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "name": "Ada", "email": "ADA@example.com", "password": "secret1", "role": "hr", "companyName": "Corp" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "User with this email already exists");

    let hr = signup(
        &app,
        json!({ "name": "Rita", "email": "rita@corp.io", "password": "secret1", "role": "recruiter", "companyName": "Corp" }),
    )
    .await;

    let (status, json) = call(&app, Method::GET, "/api/v1/hr/students?skills=python", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalCandidates"], 1);
    assert_eq!(json["currentPage"], 1);
    assert_eq!(json["hasNextPage"], false);
    assert_eq!(json["filters"]["skills"], "python");
    assert!(json["candidates"][0].get("passwordHash").is_none());

    let (_, json) = call(&app, Method::GET, "/api/v1/hr/students?experienceMin=3&limit=abc", Some(&hr), None).await;
    assert_eq!(json["totalCandidates"], 0);
    assert_eq!(json["candidates"], json!([]));

    let (status, _) = call(&app, Method::GET, "/api/v1/hr/students", Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = call(&app, Method::GET, "/api/v1/hr/statistics", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["statistics"]["totalStudents"], 1);
    assert_eq!(json["statistics"]["skillsStats"][0], json!({ "id": "Python", "count": 1 }));
    assert_eq!(json["statistics"]["experienceStats"], json!([{ "id": "0-1", "count": 1 }]));

    let (_, json) = call(&app, Method::GET, "/api/v1/hr/suggestions?type=skills", Some(&hr), None).await;
    assert_eq!(json["suggestions"], json!(["Python", "SQL"]));
}

#[tokio::test]
async fn statistics_on_empty_set() {
    let app = app();
    let hr = signup(
        &app,
        json!({ "name": "Rita", "email": "rita@corp.io", "password": "secret1", "role": "hr", "companyName": "Corp" }),
    )
    .await;
    let (status, json) = call(&app, Method::GET, "/api/v1/hr/statistics", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["statistics"],
        json!({
            "totalStudents": 0,
            "recentRegistrations": 0,
            "availabilityStats": [],
            "degreeStats": [],
            "experienceStats": [],
            "skillsStats": []
        })
    );
}

#[tokio::test]
async fn login_and_me() {
    let app = app();
    signup(
        &app,
        json!({ "name": "Rita", "email": "rita@corp.io", "password": "secret1", "role": "hr", "companyName": "Corp" }),
    )
    .await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "rita@corp.io", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid email or password");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "Rita@Corp.io", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["access_token"].as_str().unwrap().to_string();
    let refresh = json["refresh_token"].as_str().unwrap().to_string();

    let (status, json) = call(&app, Method::GET, "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["role"], "recruiter");
    assert_eq!(json["user"]["companyName"], "Corp");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resume_upload_and_recruiter_download() {
    let app = app();
    let student = signup(
        &app,
        json!({ "name": "Ada", "email": "ada@example.com", "password": "secret1", "role": "candidate" }),
    )
    .await;
    let hr = signup(
        &app,
        json!({ "name": "Rita", "email": "rita@corp.io", "password": "secret1", "role": "hr", "companyName": "Corp" }),
    )
    .await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"cv.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.7 test\r\n--{boundary}--\r\n"
    );
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/student/resume")
        .header(header::AUTHORIZATION, format!("Bearer {student}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let (_, me) = call(&app, Method::GET, "/api/v1/me", Some(&student), None).await;
    let id = me["user"]["id"].as_str().unwrap().to_string();

    let req = Request::builder()
        .uri(format!("/api/v1/candidates/{id}/resume"))
        .header(header::AUTHORIZATION, format!("Bearer {hr}"))
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"cv.pdf\""
    );
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"%PDF-1.7 test");

    let (status, json) = call(&app, Method::GET, &format!("/api/v1/hr/students/{id}"), Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student"]["resume"]["fileName"], "cv.pdf");
}

#[tokio::test]
async fn repeated_query_keys_use_first_value() {
    let app = app();
    let student = signup(
        &app,
        json!({ "name": "Ada Lovelace", "email": "ada@example.com", "password": "secret1", "role": "student" }),
    )
    .await;
    call(&app, Method::PUT, "/api/v1/student/skills", Some(&student), Some(json!({ "skills": ["Go"] }))).await;
    let hr = signup(
        &app,
        json!({ "name": "Rita", "email": "rita@corp.io", "password": "secret1", "role": "hr", "companyName": "Corp" }),
    )
    .await;

    let (status, json) = call(&app, Method::GET, "/api/v1/hr/students?skills=go&skills=rust", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["totalCandidates"], 1);
    assert_eq!(json["filters"]["skills"], "go");

    let (status, json) = call(&app, Method::GET, "/api/v1/hr/students?skills=rust&skills=go", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalCandidates"], 0);
}
