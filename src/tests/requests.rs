// src/tests/requests.rs
use super::*;

#[tokio::test]
async fn eleventh_request_in_window_is_throttled() {
    let mut config = Config::for_tests();
    config.throttle_max_requests = 10;
    let app = TestApp::with_config(config).await;
    let (_, token) = app.seed("busy", Role::Student).await;

    for _ in 0..10 {
        let (status, _) = app.send(Method::GET, "/api/schedule", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app.send(Method::GET, "/api/schedule", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert!(body["retryAfter"].as_u64().unwrap() > 0);

    // Limits are per account
    let (_, other) = app.seed("calm", Role::Student).await;
    let (status, _) = app.send(Method::GET, "/api/schedule", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn complaints_are_private_to_their_author() {
    let app = TestApp::new().await;
    let (_, alice) = app.seed("alice", Role::Student).await;
    let (_, bob) = app.seed("bob", Role::Student).await;
    let (_, warden) = app.seed("warden", Role::Faculty).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/mess/complaint",
            Some(&alice),
            Some(json!({ "title": "Cold food", "description": "Dinner was served cold", "type": "food_quality" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["complaint"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/mess/complaints/{id}");

    let (status, _) = app.send(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCESS_DENIED");
    let (status, _) = app.send(Method::GET, "/api/mess/complaints/missing", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Students cannot resolve; staff can, once
    let resolve = format!("{uri}/resolve");
    let answer = json!({ "response": "Heaters fixed" });
    let (status, _) = app.send(Method::PUT, &resolve, Some(&alice), Some(answer.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.send(Method::PUT, &resolve, Some(&warden), Some(answer.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["complaint"]["status"], "resolved");
    let (status, body) = app.send(Method::PUT, &resolve, Some(&warden), Some(answer)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "COMPLAINT_ALREADY_RESOLVED");
}

#[tokio::test]
async fn schedule_class_rejects_bad_times() {
    let app = TestApp::new().await;
    let (_, token) = app.seed("s1", Role::Student).await;
    let class = |start: &str, end: &str| {
        json!({
            "subject": "Operating Systems",
            "subjectCode": "CS301",
            "instructorName": "Dr. Rao",
            "dayOfWeek": 1,
            "startTime": start,
            "endTime": end,
            "semester": "5",
            "academicYear": "2026-27"
        })
    };

    let (status, body) = app.send(Method::POST, "/api/schedule/class", Some(&token), Some(class("11:00", "10:00"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.send(Method::POST, "/api/schedule/class", Some(&token), Some(class("09:00", "10:30"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, body) = app.send(Method::GET, "/api/schedule", Some(&token), None).await;
    assert_eq!(body["schedule"]["classes"][0]["duration"], 90);
}

#[tokio::test]
async fn resume_starts_blank_and_keeps_updates() {
    let app = TestApp::new().await;
    let (_, token) = app.seed("s1", Role::Student).await;

    let (status, body) = app.send(Method::GET, "/api/resume", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resume"]["user"], "s1");

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/resume",
            Some(&token),
            Some(json!({ "personalInfo": { "fullName": "Test s1" }, "skills": ["Rust"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.send(Method::GET, "/api/resume", Some(&token), None).await;
    assert_eq!(body["resume"]["personalInfo"]["fullName"], "Test s1");
}

#[tokio::test]
async fn concurrent_first_schedule_reads_both_succeed() {
    let app = TestApp::new().await;
    let (_, token) = app.seed("s1", Role::Student).await;

    let (first, second) = tokio::join!(
        app.send(Method::GET, "/api/schedule", Some(&token), None),
        app.send(Method::GET, "/api/schedule", Some(&token), None),
    );
    assert_eq!(first.0, StatusCode::OK, "{}", first.1);
    assert_eq!(second.0, StatusCode::OK, "{}", second.1);
    assert_eq!(first.1["schedule"]["id"], second.1["schedule"]["id"]);
}

#[tokio::test]
async fn absurd_page_numbers_return_an_empty_page() {
    let app = TestApp::new().await;
    let (_, token) = app.seed("boss", Role::ClubAdmin).await;
    app.create_club(&token, "Robotics", false).await;

    let (status, body) = app
        .send(Method::GET, "/api/clubs?page=18446744073709551615&limit=50", None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["clubs"].as_array().unwrap().is_empty());
}
