mod requests;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::{net::SocketAddr, time::Duration};
use tower::ServiceExt;

use crate::{
    config::Config,
    db::test_store,
    models::account::{sample_account, Account, Role},
    services::auth_service,
    state::AppState,
    web::routes::create_router,
};

pub const DEFAULT_PEER: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::for_tests()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let state = AppState::new(test_store().await, config);
        Self { router: create_router(state.clone()), state }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send_from(DEFAULT_PEER, method, uri, token, body).await
    }

    /// Like `send`, as seen from a given client address.
    pub async fn send_from(
        &self,
        peer: ([u8; 4], u16),
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).unwrap();
        request.extensions_mut().insert(ConnectInfo(SocketAddr::from(peer)));

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub fn token_for(&self, account_id: &str) -> String {
        auth_service::issue_token(account_id, &self.state.config.jwt_secret, Duration::from_secs(3600)).unwrap()
    }

    /// Stores an account directly and returns a token for it.
    pub async fn seed(&self, id: &str, role: Role) -> (Account, String) {
        let account = sample_account(id, role);
        self.state.store.create(&account).await.unwrap();
        (account, self.token_for(id))
    }

    /// Registers a student through the API. Returns `(account id, token)`.
    pub async fn register_student(&self, email: &str, student_id: &str) -> (String, String) {
        let (status, body) = self
            .send(Method::POST, "/api/auth/register", None, Some(student_payload(email, student_id)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Creates a club owned by `token`'s account. Returns the club id.
    pub async fn create_club(&self, token: &str, name: &str, require_approval: bool) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/clubs",
                Some(token),
                Some(json!({
                    "name": name,
                    "description": "A club for people who like building things",
                    "category": "technical",
                    "settings": {
                        "isPublic": true,
                        "allowJoinRequests": true,
                        "requireApproval": require_approval,
                        "maxMembers": 500,
                        "minMembers": 5
                    }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["club"]["id"].as_str().unwrap().to_string()
    }
}

pub fn student_payload(email: &str, student_id: &str) -> Value {
    json!({
        "email": email,
        "password": "Secret123",
        "firstName": "Asha",
        "lastName": "Verma",
        "role": "student",
        "studentId": student_id,
        "department": "CSE",
        "year": 2
    })
}
