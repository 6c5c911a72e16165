use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sparkhub::Config;
use tower::ServiceExt;

struct Api {
    app: Router,
}

impl Api {
    fn new() -> Self { Self::with(Config::testing()) }

    fn with(config: Config) -> Self {
        Self {
            app: sparkhub::in_memory(&config),
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = match bytes.is_empty() {
            true => Value::Null,
            false => serde_json::from_slice(&bytes).unwrap(),
        };

        (status, json)
    }

    async fn register(&self, name: &str, role: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": format!("{}@university.edu", name.to_lowercase()),
                    "password": "password123",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn submit(&self, token: &str, privacy: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/ideas",
                Some(token),
                Some(json!({
                    "title": "EcoTrack",
                    "problem": "People do not know their carbon footprint.",
                    "solution": "An app that tracks it automatically.",
                    "secretSauce": "Gamification.",
                    "targetAudience": "Students",
                    "category": "Sustainability",
                    "privacyLevel": privacy,
                    "tags": [" Green ", "AI"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["data"]["idea"]["id"].as_str().unwrap().to_string()
    }

    async fn comment(&self, token: &str, idea: &str, parent: Option<&str>) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            &format!("/api/ideas/{}/comments", idea),
            Some(token),
            Some(json!({ "content": "Looks promising!", "parentComment": parent })),
        )
        .await
    }
}

#[tokio::test]
async fn health_and_info() {
    let api = Api::new();

    let (status, body) = api.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SparkHub API is running!");
    assert_eq!(body["environment"], "test");

    let (status, body) = api.call(Method::GET, "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tagline"], "From Classroom Concept to Real-World Creation");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let api = Api::new();

    let (status, body) = api.call(Method::GET, "/api/nothing-here", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not found - /api/nothing-here");
}

#[tokio::test]
async fn security_headers_are_set() {
    let api = Api::new();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let res = api.app.clone().oneshot(req).await.unwrap();

    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert_eq!(res.headers()["referrer-policy"], "strict-origin-when-cross-origin");
}

#[tokio::test]
async fn passwords_never_leave_the_server() {
    let api = Api::new();
    let body = json!({
        "name": "Alice",
        "email": "Alice@University.edu",
        "password": "password123",
    });

    let (status, registered) = api
        .call(Method::POST, "/api/auth/register", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["data"]["user"]["email"], "alice@university.edu");
    assert_eq!(registered["data"]["user"]["role"], "student");
    assert!(registered["data"]["user"].get("password").is_none());
    assert!(registered["data"]["user"].get("passwordHash").is_none());

    let (status, logged_in) = api
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@university.edu", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["message"], "Login successful");
    assert!(logged_in["data"]["user"].get("passwordHash").is_none());

    let token = logged_in["data"]["token"].as_str().unwrap();
    let (status, me) = api.call(Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(me["data"]["user"].get("passwordHash").is_none());

    let (status, dup) = api
        .call(Method::POST, "/api/auth/register", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(dup["message"], "User already exists with this email");
}

#[tokio::test]
async fn bad_credentials_and_tokens() {
    let api = Api::new();
    api.register("Bob", "student").await;

    let (status, body) = api
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "bob@university.edu", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = api.call(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied. No token provided.");

    let (status, body) = api
        .call(Method::GET, "/api/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn validation_errors_are_listed() {
    let api = Api::new();

    let (status, body) = api
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert!(body["errors"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn only_students_submit_ideas() {
    let api = Api::new();
    let teacher = api.register("Robert", "teacher").await;

    let (status, body) = api
        .call(Method::POST, "/api/ideas", Some(&teacher), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn private_ideas_stay_private() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let stranger = api.register("Jane", "student").await;
    let teacher = api.register("Robert", "teacher").await;
    let idea = api.submit(&owner, "private").await;
    let path = format!("/api/ideas/{}", idea);

    let (status, _) = api.call(Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = api.call(Method::GET, &path, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api.call(Method::GET, &path, Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["idea"]["tags"], json!(["green", "ai"]));

    let (status, _) = api.call(Method::GET, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = api.call(Method::GET, "/api/ideas", None, None).await;
    assert_eq!(listing["data"]["pagination"]["total"], 0);

    let (_, listing) = api.call(Method::GET, "/api/ideas", Some(&owner), None).await;
    assert_eq!(listing["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let api = Api::new();

    let (status, body) = api.call(Method::GET, "/api/ideas/12345", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found");
}

#[tokio::test]
async fn upvote_toggles() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let fan = api.register("Jane", "student").await;
    let idea = api.submit(&owner, "public").await;
    let path = format!("/api/ideas/{}/upvote", idea);

    let (status, body) = api.call(Method::POST, &path, Some(&fan), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Idea upvoted");
    assert_eq!(body["data"]["upvoteCount"], 1);

    let (_, body) = api
        .call(Method::GET, &format!("/api/ideas/{}", idea), Some(&fan), None)
        .await;
    assert_eq!(body["data"]["userSpecificData"]["hasUpvoted"], true);

    let (_, body) = api.call(Method::POST, &path, Some(&fan), None).await;
    assert_eq!(body["message"], "Upvote removed");
    assert_eq!(body["data"]["upvoteCount"], 0);

    let (status, _) = api.call(Method::POST, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_comments_leave_the_listing() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let idea = api.submit(&owner, "public").await;

    let (_, first) = api.comment(&owner, &idea, None).await;
    let (status, _) = api.comment(&owner, &idea, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = first["data"]["comment"]["id"].as_str().unwrap();
    let (status, body) = api
        .call(Method::DELETE, &format!("/api/comments/{}", id), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted successfully");

    let (status, body) = api
        .call(
            Method::GET,
            &format!("/api/ideas/{}/comments", idea),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["data"]["comments"][0]["userSpecificData"]["canEdit"],
        true
    );
}

#[tokio::test]
async fn replies_must_share_the_idea() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let here = api.submit(&owner, "public").await;
    let there = api.submit(&owner, "public").await;

    let (_, parent) = api.comment(&owner, &there, None).await;
    let parent_id = parent["data"]["comment"]["id"].as_str().unwrap();

    let (status, body) = api.comment(&owner, &here, Some(parent_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Parent comment does not belong to this idea");

    let (status, _) = api.comment(&owner, &there, Some(parent_id)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = api
        .call(
            Method::GET,
            &format!("/api/comments/{}/replies", parent_id),
            None,
            None,
        )
        .await;
    assert_eq!(body["data"]["replies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn requests_are_rate_limited() {
    let api = Api::with(Config {
        rate_limit_max: 2,
        ..Config::testing()
    });

    for _ in 0..2 {
        let (status, _) = api.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = api.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["message"], "Too many requests, please try again later");
}

#[tokio::test]
async fn people_and_counts_are_shown() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let teacher = api.register("Robert", "teacher").await;
    let idea = api.submit(&owner, "public").await;

    let (_, top) = api.comment(&owner, &idea, None).await;
    let top_id = top["data"]["comment"]["id"].as_str().unwrap();
    assert_eq!(top["data"]["comment"]["author"]["name"], "John");
    let (status, _) = api.comment(&teacher, &idea, Some(top_id)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = api
        .call(Method::GET, &format!("/api/ideas/{}", idea), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let shown = &body["data"]["idea"];
    assert_eq!(shown["commentCount"], 2);
    assert_eq!(shown["creator"]["name"], "John");
    assert_eq!(shown["creator"]["role"], "student");
    assert!(shown["creator"].get("email").is_none());
    assert_eq!(shown["assignedMentor"], Value::Null);

    let (_, body) = api.call(Method::GET, "/api/ideas", None, None).await;
    assert_eq!(body["data"]["ideas"][0]["commentCount"], 2);

    let (status, body) = api
        .call(
            Method::GET,
            &format!("/api/ideas/{}/comments?includeReplies=false", idea),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["replyCount"], 1);
    assert_eq!(comments[0]["author"]["name"], "John");

    let (_, body) = api
        .call(Method::GET, &format!("/api/comments/{}/replies", top_id), None, None)
        .await;
    assert_eq!(body["data"]["replies"][0]["author"]["role"], "teacher");
    assert_eq!(body["data"]["replies"][0]["replyCount"], 0);
}

#[tokio::test]
async fn ideas_are_edited_and_reviewed() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let other = api.register("Jane", "student").await;
    let teacher = api.register("Robert", "teacher").await;
    let idea = api.submit(&owner, "public").await;
    let path = format!("/api/ideas/{}", idea);

    let (status, _) = api
        .call(Method::PUT, &path, Some(&other), Some(json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api
        .call(Method::PUT, &path, Some(&owner), Some(json!({ "category": "Cooking" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Invalid category"]));

    let (status, body) = api
        .call(Method::PUT, &path, Some(&owner), Some(json!({ "title": "EcoTrack Pro" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["idea"]["title"], "EcoTrack Pro");
    assert_eq!(body["data"]["idea"]["category"], "Sustainability");
    assert_eq!(body["data"]["idea"]["tags"], json!(["green", "ai"]));

    let review = json!({ "status": "Under Review", "reviewNotes": "Looks solid." });
    let (status, _) = api
        .call(Method::PUT, &format!("{}/review", path), Some(&owner), Some(review.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api
        .call(Method::PUT, &format!("{}/review", path), Some(&teacher), Some(review))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["idea"]["status"], "Under Review");
    assert!(body["data"]["idea"]["reviewedBy"].is_string());
    assert!(body["data"]["idea"]["reviewedAt"].is_string());
}

#[tokio::test]
async fn comments_and_profiles_are_edited() {
    let api = Api::new();
    let owner = api.register("John", "student").await;
    let idea = api.submit(&owner, "public").await;

    let (_, live) = api.comment(&owner, &idea, None).await;
    let (_, gone) = api.comment(&owner, &idea, None).await;
    let live = format!("/api/comments/{}", live["data"]["comment"]["id"].as_str().unwrap());
    let gone = format!("/api/comments/{}", gone["data"]["comment"]["id"].as_str().unwrap());
    api.call(Method::DELETE, &gone, Some(&owner), None).await;

    let rewrite = json!({ "content": "On second thought, ship it." });
    let (status, body) = api
        .call(Method::PUT, &gone, Some(&owner), Some(rewrite.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot edit deleted comment");

    let (status, body) = api.call(Method::PUT, &live, Some(&owner), Some(rewrite)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["comment"]["isEdited"], true);
    assert!(body["data"]["comment"]["editedAt"].is_string());

    let (status, body) = api
        .call(
            Method::PUT,
            "/api/auth/profile",
            Some(&owner),
            Some(json!({ "phone": "call me", "year": 9 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!(["Year must be between 1 and 6", "Please provide a valid phone number"])
    );
}
