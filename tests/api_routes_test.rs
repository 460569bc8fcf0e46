// ABOUTME: HTTP-level integration tests over the full router with stubbed AI
// ABOUTME: Covers auth flows, normalization through the analyze route, and fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use dish_detective::config::ServerConfig;
use dish_detective::errors::AppError;
use dish_detective::external::VideoSearch;
use dish_detective::llm::{ChatRequest, ChatResponse, LlmProvider};
use dish_detective::models::Video;
use dish_detective::resources::ServerResources;
use dish_detective::server::build_router;
use dish_detective::storage::Storage;

// "foobar" in base64; good enough for a fake photo payload
const FAKE_IMAGE: &str = "Zm9vYmFy";

/// One scripted model reply
enum Reply {
    Text(&'static str),
    Error,
}

/// LLM stub that pops scripted replies in order
struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    fn next(&self) -> Result<ChatResponse, AppError> {
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or(Reply::Error);
        match reply {
            Reply::Text(text) => Ok(ChatResponse {
                content: text.to_owned(),
                model: "stub".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Reply::Error => Err(AppError::internal("scripted AI failure")),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }
    fn display_name(&self) -> &'static str {
        "Scripted stub"
    }
    fn default_model(&self) -> &str {
        "stub"
    }
    fn available_models(&self) -> &'static [&'static str] {
        &["stub"]
    }
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.next()
    }
    async fn complete_with_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _mime_type: &str,
    ) -> Result<ChatResponse, AppError> {
        self.next()
    }
    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Video search stub returning one fixed result
struct StubVideos;

#[async_trait]
impl VideoSearch for StubVideos {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<Video>, AppError> {
        Ok(vec![Video {
            video_id: "vid1".to_owned(),
            title: format!("How to make {query}"),
            channel_title: "TestChef".to_owned(),
            description: String::new(),
            published_at: "2026-01-01T00:00:00Z".to_owned(),
            thumbnail_url: "https://img.test/vid1.jpg".to_owned(),
        }])
    }
}

/// Video search stub that always fails
struct BrokenVideos;

#[async_trait]
impl VideoSearch for BrokenVideos {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Video>, AppError> {
        Err(AppError::external_service("youtube", "stubbed outage"))
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "memory:".to_owned(),
        gemini_api_key: Some("test".to_owned()),
        youtube_api_key: None,
        stripe_secret_key: None,
        stripe_webhook_secret: None,
        cors_allowed_origins: vec!["*".to_owned()],
        max_body_bytes: 1024 * 1024,
        session_expiry_hours: 24,
    }
}

async fn test_router(replies: Vec<Reply>, videos_fail: bool) -> Router {
    let storage = Storage::new("memory:").await.expect("memory storage");
    let video_search: Arc<dyn VideoSearch> = if videos_fail {
        Arc::new(BrokenVideos)
    } else {
        Arc::new(StubVideos)
    };
    let resources = Arc::new(ServerResources::new(
        storage,
        Arc::new(ScriptedLlm::new(replies)),
        video_search,
        None,
        Arc::new(test_config()),
    ));
    build_router(resources)
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = request
        .body(Body::from(body.to_string()))
        .expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

async fn register(router: &Router, username: &str) -> String {
    let (status, body) = send_json(
        router,
        "POST",
        "/api/auth/register",
        None,
        serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter2hunter2",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("session token").to_owned()
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let router = test_router(vec![], false).await;
    let token = register(&router, "alice").await;

    let (status, me) = send_json(
        &router,
        "GET",
        "/api/auth/me",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["credits"], 3);
    assert_eq!(me["subscriptionStatus"], "free");

    // Login with email instead of username
    let (status, login) = send_json(
        &router,
        "POST",
        "/api/auth/login",
        None,
        serde_json::json!({ "username": "alice@example.com", "password": "hunter2hunter2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["success"], true);
}

#[tokio::test]
async fn test_duplicate_username_rejected_with_message() {
    let router = test_router(vec![], false).await;
    register(&router, "alice").await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/api/auth/register",
        None,
        serde_json::json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "hunter2hunter2",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_wrong_password_and_missing_token() {
    let router = test_router(vec![], false).await;
    register(&router, "alice").await;

    let (status, _) = send_json(
        &router,
        "POST",
        "/api/auth/login",
        None,
        serde_json::json!({ "username": "alice", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &router,
        "GET",
        "/api/recipes",
        None,
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let router = test_router(vec![], false).await;
    let token = register(&router, "alice").await;

    let (status, _) = send_json(
        &router,
        "POST",
        "/api/auth/logout",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &router,
        "GET",
        "/api/auth/me",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analyze_normalizes_malformed_model_output() {
    let reply = r#"Here you go!
```json
{"foodName": "Tacos", "description": "Street classic", "tags": ["Mexican",],
 "recipes": [{"title": "Street Tacos",
   "ingredients": [{"quantity": "2", "item": "tortillas"}, "100g carne asada"],
   "instructions": [{"number": 1, "instruction": "Warm the tortillas"}],
   "nutritionInfo": {"calories": "250"},}]}
```"#;
    let router = test_router(vec![Reply::Text(reply)], false).await;
    let token = register(&router, "alice").await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/api/analyze",
        Some(&token),
        serde_json::json!({ "image": FAKE_IMAGE }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foodName"], "Tacos");
    assert_eq!(body["tags"], serde_json::json!(["Mexican"]));
    let recipe = &body["recipes"][0];
    assert_eq!(recipe["ingredients"][0], "2 tortillas");
    assert_eq!(recipe["ingredients"][1], "100g carne asada");
    assert_eq!(recipe["instructions"][0], "1. Warm the tortillas");
    assert_eq!(recipe["nutritionInfo"]["calories"], 250);
    assert_eq!(recipe["nutritionInfo"]["protein"], "0g");
    // Enriched with the stubbed video
    assert_eq!(body["youtubeVideos"][0]["videoId"], "vid1");
}

#[tokio::test]
async fn test_analyze_video_outage_is_non_fatal() {
    let router = test_router(
        vec![Reply::Text(r#"{"foodName": "Pho", "recipes": []}"#)],
        true,
    )
    .await;
    let token = register(&router, "alice").await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/api/analyze",
        Some(&token),
        serde_json::json!({ "image": FAKE_IMAGE }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foodName"], "Pho");
    assert_eq!(body["youtubeVideos"], serde_json::json!([]));
}

#[tokio::test]
async fn test_analyze_unparsable_response_is_500_with_details() {
    let router = test_router(
        vec![Reply::Text("Sorry, I can only describe food in prose.")],
        false,
    )
    .await;
    let token = register(&router, "alice").await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/api/analyze",
        Some(&token),
        serde_json::json!({ "image": FAKE_IMAGE }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "AI_UNPARSABLE_RESPONSE");
    assert!(body["details"]["reason"].is_string());
}

#[tokio::test]
async fn test_analyze_rejects_bad_base64_and_consumes_credit() {
    let router = test_router(
        vec![Reply::Text(r#"{"foodName": "Toast", "recipes": []}"#)],
        false,
    )
    .await;
    let token = register(&router, "alice").await;

    let (status, _) = send_json(
        &router,
        "POST",
        "/api/analyze",
        Some(&token),
        serde_json::json!({ "image": "not base64 at all!!!" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &router,
        "POST",
        "/api/analyze",
        Some(&token),
        serde_json::json!({ "image": FAKE_IMAGE }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Rejected request must not have cost a credit; the successful one did
    let (_, status_body) = send_json(
        &router,
        "GET",
        "/api/billing/status",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status_body["credits"], 2);
    assert_eq!(status_body["subscriptionStatus"], "free");
}

#[tokio::test]
async fn test_saved_recipes_crud_and_ownership() {
    let router = test_router(vec![], false).await;
    let alice = register(&router, "alice").await;
    let mallory = register(&router, "mallory").await;

    let (status, saved) = send_json(
        &router,
        "POST",
        "/api/recipes",
        Some(&alice),
        serde_json::json!({ "analysis": { "foodName": "Lasagna" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["title"], "Lasagna");
    let recipe_id = saved["id"].as_str().expect("recipe id").to_owned();

    // Owner can read and rename
    let uri = format!("/api/recipes/{recipe_id}");
    let (status, updated) = send_json(
        &router,
        "PATCH",
        &uri,
        Some(&alice),
        serde_json::json!({ "title": "Nonna's Lasagna" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Nonna's Lasagna");

    // Another user gets 403, not 404
    let (status, _) = send_json(&router, "GET", &uri, Some(&mallory), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        send_json(&router, "DELETE", &uri, Some(&mallory), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner deletes; a second read is 404
    let (status, _) = send_json(&router, "DELETE", &uri, Some(&alice), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&router, "GET", &uri, Some(&alice), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_meal_plan_falls_back_when_ai_fails() {
    let router = test_router(vec![Reply::Error], false).await;
    let token = register(&router, "alice").await;

    let (status, plan) = send_json(
        &router,
        "POST",
        "/api/meal-plans",
        Some(&token),
        serde_json::json!({
            "duration": "1-week",
            "mealsPerDay": 2,
            "cuisinePreferences": ["Italian"],
            "healthGoal": "weight loss",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["days"].as_array().expect("days").len(), 7);
    assert_eq!(plan["days"][0]["meals"].as_array().expect("meals").len(), 2);
    assert!(plan["nutritionSummary"]["averageDailyCalories"].as_i64().expect("calories") > 0);
    assert!(!plan["groceryList"].as_array().expect("groceries").is_empty());
}

#[tokio::test]
async fn test_meal_plan_uses_ai_result_when_parsable() {
    let reply = r#"```json
{"days": [{"date": "2026-09-01", "meals": [{"mealType": "Lunch", "name": "Model Meal",
 "cuisine": "Italian", "calories": 500, "ingredients": ["pasta"], "instructions": "Cook.",
 "macros": {"protein": "20g", "carbs": "60g", "fats": "15g"}}],
 "dailyNutrition": {"calories": 500, "protein": "20g", "carbs": "60g", "fats": "15g"}}],
 "groceryList": [], "nutritionSummary": {"averageDailyCalories": 500}}
```"#;
    let router = test_router(vec![Reply::Text(reply)], false).await;
    let token = register(&router, "alice").await;

    let (status, plan) = send_json(
        &router,
        "POST",
        "/api/meal-plans",
        Some(&token),
        serde_json::json!({ "duration": "1-week", "mealsPerDay": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["days"][0]["meals"][0]["name"], "Model Meal");
}

#[tokio::test]
async fn test_chat_round_trip_and_history() {
    let router = test_router(
        vec![
            Reply::Text("Try a classic carbonara: eggs, guanciale, pecorino."),
            Reply::Text("For two servings, use 200g of pasta."),
        ],
        false,
    )
    .await;
    let token = register(&router, "alice").await;

    let (status, first) = send_json(
        &router,
        "POST",
        "/api/chat/messages",
        Some(&token),
        serde_json::json!({ "message": "What should I cook tonight?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = first["conversationId"].as_str().expect("conversation id").to_owned();
    assert!(first["reply"].as_str().expect("reply").contains("carbonara"));

    let (status, _) = send_json(
        &router,
        "POST",
        "/api/chat/messages",
        Some(&token),
        serde_json::json!({ "conversationId": conversation_id, "message": "How much for two?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, conversations) = send_json(
        &router,
        "GET",
        "/api/chat/conversations",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversations[0]["messageCount"], 4);
    assert_eq!(conversations[0]["title"], "What should I cook tonight?");

    let uri = format!("/api/chat/conversations/{conversation_id}/messages");
    let (status, messages) = send_json(&router, "GET", &uri, Some(&token), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages.as_array().expect("messages").len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");

    let uri = format!("/api/chat/conversations/{conversation_id}");
    let (status, _) = send_json(&router, "DELETE", &uri, Some(&token), serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let (status, conversations) = send_json(
        &router,
        "GET",
        "/api/chat/conversations",
        Some(&token),
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(conversations.as_array().expect("conversations").is_empty());
}

#[tokio::test]
async fn test_health_and_unconfigured_billing() {
    let router = test_router(vec![], false).await;

    let (status, health) = send_json(&router, "GET", "/health", None, serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "dish-detective");

    let token = register(&router, "alice").await;
    let (status, body) = send_json(
        &router,
        "POST",
        "/api/billing/checkout",
        Some(&token),
        serde_json::json!({ "plan": "premium-monthly" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIG_ERROR");
}
