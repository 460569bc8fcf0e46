// ABOUTME: Integration tests for the SQLite storage backend against a temp database
// ABOUTME: Exercises migrations, uniqueness, ordering, and conversation summaries

// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{Duration, Utc};
use uuid::Uuid;

use dish_detective::models::{ChatMessageRecord, SavedRecipe, User, UserSession};
use dish_detective::storage::{Storage, StorageProvider};

async fn temp_storage() -> (Storage, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite:{}", db_path.display());
    let storage = Storage::new(&url).await.expect("sqlite storage");
    storage.migrate().await.expect("migrate");
    (storage, dir)
}

fn sample_user(username: &str) -> User {
    User::new(
        username.to_owned(),
        format!("{username}@example.com"),
        "pbkdf2$100000$00$00".to_owned(),
    )
}

#[tokio::test]
async fn test_user_crud_and_uniqueness() {
    let (storage, _dir) = temp_storage().await;

    let user = sample_user("alice");
    storage.create_user(&user).await.expect("create user");

    let by_id = storage
        .get_user(user.id)
        .await
        .expect("get user")
        .expect("user exists");
    assert_eq!(by_id.username, "alice");
    assert_eq!(by_id.credits, 3);

    let by_name = storage
        .get_user_by_username("alice")
        .await
        .expect("get by username");
    assert!(by_name.is_some());
    let by_email = storage
        .get_user_by_email("alice@example.com")
        .await
        .expect("get by email");
    assert!(by_email.is_some());

    // Same username, different email
    let mut dup = sample_user("alice");
    dup.email = "alice2@example.com".to_owned();
    assert!(storage.create_user(&dup).await.is_err());

    // Same email, different username
    let mut dup = sample_user("alice3");
    dup.email = "alice@example.com".to_owned();
    assert!(storage.create_user(&dup).await.is_err());

    let mut updated = by_id.clone();
    updated.credits = 1;
    storage.update_user(&updated).await.expect("update user");
    let reloaded = storage
        .get_user(user.id)
        .await
        .expect("get user")
        .expect("user exists");
    assert_eq!(reloaded.credits, 1);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (storage, _dir) = temp_storage().await;

    let user = sample_user("alice");
    storage.create_user(&user).await.expect("create user");

    let session = UserSession {
        token: "deadbeef".repeat(8),
        user_id: user.id,
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    };
    storage.create_session(&session).await.expect("create session");

    let loaded = storage
        .get_session_by_token(&session.token)
        .await
        .expect("get session")
        .expect("session exists");
    assert_eq!(loaded.user_id, user.id);
    assert!(!loaded.is_expired());

    storage
        .delete_session(&session.token)
        .await
        .expect("delete session");
    let gone = storage
        .get_session_by_token(&session.token)
        .await
        .expect("get session");
    assert!(gone.is_none());
}

#[tokio::test]
async fn test_saved_recipes_newest_first() {
    let (storage, _dir) = temp_storage().await;

    let user = sample_user("alice");
    storage.create_user(&user).await.expect("create user");

    let base = Utc::now();
    for (i, title) in ["Old", "Middle", "New"].iter().enumerate() {
        let recipe = SavedRecipe {
            id: Uuid::new_v4(),
            user_id: user.id,
            title: (*title).to_owned(),
            analysis: serde_json::json!({ "foodName": title }),
            created_at: base + Duration::seconds(i as i64),
        };
        storage
            .create_saved_recipe(&recipe)
            .await
            .expect("create recipe");
    }

    let recipes = storage
        .get_saved_recipes(user.id)
        .await
        .expect("list recipes");
    let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["New", "Middle", "Old"]);

    let mut renamed = recipes[0].clone();
    renamed.title = "Renamed".to_owned();
    storage
        .update_saved_recipe(&renamed)
        .await
        .expect("update recipe");
    let reloaded = storage
        .get_saved_recipe_by_id(renamed.id)
        .await
        .expect("get recipe")
        .expect("recipe exists");
    assert_eq!(reloaded.title, "Renamed");
    assert_eq!(reloaded.analysis["foodName"], "New");

    storage
        .delete_saved_recipe(renamed.id)
        .await
        .expect("delete recipe");
    let remaining = storage
        .get_saved_recipes(user.id)
        .await
        .expect("list recipes");
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn test_conversation_summaries_titled_and_ordered() {
    let (storage, _dir) = temp_storage().await;

    let user = sample_user("alice");
    storage.create_user(&user).await.expect("create user");

    let base = Utc::now();
    let first_conversation = Uuid::new_v4();
    let second_conversation = Uuid::new_v4();

    let turns = [
        (first_conversation, "user", "What goes with ramen?", 0),
        (first_conversation, "assistant", "A soft egg and scallions.", 1),
        (second_conversation, "user", "Plan a taco night", 10),
        (second_conversation, "assistant", "Carnitas, salsa verde, slaw.", 11),
    ];
    for (conversation_id, role, content, offset) in turns {
        storage
            .create_chat_message(&ChatMessageRecord {
                id: Uuid::new_v4(),
                user_id: user.id,
                conversation_id,
                role: role.to_owned(),
                content: content.to_owned(),
                created_at: base + Duration::seconds(offset),
            })
            .await
            .expect("create message");
    }

    let conversations = storage
        .get_conversations(user.id)
        .await
        .expect("list conversations");
    assert_eq!(conversations.len(), 2);
    // Most recently active conversation first, titled by its first user message
    assert_eq!(conversations[0].conversation_id, second_conversation);
    assert_eq!(conversations[0].title, "Plan a taco night");
    assert_eq!(conversations[0].message_count, 2);
    assert_eq!(conversations[1].title, "What goes with ramen?");

    let messages = storage
        .get_chat_messages(user.id, first_conversation)
        .await
        .expect("get messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");

    // Other users never see the conversation
    let stranger = sample_user("bob");
    storage.create_user(&stranger).await.expect("create user");
    let none = storage
        .get_chat_messages(stranger.id, first_conversation)
        .await
        .expect("get messages");
    assert!(none.is_empty());

    storage
        .delete_conversation(user.id, first_conversation)
        .await
        .expect("delete conversation");
    let conversations = storage
        .get_conversations(user.id)
        .await
        .expect("list conversations");
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].conversation_id, second_conversation);
}

#[tokio::test]
async fn test_conversation_title_never_taken_from_another_user() {
    let (storage, _dir) = temp_storage().await;

    let alice = sample_user("alice");
    let mallory = sample_user("mallory");
    storage.create_user(&alice).await.expect("create user");
    storage.create_user(&mallory).await.expect("create user");

    // Both users hold messages under the same client-supplied conversation
    // UUID; Alice's message is older.
    let conversation_id = Uuid::new_v4();
    let base = Utc::now();
    let turns = [
        (alice.id, "Alice's private question", 0),
        (mallory.id, "Mallory's own message", 10),
    ];
    for (user_id, content, offset) in turns {
        storage
            .create_chat_message(&ChatMessageRecord {
                id: Uuid::new_v4(),
                user_id,
                conversation_id,
                role: "user".to_owned(),
                content: content.to_owned(),
                created_at: base + Duration::seconds(offset),
            })
            .await
            .expect("create message");
    }

    let conversations = storage
        .get_conversations(mallory.id)
        .await
        .expect("list conversations");
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Mallory's own message");
    assert_eq!(conversations[0].message_count, 1);

    let conversations = storage
        .get_conversations(alice.id)
        .await
        .expect("list conversations");
    assert_eq!(conversations[0].title, "Alice's private question");
}
