//! Integration tests against the live Microsoft Graph API.
//!
//! These need a delegated access token in `GRAPH_LIVE_TOKEN`; the quickest
//! source is the Graph Explorer access token panel.
//! Run with: `cargo test --features integration -- --nocapture`

#![cfg(feature = "integration")]
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use graph_bridge_mcp::config::Config;
use graph_bridge_mcp::error::GraphError;
use graph_bridge_mcp::graph::GraphClient;
use graph_bridge_mcp::store::MemoryKvStore;

fn live_token() -> Option<String> {
    std::env::var("GRAPH_LIVE_TOKEN").ok().filter(|token| !token.is_empty())
}

fn create_client() -> Arc<GraphClient> {
    let config = Config::new(
        "http://localhost:8080",
        "common",
        "unused-for-direct-calls",
        "unused-for-direct-calls",
        "live-test-signing-secret-32-bytes!!",
    );
    Arc::new(
        GraphClient::new(&config, Arc::new(MemoryKvStore::new()))
            .expect("Failed to create client"),
    )
}

#[tokio::test]
async fn test_get_me() {
    let Some(token) = live_token() else {
        println!("Skipping: GRAPH_LIVE_TOKEN not set");
        return;
    };

    let client = create_client();
    let user = client.me(&token).await.expect("Profile read should succeed");

    assert!(user.display_name.is_some() || user.user_principal_name.is_some());
    println!("Signed in as: {:?}", user.display_name);
}

#[tokio::test]
async fn test_list_messages() {
    let Some(token) = live_token() else {
        println!("Skipping: GRAPH_LIVE_TOKEN not set");
        return;
    };

    let client = create_client();
    let result = client.list_messages(&token, None, None, false, 5).await;

    // Mail.Read may be missing from the token's scopes
    match result {
        Ok(messages) => println!("Inbox returned {} messages", messages.len()),
        Err(GraphError::Forbidden { message }) => {
            println!("Note: mail scope not granted: {message}");
        }
        Err(error) => panic!("Unexpected mail error: {error:?}"),
    }
}

#[tokio::test]
async fn test_calendar_view() {
    let Some(token) = live_token() else {
        println!("Skipping: GRAPH_LIVE_TOKEN not set");
        return;
    };

    let client = create_client();
    let start = Utc::now();
    let end = start + Duration::days(7);

    let result =
        client.calendar_view(&token, &start.to_rfc3339(), &end.to_rfc3339(), 10).await;

    match result {
        Ok(events) => println!("Next 7 days hold {} events", events.len()),
        Err(GraphError::Forbidden { message }) => {
            println!("Note: calendar scope not granted: {message}");
        }
        Err(error) => panic!("Unexpected calendar error: {error:?}"),
    }
}

#[tokio::test]
async fn test_list_drive_root() {
    let Some(token) = live_token() else {
        println!("Skipping: GRAPH_LIVE_TOKEN not set");
        return;
    };

    let client = create_client();
    let result = client.list_drive_children(&token, None, 10).await;

    // Accounts without OneDrive provisioned return 404 here
    match result {
        Ok(items) => println!("Drive root holds {} items", items.len()),
        Err(GraphError::Forbidden { message } | GraphError::NotFound { resource: message }) => {
            println!("Note: drive not reachable: {message}");
        }
        Err(error) => panic!("Unexpected drive error: {error:?}"),
    }
}

#[tokio::test]
async fn test_rejected_token_maps_to_unauthorized() {
    let client = create_client();
    let result = client.me("not-a-real-token").await;

    assert!(matches!(result, Err(GraphError::Unauthorized { .. })));
}
