use std::{sync::Arc, time::Duration};

use mcp_relay::{
    lib::errors::McpClientError,
    tools::{adapt, AgentTool},
};
use serde_json::json;

use crate::common::{object, registry_with, server, FakeProvider};

#[tokio::test]
async fn connecting_twice_performs_one_handshake() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    let files = server("files");

    registry.connect(&files).await.expect("first connect");
    registry.connect(&files).await.expect("second connect");

    assert_eq!(state.connects(), 1);
    assert_eq!(registry.connection_names().await, vec!["files".to_string()]);
}

#[tokio::test]
async fn concurrent_first_connects_share_one_handshake() {
    let provider = FakeProvider::new(&["echo"]).with_connect_delay(Duration::from_millis(50));
    let (registry, state) = registry_with(provider);
    let files = server("files");

    let (first, second) = tokio::join!(registry.connect(&files), registry.connect(&files));

    first.expect("first connect");
    second.expect("second connect");
    assert_eq!(state.connects(), 1);
    assert!(registry.is_connected("files").await);
}

#[tokio::test]
async fn is_connected_follows_connect_and_disconnect() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    let files = server("files");

    assert!(!registry.is_connected("files").await);
    registry.connect(&files).await.expect("connect");
    assert!(registry.is_connected("files").await);
    registry.disconnect("files").await.expect("disconnect");
    assert!(!registry.is_connected("files").await);
    assert_eq!(state.closes(), 1);

    registry.disconnect("files").await.expect("second disconnect is a no-op");
    assert_eq!(state.closes(), 1);
}

#[tokio::test]
async fn capabilities_are_captured_at_connect_time() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo", "read_file"]));
    registry.connect(&server("files")).await.expect("connect");

    state.set_tools(&["echo", "read_file", "write_file"]);

    let tools = registry
        .list_all_capabilities()
        .await
        .into_iter()
        .map(|(server, tool)| format!("{server}/{}", tool.name))
        .collect::<Vec<_>>();
    assert_eq!(tools, vec!["files/echo", "files/read_file"]);
}

#[tokio::test]
async fn capabilities_keep_connection_order() {
    let (registry, _state) = registry_with(FakeProvider::new(&["echo"]));
    registry.connect(&server("zeta")).await.expect("connect zeta");
    registry.connect(&server("alpha")).await.expect("connect alpha");

    let servers = registry
        .list_all_capabilities()
        .await
        .into_iter()
        .map(|(server, _)| server)
        .collect::<Vec<_>>();
    assert_eq!(servers, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn invoking_an_unknown_server_performs_no_io() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));

    let error = registry
        .invoke("ghost", "echo", object(json!({ "msg": "hi" })))
        .await
        .expect_err("ghost is not connected");

    assert!(matches!(error, McpClientError::NotConnected { ref server } if server == "ghost"));
    assert_eq!(state.connects(), 0);
    assert_eq!(state.calls(), 0);
}

#[tokio::test]
async fn adapted_echo_returns_pretty_json_of_the_remote_result() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    registry.connect(&server("files")).await.expect("connect");

    let (name, descriptor) = registry
        .list_all_capabilities()
        .await
        .into_iter()
        .next()
        .expect("echo should be discovered");
    let tool = adapt(Arc::clone(&registry), &name, &descriptor);

    assert_eq!(tool.name(), "mcp_files_echo");
    assert_eq!(tool.description(), "MCP tool: echo from files");
    assert_eq!(tool.parameters(), json!({ "type": "object", "properties": {} }));

    let output = tool
        .execute(json!({ "msg": "hi" }))
        .await
        .expect("echo succeeds");
    assert_eq!(
        output,
        serde_json::to_string_pretty(&json!({ "msg": "hi" })).expect("pretty json")
    );
    assert_eq!(state.calls(), 1);
}

#[tokio::test]
async fn failed_invocation_keeps_the_connection() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    registry.connect(&server("files")).await.expect("connect");
    state.fail_calls.store(true, std::sync::atomic::Ordering::SeqCst);

    let error = registry
        .invoke("files", "echo", object(json!({})))
        .await
        .expect_err("call should fail");

    assert!(matches!(error, McpClientError::Invocation { .. }), "{error:?}");
    assert!(registry.is_connected("files").await);
    assert_eq!(state.closes(), 0);
}

#[tokio::test]
async fn failed_connect_leaves_no_entry_and_can_be_retried() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    state.fail_next_connects(1);

    let error = registry
        .connect(&server("files"))
        .await
        .expect_err("first connect fails");
    assert!(error.is_connect_failure());
    assert!(!registry.is_connected("files").await);

    registry.connect(&server("files")).await.expect("retry succeeds");
    assert!(registry.is_connected("files").await);
    assert_eq!(state.connects(), 2);
}

#[tokio::test]
async fn disconnect_all_closes_everything_and_tolerates_an_empty_registry() {
    let (registry, state) = registry_with(FakeProvider::new(&["echo"]));
    registry.disconnect_all().await.expect("empty teardown succeeds");

    registry.connect(&server("a")).await.expect("connect a");
    registry.connect(&server("b")).await.expect("connect b");
    registry.disconnect_all().await.expect("teardown succeeds");

    assert!(registry.connection_names().await.is_empty());
    assert_eq!(state.closes(), 2);
    registry.disconnect_all().await.expect("repeat teardown succeeds");
}

#[tokio::test]
async fn teardown_waits_for_an_in_flight_connect() {
    let provider = FakeProvider::new(&["echo"]).with_connect_delay(Duration::from_millis(100));
    let (registry, state) = registry_with(provider);

    let connecting = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.connect(&server("files")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(state.connects(), 1, "connect should be in flight");

    registry.disconnect_all().await.expect("teardown succeeds");
    connecting
        .await
        .expect("connect task completes")
        .expect("connect succeeds");

    assert!(!registry.is_connected("files").await);
    assert_eq!(state.closes(), 1);
}
