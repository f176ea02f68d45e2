use std::sync::{atomic::Ordering, Arc};

use mcp_relay::{
    client::ConnectionRegistry,
    config::ServerLaunchConfig,
    plugin::{McpClientPlugin, ToolHost, GATEWAY_STOP},
    tools::athena::{QUICKSAVE_CONFIRMATION, SECRET_MODE_ENABLED},
};
use serde_json::{json, Value};

use crate::common::{registry_with, server, FakeProvider, ProviderState};

const ATHENA_TOOLS: &[&str] = &[
    "smart_search",
    "agentic_search",
    "quicksave",
    "recall_session",
    "health_check",
    "governance_status",
    "list_memory_paths",
    "set_secret_mode",
    "permission_status",
];

fn athena() -> ServerLaunchConfig {
    server("athena")
}

fn host_with(registry: &Arc<ConnectionRegistry>) -> ToolHost {
    let mut host = ToolHost::new();
    McpClientPlugin::new(Arc::clone(registry), athena()).register(&mut host);
    host
}

fn setup() -> (Arc<ConnectionRegistry>, Arc<ProviderState>, ToolHost) {
    let (registry, state) = registry_with(FakeProvider::new(ATHENA_TOOLS));
    let host = host_with(&registry);
    (registry, state, host)
}

fn parse(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|err| panic!("not JSON ({err}): {output}"))
}

#[tokio::test]
async fn registering_does_not_connect() {
    let (registry, state, host) = setup();

    assert_eq!(host.tools().len(), 9);
    assert_eq!(state.connects(), 0);
    assert!(!registry.is_connected("athena").await);
}

#[tokio::test]
async fn first_call_connects_and_later_calls_reuse_the_connection() {
    let (registry, state, host) = setup();

    let first = host
        .execute("athena_smart_search", json!({ "query": "rust" }))
        .await;
    assert_eq!(
        parse(&first),
        json!({ "tool": "smart_search", "args": { "query": "rust", "limit": 5 } })
    );
    assert!(registry.is_connected("athena").await);

    host.execute("athena_health_check", json!({})).await;
    assert_eq!(state.connects(), 1);
    assert_eq!(state.calls(), 2);
}

#[tokio::test]
async fn explicit_limit_is_forwarded() {
    let (_registry, _state, host) = setup();

    let output = host
        .execute("athena_recall_session", json!({ "limit": 3 }))
        .await;

    assert_eq!(
        parse(&output),
        json!({ "tool": "recall_session", "args": { "limit": 3 } })
    );
}

#[tokio::test]
async fn null_limit_is_forwarded_as_the_default() {
    let (_registry, _state, host) = setup();

    let search = host
        .execute("athena_smart_search", json!({ "query": "q", "limit": null }))
        .await;
    let recall = host
        .execute("athena_recall_session", json!({ "limit": null }))
        .await;

    assert_eq!(
        parse(&search),
        json!({ "tool": "smart_search", "args": { "query": "q", "limit": 5 } })
    );
    assert_eq!(
        parse(&recall),
        json!({ "tool": "recall_session", "args": { "limit": 1 } })
    );
}

#[tokio::test]
async fn fractional_limit_is_forwarded_unchanged() {
    let (_registry, _state, host) = setup();

    let output = host
        .execute("athena_agentic_search", json!({ "query": "q", "limit": 2.5 }))
        .await;

    assert_eq!(
        parse(&output),
        json!({ "tool": "agentic_search", "args": { "query": "q", "limit": 2.5 } })
    );
}

#[tokio::test]
async fn fixed_messages_replace_the_remote_result() {
    let (_registry, state, host) = setup();

    let saved = host
        .execute("athena_quicksave", json!({ "summary": "wrapped up the parser" }))
        .await;
    let secret = host
        .execute("athena_set_secret_mode", json!({ "enabled": true }))
        .await;

    assert_eq!(saved, QUICKSAVE_CONFIRMATION);
    assert_eq!(secret, SECRET_MODE_ENABLED);
    assert_eq!(state.calls(), 2);
}

#[tokio::test]
async fn connect_failure_is_reported_with_the_tool_prefix_and_retried() {
    let (registry, state, host) = setup();
    state.fail_next_connects(1);

    let failed = host
        .execute("athena_smart_search", json!({ "query": "rust" }))
        .await;
    assert!(failed.starts_with("Error searching memory: "), "{failed}");
    assert!(failed.contains("athena"), "{failed}");
    assert!(!registry.is_connected("athena").await);

    let retried = host
        .execute("athena_smart_search", json!({ "query": "rust" }))
        .await;
    assert_eq!(parse(&retried)["tool"], json!("smart_search"));
    assert_eq!(state.connects(), 2);
}

#[tokio::test]
async fn remote_failure_is_reported_and_the_connection_stays() {
    let (registry, state, host) = setup();
    host.execute("athena_health_check", json!({})).await;
    state.fail_calls.store(true, Ordering::SeqCst);

    let output = host.execute("athena_governance_status", json!({})).await;

    assert!(output.starts_with("Error checking governance: "), "{output}");
    assert!(registry.is_connected("athena").await);
    assert_eq!(state.connects(), 1);
}

#[tokio::test]
async fn invalid_arguments_are_reported_without_connecting() {
    let (registry, state, host) = setup();

    let output = host.execute("athena_set_secret_mode", json!({})).await;

    assert!(output.starts_with("Error setting secret mode: "), "{output}");
    assert!(!registry.is_connected("athena").await);
    assert_eq!(state.connects(), 0);
}

#[tokio::test]
async fn gateway_stop_disconnects_every_server() {
    let (registry, state, host) = setup();
    host.execute("athena_health_check", json!({})).await;
    registry.connect(&server("files")).await.expect("connect files");

    host.emit(GATEWAY_STOP).await;

    assert!(registry.connection_names().await.is_empty());
    assert_eq!(state.closes(), 2);
    assert_eq!(
        host.execute("athena_health_check", json!({})).await,
        "Host is shutting down"
    );
}

#[tokio::test]
async fn discovered_tools_are_exposed_after_the_athena_proxies() {
    let (registry, _state) = registry_with(FakeProvider::new(&["echo"]));
    registry.connect(&server("files")).await.expect("connect files");

    let plugin = McpClientPlugin::new(Arc::clone(&registry), athena())
        .with_discovered_tools(registry.list_all_capabilities().await);
    let mut host = ToolHost::new();
    plugin.register(&mut host);

    let names = host
        .tools()
        .iter()
        .map(|tool| tool.name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names.len(), 10);
    assert_eq!(names.last().map(String::as_str), Some("mcp_files_echo"));

    let output = host.execute("mcp_files_echo", json!({ "msg": "hi" })).await;
    assert_eq!(parse(&output), json!({ "msg": "hi" }));
}
