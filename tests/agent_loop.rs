//! Agent loop integration tests
//!
//! Drive `DeepAgent` end to end with the scripted mock provider.

use std::sync::Arc;
use std::time::Duration;

use deepagent::checkpoint::FileCheckpointStore;
use deepagent::core::config::ProviderType;
use deepagent::core::{Message, Role, ToolCall};
use deepagent::llm::{ChatModel, MockProvider, MockReply, ProviderModelFactory};
use deepagent::{Config, DeepAgent, DeepAgentError, StreamEvent};
use futures::StreamExt;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn agent_with(mock: &Arc<MockProvider>) -> DeepAgent {
    DeepAgent::builder(Arc::new(ChatModel::new(mock.clone(), "mock"))).build()
}

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args)
}

#[tokio::test]
async fn test_batch_yields_one_result_per_call_in_order() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![
                call("c1", "fs_write_file", json!({"path": "a.txt", "content": "x"})),
                call("c2", "fs_read_file", json!({"path": "a.txt"})),
                call("c3", "plan_add_todo", json!({"task": "t"})),
            ],
        ),
        MockReply::text("done"),
    ]));
    let agent = agent_with(&mock);

    let response = assert_ok!(agent.invoke(Some("batch"), "go").await);
    assert_eq!(response.response, "done");
    assert_eq!(response.files.read("a.txt"), Some("x"));
    assert_eq!(response.todos.render().as_deref(), Some("0. [pending] t"));

    let snapshot = assert_ok!(agent.get_state("batch").await);
    let roles: Vec<Role> = snapshot.messages.iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::Human, Role::Ai, Role::Tool, Role::Tool, Role::Tool, Role::Ai]
    );
    assert_eq!(snapshot.messages[2], Message::tool("c1", "Successfully wrote to a.txt"));
    assert_eq!(snapshot.messages[3], Message::tool("c2", "x"));
    assert_eq!(snapshot.messages[4], Message::tool("c3", "Added TODO: t"));

    // The second model call saw the results
    let second = &mock.requests()[1];
    assert_eq!(second.messages.len(), 6);
    assert_eq!(second.tool_names.len(), 8);
}

#[tokio::test]
async fn test_threads_persist_and_stay_isolated() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![call("c1", "fs_write_file", json!({"path": "notes.md", "content": "n"}))],
        ),
        MockReply::text("saved"),
    ]));
    let agent = agent_with(&mock);

    assert_ok!(agent.invoke(Some("thread-a"), "write notes").await);
    let other = assert_ok!(agent.invoke(Some("thread-b"), "hello").await);
    assert!(other.files.is_empty());

    let again = assert_ok!(agent.chat("thread-a", "what files exist?").await);
    assert_eq!(again.files.read("notes.md"), Some("n"));
    assert_eq!(again.response, "Echo: what files exist?");

    let snapshot = assert_ok!(agent.get_state("thread-a").await);
    assert_eq!(snapshot.messages.len(), 6);
}

#[tokio::test]
async fn test_unknown_thread() {
    let agent = agent_with(&Arc::new(MockProvider::new()));

    let err = assert_err!(agent.chat("nope", "hi").await);
    assert!(err.is_not_found());

    let err = assert_err!(agent.get_state("nope").await);
    assert!(matches!(err, DeepAgentError::ThreadNotFound(ref id) if id == "nope"));
}

#[tokio::test]
async fn test_stream_event_order() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls("planning", vec![call("c1", "plan_add_todo", json!({"task": "t"}))]),
        MockReply::text("final"),
    ]));
    let agent = agent_with(&mock);

    let events: Vec<StreamEvent> = agent
        .stream(Some("streamed".to_string()), "go".to_string())
        .collect()
        .await;

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            StreamEvent::StateUpdate { .. } => "state_update",
            StreamEvent::Content { .. } => "content",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Error { .. } => "error",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "state_update",
            "content",
            "state_update",
            "state_update",
            "content",
            "complete"
        ]
    );

    assert_eq!(
        events[1],
        StreamEvent::Content {
            content: "planning".to_string()
        }
    );
    match &events[2] {
        StreamEvent::StateUpdate { todos, .. } => assert_eq!(todos.len(), 1),
        other => panic!("unexpected event {:?}", other),
    }
    match events.last() {
        Some(StreamEvent::Complete { thread_id, todos, .. }) => {
            assert_eq!(thread_id, "streamed");
            assert_eq!(todos.len(), 1);
        }
        other => panic!("unexpected terminal event {:?}", other),
    }
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn test_stream_error_is_terminal() {
    let mut config = Config::default();
    config.provider = ProviderType::OpenAi;
    config.openai.api_key = None;
    let agent = DeepAgent::builder(Arc::new(ProviderModelFactory::from_config(&config))).build();

    let events: Vec<StreamEvent> = agent.stream(None, "hi".to_string()).collect().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error { .. }));
}

#[tokio::test]
async fn test_dropped_stream_keeps_saved_steps() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls("", vec![call("c1", "plan_read_todos", json!({}))]),
        MockReply::text("final"),
    ]));
    let agent = agent_with(&mock);

    let mut events = agent.stream(Some("dropped".to_string()), "go".to_string());
    let first = events.next().await;
    assert!(matches!(first, Some(StreamEvent::StateUpdate { .. })));
    drop(events);

    // The first agent step was saved before it was announced
    let snapshot = assert_ok!(agent.get_state("dropped").await);
    assert!(snapshot.messages.len() >= 2);
    assert_eq!(snapshot.messages[0], Message::human("go"));
    assert!(snapshot.messages[1].has_tool_calls());
}

#[tokio::test]
async fn test_abandoned_batch_commits_nothing_and_is_closed_on_resume() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![
                call("c1", "fs_write_file", json!({"path": "a.txt", "content": "x"})),
                call(
                    "c2",
                    "delegate_to_subagent",
                    json!({"sub_agent_name": "research-agent", "task": "dig"}),
                ),
            ],
        ),
        MockReply::delayed(Duration::from_secs(30), MockReply::text("too late")),
    ]));
    let agent = agent_with(&mock);

    let mut events = agent.stream(Some("abandoned".to_string()), "go".to_string());
    assert!(matches!(events.next().await, Some(StreamEvent::StateUpdate { .. })));

    // Wait until the slow delegation is in flight, then walk away
    tokio::time::timeout(Duration::from_secs(5), async {
        while mock.requests().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    drop(events);

    let response = assert_ok!(agent.chat("abandoned", "again").await);
    assert_eq!(response.response, "Echo: again");
    assert!(response.files.is_empty());

    // The resumed request saw a result for every earlier call
    let requests = mock.requests();
    let seen = &requests[2].messages;
    let roles: Vec<Role> = seen.iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::Human, Role::Ai, Role::Tool, Role::Tool, Role::Human]
    );
    for (message, id) in seen[3..5].iter().zip(["c1", "c2"]) {
        assert!(matches!(message, Message::Tool { tool_call_id, .. } if tool_call_id == id));
        assert!(message.content().starts_with("Error: "));
    }

    let snapshot = assert_ok!(agent.get_state("abandoned").await);
    assert!(snapshot.files.is_empty());
}

#[tokio::test]
async fn test_model_failure_becomes_answer() {
    let mock = Arc::new(MockProvider::with_script(vec![MockReply::fail("boom")]));
    let agent = agent_with(&mock);

    let response = assert_ok!(agent.invoke(None, "hi").await);
    assert!(response.response.starts_with("Error: "));
    assert!(response.response.contains("boom"));
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_credentials_are_service_unavailable() {
    let mut config = Config::default();
    config.provider = ProviderType::OpenAi;
    config.openai.api_key = None;
    let agent = DeepAgent::builder(Arc::new(ProviderModelFactory::from_config(&config))).build();

    let err = assert_err!(agent.invoke(Some("cfg"), "hi").await);
    assert!(err.is_service_unavailable());

    // Nothing was recorded for the thread
    assert!(agent.get_state("cfg").await.is_err());
}

#[tokio::test]
async fn test_step_cap() {
    let looping = || MockReply::tool_calls("", vec![call("c", "plan_read_todos", json!({}))]);
    let mock = Arc::new(MockProvider::with_script(vec![looping(), looping(), looping()]));
    let agent = DeepAgent::builder(Arc::new(ChatModel::new(mock.clone(), "mock")))
        .max_steps(Some(2))
        .build();

    let response = assert_ok!(agent.invoke(None, "spin").await);
    assert_eq!(
        response.response,
        "Error: Agent stopped after 2 steps without a final answer."
    );
    assert_eq!(mock.requests().len(), 2);
    assert_eq!(mock.remaining(), 1);

    let snapshot = assert_ok!(agent.get_state(&response.thread_id).await);
    let last = snapshot.messages.last().unwrap();
    assert_eq!(last.role(), Role::Ai);
    assert!(!last.has_tool_calls());
}

#[tokio::test]
async fn test_sub_agent_runs_without_tools() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![call(
                "c1",
                "delegate_to_subagent",
                json!({"sub_agent_name": "research-agent", "task": "find facts"}),
            )],
        ),
        MockReply::text("facts found"),
        MockReply::text("final"),
    ]));
    let agent = agent_with(&mock);

    let response = assert_ok!(agent.invoke(Some("delegate"), "research").await);
    assert_eq!(response.response, "final");

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    let sub = &requests[1];
    assert!(sub.tool_names.is_empty());
    assert_eq!(sub.messages.len(), 1);
    assert_eq!(sub.messages[0].role(), Role::System);
    assert!(sub.messages[0].content().starts_with("You are a research specialist."));
    assert!(!sub.messages[0].content().contains("Context:"));

    let snapshot = assert_ok!(agent.get_state("delegate").await);
    assert_eq!(snapshot.messages[2], Message::tool("c1", "facts found"));
}

#[tokio::test]
async fn test_unknown_sub_agent_leaves_state_unchanged() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![
                call("c1", "fs_write_file", json!({"path": "a.txt", "content": "x"})),
                call("c2", "plan_add_todo", json!({"task": "t"})),
            ],
        ),
        MockReply::text("ready"),
        MockReply::tool_calls(
            "",
            vec![call(
                "c3",
                "delegate_to_subagent",
                json!({"sub_agent_name": "unknown-agent", "task": "x"}),
            )],
        ),
        MockReply::text("gave up"),
    ]));
    let agent = agent_with(&mock);

    let before = assert_ok!(agent.invoke(Some("unknown-sub"), "setup").await);
    let after = assert_ok!(agent.chat("unknown-sub", "delegate").await);
    assert_eq!(after.files, before.files);
    assert_eq!(after.todos, before.todos);

    let snapshot = assert_ok!(agent.get_state("unknown-sub").await);
    let result = snapshot
        .messages
        .iter()
        .find(|m| matches!(m, Message::Tool { tool_call_id, .. } if tool_call_id == "c3"))
        .unwrap();
    assert!(result.content().contains("unknown-agent"));
    assert!(result.content().starts_with("Error: Unknown sub-agent"));
}

#[tokio::test]
async fn test_unknown_tool_is_reported() {
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls("", vec![call("c1", "fs_delete_file", json!({"path": "a"}))]),
        MockReply::text("ok"),
    ]));
    let agent = agent_with(&mock);

    let response = assert_ok!(agent.invoke(Some("unknown-tool"), "go").await);
    assert_eq!(response.response, "ok");

    let snapshot = assert_ok!(agent.get_state("unknown-tool").await);
    assert_eq!(
        snapshot.messages[2],
        Message::tool("c1", "Error: Unknown tool 'fs_delete_file'.")
    );
}

#[tokio::test]
async fn test_same_thread_requests_are_serialized() {
    let agent = agent_with(&Arc::new(MockProvider::new()));
    assert_ok!(agent.invoke(Some("busy"), "first").await);

    let (a, b) = tokio::join!(agent.chat("busy", "second"), agent.chat("busy", "third"));
    assert_ok!(a);
    assert_ok!(b);

    let snapshot = assert_ok!(agent.get_state("busy").await);
    let roles: Vec<Role> = snapshot.messages.iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::Human, Role::Ai, Role::Human, Role::Ai, Role::Human, Role::Ai]
    );
}

#[tokio::test]
async fn test_file_store_survives_new_agent() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockProvider::with_script(vec![
        MockReply::tool_calls(
            "",
            vec![call("c1", "fs_write_file", json!({"path": "plan.md", "content": "p"}))],
        ),
        MockReply::text("written"),
    ]));

    let store = Arc::new(FileCheckpointStore::new(dir.path()).unwrap());
    let first = DeepAgent::builder(Arc::new(ChatModel::new(mock.clone(), "mock")))
        .store(store)
        .build();
    assert!(first.is_persistent());
    assert_ok!(first.invoke(Some("durable"), "write a plan").await);

    let store = Arc::new(FileCheckpointStore::new(dir.path()).unwrap());
    let second = DeepAgent::builder(Arc::new(ChatModel::new(mock, "mock")))
        .store(store)
        .build();
    let response = assert_ok!(second.chat("durable", "continue").await);
    assert_eq!(response.files.read("plan.md"), Some("p"));

    let err = assert_err!(second.invoke(Some("../escape"), "hi").await);
    assert!(matches!(err, DeepAgentError::Checkpoint(_)));
}
