//! Live Ollama test
//!
//! Runs one request against a local Ollama server. Requires a running server
//! with the configured model pulled.

use std::time::Duration;

use deepagent::core::config::ProviderType;
use deepagent::{Config, DeepAgent};
use tokio::time::timeout;

#[tokio::test]
#[ignore] // Requires a running Ollama server
async fn test_ollama_round_trip() {
    let mut config = Config::default();
    config.provider = ProviderType::Ollama;
    config.agent.max_steps = 5;

    let agent = DeepAgent::from_config(&config).expect("agent from config");

    let result = timeout(
        Duration::from_secs(180),
        agent.invoke(None, "Add a TODO called 'write tests', then tell me you are done."),
    )
    .await;

    let response = match result {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => panic!("request failed: {}", e),
        Err(_) => panic!("request timed out"),
    };

    assert!(!response.response.is_empty());
    let snapshot = agent.get_state(&response.thread_id).await.unwrap();
    assert!(snapshot.messages.len() >= 2);
}
