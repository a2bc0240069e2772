//! Agent orchestrator
//!
//! `DeepAgent` runs the AGENT/TOOLS/END loop for a thread: the model is
//! invoked with the full history, any tool calls it makes are executed as one
//! batch, and the loop repeats until the model answers without tool calls.
//! Thread state is loaded once per request and saved after every step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::agent::events::StreamEvent;
use crate::agent::loop_state::{AgentLoopState, Step};
use crate::agent::node::AgentNode;
use crate::agent::sub_agent::{SubAgentExecutor, SubAgentRegistry};
use crate::checkpoint::{create_store, CheckpointStore, InMemoryCheckpointStore};
use crate::core::{Config, DeepAgentError, Message, Result};
use crate::llm::{ChatModel, ModelFactory, ProviderModelFactory};
use crate::state::{FileStore, ThreadState, TodoList};
use crate::tools::{ToolDispatcher, ToolRegistry};

/// Default cap on model invocations per request
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Result recorded for tool calls whose batch never finished
const INTERRUPTED_CALL: &str = "Error: Tool call was cancelled before it completed.";

/// Result of `invoke` / `chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    /// Content of the final ai message
    pub response: String,
    pub thread_id: String,
    pub files: FileStore,
    pub todos: TodoList,
}

/// Full saved state of a thread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadSnapshot {
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub files: FileStore,
    pub todos: TodoList,
}

/// Builder for `DeepAgent`
pub struct DeepAgentBuilder {
    factory: Arc<dyn ModelFactory>,
    store: Option<Arc<dyn CheckpointStore>>,
    sub_agents: SubAgentRegistry,
    system_prompt: Option<String>,
    max_steps: Option<usize>,
}

impl DeepAgentBuilder {
    /// Start from a model factory with the built-in sub-agents, an
    /// in-memory store and the default step cap
    pub fn new(factory: Arc<dyn ModelFactory>) -> Self {
        Self {
            factory,
            store: None,
            sub_agents: SubAgentRegistry::builtin(),
            system_prompt: None,
            max_steps: Some(DEFAULT_MAX_STEPS),
        }
    }

    /// Set the checkpoint store
    pub fn store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the sub-agent registry
    pub fn sub_agents(mut self, sub_agents: SubAgentRegistry) -> Self {
        self.sub_agents = sub_agents;
        self
    }

    /// Override the built-in system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the step cap (`None` = unlimited)
    pub fn max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Build the agent
    pub fn build(self) -> DeepAgent {
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| AgentNode::default_system_prompt(&self.sub_agents));
        let node = AgentNode::new(system_prompt, ToolRegistry::new().all_definitions());
        let executor = SubAgentExecutor::new(Arc::new(self.sub_agents));

        DeepAgent {
            factory: self.factory,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryCheckpointStore::new())),
            node: Arc::new(node),
            dispatcher: Arc::new(ToolDispatcher::new(Arc::new(executor))),
            thread_locks: Arc::new(Mutex::new(HashMap::new())),
            max_steps: self.max_steps,
        }
    }
}

/// Planning agent with per-thread files, TODOs and sub-agents
#[derive(Clone)]
pub struct DeepAgent {
    factory: Arc<dyn ModelFactory>,
    store: Arc<dyn CheckpointStore>,
    node: Arc<AgentNode>,
    dispatcher: Arc<ToolDispatcher>,
    /// One writer per thread id
    thread_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    max_steps: Option<usize>,
}

impl DeepAgent {
    /// Create a builder
    pub fn builder(factory: Arc<dyn ModelFactory>) -> DeepAgentBuilder {
        DeepAgentBuilder::new(factory)
    }

    /// Agent wired from configuration: provider, store, sub-agents, prompt
    /// and step cap
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder(Arc::new(ProviderModelFactory::from_config(config)))
            .store(create_store(config)?)
            .sub_agents(SubAgentRegistry::from_config(config))
            .max_steps(config.max_steps());
        if let Some(prompt) = &config.agent.system_prompt {
            builder = builder.system_prompt(prompt.clone());
        }
        Ok(builder.build())
    }

    /// System prompt used for every model call
    pub fn system_prompt(&self) -> &str {
        self.node.system_prompt()
    }

    /// Registered sub-agents
    pub fn sub_agents(&self) -> &SubAgentRegistry {
        self.dispatcher.sub_agents().registry()
    }

    /// Whether threads survive a restart
    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    /// Run a request on `thread_id`, or on a new thread when `None`
    pub async fn invoke(&self, thread_id: Option<&str>, query: &str) -> Result<AgentResponse> {
        let thread_id = thread_id.map_or_else(new_thread_id, str::to_string);
        let state = self.run_thread(&thread_id, query, false, None).await?;
        Ok(Self::response(thread_id, state))
    }

    /// Continue an existing thread
    pub async fn chat(&self, thread_id: &str, query: &str) -> Result<AgentResponse> {
        let state = self.run_thread(thread_id, query, true, None).await?;
        Ok(Self::response(thread_id.to_string(), state))
    }

    /// Saved state of a thread
    pub async fn get_state(&self, thread_id: &str) -> Result<ThreadSnapshot> {
        let state = self
            .store
            .load(thread_id)
            .await?
            .ok_or_else(|| DeepAgentError::ThreadNotFound(thread_id.to_string()))?;

        Ok(ThreadSnapshot {
            thread_id: thread_id.to_string(),
            messages: state.messages,
            files: state.files,
            todos: state.todos,
        })
    }

    /// Run a request and stream its progress.
    ///
    /// The stream always ends with exactly one `Complete` or `Error` event.
    /// Dropping it stops the request at its next suspension point; steps
    /// already saved stay saved.
    pub fn stream(
        &self,
        thread_id: Option<String>,
        query: String,
    ) -> impl Stream<Item = StreamEvent> + Send + Unpin + 'static {
        let (tx, rx) = mpsc::channel(32);
        let agent = self.clone();
        let thread_id = thread_id.unwrap_or_else(new_thread_id);

        tokio::spawn(async move {
            tokio::select! {
                result = agent.run_thread(&thread_id, &query, false, Some(&tx)) => {
                    let terminal = match result {
                        Ok(state) => StreamEvent::Complete {
                            thread_id: thread_id.clone(),
                            files: state.files,
                            todos: state.todos,
                        },
                        Err(e) => StreamEvent::Error { error: e.to_string() },
                    };
                    let _ = tx.send(terminal).await;
                }
                _ = tx.closed() => {
                    info!(thread_id = %thread_id, "stream dropped, request cancelled");
                }
            }
        });

        ReceiverStream::new(rx)
    }

    fn response(thread_id: String, state: ThreadState) -> AgentResponse {
        AgentResponse {
            response: state.response_text(),
            thread_id,
            files: state.files,
            todos: state.todos,
        }
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .thread_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // Entries only the map still holds belong to finished requests
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(thread_id.to_string()).or_default().clone()
    }

    fn create_model(&self) -> Result<ChatModel> {
        self.factory.create().map_err(|e| match e {
            DeepAgentError::Config(msg) => DeepAgentError::ServiceUnavailable(msg),
            other => other,
        })
    }

    /// The loop itself. Holds the thread's lock for the whole request.
    async fn run_thread(
        &self,
        thread_id: &str,
        query: &str,
        must_exist: bool,
        events: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Result<ThreadState> {
        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock().await;

        let mut state = match self.store.load(thread_id).await? {
            Some(state) => {
                debug!(thread_id, messages = state.len(), "resuming thread");
                state
            }
            None if must_exist => {
                return Err(DeepAgentError::ThreadNotFound(thread_id.to_string()))
            }
            None => {
                info!(thread_id, "new thread");
                ThreadState::new()
            }
        };

        let model = self.create_model()?;

        let interrupted = state.close_pending_calls(INTERRUPTED_CALL);
        if interrupted > 0 {
            warn!(thread_id, calls = interrupted, "closing tool calls from an interrupted batch");
        }

        info!(thread_id, model = model.model(), "processing request");
        state.push(Message::human(query));
        self.store.save(thread_id, &state).await?;

        let mut loop_state = AgentLoopState::new(self.max_steps);

        while loop_state.should_continue() {
            match loop_state.step {
                Step::Agent => {
                    let reply = if loop_state.has_budget() {
                        let reply = self.node.run(&model, &state.messages).await;
                        loop_state.after_agent(&reply);
                        reply
                    } else {
                        warn!(thread_id, steps = loop_state.turn, "step limit reached");
                        loop_state.exhaust()
                    };
                    let content = reply.content().to_string();
                    state.push(reply);
                    self.commit_step(thread_id, &state, events).await?;

                    if !content.is_empty() {
                        emit(events, StreamEvent::Content { content }).await;
                    }
                }
                Step::Tools => {
                    let calls = state
                        .last_message()
                        .map(|m| m.tool_calls().to_vec())
                        .unwrap_or_default();
                    debug!(thread_id, calls = calls.len(), "executing tool batch");

                    // The batch works on copies; nothing reaches the thread
                    // until every call has a result.
                    let mut files = state.files.clone();
                    let mut todos = state.todos.clone();
                    let results = self
                        .dispatcher
                        .dispatch(&calls, &mut files, &mut todos, &model)
                        .await;

                    state.files = files;
                    state.todos = todos;
                    for result in results {
                        state.push(result.into());
                    }
                    loop_state.after_tools();
                    self.commit_step(thread_id, &state, events).await?;
                }
                Step::End => break,
            }
        }

        info!(
            thread_id,
            steps = loop_state.turn,
            files = state.files.len(),
            todos = state.todos.len(),
            "request complete"
        );
        Ok(state)
    }

    /// Save a finished step and announce it
    async fn commit_step(
        &self,
        thread_id: &str,
        state: &ThreadState,
        events: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Result<()> {
        self.store.save(thread_id, state).await?;
        emit(
            events,
            StreamEvent::StateUpdate {
                thread_id: thread_id.to_string(),
                files: state.files.clone(),
                todos: state.todos.clone(),
            },
        )
        .await;
        Ok(())
    }
}

async fn emit(events: Option<&mpsc::Sender<StreamEvent>>, event: StreamEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
