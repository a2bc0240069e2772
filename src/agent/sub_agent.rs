//! Sub-agent support
//!
//! Sub-agents are stateless specialists. Delegating to one is a single model
//! call under the sub-agent's own system prompt, with no tools, no history and
//! no access to the thread's files or TODOs beyond a list of file paths.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::config::{Config, SubAgentConfig};
use crate::core::Message;
use crate::llm::ChatModel;
use crate::state::FileStore;

/// A registered specialist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentDescriptor {
    /// Name used by `delegate_to_subagent`
    pub name: String,
    /// One-line summary shown to the main agent
    pub description: String,
    /// Prompt the specialist runs under
    pub system_prompt: String,
    /// Descriptive tags; they grant nothing
    pub capabilities: Vec<String>,
}

impl SubAgentDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            capabilities: Vec::new(),
        }
    }

    /// Set the capability tags
    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    /// The three specialists every agent starts with
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "research-agent",
                "Specialized in researching topics and gathering information",
                "You are a research specialist. Your role is to conduct thorough research on topics, gather relevant information, and provide comprehensive summaries.",
            )
            .with_capabilities(&["research", "summarization"]),
            Self::new(
                "writing-agent",
                "Specialized in writing and content creation",
                "You are a writing specialist. Your role is to create well-structured, clear, and engaging written content based on provided information.",
            )
            .with_capabilities(&["writing", "editing"]),
            Self::new(
                "analysis-agent",
                "Specialized in analyzing data and information",
                "You are an analysis specialist. Your role is to analyze information, identify patterns, and provide insights.",
            )
            .with_capabilities(&["analysis", "insights"]),
        ]
    }
}

impl From<SubAgentConfig> for SubAgentDescriptor {
    fn from(config: SubAgentConfig) -> Self {
        Self {
            name: config.name,
            description: config.description,
            system_prompt: config.system_prompt,
            capabilities: config.capabilities,
        }
    }
}

/// Ordered set of sub-agents, looked up by name
#[derive(Debug, Clone, Default)]
pub struct SubAgentRegistry {
    agents: Vec<SubAgentDescriptor>,
}

impl SubAgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in specialists
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for agent in SubAgentDescriptor::builtin() {
            registry.register(agent);
        }
        registry
    }

    /// Built-ins plus the `[[sub_agents]]` entries of `config`
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        for agent in config.sub_agents.iter().cloned() {
            registry.register(agent.into());
        }
        registry
    }

    /// Add a sub-agent. An existing entry with the same name is replaced in
    /// place, keeping its position.
    pub fn register(&mut self, agent: SubAgentDescriptor) {
        match self.agents.iter_mut().find(|a| a.name == agent.name) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SubAgentDescriptor> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubAgentDescriptor> {
        self.agents.iter()
    }

    /// `- name: description` lines for prompts and the CLI
    pub fn describe(&self) -> String {
        if self.agents.is_empty() {
            return "No sub-agents available.".to_string();
        }
        self.agents
            .iter()
            .map(|a| format!("- {}: {}", a.name, a.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// What a sub-agent is told about the thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentContext {
    /// Known file paths, sorted
    pub files: Vec<String>,
}

impl SubAgentContext {
    /// Context for a delegation, or `None` when there is nothing to share
    pub fn from_files(files: &FileStore) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        Some(Self {
            files: files.paths().into_iter().map(str::to_string).collect(),
        })
    }

    fn render(&self) -> String {
        format!("files: {}", self.files.join(", "))
    }
}

/// Runs delegated tasks
#[derive(Debug, Clone)]
pub struct SubAgentExecutor {
    registry: Arc<SubAgentRegistry>,
}

impl SubAgentExecutor {
    pub fn new(registry: Arc<SubAgentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SubAgentRegistry {
        &self.registry
    }

    /// Run `task` on the named sub-agent and return its answer.
    ///
    /// Never fails: an unknown name or a model error comes back as error
    /// text for the calling agent to read.
    pub async fn delegate(
        &self,
        name: &str,
        task: &str,
        model: &ChatModel,
        context: Option<&SubAgentContext>,
    ) -> String {
        let Some(agent) = self.registry.get(name) else {
            warn!(sub_agent = name, "unknown sub-agent");
            return format!(
                "Error: Unknown sub-agent '{}'. Available: {}",
                name,
                self.registry.names().join(", ")
            );
        };

        info!(
            sub_agent = name,
            task = %task.chars().take(50).collect::<String>(),
            "delegating task"
        );

        let prompt = Self::build_prompt(agent, task, context);
        match model.invoke(&[Message::system(prompt)]).await {
            Ok(reply) => {
                info!(sub_agent = name, "sub-agent completed task");
                reply.content().to_string()
            }
            Err(e) => {
                error!(sub_agent = name, "sub-agent failed: {}", e);
                format!("Error: Sub-agent {} failed: {}", name, e)
            }
        }
    }

    /// The single system message a sub-agent receives
    pub fn build_prompt(
        agent: &SubAgentDescriptor,
        task: &str,
        context: Option<&SubAgentContext>,
    ) -> String {
        let mut prompt = format!("{}\n\nTask: {}", agent.system_prompt, task);
        if let Some(context) = context {
            prompt.push_str("\n\nContext:\n");
            prompt.push_str(&context.render());
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::llm::{MockProvider, MockReply};

    fn executor() -> SubAgentExecutor {
        SubAgentExecutor::new(Arc::new(SubAgentRegistry::builtin()))
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SubAgentRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["research-agent", "writing-agent", "analysis-agent"]
        );
        assert!(registry
            .describe()
            .contains("- writing-agent: Specialized in writing and content creation"));
    }

    #[test]
    fn test_config_entries_extend_and_replace() {
        let mut config = Config::default();
        config.sub_agents = vec![
            SubAgentConfig {
                name: "review-agent".to_string(),
                description: "Reviews drafts".to_string(),
                system_prompt: "You are a reviewer.".to_string(),
                capabilities: vec![],
            },
            SubAgentConfig {
                name: "research-agent".to_string(),
                description: "Custom research".to_string(),
                system_prompt: "Research narrowly.".to_string(),
                capabilities: vec![],
            },
        ];

        let registry = SubAgentRegistry::from_config(&config);
        assert_eq!(
            registry.names(),
            vec!["research-agent", "writing-agent", "analysis-agent", "review-agent"]
        );
        assert_eq!(
            registry.get("research-agent").unwrap().system_prompt,
            "Research narrowly."
        );
    }

    #[test]
    fn test_prompt_layout() {
        let agent = SubAgentDescriptor::new("a", "d", "You are A.");
        assert_eq!(
            SubAgentExecutor::build_prompt(&agent, "do it", None),
            "You are A.\n\nTask: do it"
        );

        let context = SubAgentContext {
            files: vec!["a.txt".to_string(), "b.md".to_string()],
        };
        assert_eq!(
            SubAgentExecutor::build_prompt(&agent, "do it", Some(&context)),
            "You are A.\n\nTask: do it\n\nContext:\nfiles: a.txt, b.md"
        );
    }

    #[test]
    fn test_context_only_with_files() {
        let mut files = FileStore::new();
        assert!(SubAgentContext::from_files(&files).is_none());
        files.write("b.md", "");
        files.write("a.txt", "");
        assert_eq!(
            SubAgentContext::from_files(&files).unwrap().files,
            vec!["a.txt", "b.md"]
        );
    }

    #[tokio::test]
    async fn test_delegate_single_system_message_without_tools() {
        let mock = Arc::new(MockProvider::with_script(vec![MockReply::text("summary")]));
        let model = ChatModel::new(mock.clone(), "mock");

        let out = executor()
            .delegate("research-agent", "find facts", &model, None)
            .await;
        assert_eq!(out, "summary");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tool_names.is_empty());
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role(), Role::System);
        assert!(requests[0].messages[0]
            .content()
            .ends_with("\n\nTask: find facts"));
    }

    #[tokio::test]
    async fn test_delegate_unknown_and_failure() {
        let mock = Arc::new(MockProvider::with_script(vec![MockReply::fail("boom")]));
        let model = ChatModel::new(mock.clone(), "mock");
        let executor = executor();

        let out = executor.delegate("unknown-agent", "x", &model, None).await;
        assert_eq!(
            out,
            "Error: Unknown sub-agent 'unknown-agent'. Available: research-agent, writing-agent, analysis-agent"
        );
        assert!(mock.requests().is_empty());

        let out = executor.delegate("analysis-agent", "x", &model, None).await;
        assert!(out.starts_with("Error: Sub-agent analysis-agent failed:"));
        assert!(out.contains("boom"));
    }
}
