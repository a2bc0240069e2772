//! Agent loop state management
//!
//! Tracks where the AGENT/TOOLS/END state machine is for one request and how
//! many model invocations it has spent.

use crate::core::Message;

/// Next thing the loop will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Invoke the model
    Agent,
    /// Execute the tool calls of the latest ai message
    Tools,
    /// Done
    End,
}

/// State of the agent loop for one request
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    /// Next step
    pub step: Step,
    /// Model invocations so far
    pub turn: usize,
    /// Maximum model invocations (`None` = unlimited)
    pub max_turns: Option<usize>,
}

impl AgentLoopState {
    /// Fresh state, starting at `Agent`
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            step: Step::Agent,
            turn: 0,
            max_turns,
        }
    }

    /// Check if the loop should continue
    pub fn should_continue(&self) -> bool {
        self.step != Step::End
    }

    /// Whether another model invocation fits under the cap
    pub fn has_budget(&self) -> bool {
        self.max_turns.map_or(true, |max| self.turn < max)
    }

    /// Record a model reply and pick the next step from it
    pub fn after_agent(&mut self, reply: &Message) {
        self.turn += 1;
        self.step = if reply.has_tool_calls() {
            Step::Tools
        } else {
            Step::End
        };
    }

    /// A tool batch finished
    pub fn after_tools(&mut self) {
        self.step = Step::Agent;
    }

    /// Give up because the cap was reached; returns the closing ai message
    pub fn exhaust(&mut self) -> Message {
        self.step = Step::End;
        Message::ai(format!(
            "Error: Agent stopped after {} steps without a final answer.",
            self.turn
        ))
    }
}
