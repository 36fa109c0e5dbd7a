//! Append-only transcript of debate turns.
//!
//! The transcript IS the conversation history: every subsequent prompt
//! embeds it, and the UI renders it. Turns are immutable once appended;
//! the only mutation the store offers is `append`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::directive::Directive;
use super::state::AgentRole;

/// One persona's contribution within one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub agent: AgentRole,
    /// The displayed text, directive tags already stripped.
    pub text: String,
    /// Round the turn belongs to (1-indexed).
    pub round: u32,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
    /// Arbiter directive, populated only for arbiter turns and only
    /// when it is not a plain continuation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<Directive>,
}

impl Turn {
    /// A plain (non-arbiter) turn.
    pub fn new(agent: AgentRole, text: impl Into<String>, round: u32) -> Self {
        Self {
            agent,
            text: text.into(),
            round,
            timestamp: Utc::now(),
            directive: None,
        }
    }

    /// An arbiter turn carrying a parsed directive. `Continue` is the
    /// unmarked case and stored as `None`.
    pub fn arbiter(text: impl Into<String>, round: u32, directive: Directive) -> Self {
        Self {
            agent: AgentRole::Arbiter,
            text: text.into(),
            round,
            timestamp: Utc::now(),
            directive: directive.is_special().then_some(directive),
        }
    }
}

/// A turn as it travels in gateway request bodies — the subset of
/// fields the prompt builder on the far side consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    pub agent: AgentRole,
    pub text: String,
    pub round: u32,
}

impl From<&Turn> for WireTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            agent: turn.agent,
            text: turn.text.clone(),
            round: turn.round,
        }
    }
}

/// Ordered, append-only log of turns for one debate run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn. Turns are never modified or removed.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Wire-shaped history for gateway request bodies.
    pub fn wire_history(&self) -> Vec<WireTurn> {
        self.turns.iter().map(WireTurn::from).collect()
    }

    /// Agent- and round-labeled serialization for prompt construction:
    /// `[ARCHITECT - ROUND 1]: …` blocks separated by blank lines.
    pub fn render_history(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                format!(
                    "[{} - ROUND {}]: {}",
                    t.agent.to_string().to_uppercase(),
                    t.round,
                    t.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
