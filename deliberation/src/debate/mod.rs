//! Debate Orchestration — Architect/Destroyer/Arbiter war room loop
//!
//! State machine for the fixed-order persona rotation that drives one
//! consulting debate. The Arbiter closes every cycle with a bracket-tag
//! directive that decides whether the cycle repeats, the round
//! advances, or the debate terminates into synthesis.
//!
//! # Debate Flow
//!
//! ```text
//! ArchitectTurn → DestroyerTurn → ArbiterTurn → [directive?]
//!      ▲                                             │
//!      ├── [VETO] same round ────────────────────────┤
//!      ├── [MECE CHECK] / [CONTINUE] round+1 ────────┤
//!      │        (while cycle budget remains)         │
//!      │                                             ▼
//!      │                [CONSENSUS GRANTED] or budget spent
//!      │                                             │
//!      └───────────── cancel at any point ──→ Terminated
//! ```

pub mod directive;
pub mod orchestrator;
pub mod state;
pub mod transcript;

pub use directive::{parse_directive, strip_directive_tags, Directive};
pub use orchestrator::{DebateConfig, DebateError, DebateOrchestrator, DebateOutcome, NextAction};
pub use state::{AgentRole, DebatePhase, DebateSession, DebateTransition, TransitionError};
pub use transcript::{Transcript, Turn, WireTurn};
