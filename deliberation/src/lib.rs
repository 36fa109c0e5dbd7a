//! Deliberation — the debate core of the war room consulting engine.
//!
//! This library provides:
//! - A typed state machine for the Architect → Destroyer → Arbiter
//!   persona rotation (`debate::state`, `debate::orchestrator`)
//! - The arbiter's bracket-tag control protocol (`debate::directive`)
//! - An append-only transcript of debate turns (`debate::transcript`)
//! - A bounded exponential-backoff retry policy shared by every
//!   gateway call (`retry`)
//! - A broadcast event bus so a UI layer can render turns live
//!   (`events`)
//!
//! No network I/O happens here. The binary crate owns the model
//! gateway client and feeds completed turns into the orchestrator; the
//! orchestrator decides whether the debate repeats a round, advances,
//! or terminates into synthesis.

pub mod debate;
pub mod events;
pub mod retry;

pub use debate::directive::{parse_directive, strip_directive_tags, Directive};
pub use debate::orchestrator::{
    DebateConfig, DebateError, DebateOrchestrator, DebateOutcome, NextAction,
};
pub use debate::state::{AgentRole, DebatePhase, DebateSession, DebateTransition, TransitionError};
pub use debate::transcript::{Transcript, Turn, WireTurn};
pub use events::{EngineEvent, EventBus, SharedEventBus};
pub use retry::{with_retry, RetryPolicy};
