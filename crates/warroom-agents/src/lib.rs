//! War-room engine: intake, research, adversarial debate, synthesis.
//!
//! Builds on the `deliberation` crate's debate core and adds the
//! side-effectful layers around it: the model-gateway HTTP client, the
//! per-phase services with retry and fallback, the debate runner, and
//! the macro phase controller.

pub mod config;
pub mod gateway;
pub mod intake;
pub mod phases;
pub mod runner;
pub mod services;

pub use config::EngineConfig;
pub use gateway::{Action, Gateway, GatewayRequest, HttpGateway};
pub use intake::{EngagementContext, IntakeData};
pub use phases::{EngagementReport, Engine, EnginePhase, PhaseController, PhaseError};
pub use runner::DebateRunner;
pub use services::PersonaServices;
