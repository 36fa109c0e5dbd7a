//! Engagement intake — the client's business situation.
//!
//! Field names serialize in camelCase because the same record travels
//! in gateway request bodies; the intake TOML uses the identical keys.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Structured record of the client's situation, filled in during the
/// intake phase. Immutable once the debate starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeData {
    /// One-line description of the company.
    pub company_one_liner: String,
    pub industry: String,
    pub size: String,
    pub ideal_customer: String,
    /// The core problem the engagement is about.
    pub core_problem: String,
    /// What the client has already tried.
    pub attempts: String,
    /// Urgency, 1–100.
    pub urgency: u8,
    pub success_vision: String,
    pub budget: String,
    pub constraints: String,
    pub competitors: String,
    /// Self-assessed clarity on the problem, 1–5.
    pub clarity: u8,
    /// Kinds of advice requested.
    pub advice_type: Vec<String>,
}

impl IntakeData {
    /// Load intake answers from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read intake file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse intake file {}", path.display()))
    }
}

/// Immutable input to the whole debate: the intake record plus the
/// research brief produced by the research phase. Created once at the
/// phase transition into debate; read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementContext {
    pub intake: IntakeData,
    pub research: String,
}

impl EngagementContext {
    pub fn new(intake: IntakeData, research: String) -> Self {
        Self { intake, research }
    }
}
