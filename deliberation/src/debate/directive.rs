//! Arbiter directive protocol — bracket tags embedded in generated text.
//!
//! The arbiter is instructed to end its critique with exactly one of
//! four literal tags. Models do not always comply, so extraction is
//! best-effort: a missing or unrecognized tag defaults to `Continue`,
//! and every occurrence of any tag is stripped from the displayed text.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The arbiter's per-cycle control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Reset the round — the architect must restate with more rigor.
    Veto,
    /// Audit pass; the round still advances.
    MeceCheck,
    /// Debate over — hand off to synthesis.
    Consensus,
    /// Plain continuation (also the default for malformed output).
    Continue,
}

impl Directive {
    /// Wire string used in gateway requests (`lastArbiterCommand`).
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Self::Veto => "veto",
            Self::MeceCheck => "mece_check",
            Self::Consensus => "consensus",
            Self::Continue => "normal",
        }
    }

    /// Whether this directive carries a special badge in transcripts.
    ///
    /// `Continue` is the unmarked case — turns store it as `None`.
    pub fn is_special(self) -> bool {
        self != Self::Continue
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

const VETO_TAG: &str = "[VETO]";
const MECE_TAG: &str = "[MECE CHECK]";
const CONSENSUS_TAG: &str = "[CONSENSUS GRANTED]";

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[(VETO|MECE CHECK|CONSENSUS GRANTED|CONTINUE)\]")
            .expect("tag pattern is valid")
    })
}

/// Extract the directive from raw arbiter output and strip all tag
/// occurrences from the displayed text.
///
/// Detection checks the whole text (models sometimes emit the tag
/// mid-response), in veto → mece → consensus priority. No recognized
/// tag means `Continue`.
pub fn parse_directive(raw: &str) -> (String, Directive) {
    let directive = if raw.contains(VETO_TAG) {
        Directive::Veto
    } else if raw.contains(MECE_TAG) {
        Directive::MeceCheck
    } else if raw.contains(CONSENSUS_TAG) {
        Directive::Consensus
    } else {
        Directive::Continue
    };

    (strip_directive_tags(raw), directive)
}

/// Remove every occurrence of any of the four tags and trim.
pub fn strip_directive_tags(raw: &str) -> String {
    tag_pattern().replace_all(raw, "").trim().to_string()
}
