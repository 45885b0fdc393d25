use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flows::FlowKind;

/// The closed set of intents the orchestrator can dispatch on.
///
/// Classifier labels outside this set are routed to `General` rather than
/// rejected, so an out-of-date classifier never breaks a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Faq,
    Booking,
    Payment,
    Weather,
    General,
}

impl Intent {
    pub const KNOWN: &'static [Intent] =
        &[Intent::Faq, Intent::Booking, Intent::Payment, Intent::Weather, Intent::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Booking => "booking",
            Self::Payment => "payment",
            Self::Weather => "weather",
            Self::General => "general",
        }
    }

    /// Strict lookup. Used by verification parsing, where an unknown label
    /// must discard the verification instead of degrading to `General`.
    pub fn parse_known(label: &str) -> Result<Self, UnknownIntent> {
        match label.trim().to_ascii_lowercase().as_str() {
            "faq" => Ok(Self::Faq),
            "booking" => Ok(Self::Booking),
            "payment" => Ok(Self::Payment),
            "weather" => Ok(Self::Weather),
            "general" => Ok(Self::General),
            other => Err(UnknownIntent(other.to_owned())),
        }
    }

    /// Lenient lookup for classifier labels: anything unknown becomes
    /// `General`.
    pub fn from_label(label: &str) -> Self {
        Self::parse_known(label).unwrap_or(Self::General)
    }

    /// The multi-turn flow this intent opens, if any.
    pub fn flow(&self) -> Option<FlowKind> {
        match self {
            Self::Booking => Some(FlowKind::Booking),
            Self::Payment => Some(FlowKind::Payment),
            _ => None,
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_known(value)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown intent label `{0}`")]
pub struct UnknownIntent(pub String);

/// Raw output of the classification capability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub distribution: HashMap<String, f64>,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        let label = label.into();
        let distribution = HashMap::from([(label.clone(), confidence)]);
        Self { label, confidence, distribution }
    }
}
