use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Readiness, SecureBoot};

/// A hardware fact pulled out of diagnostic text, or the reason it is missing.
///
/// Serialized as a bare string: `"16GB"`, `"Unknown"`, `"Offline"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reading {
    Value(String),
    Unknown,
    Offline,
}

impl Reading {
    pub fn value(v: impl Into<String>) -> Self {
        Reading::Value(v.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Reading::Value(v) => v,
            Reading::Unknown => "Unknown",
            Reading::Offline => "Offline",
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Reading {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Unknown" => Reading::Unknown,
            "Offline" => Reading::Offline,
            _ => Reading::Value(s),
        }
    }
}

impl From<Reading> for String {
    fn from(r: Reading) -> Self {
        match r {
            Reading::Value(v) => v,
            other => other.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDiagnostics {
    pub win11_ready: Readiness,
    pub ram: Reading,
    pub tpm: Reading,
    pub cpu: Reading,
    pub os: Reading,
    pub secure_boot: SecureBoot,
}

impl ParsedDiagnostics {
    pub fn offline() -> Self {
        Self {
            win11_ready: Readiness::Offline,
            ram: Reading::Offline,
            tpm: Reading::Offline,
            cpu: Reading::Offline,
            os: Reading::Offline,
            secure_boot: SecureBoot::Offline,
        }
    }

    pub fn unknown() -> Self {
        Self {
            win11_ready: Readiness::Unknown,
            ram: Reading::Unknown,
            tpm: Reading::Unknown,
            cpu: Reading::Unknown,
            os: Reading::Unknown,
            secure_boot: SecureBoot::Unknown,
        }
    }

    pub fn is_all_offline(&self) -> bool {
        *self == Self::offline()
    }
}
