use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Windows 11 readiness verdict for one workstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Readiness {
    Pass,
    Fail,
    Unsupported,
    Offline,
    Unknown,
}

impl Readiness {
    pub const fn as_str(self) -> &'static str {
        match self {
            Readiness::Pass => "Pass",
            Readiness::Fail => "Fail",
            Readiness::Unsupported => "Unsupported",
            Readiness::Offline => "Offline",
            Readiness::Unknown => "Unknown",
        }
    }

    /// Offline and Unknown share one bucket in every count.
    pub const fn is_offline_bucket(self) -> bool {
        matches!(self, Readiness::Offline | Readiness::Unknown)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Readiness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Readiness::Pass),
            "fail" => Ok(Readiness::Fail),
            "unsupported" => Ok(Readiness::Unsupported),
            "offline" => Ok(Readiness::Offline),
            "unknown" => Ok(Readiness::Unknown),
            other => Err(format!(
                "invalid readiness status: {other} (expected Pass|Fail|Unsupported|Offline|Unknown)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecureBoot {
    Enabled,
    #[serde(rename = "Capable but Disabled")]
    CapableButDisabled,
    #[serde(rename = "Not Capable")]
    NotCapable,
    Unknown,
    Offline,
}

impl SecureBoot {
    pub const fn as_str(self) -> &'static str {
        match self {
            SecureBoot::Enabled => "Enabled",
            SecureBoot::CapableButDisabled => "Capable but Disabled",
            SecureBoot::NotCapable => "Not Capable",
            SecureBoot::Unknown => "Unknown",
            SecureBoot::Offline => "Offline",
        }
    }
}

impl fmt::Display for SecureBoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_parses_case_insensitively() {
        assert_eq!(" pass ".parse::<Readiness>(), Ok(Readiness::Pass));
        assert_eq!("UNSUPPORTED".parse::<Readiness>(), Ok(Readiness::Unsupported));
        assert!("maybe".parse::<Readiness>().is_err());
    }

    #[test]
    fn secure_boot_serializes_with_display_labels() {
        let v = serde_json::to_value(SecureBoot::CapableButDisabled).expect("serialize");
        assert_eq!(v, serde_json::json!("Capable but Disabled"));
        let v = serde_json::to_value(SecureBoot::NotCapable).expect("serialize");
        assert_eq!(v, serde_json::json!("Not Capable"));
    }
}
