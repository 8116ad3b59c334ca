//! Home Assistant platform kinds and entity presentation enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity platform a channel surfaces on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Sensor,
    BinarySensor,
    Switch,
    Light,
    Button,
    Number,
    Select,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 7] = [
        PlatformKind::Sensor,
        PlatformKind::BinarySensor,
        PlatformKind::Switch,
        PlatformKind::Light,
        PlatformKind::Button,
        PlatformKind::Number,
        PlatformKind::Select,
    ];

    /// Platforms whose entities can send values back to the device.
    pub fn is_command_capable(self) -> bool {
        matches!(
            self,
            PlatformKind::Switch
                | PlatformKind::Light
                | PlatformKind::Button
                | PlatformKind::Number
                | PlatformKind::Select
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Sensor => "sensor",
            PlatformKind::BinarySensor => "binary_sensor",
            PlatformKind::Switch => "switch",
            PlatformKind::Light => "light",
            PlatformKind::Button => "button",
            PlatformKind::Number => "number",
            PlatformKind::Select => "select",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a non-primary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    /// Changes device configuration
    Config,
    /// Exposes diagnostics such as battery or RSSI
    Diagnostic,
}

impl EntityCategory {
    /// Accepts the value form (`diagnostic`) or member form (`DIAGNOSTIC`).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "config" => Some(EntityCategory::Config),
            "diagnostic" => Some(EntityCategory::Diagnostic),
            _ => None,
        }
    }
}

/// Long-term statistics class of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_capable_platforms() {
        let capable: Vec<_> = PlatformKind::ALL
            .iter()
            .filter(|p| p.is_command_capable())
            .map(|p| p.as_str())
            .collect();
        assert_eq!(capable, ["switch", "light", "button", "number", "select"]);
    }

    #[test]
    fn test_platform_serde_names() {
        let kind: PlatformKind = serde_yaml::from_str("binary_sensor").unwrap();
        assert_eq!(kind, PlatformKind::BinarySensor);
        assert_eq!(kind.to_string(), "binary_sensor");
    }

    #[test]
    fn test_entity_category_parse() {
        assert_eq!(EntityCategory::parse("DIAGNOSTIC"), Some(EntityCategory::Diagnostic));
        assert_eq!(EntityCategory::parse("config"), Some(EntityCategory::Config));
        assert_eq!(EntityCategory::parse("system"), None);
    }
}
