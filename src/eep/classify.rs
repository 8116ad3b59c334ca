//! # Static Channel Classification
//!
//! Fills in what a profile table leaves out: the target platform, entity
//! metadata and normalised unit strings. Everything here runs once at load
//! time and looks only at the channel definition, never at decoded values.

use crate::eep::platform::{EntityCategory, PlatformKind, StateClass};
use crate::eep::profile::{EntityMeta, ValueKind};

/// Keywords marking a numeric field as a settable parameter.
const CONFIG_KEYWORDS: &[&str] = &[
    "volume", "speed", "setpoint", "target", "position", "bypass", "ventil",
];
const CONFIG_SHORTCUTS: &[&str] = &["VIT", "VOL", "POS", "VVENT"];

/// Largest physical span still treated as a parameter rather than a sensor scale.
const MAX_PARAMETER_SPAN: f64 = 10_000.0;

/// Pick a platform for a channel that declares none.
///
/// `name` is matched upper-cased the way EEP shortcuts (`TMP`, `CMD`, `R1`)
/// are written.
pub fn classify_platform(name: &str, description: &str, kind: &ValueKind) -> PlatformKind {
    let shortcut = name.to_ascii_uppercase();
    let desc = description.to_lowercase();

    match kind {
        ValueKind::Boolean => return PlatformKind::BinarySensor,
        ValueKind::Enum { items } => {
            let mut values: Vec<u32> = items.iter().map(|i| i.value).collect();
            values.sort_unstable();
            values.dedup();
            return if values == [0, 1] {
                PlatformKind::BinarySensor
            } else if shortcut.starts_with('R') && values.len() >= 3 {
                PlatformKind::Button
            } else if values.len() > 2 {
                PlatformKind::Select
            } else {
                PlatformKind::Sensor
            };
        }
        ValueKind::Value(_) => {}
    }

    if ["DIM", "BRI", "DMD"].iter().any(|k| shortcut.contains(k))
        || desc.contains("dimm")
        || desc.contains("brightness")
    {
        return PlatformKind::Light;
    }

    if shortcut == "CMD" || desc.contains("command") {
        return PlatformKind::Button;
    }

    if let ValueKind::Value(scale) = kind {
        let (lo, hi) = scale.physical_bounds();
        let span = hi - lo;
        let configurable = CONFIG_KEYWORDS.iter().any(|k| desc.contains(k))
            || CONFIG_SHORTCUTS.iter().any(|k| shortcut.contains(k));
        if span > 0.0 && span <= MAX_PARAMETER_SPAN && configurable {
            return PlatformKind::Number;
        }
    }

    PlatformKind::Sensor
}

struct Detector {
    keywords: &'static [&'static str],
    shortcuts: &'static [&'static str],
    device_class: Option<&'static str>,
    unit: Option<&'static str>,
    icon: &'static str,
    state_class: Option<StateClass>,
    category: Option<EntityCategory>,
}

impl Detector {
    fn matches(&self, desc: &str, shortcut: &str) -> bool {
        self.keywords.iter().any(|k| desc.contains(k))
            || self.shortcuts.iter().any(|s| shortcut.contains(s))
    }
}

const DETECTORS: &[Detector] = &[
    Detector {
        keywords: &["temperature", "temp"],
        shortcuts: &["TMP", "TEMP"],
        device_class: Some("temperature"),
        unit: Some("°C"),
        icon: "mdi:thermometer",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
    Detector {
        keywords: &["humidity", "humid"],
        shortcuts: &["HUM"],
        device_class: Some("humidity"),
        unit: Some("%"),
        icon: "mdi:water-percent",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
    Detector {
        keywords: &["battery", "batt"],
        shortcuts: &["BATT"],
        device_class: Some("battery"),
        unit: Some("%"),
        icon: "mdi:battery",
        state_class: Some(StateClass::Measurement),
        category: Some(EntityCategory::Diagnostic),
    },
    Detector {
        keywords: &["power"],
        shortcuts: &["POW", "PWR"],
        device_class: Some("power"),
        unit: Some("W"),
        icon: "mdi:lightning-bolt",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
    Detector {
        keywords: &["energy"],
        shortcuts: &["ENERGY"],
        device_class: Some("energy"),
        unit: Some("Wh"),
        icon: "mdi:lightning-bolt",
        state_class: Some(StateClass::TotalIncreasing),
        category: None,
    },
    Detector {
        keywords: &["voltage"],
        shortcuts: &["VOLT"],
        device_class: Some("voltage"),
        unit: Some("V"),
        icon: "mdi:flash",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
    Detector {
        keywords: &["illuminance", "lux"],
        shortcuts: &["LUX", "ILL"],
        device_class: Some("illuminance"),
        unit: Some("lx"),
        icon: "mdi:brightness-5",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
    Detector {
        keywords: &["motion", "presence", "occupancy"],
        shortcuts: &["PIR", "MOT"],
        device_class: None,
        unit: None,
        icon: "mdi:run",
        state_class: None,
        category: None,
    },
    Detector {
        keywords: &["co2", "carbon dioxide"],
        shortcuts: &["CO2"],
        device_class: Some("carbon_dioxide"),
        unit: Some("ppm"),
        icon: "mdi:molecule-co2",
        state_class: Some(StateClass::Measurement),
        category: None,
    },
];

/// Fill missing metadata from description and shortcut patterns.
///
/// Only the first matching detector applies and explicit values always win.
/// Units and state classes are only inferred for numeric channels.
pub fn auto_detect_meta(name: &str, description: &str, kind: &ValueKind, meta: &mut EntityMeta) {
    let shortcut = name.to_ascii_uppercase();
    let desc = description.to_lowercase();
    let numeric = matches!(kind, ValueKind::Value(_));

    let Some(detector) = DETECTORS.iter().find(|d| d.matches(&desc, &shortcut)) else {
        return;
    };

    if meta.device_class.is_none() && numeric {
        meta.device_class = detector.device_class.map(str::to_string);
    }
    if meta.unit.is_none() && numeric {
        meta.unit = detector.unit.map(str::to_string);
    }
    if meta.state_class.is_none() && numeric {
        meta.state_class = detector.state_class;
    }
    if meta.icon.is_none() {
        meta.icon = Some(detector.icon.to_string());
    }
    if meta.entity_category.is_none() {
        meta.entity_category = detector.category;
    }
}

/// Map common unit spellings onto their canonical symbol.
///
/// Unknown units are returned trimmed but otherwise untouched.
pub fn normalize_unit(unit: &str) -> Option<String> {
    let raw = unit.trim();
    if raw.is_empty() {
        return None;
    }

    let canonical = match raw.to_lowercase().as_str() {
        "%" | "percent" | "percentage" => "%",
        "c" | "°c" | "celsius" | "degc" => "°C",
        "f" | "°f" | "fahrenheit" => "°F",
        "w" | "watt" | "watts" => "W",
        "wh" => "Wh",
        "kwh" => "kWh",
        "v" | "volt" | "volts" => "V",
        "a" | "amp" | "ampere" => "A",
        "lx" | "lux" => "lx",
        "ppm" => "ppm",
        "s" | "sec" | "seconds" => "s",
        "m3/h" | "m³/h" => "m³/h",
        _ => raw,
    };
    Some(canonical.to_string())
}
