//! Profile descriptors and channel specifications.
//!
//! These are the validated, immutable forms produced by the profile table
//! loader. A [`ProfileDescriptor`] owns its ordered [`ChannelSpec`]s; nothing
//! here is mutated after the registry is built.

use crate::eep::id::EepId;
use crate::eep::platform::{EntityCategory, PlatformKind, StateClass};
use serde::Serialize;

/// Linear map from a raw integer range to a physical range.
///
/// `raw_min` may exceed `raw_max` for inverted scales such as A5-02-05,
/// where raw 255 is 0 °C and raw 0 is 40 °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericScale {
    pub raw_min: u32,
    pub raw_max: u32,
    pub min: f64,
    pub max: f64,
}

impl NumericScale {
    /// Raw integer range with no physical scaling.
    pub fn identity(raw_min: u32, raw_max: u32) -> Self {
        Self {
            raw_min,
            raw_max,
            min: f64::from(raw_min),
            max: f64::from(raw_max),
        }
    }

    /// Raw bounds ordered low to high.
    pub fn raw_bounds(&self) -> (u32, u32) {
        (self.raw_min.min(self.raw_max), self.raw_min.max(self.raw_max))
    }

    /// Physical bounds ordered low to high.
    pub fn physical_bounds(&self) -> (f64, f64) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    pub fn contains_raw(&self, raw: u32) -> bool {
        let (lo, hi) = self.raw_bounds();
        (lo..=hi).contains(&raw)
    }

    /// Physical size of one raw step.
    pub fn step(&self) -> f64 {
        ((self.max - self.min) / (f64::from(self.raw_max) - f64::from(self.raw_min))).abs()
    }

    /// Scale a raw value; `None` when outside the declared raw range.
    pub fn to_physical(&self, raw: u32) -> Option<f64> {
        if !self.contains_raw(raw) {
            return None;
        }
        let raw_span = f64::from(self.raw_max) - f64::from(self.raw_min);
        Some(self.min + (f64::from(raw) - f64::from(self.raw_min)) * (self.max - self.min) / raw_span)
    }

    /// Inverse of [`to_physical`](Self::to_physical), rounding to the
    /// nearest raw step; `None` when `value` lies outside the physical range.
    pub fn to_raw(&self, value: f64) -> Option<u32> {
        if !value.is_finite() {
            return None;
        }
        let (lo, hi) = self.physical_bounds();
        let slack = (hi - lo) * 1e-9;
        if value < lo - slack || value > hi + slack {
            return None;
        }

        let raw_span = f64::from(self.raw_max) - f64::from(self.raw_min);
        let raw = f64::from(self.raw_min) + (value - self.min) * raw_span / (self.max - self.min);
        let (raw_lo, raw_hi) = self.raw_bounds();
        let rounded = raw.round().clamp(f64::from(raw_lo), f64::from(raw_hi));
        Some(rounded as u32)
    }
}

/// One raw value to symbol mapping of an enum channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumItem {
    pub value: u32,
    pub symbol: String,
    pub description: Option<String>,
}

/// Entity id suffix for a channel name: lowercase, spaces as underscores.
pub fn entity_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// How a channel's raw bits are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    Value(NumericScale),
    /// Items sorted by raw value.
    Enum { items: Vec<EnumItem> },
    Boolean,
}

impl ValueKind {
    pub fn symbol_for(&self, raw: u32) -> Option<&str> {
        match self {
            ValueKind::Enum { items } => items
                .binary_search_by_key(&raw, |item| item.value)
                .ok()
                .map(|index| items[index].symbol.as_str()),
            _ => None,
        }
    }

    pub fn raw_for_symbol(&self, symbol: &str) -> Option<u32> {
        match self {
            ValueKind::Enum { items } => items
                .iter()
                .find(|item| item.symbol == symbol)
                .map(|item| item.value),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Value(_) => "value",
            ValueKind::Enum { .. } => "enum",
            ValueKind::Boolean => "boolean",
        }
    }
}

/// Constant bits written next to a channel when encoding a command, such
/// as the command identifier nibble of a VLD actuator telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedBits {
    pub offset: u16,
    pub size: u16,
    pub value: u32,
}

/// Presentation metadata carried through to the entity layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityMeta {
    pub unit: Option<String>,
    pub device_class: Option<String>,
    pub state_class: Option<StateClass>,
    pub icon: Option<String>,
    pub entity_category: Option<EntityCategory>,
}

/// A named, independently decodable field of a telegram payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSpec {
    pub name: String,
    pub description: String,
    /// Bit offset from the MSB of the first data byte
    pub offset: u16,
    /// Width in bits
    pub size: u16,
    pub kind: ValueKind,
    pub platform: PlatformKind,
    pub meta: EntityMeta,
    pub command_bits: Vec<FixedBits>,
}

impl ChannelSpec {
    pub fn is_command_capable(&self) -> bool {
        self.platform.is_command_capable()
    }
}

/// Validated profile: identity, payload length and ordered channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDescriptor {
    pub eep: EepId,
    pub title: String,
    /// Declared user data length in bytes (excluding RORG, sender, status)
    pub data_len: usize,
    pub channels: Vec<ChannelSpec>,
}

impl ProfileDescriptor {
    pub fn channel(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn command_channels(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.channels.iter().filter(|c| c.is_command_capable())
    }
}
