//! RORG/FUNC/TYPE triplet identifying an EnOcean Equipment Profile.

use crate::error::EnOceanError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Three-part EEP identifier, written `D2-50-00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EepId {
    pub rorg: u8,
    pub func: u8,
    pub type_: u8,
}

impl EepId {
    pub const fn new(rorg: u8, func: u8, type_: u8) -> Self {
        Self { rorg, func, type_ }
    }
}

impl fmt::Display for EepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}-{:02X}-{:02X}", self.rorg, self.func, self.type_)
    }
}

impl FromStr for EepId {
    type Err = EnOceanError;

    /// Accepts `D2-50-00`, `d2_50_00`, `D2:50:00` and `D25000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EnOceanError::InvalidEepId(s.to_string());
        let text = s.trim();

        let parts: Vec<&str> = if text.contains(['-', '_', ':']) {
            text.split(['-', '_', ':']).collect()
        } else if text.len() == 6 && text.is_ascii() {
            vec![&text[0..2], &text[2..4], &text[4..6]]
        } else {
            return Err(invalid());
        };

        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 3];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        Ok(EepId::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl Serialize for EepId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
