//! Typed channel values produced by the decoder and accepted by the encoder.

use serde::Serialize;
use std::fmt;

/// Decoded value of one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Number(f64),
    Enum { raw: u32, symbol: String },
    Bool(bool),
}

impl ChannelValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            ChannelValue::Enum { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ChannelValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Number(v) => write!(f, "{v}"),
            ChannelValue::Enum { symbol, .. } => f.write_str(symbol),
            ChannelValue::Bool(b) => write!(f, "{}", if *b { "on" } else { "off" }),
        }
    }
}

/// Why a channel could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidReason {
    /// Raw value outside the declared raw range
    OutOfRange { raw: u32 },
    /// Raw value has no enum item
    UnmappedEnum { raw: u32 },
    /// Bit range runs past the received payload
    OutOfBounds {
        offset: u16,
        size: u16,
        payload_bits: usize,
    },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::OutOfRange { raw } => write!(f, "raw value {raw} out of range"),
            InvalidReason::UnmappedEnum { raw } => write!(f, "raw value {raw} has no enum item"),
            InvalidReason::OutOfBounds {
                offset,
                size,
                payload_bits,
            } => write!(
                f,
                "bits {offset}..{} beyond {payload_bits}-bit payload",
                usize::from(*offset) + usize::from(*size)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

/// One channel of a decoded telegram.
///
/// An invalid value keeps its raw integer (when one could be read) but never
/// carries a typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedValue {
    pub channel: String,
    pub raw: Option<u32>,
    pub value: Option<ChannelValue>,
    pub validity: Validity,
}

impl DecodedValue {
    pub fn valid(channel: &str, raw: u32, value: ChannelValue) -> Self {
        Self {
            channel: channel.to_string(),
            raw: Some(raw),
            value: Some(value),
            validity: Validity::Valid,
        }
    }

    pub fn invalid(channel: &str, raw: Option<u32>, reason: InvalidReason) -> Self {
        Self {
            channel: channel.to_string(),
            raw,
            value: None,
            validity: Validity::Invalid(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// A value an entity wants written to its device.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandValue {
    Number(f64),
    Symbol(String),
    Bool(bool),
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Number(v) => write!(f, "{v}"),
            CommandValue::Symbol(s) => f.write_str(s),
            CommandValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<ChannelValue> for CommandValue {
    fn from(value: ChannelValue) -> Self {
        match value {
            ChannelValue::Number(v) => CommandValue::Number(v),
            ChannelValue::Enum { symbol, .. } => CommandValue::Symbol(symbol),
            ChannelValue::Bool(b) => CommandValue::Bool(b),
        }
    }
}
