//! # Telegram Decoder
//!
//! Extracts every channel of a profile from a telegram payload. Each channel
//! is decoded independently: a bad channel is marked invalid and its siblings
//! still decode. Only an unresolvable profile fails the whole telegram.

use crate::eep::{ChannelSpec, EepId, ProfileDescriptor, ProfileRegistry, ValueKind};
use crate::error::EnOceanError;
use crate::payload::value::{ChannelValue, DecodedValue, InvalidReason};
use crate::telegram::Telegram;
use crate::util::bits::extract_bits;
use log::trace;

/// Decode one channel from raw user data.
pub fn decode_channel(payload: &[u8], channel: &ChannelSpec) -> DecodedValue {
    let Some(raw) = extract_bits(payload, channel.offset, channel.size) else {
        return DecodedValue::invalid(
            &channel.name,
            None,
            InvalidReason::OutOfBounds {
                offset: channel.offset,
                size: channel.size,
                payload_bits: payload.len() * 8,
            },
        );
    };

    match &channel.kind {
        ValueKind::Value(scale) => match scale.to_physical(raw) {
            Some(value) => DecodedValue::valid(&channel.name, raw, ChannelValue::Number(value)),
            None => DecodedValue::invalid(&channel.name, Some(raw), InvalidReason::OutOfRange { raw }),
        },
        ValueKind::Enum { .. } => match channel.kind.symbol_for(raw) {
            Some(symbol) => DecodedValue::valid(
                &channel.name,
                raw,
                ChannelValue::Enum {
                    raw,
                    symbol: symbol.to_string(),
                },
            ),
            None => DecodedValue::invalid(&channel.name, Some(raw), InvalidReason::UnmappedEnum { raw }),
        },
        ValueKind::Boolean => DecodedValue::valid(&channel.name, raw, ChannelValue::Bool(raw != 0)),
    }
}

/// Decode all channels of `profile` in declaration order.
pub fn decode(telegram: &Telegram, profile: &ProfileDescriptor) -> Vec<DecodedValue> {
    let values: Vec<DecodedValue> = profile
        .channels
        .iter()
        .map(|channel| decode_channel(&telegram.payload, channel))
        .collect();

    trace!(
        "Decoded {} channels of {} from {}",
        values.len(),
        profile.eep,
        telegram.sender
    );
    values
}

/// Resolve `eep` and decode.
///
/// Fails with [`EnOceanError::ProfileNotFound`] when the triplet is unknown
/// and [`EnOceanError::RorgMismatch`] when the telegram belongs to a
/// different radio telegram type; no values are produced in either case.
pub fn decode_with_registry(
    telegram: &Telegram,
    eep: &EepId,
    registry: &ProfileRegistry,
) -> Result<Vec<DecodedValue>, EnOceanError> {
    let profile = registry.lookup(eep)?;
    if telegram.rorg != profile.eep.rorg {
        return Err(EnOceanError::RorgMismatch {
            telegram: telegram.rorg,
            profile: profile.eep,
        });
    }
    Ok(decode(telegram, profile))
}
