//! # Command Encoder
//!
//! Inverse of the decoder for command-capable channels: a typed value is
//! checked against the channel's domain, converted to raw bits and written
//! into a zeroed payload together with the channel's fixed command bits.
//! Values outside the domain are rejected before any bit is written.

use crate::eep::{ChannelSpec, ProfileDescriptor, ValueKind};
use crate::error::EnOceanError;
use crate::payload::value::CommandValue;
use crate::util::bits::insert_bits;

fn out_of_domain(channel: &ChannelSpec, detail: String) -> EnOceanError {
    EnOceanError::CommandOutOfDomain {
        channel: channel.name.clone(),
        detail,
    }
}

/// Raw bits for `value` on `channel`.
pub fn command_raw(channel: &ChannelSpec, value: &CommandValue) -> Result<u32, EnOceanError> {
    match (&channel.kind, value) {
        (ValueKind::Value(scale), CommandValue::Number(v)) => scale.to_raw(*v).ok_or_else(|| {
            let (lo, hi) = scale.physical_bounds();
            out_of_domain(channel, format!("{v} outside [{lo}, {hi}]"))
        }),
        (ValueKind::Value(scale), CommandValue::Bool(on)) => {
            let (lo, hi) = scale.physical_bounds();
            let target = if *on { hi } else { lo };
            scale
                .to_raw(target)
                .ok_or_else(|| out_of_domain(channel, format!("{target} not representable")))
        }
        (ValueKind::Enum { .. }, CommandValue::Symbol(symbol)) => channel
            .kind
            .raw_for_symbol(symbol)
            .ok_or_else(|| out_of_domain(channel, format!("unknown symbol {symbol}"))),
        (ValueKind::Enum { .. }, CommandValue::Number(v)) => {
            let raw = *v as u32;
            if v.fract() == 0.0 && *v >= 0.0 && channel.kind.symbol_for(raw).is_some() {
                Ok(raw)
            } else {
                Err(out_of_domain(channel, format!("{v} is not an enum value")))
            }
        }
        (ValueKind::Boolean, CommandValue::Bool(on)) => Ok(u32::from(*on)),
        (ValueKind::Boolean, CommandValue::Number(v)) if *v == 0.0 || *v == 1.0 => Ok(*v as u32),
        (kind, value) => Err(out_of_domain(
            channel,
            format!("{value} does not fit a {} channel", kind.name()),
        )),
    }
}

/// Write `value` and the channel's fixed command bits into `payload`.
pub fn encode_channel(
    payload: &mut [u8],
    channel: &ChannelSpec,
    value: &CommandValue,
) -> Result<(), EnOceanError> {
    let raw = command_raw(channel, value)?;

    for bits in &channel.command_bits {
        if !insert_bits(payload, bits.offset, bits.size, bits.value) {
            return Err(out_of_domain(
                channel,
                format!("command bits at {} do not fit the payload", bits.offset),
            ));
        }
    }
    if !insert_bits(payload, channel.offset, channel.size, raw) {
        return Err(out_of_domain(
            channel,
            format!("bits {} width {} do not fit the payload", channel.offset, channel.size),
        ));
    }
    Ok(())
}

/// Build the user data of a command telegram for `channel_name`.
pub fn encode_command_payload(
    profile: &ProfileDescriptor,
    channel_name: &str,
    value: &CommandValue,
) -> Result<Vec<u8>, EnOceanError> {
    let channel = profile
        .channel(channel_name)
        .ok_or_else(|| EnOceanError::UnknownChannel {
            eep: profile.eep,
            channel: channel_name.to_string(),
        })?;
    if !channel.is_command_capable() {
        return Err(EnOceanError::NotCommandCapable(channel.name.clone()));
    }

    let mut payload = vec![0u8; profile.data_len];
    encode_channel(&mut payload, channel, value)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eep::{EepId, ProfileRegistry};

    fn profile(eep: &str) -> ProfileDescriptor {
        let registry = ProfileRegistry::builtin().unwrap();
        registry.lookup(&eep.parse::<EepId>().unwrap()).unwrap().clone()
    }

    #[test]
    fn test_fan_speed_payload() {
        let profile = profile("D2-50-00");
        let payload =
            encode_command_payload(&profile, "fan_speed", &CommandValue::Number(50.0)).unwrap();
        assert_eq!(payload, vec![0x00, 125, 0x00, 0x00]);
    }

    #[test]
    fn test_fixed_command_bits_written() {
        let profile = profile("A5-38-08");
        let payload = encode_command_payload(&profile, "edim", &CommandValue::Number(40.0)).unwrap();
        // CMD 2, EDIM 40, LRN data telegram, switched on
        assert_eq!(payload, vec![0x02, 40, 0x00, 0x09]);

        let payload = encode_command_payload(&profile, "sw", &CommandValue::Bool(false)).unwrap();
        assert_eq!(payload, vec![0x01, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn test_enum_by_symbol_and_number() {
        let profile = profile("D2-50-00");
        let boost = profile.channel("boost").unwrap();
        assert_eq!(command_raw(boost, &CommandValue::Symbol("active".into())).unwrap(), 2);
        assert_eq!(command_raw(boost, &CommandValue::Number(1.0)).unwrap(), 1);
        assert!(command_raw(boost, &CommandValue::Number(3.0)).is_err());
        assert!(command_raw(boost, &CommandValue::Number(1.5)).is_err());
        assert!(command_raw(boost, &CommandValue::Symbol("turbo".into())).is_err());
    }

    #[test]
    fn test_out_of_domain_rejected() {
        let profile = profile("D2-50-00");
        let err = encode_command_payload(&profile, "fan_speed", &CommandValue::Number(100.5))
            .unwrap_err();
        assert!(matches!(err, EnOceanError::CommandOutOfDomain { .. }));
        let err = encode_command_payload(&profile, "fan_speed", &CommandValue::Symbol("max".into()))
            .unwrap_err();
        assert!(matches!(err, EnOceanError::CommandOutOfDomain { .. }));
    }

    #[test]
    fn test_read_only_and_unknown_channels() {
        let profile = profile("D2-50-00");
        assert!(matches!(
            encode_command_payload(&profile, "message_type", &CommandValue::Number(0.0)),
            Err(EnOceanError::NotCommandCapable(_))
        ));
        assert!(matches!(
            encode_command_payload(&profile, "missing", &CommandValue::Number(0.0)),
            Err(EnOceanError::UnknownChannel { .. })
        ));
    }
}
