//! # Entity Dispatcher
//!
//! Routes decoded values to entities, encodes commands back into telegrams
//! and tracks per-device availability.

pub mod binding;
pub mod entity;
pub mod sink;

pub use binding::{Availability, DeviceBinding};
pub use entity::{entities_for, platforms_for, unique_id, EntityDescriptor, RSSI_ENTITY};
pub use sink::{EntitySink, LogSink, RecordingSink, SinkEvent};

use crate::eep::ProfileDescriptor;
use crate::error::EnOceanError;
use crate::payload::{encode_command_payload, CommandValue, DecodedValue, InvalidReason, Validity};
use crate::telegram::{DeviceAddress, Telegram};
use log::debug;

/// Outcome of pushing one telegram's values to a binding's entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Unique ids that received a value
    pub updated: Vec<String>,
    /// Channels left without an update, with the reason
    pub skipped: Vec<(String, InvalidReason)>,
}

impl ApplyReport {
    pub fn all_valid(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Push every valid value to its entity; invalid values leave the entity's
/// previous state untouched.
pub fn apply(
    binding: &mut DeviceBinding,
    values: &[DecodedValue],
    sink: &mut dyn EntitySink,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for decoded in values {
        match (&decoded.validity, &decoded.value) {
            (Validity::Valid, Some(value)) => {
                let Some(entity) = binding.entity_for_channel(&decoded.channel) else {
                    debug!(
                        "{} channel {} has no entity, value dropped",
                        binding.address, decoded.channel
                    );
                    continue;
                };
                sink.update(entity, value);
                report.updated.push(entity.unique_id.clone());
                binding.set_state(&decoded.channel, value.clone());
            }
            (Validity::Invalid(reason), _) => {
                debug!(
                    "{} channel {} not updated: {reason}",
                    binding.address, decoded.channel
                );
                report.skipped.push((decoded.channel.clone(), *reason));
            }
            (Validity::Valid, None) => {}
        }
    }
    report
}

/// Forward the telegram's signal strength to the binding's RSSI entity.
pub fn apply_rssi(binding: &mut DeviceBinding, dbm: i8, sink: &mut dyn EntitySink) {
    binding.set_rssi(dbm);
    if let Some(entity) = binding.entities.iter().find(|e| e.channel.is_none()) {
        sink.rssi(entity, dbm);
    }
}

/// Encode `value` for `channel` into a telegram from `sender` addressed to
/// the bound device.
pub fn encode_command(
    binding: &DeviceBinding,
    profile: &ProfileDescriptor,
    channel: &str,
    value: &CommandValue,
    sender: DeviceAddress,
) -> Result<Telegram, EnOceanError> {
    if profile.eep != binding.eep {
        return Err(EnOceanError::ProfileNotFound(binding.eep));
    }
    let payload = encode_command_payload(profile, channel, value)?;
    debug!(
        "Encoded {channel}={value} for {} as {}",
        binding.address,
        crate::util::hex::format_hex_compact(&payload)
    );
    Ok(Telegram::new(profile.eep.rorg, payload, sender).with_destination(binding.address))
}
