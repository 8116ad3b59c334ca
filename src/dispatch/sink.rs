//! The boundary between the dispatcher and whatever presents entities.

use crate::dispatch::binding::Availability;
use crate::dispatch::entity::EntityDescriptor;
use crate::payload::ChannelValue;
use crate::telegram::DeviceAddress;
use log::info;

/// Receives entity updates from the dispatcher.
///
/// Implementations must not block: calls arrive on the telegram path.
pub trait EntitySink {
    /// A channel decoded to a valid value.
    fn update(&mut self, entity: &EntityDescriptor, value: &ChannelValue);

    /// A device changed availability.
    fn availability_changed(&mut self, address: &DeviceAddress, availability: Availability);

    /// Signal strength of the latest telegram from the entity's device.
    fn rssi(&mut self, _entity: &EntityDescriptor, _dbm: i8) {}
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Update {
        unique_id: String,
        value: ChannelValue,
    },
    Availability {
        address: DeviceAddress,
        availability: Availability,
    },
    Rssi {
        unique_id: String,
        dbm: i8,
    },
}

/// Keeps every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Values pushed to `unique_id`, oldest first.
    pub fn updates_for(&self, unique_id: &str) -> Vec<&ChannelValue> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Update { unique_id: id, value } if id == unique_id => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl EntitySink for RecordingSink {
    fn update(&mut self, entity: &EntityDescriptor, value: &ChannelValue) {
        self.events.push(SinkEvent::Update {
            unique_id: entity.unique_id.clone(),
            value: value.clone(),
        });
    }

    fn availability_changed(&mut self, address: &DeviceAddress, availability: Availability) {
        self.events.push(SinkEvent::Availability {
            address: *address,
            availability,
        });
    }

    fn rssi(&mut self, entity: &EntityDescriptor, dbm: i8) {
        self.events.push(SinkEvent::Rssi {
            unique_id: entity.unique_id.clone(),
            dbm,
        });
    }
}

/// Writes every update to the log at info level.
#[derive(Debug, Default)]
pub struct LogSink;

impl EntitySink for LogSink {
    fn update(&mut self, entity: &EntityDescriptor, value: &ChannelValue) {
        let unit = entity.meta.unit.as_deref().unwrap_or("");
        info!("{} [{}] = {value}{unit}", entity.unique_id, entity.platform);
    }

    fn availability_changed(&mut self, address: &DeviceAddress, availability: Availability) {
        info!("{address} is now {availability:?}");
    }

    fn rssi(&mut self, entity: &EntityDescriptor, dbm: i8) {
        info!("{} = {dbm} dBm", entity.unique_id);
    }
}
