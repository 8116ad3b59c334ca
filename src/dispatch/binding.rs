//! Per-device runtime state.

use crate::dispatch::entity::{entities_for, EntityDescriptor};
use crate::eep::{EepId, ProfileDescriptor};
use crate::payload::ChannelValue;
use crate::telegram::DeviceAddress;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
}

/// A device paired with its profile and the entities created for it.
///
/// A new binding starts `Available` with `last_seen` set to its creation
/// time, so a restored device that never speaks goes unavailable one
/// timeout after startup.
#[derive(Debug, Clone)]
pub struct DeviceBinding {
    pub address: DeviceAddress,
    pub eep: EepId,
    pub entities: Vec<EntityDescriptor>,
    states: HashMap<String, ChannelValue>,
    availability: Availability,
    last_seen: Instant,
    last_rssi: Option<i8>,
}

impl DeviceBinding {
    pub fn new(address: DeviceAddress, profile: &ProfileDescriptor, now: Instant) -> Self {
        Self {
            address,
            eep: profile.eep,
            entities: entities_for(&address, profile),
            states: HashMap::new(),
            availability: Availability::Available,
            last_seen: now,
            last_rssi: None,
        }
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn last_rssi(&self) -> Option<i8> {
        self.last_rssi
    }

    pub fn state(&self, channel: &str) -> Option<&ChannelValue> {
        self.states.get(channel)
    }

    pub fn entity_for_channel(&self, channel: &str) -> Option<&EntityDescriptor> {
        self.entities
            .iter()
            .find(|e| e.channel.as_deref() == Some(channel))
    }

    pub(crate) fn set_state(&mut self, channel: &str, value: ChannelValue) {
        self.states.insert(channel.to_string(), value);
    }

    pub(crate) fn set_rssi(&mut self, dbm: i8) {
        self.last_rssi = Some(dbm);
    }

    /// Record a received telegram. Returns the new state when the device
    /// was unavailable.
    pub fn on_telegram(&mut self, now: Instant) -> Option<Availability> {
        self.last_seen = now;
        if self.availability == Availability::Unavailable {
            self.availability = Availability::Available;
            Some(Availability::Available)
        } else {
            None
        }
    }

    /// Mark the device unavailable once `timeout` has passed since it was
    /// last seen. Returns the new state on a real transition only.
    pub fn check_timeout(&mut self, now: Instant, timeout: Duration) -> Option<Availability> {
        if self.availability == Availability::Available
            && now.saturating_duration_since(self.last_seen) >= timeout
        {
            self.availability = Availability::Unavailable;
            Some(Availability::Unavailable)
        } else {
            None
        }
    }
}
