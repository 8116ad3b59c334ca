//! Entity descriptors derived from a profile.
//!
//! Everything here is static: platforms and entities follow from the
//! profile declaration alone, never from observed telegram values.

use crate::eep::{
    entity_key, ChannelSpec, EntityCategory, EntityMeta, PlatformKind, ProfileDescriptor, StateClass,
    ValueKind,
};
use crate::telegram::DeviceAddress;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

pub use crate::constants::RSSI_ENTITY;

/// What a platform needs to instantiate one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    /// `<aa_bb_cc_dd>-<channel>`, stable across restarts
    pub unique_id: String,
    /// Channel this entity presents; `None` for the RSSI entity
    pub channel: Option<String>,
    pub name: String,
    pub platform: PlatformKind,
    pub meta: EntityMeta,
    /// Select options in raw-value order
    pub options: Vec<String>,
    /// Number bounds
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl EntityDescriptor {
    pub fn is_command_capable(&self) -> bool {
        self.channel.is_some() && self.platform.is_command_capable()
    }
}

pub fn unique_id(address: &DeviceAddress, suffix: &str) -> String {
    format!(
        "{}-{}",
        address.to_underscore(),
        entity_key(suffix)
    )
}

/// Distinct platforms a profile's channels surface on.
pub fn platforms_for(profile: &ProfileDescriptor) -> BTreeSet<PlatformKind> {
    profile.channels.iter().map(|c| c.platform).collect()
}

fn channel_entity(address: &DeviceAddress, channel: &ChannelSpec) -> EntityDescriptor {
    let mut entity = EntityDescriptor {
        unique_id: unique_id(address, &channel.name),
        channel: Some(channel.name.clone()),
        name: channel.description.clone(),
        platform: channel.platform,
        meta: channel.meta.clone(),
        options: Vec::new(),
        min: None,
        max: None,
        step: None,
    };

    match &channel.kind {
        ValueKind::Enum { items } => {
            entity.options = items.iter().map(|item| item.symbol.clone()).collect();
        }
        ValueKind::Value(scale) => {
            let (lo, hi) = scale.physical_bounds();
            entity.min = Some(lo);
            entity.max = Some(hi);
            entity.step = Some(scale.step());
        }
        ValueKind::Boolean => {}
    }
    entity
}

fn rssi_entity(address: &DeviceAddress) -> EntityDescriptor {
    EntityDescriptor {
        unique_id: unique_id(address, RSSI_ENTITY),
        channel: None,
        name: "RSSI".to_string(),
        platform: PlatformKind::Sensor,
        meta: EntityMeta {
            unit: Some("dBm".to_string()),
            device_class: Some("signal_strength".to_string()),
            state_class: Some(StateClass::Measurement),
            icon: Some("mdi:wifi".to_string()),
            entity_category: Some(EntityCategory::Diagnostic),
        },
        options: Vec::new(),
        min: None,
        max: None,
        step: None,
    }
}

/// Entities for a device bound to `profile`, in channel order followed by
/// the RSSI diagnostic entity. Later entities whose unique id collides with
/// an earlier one are dropped.
pub fn entities_for(address: &DeviceAddress, profile: &ProfileDescriptor) -> Vec<EntityDescriptor> {
    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(profile.channels.len() + 1);

    let candidates = profile
        .channels
        .iter()
        .map(|channel| channel_entity(address, channel))
        .chain(std::iter::once(rssi_entity(address)));

    for entity in candidates {
        if seen.insert(entity.unique_id.clone()) {
            entities.push(entity);
        } else {
            debug!("Dropping duplicate entity {}", entity.unique_id);
        }
    }
    entities
}
