//! # EnOcean Equipment Profiles
//!
//! Declarative profile descriptors, the YAML table they are loaded from and
//! the registry that indexes them by RORG/FUNC/TYPE.

pub mod classify;
pub mod id;
pub mod platform;
pub mod profile;
pub mod registry;
pub mod table;

pub use id::EepId;
pub use platform::{EntityCategory, PlatformKind, StateClass};
pub use profile::{
    entity_key, ChannelSpec, EntityMeta, EnumItem, FixedBits, NumericScale, ProfileDescriptor, ValueKind,
};
pub use registry::{ProfileRegistry, RegistryBuilder};
