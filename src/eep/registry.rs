//! # Profile Registry
//!
//! Read-only index of [`ProfileDescriptor`]s keyed by [`EepId`]. A registry
//! is built once from one or more profile tables plus optional override
//! documents and is then shared behind an `Arc` without locking.

use crate::eep::id::EepId;
use crate::eep::profile::ProfileDescriptor;
use crate::eep::table::{apply_overrides, parse_overrides, parse_table, ProfileOverrideDoc};
use crate::error::EnOceanError;
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Bundled profile catalogue.
pub const BUILTIN_TABLE: &str = include_str!("../../profiles/eep_profiles.yaml");

static BUILTIN: Lazy<Result<Arc<ProfileRegistry>, String>> = Lazy::new(|| {
    ProfileRegistry::from_yaml_str(BUILTIN_TABLE)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<ProfileDescriptor>,
    index: HashMap<EepId, usize>,
}

impl ProfileRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Shared registry over the bundled catalogue.
    pub fn builtin() -> Result<Arc<ProfileRegistry>, EnOceanError> {
        BUILTIN
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| EnOceanError::ProfileTable(e.clone()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, EnOceanError> {
        Self::builder().table(yaml)?.build()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EnOceanError> {
        Self::builder().table_file(path)?.build()
    }

    /// Index already validated descriptors, rejecting duplicate triplets.
    pub fn from_profiles(profiles: Vec<ProfileDescriptor>) -> Result<Self, EnOceanError> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (slot, profile) in profiles.iter().enumerate() {
            if index.insert(profile.eep, slot).is_some() {
                return Err(EnOceanError::DuplicateProfile(profile.eep));
            }
        }
        Ok(Self { profiles, index })
    }

    pub fn lookup(&self, eep: &EepId) -> Result<&ProfileDescriptor, EnOceanError> {
        self.get(eep).ok_or(EnOceanError::ProfileNotFound(*eep))
    }

    pub fn get(&self, eep: &EepId) -> Option<&ProfileDescriptor> {
        self.index.get(eep).map(|&slot| &self.profiles[slot])
    }

    pub fn contains(&self, eep: &EepId) -> bool {
        self.index.contains_key(eep)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ProfileDescriptor> {
        self.profiles.iter()
    }
}

/// Collects tables and overrides, then validates them together.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    profiles: Vec<ProfileDescriptor>,
    overrides: Vec<ProfileOverrideDoc>,
}

impl RegistryBuilder {
    pub fn builtin(self) -> Result<Self, EnOceanError> {
        self.table(BUILTIN_TABLE)
    }

    pub fn table(mut self, yaml: &str) -> Result<Self, EnOceanError> {
        let profiles = parse_table(yaml)?;
        debug!("Parsed profile table with {} profiles", profiles.len());
        self.profiles.extend(profiles);
        Ok(self)
    }

    pub fn table_file(self, path: impl AsRef<Path>) -> Result<Self, EnOceanError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            EnOceanError::ProfileTable(format!("cannot read {}: {e}", path.display()))
        })?;
        self.table(&yaml)
    }

    pub fn overrides(mut self, yaml: &str) -> Result<Self, EnOceanError> {
        self.overrides.extend(parse_overrides(yaml)?);
        Ok(self)
    }

    pub fn overrides_file(self, path: impl AsRef<Path>) -> Result<Self, EnOceanError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            EnOceanError::ProfileTable(format!("cannot read {}: {e}", path.display()))
        })?;
        self.overrides(&yaml)
    }

    pub fn build(self) -> Result<ProfileRegistry, EnOceanError> {
        let mut registry = ProfileRegistry::from_profiles(self.profiles)?;
        apply_overrides(&mut registry.profiles, &self.overrides)?;
        info!(
            "Profile registry ready: {} profiles, {} overrides",
            registry.len(),
            self.overrides.len()
        );
        Ok(registry)
    }
}
