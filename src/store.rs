//! # Device Store
//!
//! Learned devices persist to a small JSON file so bindings survive a
//! restart:
//!
//! ```json
//! {
//!   "version": 1,
//!   "devices": [
//!     { "address": "01:82:5d:ab", "eep": "A5-02-05", "manufacturer": 11, "added": "2024-05-01T10:00:00Z" }
//!   ]
//! }
//! ```
//!
//! Entries that no longer parse are skipped with a warning instead of
//! failing the whole load.

use crate::constants::DEVICE_STORE_VERSION;
use crate::eep::EepId;
use crate::error::EnOceanError;
use crate::telegram::DeviceAddress;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDevice {
    pub address: DeviceAddress,
    pub eep: EepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<u16>,
    pub added: DateTime<Utc>,
}

#[derive(Serialize)]
struct StoreFileOut<'a> {
    version: u32,
    devices: &'a [StoredDevice],
}

#[derive(Deserialize)]
struct StoreFileIn {
    version: u32,
    #[serde(default)]
    devices: Vec<serde_json::Value>,
}

/// Write all devices, replacing the file atomically.
pub fn save_devices(path: impl AsRef<Path>, devices: &[StoredDevice]) -> Result<(), EnOceanError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&StoreFileOut {
        version: DEVICE_STORE_VERSION,
        devices,
    })
    .map_err(|e| EnOceanError::DeviceStore(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    debug!("Saved {} devices to {}", devices.len(), path.display());
    Ok(())
}

/// Read devices; a missing file is an empty store.
pub fn load_devices(path: impl AsRef<Path>) -> Result<Vec<StoredDevice>, EnOceanError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let json = fs::read_to_string(path)?;
    let file: StoreFileIn = serde_json::from_str(&json)
        .map_err(|e| EnOceanError::DeviceStore(format!("{}: {e}", path.display())))?;
    if file.version > DEVICE_STORE_VERSION {
        return Err(EnOceanError::DeviceStore(format!(
            "unsupported device store version {} (supported: {})",
            file.version, DEVICE_STORE_VERSION
        )));
    }

    let mut devices = Vec::with_capacity(file.devices.len());
    for entry in file.devices {
        match serde_json::from_value::<StoredDevice>(entry.clone()) {
            Ok(device) => devices.push(device),
            Err(e) => warn!("Skipping stored device {entry}: {e}"),
        }
    }
    Ok(devices)
}
