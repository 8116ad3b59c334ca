//! # EnOcean Gateway
//!
//! Owns the device bindings and drives every received telegram through
//! teach-in, decoding and entity dispatch.
//!
//! Time is passed in by the caller (`now: Instant`) so availability and
//! learning windows stay deterministic under test.

use crate::config::GatewayConfig;
use crate::constants::RORG_UTE;
use crate::dispatch::{self, apply, apply_rssi, Availability, DeviceBinding, EntitySink, ApplyReport};
use crate::eep::{EepId, ProfileRegistry};
use crate::error::EnOceanError;
use crate::payload::{decode, CommandValue};
use crate::store::{self, StoredDevice};
use crate::telegram::{is_learn_telegram, parse_teach_in, DeviceAddress, TeachIn, Telegram};
use crate::util::logging::{log_telegram_hex, WarnOnce};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a telegram produced no entity updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sender has no binding
    UnknownDevice,
    /// Addressed to another receiver
    Directed,
    /// Teach-in telegram while learning is off
    NotLearning,
    /// Teach-in telegram that names no profile
    NoProfileAnnounced,
    /// Teach-in for a profile missing from the registry
    UnknownProfile(EepId),
    /// Teach-in from a device already bound to the same profile
    AlreadyBound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelegramOutcome {
    Dispatched(ApplyReport),
    /// Dispatched, and the device crossed the invalid-telegram threshold.
    /// The caller should reset the transceiver.
    ResetRequested(ApplyReport),
    Registered(TeachIn),
    Ignored(IgnoreReason),
}

impl TelegramOutcome {
    pub fn needs_reset(&self) -> bool {
        matches!(self, TelegramOutcome::ResetRequested(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LearningWindow {
    Until(Instant),
    /// The requested duration does not fit in an `Instant`.
    Open,
}

pub struct Gateway {
    registry: Arc<ProfileRegistry>,
    config: GatewayConfig,
    base_id: Option<DeviceAddress>,
    bindings: HashMap<DeviceAddress, DeviceBinding>,
    records: HashMap<DeviceAddress, StoredDevice>,
    learning: Option<LearningWindow>,
    invalid_counts: HashMap<DeviceAddress, u32>,
    invalid_warned: WarnOnce<DeviceAddress>,
    unknown_seen: WarnOnce<DeviceAddress>,
}

impl Gateway {
    pub fn new(registry: Arc<ProfileRegistry>, config: GatewayConfig) -> Self {
        Self {
            registry,
            base_id: config.base_id,
            config,
            bindings: HashMap::new(),
            records: HashMap::new(),
            learning: None,
            invalid_counts: HashMap::new(),
            invalid_warned: WarnOnce::new(),
            unknown_seen: WarnOnce::new(),
        }
    }

    /// Build the registry from `config` and restore stored devices.
    pub fn from_config(config: GatewayConfig, now: Instant) -> Result<Self, EnOceanError> {
        let registry = Arc::new(config.build_registry()?);
        let mut gateway = Self::new(registry, config);
        if gateway.config.device_store.is_some() {
            let restored = gateway.restore_devices(now)?;
            info!("Restored {restored} devices");
        }
        Ok(gateway)
    }

    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn base_id(&self) -> Option<DeviceAddress> {
        self.base_id
    }

    /// Set the transceiver base ID, usually from a `CO_RD_IDBASE` response.
    pub fn set_base_id(&mut self, base_id: DeviceAddress) {
        info!("Transceiver base ID {base_id}");
        self.base_id = Some(base_id);
    }

    // ------------------------------------------------------------------
    // Learning mode
    // ------------------------------------------------------------------

    /// Enable teach-in for `duration`, or the configured learning time.
    pub fn start_learning(&mut self, now: Instant, duration: Option<Duration>) {
        let duration = duration.unwrap_or_else(|| self.config.learning_duration());
        match now.checked_add(duration) {
            Some(until) => {
                self.learning = Some(LearningWindow::Until(until));
                info!("Learning mode enabled for {}s", duration.as_secs());
            }
            None => {
                self.learning = Some(LearningWindow::Open);
                info!("Learning mode enabled until stopped");
            }
        }
    }

    pub fn stop_learning(&mut self) {
        if self.learning.take().is_some() {
            info!("Learning mode disabled");
        }
    }

    pub fn is_learning(&self, now: Instant) -> bool {
        match self.learning {
            Some(LearningWindow::Until(until)) => now < until,
            Some(LearningWindow::Open) => true,
            None => false,
        }
    }

    /// Time left in the learning window; `Duration::MAX` when it was opened
    /// without a reachable end.
    pub fn learning_remaining(&self, now: Instant) -> Option<Duration> {
        match self.learning? {
            LearningWindow::Until(until) if now < until => Some(until.duration_since(now)),
            LearningWindow::Until(_) => None,
            LearningWindow::Open => Some(Duration::MAX),
        }
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Bind `address` to `eep`, replacing any earlier binding.
    pub fn add_device(
        &mut self,
        address: DeviceAddress,
        eep: EepId,
        now: Instant,
    ) -> Result<&DeviceBinding, EnOceanError> {
        self.bind(address, eep, None, now)
    }

    pub fn remove_device(&mut self, address: &DeviceAddress) -> Option<DeviceBinding> {
        let removed = self.bindings.remove(address);
        if removed.is_some() {
            self.records.remove(address);
            self.invalid_counts.remove(address);
            self.invalid_warned.clear(address);
            info!("Removed device {address}");
            self.persist();
        }
        removed
    }

    pub fn device(&self, address: &DeviceAddress) -> Option<&DeviceBinding> {
        self.bindings.get(address)
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceBinding> {
        self.bindings.values()
    }

    pub fn device_count(&self) -> usize {
        self.bindings.len()
    }

    fn bind(
        &mut self,
        address: DeviceAddress,
        eep: EepId,
        manufacturer: Option<u16>,
        now: Instant,
    ) -> Result<&DeviceBinding, EnOceanError> {
        let profile = self.registry.lookup(&eep)?;
        let binding = DeviceBinding::new(address, profile, now);
        info!(
            "Bound {address} to {eep} ({}) with {} entities",
            profile.title,
            binding.entities.len()
        );

        self.records.insert(
            address,
            StoredDevice {
                address,
                eep,
                manufacturer,
                added: Utc::now(),
            },
        );
        self.invalid_counts.remove(&address);
        self.invalid_warned.clear(&address);
        self.unknown_seen.clear(&address);
        self.bindings.insert(address, binding);
        self.persist();

        self.bindings
            .get(&address)
            .ok_or_else(|| EnOceanError::UnknownDevice(address.to_string()))
    }

    // ------------------------------------------------------------------
    // Telegram path
    // ------------------------------------------------------------------

    pub fn handle_telegram(
        &mut self,
        telegram: &Telegram,
        now: Instant,
        sink: &mut dyn EntitySink,
    ) -> Result<TelegramOutcome, EnOceanError> {
        log_telegram_hex(&format!("{} {:02X}", telegram.sender, telegram.rorg), &telegram.payload);

        if self.is_directed_elsewhere(telegram) {
            debug!("Ignoring telegram from {} to {:?}", telegram.sender, telegram.destination);
            return Ok(TelegramOutcome::Ignored(IgnoreReason::Directed));
        }

        if is_learn_telegram(telegram) {
            if self.is_learning(now) {
                return self.teach_in(telegram, now);
            }
            if telegram.rorg == RORG_UTE || !self.bindings.contains_key(&telegram.sender) {
                debug!("Teach-in from {} outside learning mode", telegram.sender);
                return Ok(TelegramOutcome::Ignored(IgnoreReason::NotLearning));
            }
            // A bound device repeating its teach-in carries no data
            return Ok(TelegramOutcome::Ignored(IgnoreReason::AlreadyBound));
        }

        let registry = Arc::clone(&self.registry);
        let Some(binding) = self.bindings.get_mut(&telegram.sender) else {
            if self.unknown_seen.first(telegram.sender) {
                info!("Telegram from unknown device {}", telegram.sender);
            }
            return Ok(TelegramOutcome::Ignored(IgnoreReason::UnknownDevice));
        };

        let profile = registry.lookup(&binding.eep)?;
        // Rejected before any binding state changes: no liveness, no invalid count.
        if telegram.rorg != profile.eep.rorg {
            return Err(EnOceanError::RorgMismatch {
                telegram: telegram.rorg,
                profile: profile.eep,
            });
        }

        if let Some(availability) = binding.on_telegram(now) {
            sink.availability_changed(&binding.address, availability);
        }

        let values = decode(telegram, profile);
        let report = apply(binding, &values, sink);
        if let Some(dbm) = telegram.dbm {
            apply_rssi(binding, dbm, sink);
        }

        Ok(self.track_validity(telegram.sender, report))
    }

    fn is_directed_elsewhere(&self, telegram: &Telegram) -> bool {
        if !self.config.ignore_directed_telegrams {
            return false;
        }
        match telegram.destination {
            Some(dest) => !dest.is_broadcast() && Some(dest) != self.base_id,
            None => false,
        }
    }

    fn teach_in(&mut self, telegram: &Telegram, now: Instant) -> Result<TelegramOutcome, EnOceanError> {
        let Some(teach_in) = parse_teach_in(telegram) else {
            info!("Teach-in from {} does not announce a profile", telegram.sender);
            return Ok(TelegramOutcome::Ignored(IgnoreReason::NoProfileAnnounced));
        };

        if !self.registry.contains(&teach_in.eep) {
            warn!(
                "Teach-in from {} announces unsupported profile {}",
                telegram.sender, teach_in.eep
            );
            return Ok(TelegramOutcome::Ignored(IgnoreReason::UnknownProfile(teach_in.eep)));
        }

        if self
            .bindings
            .get(&telegram.sender)
            .is_some_and(|binding| binding.eep == teach_in.eep)
        {
            debug!("{} already bound to {}", telegram.sender, teach_in.eep);
            return Ok(TelegramOutcome::Ignored(IgnoreReason::AlreadyBound));
        }

        self.bind(telegram.sender, teach_in.eep, teach_in.manufacturer, now)?;
        Ok(TelegramOutcome::Registered(teach_in))
    }

    fn track_validity(&mut self, address: DeviceAddress, report: ApplyReport) -> TelegramOutcome {
        if report.all_valid() {
            if self.invalid_counts.remove(&address).is_some() {
                self.invalid_warned.clear(&address);
            }
            return TelegramOutcome::Dispatched(report);
        }

        if self.invalid_warned.first(address) {
            let reasons: Vec<String> = report
                .skipped
                .iter()
                .map(|(channel, reason)| format!("{channel}: {reason}"))
                .collect();
            warn!("Invalid telegram from {address}: {}", reasons.join(", "));
        }

        let count = self.invalid_counts.entry(address).or_insert(0);
        *count += 1;
        if *count < self.config.invalid_telegram_threshold {
            return TelegramOutcome::Dispatched(report);
        }

        warn!(
            "{address} sent {} invalid telegrams in a row, requesting transceiver reset",
            count
        );
        self.invalid_counts.clear();
        self.invalid_warned.clear_all();
        TelegramOutcome::ResetRequested(report)
    }

    /// Mark silent devices unavailable. Returns the devices that changed.
    pub fn check_availability(&mut self, now: Instant, sink: &mut dyn EntitySink) -> Vec<DeviceAddress> {
        let timeout = self.config.availability_timeout();
        let mut changed = Vec::new();
        for binding in self.bindings.values_mut() {
            if let Some(availability) = binding.check_timeout(now, timeout) {
                if availability == Availability::Unavailable {
                    warn!(
                        "{} silent for {}s, marking unavailable",
                        binding.address,
                        timeout.as_secs()
                    );
                }
                sink.availability_changed(&binding.address, availability);
                changed.push(binding.address);
            }
        }
        changed
    }

    /// Encode a command for a bound device, sent from the base ID.
    pub fn encode_command(
        &self,
        address: &DeviceAddress,
        channel: &str,
        value: &CommandValue,
    ) -> Result<Telegram, EnOceanError> {
        let sender = self
            .base_id
            .ok_or_else(|| EnOceanError::Config("transceiver base ID unknown".to_string()))?;
        let binding = self
            .bindings
            .get(address)
            .ok_or_else(|| EnOceanError::UnknownDevice(address.to_string()))?;
        let profile = self.registry.lookup(&binding.eep)?;
        dispatch::encode_command(binding, profile, channel, value, sender)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Stored form of every bound device, ordered by address.
    pub fn stored_devices(&self) -> Vec<StoredDevice> {
        let mut devices: Vec<StoredDevice> = self.records.values().cloned().collect();
        devices.sort_by_key(|d| d.address.as_u32());
        devices
    }

    pub fn save_devices(&self, path: impl AsRef<std::path::Path>) -> Result<(), EnOceanError> {
        store::save_devices(path, &self.stored_devices())
    }

    /// Bind every stored device whose profile is still known. Returns the
    /// number bound.
    pub fn load_devices(
        &mut self,
        path: impl AsRef<std::path::Path>,
        now: Instant,
    ) -> Result<usize, EnOceanError> {
        let mut bound = 0;
        for device in store::load_devices(path)? {
            let Ok(profile) = self.registry.lookup(&device.eep) else {
                warn!("Stored device {} uses unknown profile {}", device.address, device.eep);
                continue;
            };
            self.bindings
                .insert(device.address, DeviceBinding::new(device.address, profile, now));
            self.records.insert(device.address, device);
            bound += 1;
        }
        Ok(bound)
    }

    fn restore_devices(&mut self, now: Instant) -> Result<usize, EnOceanError> {
        match self.config.device_store.clone() {
            Some(path) => self.load_devices(path, now),
            None => Ok(0),
        }
    }

    fn persist(&self) {
        if let Some(path) = &self.config.device_store {
            if let Err(e) = self.save_devices(path) {
                warn!("Could not save devices to {}: {e}", path.display());
            }
        }
    }
}
