//! # Gateway Service
//!
//! Runs a [`Gateway`] as a tokio task. Received packets, commands and
//! learning requests arrive over an mpsc channel through a cloneable
//! [`GatewayHandle`]; packets for the transceiver (commands, base ID
//! queries, resets) leave through an outbound channel. An interval tick
//! drives availability checks.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), enocean_rs::EnOceanError> {
//! use enocean_rs::{Gateway, GatewayConfig, GatewayService, LogSink, ProfileRegistry};
//! use tokio::sync::mpsc;
//!
//! let gateway = Gateway::new(ProfileRegistry::builtin()?, GatewayConfig::default());
//! let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
//! let (service, handle) = GatewayService::new(gateway, Box::new(LogSink), outbound_tx);
//! tokio::spawn(service.run());
//!
//! handle.start_learning(None).await?;
//! while let Some(packet) = outbound_rx.recv().await {
//!     // write enocean_rs::esp3::build_packet(&packet)? to the serial port
//! }
//! # Ok(())
//! # }
//! ```

use crate::dispatch::{Availability, EntityDescriptor, EntitySink, SinkEvent};
use crate::eep::EepId;
use crate::error::EnOceanError;
use crate::esp3::{erp1_from_telegram, telegram_from_erp1, Esp3Packet, PacketType};
use crate::gateway::{Gateway, TelegramOutcome};
use crate::payload::{ChannelValue, CommandValue};
use crate::telegram::{DeviceAddress, Telegram};
use crate::util::LogThrottle;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};

const EVENT_QUEUE_DEPTH: usize = 64;

/// Warnings about undeliverable telegrams per minute
const DROPPED_WARNINGS_PER_MINUTE: u32 = 10;

/// Snapshot of one bound device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub address: DeviceAddress,
    pub eep: EepId,
    pub availability: Availability,
    pub last_rssi: Option<i8>,
}

/// Requests handled by the service task.
#[derive(Debug)]
pub enum GatewayEvent {
    /// A packet read from the transceiver
    Packet(Esp3Packet),
    /// A telegram already extracted from its packet
    Telegram(Telegram),
    Command {
        address: DeviceAddress,
        channel: String,
        value: CommandValue,
        reply: oneshot::Sender<Result<(), EnOceanError>>,
    },
    AddDevice {
        address: DeviceAddress,
        eep: EepId,
        reply: oneshot::Sender<Result<(), EnOceanError>>,
    },
    StartLearning(Option<Duration>),
    StopLearning,
    Devices(oneshot::Sender<Vec<DeviceStatus>>),
    Shutdown,
}

/// Cloneable front end to a running [`GatewayService`].
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    tx: mpsc::Sender<GatewayEvent>,
}

impl GatewayHandle {
    async fn send(&self, event: GatewayEvent) -> Result<(), EnOceanError> {
        self.tx.send(event).await.map_err(|_| EnOceanError::ServiceClosed)
    }

    pub async fn packet(&self, packet: Esp3Packet) -> Result<(), EnOceanError> {
        self.send(GatewayEvent::Packet(packet)).await
    }

    pub async fn telegram(&self, telegram: Telegram) -> Result<(), EnOceanError> {
        self.send(GatewayEvent::Telegram(telegram)).await
    }

    /// Encode and queue a command; resolves once the packet is handed to
    /// the outbound channel.
    pub async fn command(
        &self,
        address: DeviceAddress,
        channel: &str,
        value: CommandValue,
    ) -> Result<(), EnOceanError> {
        let (reply, rx) = oneshot::channel();
        self.send(GatewayEvent::Command {
            address,
            channel: channel.to_string(),
            value,
            reply,
        })
        .await?;
        rx.await.map_err(|_| EnOceanError::ServiceClosed)?
    }

    pub async fn add_device(&self, address: DeviceAddress, eep: EepId) -> Result<(), EnOceanError> {
        let (reply, rx) = oneshot::channel();
        self.send(GatewayEvent::AddDevice { address, eep, reply }).await?;
        rx.await.map_err(|_| EnOceanError::ServiceClosed)?
    }

    pub async fn start_learning(&self, duration: Option<Duration>) -> Result<(), EnOceanError> {
        self.send(GatewayEvent::StartLearning(duration)).await
    }

    pub async fn stop_learning(&self) -> Result<(), EnOceanError> {
        self.send(GatewayEvent::StopLearning).await
    }

    pub async fn devices(&self) -> Result<Vec<DeviceStatus>, EnOceanError> {
        let (reply, rx) = oneshot::channel();
        self.send(GatewayEvent::Devices(reply)).await?;
        rx.await.map_err(|_| EnOceanError::ServiceClosed)
    }

    pub async fn shutdown(&self) -> Result<(), EnOceanError> {
        self.send(GatewayEvent::Shutdown).await
    }
}

pub struct GatewayService {
    gateway: Gateway,
    sink: Box<dyn EntitySink + Send>,
    events: mpsc::Receiver<GatewayEvent>,
    outbound: mpsc::Sender<Esp3Packet>,
    awaiting_base_id: bool,
    dropped_warnings: LogThrottle,
}

impl GatewayService {
    pub fn new(
        gateway: Gateway,
        sink: Box<dyn EntitySink + Send>,
        outbound: mpsc::Sender<Esp3Packet>,
    ) -> (Self, GatewayHandle) {
        let (tx, events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let service = Self {
            gateway,
            sink,
            events,
            outbound,
            awaiting_base_id: false,
            dropped_warnings: LogThrottle::new(Duration::from_secs(60), DROPPED_WARNINGS_PER_MINUTE),
        };
        (service, GatewayHandle { tx })
    }

    /// Process events until shutdown or until every handle is dropped.
    /// Returns the gateway so callers can persist or inspect it.
    pub async fn run(mut self) -> Gateway {
        info!("Gateway service started with {} devices", self.gateway.device_count());

        if self.gateway.base_id().is_none() {
            self.awaiting_base_id = true;
            self.send_packet(Esp3Packet::read_base_id()).await;
        }

        let mut availability_tick = interval(self.gateway.config().availability_check_interval());
        availability_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(GatewayEvent::Shutdown) | None => {
                            info!("Gateway service stopping");
                            break;
                        }
                        Some(event) => self.handle_event(event).await,
                    }
                }

                _ = availability_tick.tick() => {
                    let now = Instant::now().into_std();
                    let changed = self.gateway.check_availability(now, self.sink.as_mut());
                    if !changed.is_empty() {
                        debug!("{} devices changed availability", changed.len());
                    }
                }
            }
        }

        self.gateway
    }

    async fn handle_event(&mut self, event: GatewayEvent) {
        let now = Instant::now().into_std();
        match event {
            GatewayEvent::Packet(packet) => self.handle_packet(packet, now).await,
            GatewayEvent::Telegram(telegram) => self.handle_telegram(&telegram, now).await,
            GatewayEvent::Command {
                address,
                channel,
                value,
                reply,
            } => {
                let result = self.send_command(&address, &channel, &value).await;
                let _ = reply.send(result);
            }
            GatewayEvent::AddDevice { address, eep, reply } => {
                let result = self.gateway.add_device(address, eep, now).map(|_| ());
                let _ = reply.send(result);
            }
            GatewayEvent::StartLearning(duration) => self.gateway.start_learning(now, duration),
            GatewayEvent::StopLearning => self.gateway.stop_learning(),
            GatewayEvent::Devices(reply) => {
                let mut devices: Vec<DeviceStatus> = self
                    .gateway
                    .devices()
                    .map(|binding| DeviceStatus {
                        address: binding.address,
                        eep: binding.eep,
                        availability: binding.availability(),
                        last_rssi: binding.last_rssi(),
                    })
                    .collect();
                devices.sort_by_key(|d| d.address);
                let _ = reply.send(devices);
            }
            GatewayEvent::Shutdown => {}
        }
    }

    async fn handle_packet(&mut self, packet: Esp3Packet, now: std::time::Instant) {
        match packet.packet_type {
            PacketType::RadioErp1 => match telegram_from_erp1(&packet) {
                Ok(telegram) => self.handle_telegram(&telegram, now).await,
                Err(e) => {
                    if self.dropped_warnings.allow(now) {
                        warn!("Dropping radio packet: {e}");
                    }
                }
            },
            PacketType::Response if self.awaiting_base_id => {
                if let Some(base_id) = packet.base_id() {
                    self.awaiting_base_id = false;
                    self.gateway.set_base_id(base_id);
                }
            }
            other => debug!("Ignoring {other:?} packet"),
        }
    }

    async fn handle_telegram(&mut self, telegram: &Telegram, now: std::time::Instant) {
        match self.gateway.handle_telegram(telegram, now, self.sink.as_mut()) {
            Ok(TelegramOutcome::ResetRequested(_)) => {
                self.send_packet(Esp3Packet::reset()).await;
            }
            Ok(outcome) => debug!("{}: {outcome:?}", telegram.sender),
            Err(e) => {
                if self.dropped_warnings.allow(now) {
                    warn!("Telegram from {} not handled: {e}", telegram.sender);
                }
            }
        }
    }

    async fn send_command(
        &mut self,
        address: &DeviceAddress,
        channel: &str,
        value: &CommandValue,
    ) -> Result<(), EnOceanError> {
        let telegram = self.gateway.encode_command(address, channel, value)?;
        self.outbound
            .send(erp1_from_telegram(&telegram))
            .await
            .map_err(|_| EnOceanError::ServiceClosed)?;
        info!("Sent {channel}={value} to {address}");
        Ok(())
    }

    async fn send_packet(&mut self, packet: Esp3Packet) {
        if self.outbound.send(packet).await.is_err() {
            warn!("Outbound channel closed");
        }
    }
}

/// Forwards every sink call as a [`SinkEvent`] over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EntitySink for ChannelSink {
    fn update(&mut self, entity: &EntityDescriptor, value: &ChannelValue) {
        let _ = self.tx.send(SinkEvent::Update {
            unique_id: entity.unique_id.clone(),
            value: value.clone(),
        });
    }

    fn availability_changed(&mut self, address: &DeviceAddress, availability: Availability) {
        let _ = self.tx.send(SinkEvent::Availability {
            address: *address,
            availability,
        });
    }

    fn rssi(&mut self, entity: &EntityDescriptor, dbm: i8) {
        let _ = self.tx.send(SinkEvent::Rssi {
            unique_id: entity.unique_id.clone(),
            dbm,
        });
    }
}
