use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use enocean_rs::dispatch::entities_for;
use enocean_rs::util::{decode_hex, format_hex_compact};
use enocean_rs::{
    build_packet, init_logger_with_default, log_info, CommandValue, DeviceAddress, EepId,
    Esp3Decoder, Esp3Packet, Gateway, GatewayConfig, GatewayService, LogSink, ProfileRegistry,
    Telegram,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "enocean-cli")]
#[command(about = "CLI tool for EnOcean EEP telegrams")]
struct Cli {
    /// Profile table replacing the bundled catalogue
    #[arg(long, global = true)]
    table: Option<PathBuf>,
    /// Profile overrides applied on top of the table
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known profiles
    Profiles {
        #[arg(long)]
        json: bool,
    },
    /// Load a profile table and report problems
    Validate { table: PathBuf },
    /// Decode a hex payload with a profile
    Decode { eep: EepId, payload: String },
    /// Encode a command payload
    Encode {
        eep: EepId,
        channel: String,
        value: String,
    },
    /// Show the entities a device would get
    Entities { eep: EepId, address: DeviceAddress },
    /// Feed a file of hex ESP3 frames through a gateway
    Replay {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Pre-bind a device, as ADDRESS=EEP
        #[arg(long, value_parser = parse_binding)]
        bind: Vec<(DeviceAddress, EepId)>,
        /// Accept teach-in telegrams
        #[arg(long)]
        learn: bool,
    },
}

fn parse_binding(s: &str) -> Result<(DeviceAddress, EepId), String> {
    let (address, eep) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=EEP, got {s}"))?;
    let address = address.parse().map_err(|e| format!("{e}"))?;
    let eep = eep.parse().map_err(|e| format!("{e}"))?;
    Ok((address, eep))
}

/// `true`/`false`, a number, or an enum symbol.
fn parse_command_value(text: &str) -> CommandValue {
    match text {
        "true" | "on" => CommandValue::Bool(true),
        "false" | "off" => CommandValue::Bool(false),
        _ => match text.parse::<f64>() {
            Ok(number) => CommandValue::Number(number),
            Err(_) => CommandValue::Symbol(text.to_string()),
        },
    }
}

/// Gateway configuration from an optional file, with `--table` and
/// `--overrides` taking precedence.
fn gateway_config(cli: &Cli, path: Option<&Path>) -> Result<GatewayConfig> {
    let mut config = match path {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(table) = &cli.table {
        config.profile_table = Some(table.clone());
    }
    if let Some(overrides) = &cli.overrides {
        config.profile_overrides = Some(overrides.clone());
    }
    Ok(config)
}

fn registry(cli: &Cli) -> Result<ProfileRegistry> {
    Ok(gateway_config(cli, None)?.build_registry()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger_with_default("info");

    let cli = Cli::parse();

    match &cli.command {
        Commands::Profiles { json } => {
            let registry = registry(&cli)?;
            if *json {
                let profiles: Vec<_> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for profile in registry.iter() {
                    let channels: Vec<&str> =
                        profile.channels.iter().map(|c| c.name.as_str()).collect();
                    println!("{}  {}  [{}]", profile.eep, profile.title, channels.join(", "));
                }
            }
        }
        Commands::Validate { table } => {
            let registry = ProfileRegistry::from_path(table)
                .with_context(|| format!("loading {}", table.display()))?;
            log_info(&format!("{}: {} profiles OK", table.display(), registry.len()));
        }
        Commands::Decode { eep, payload } => {
            let registry = registry(&cli)?;
            let payload = decode_hex(payload)?;
            let telegram = Telegram::new(eep.rorg, payload, DeviceAddress([0; 4]));
            let values = enocean_rs::payload::decode_with_registry(&telegram, eep, &registry)?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Commands::Encode { eep, channel, value } => {
            let registry = registry(&cli)?;
            let profile = registry.lookup(eep)?;
            let payload = enocean_rs::payload::encode_command_payload(
                profile,
                channel,
                &parse_command_value(value),
            )?;
            println!("{}", format_hex_compact(&payload));
        }
        Commands::Entities { eep, address } => {
            let registry = registry(&cli)?;
            let entities = entities_for(address, registry.lookup(eep)?);
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
        Commands::Replay {
            file,
            config,
            bind,
            learn,
        } => replay(&cli, file, config.as_deref(), bind, *learn).await?,
    }

    Ok(())
}

async fn replay(
    cli: &Cli,
    file: &Path,
    config: Option<&Path>,
    bind: &[(DeviceAddress, EepId)],
    learn: bool,
) -> Result<()> {
    let config = gateway_config(cli, config)?;

    let mut gateway = Gateway::from_config(config, Instant::now())?;
    for (address, eep) in bind {
        gateway.add_device(*address, *eep, Instant::now())?;
    }

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Esp3Packet>(16);
    let (service, handle) = GatewayService::new(gateway, Box::new(LogSink), outbound_tx);
    let service = tokio::spawn(service.run());
    let outbound = tokio::spawn(async move {
        let mut resets = 0usize;
        while let Some(packet) = outbound_rx.recv().await {
            if packet == Esp3Packet::reset() {
                resets += 1;
            }
            match build_packet(&packet) {
                Ok(bytes) => log::debug!("Outbound {}", format_hex_compact(&bytes)),
                Err(e) => log::warn!("Outbound packet not encodable: {e}"),
            }
        }
        resets
    });

    if learn {
        handle.start_learning(None).await?;
    }

    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut decoder = Esp3Decoder::new();
    let mut packets = 0usize;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let hex: String = line.split_whitespace().collect();
        let bytes = decode_hex(&hex).with_context(|| format!("line {}", number + 1))?;
        decoder.extend(&bytes);

        while let Some(packet) = decoder.next_packet() {
            match packet {
                Ok(packet) => {
                    handle.packet(packet).await?;
                    packets += 1;
                }
                Err(e) => log::warn!("line {}: {e}", number + 1),
            }
        }
    }

    let devices = handle.devices().await?;
    handle.shutdown().await?;
    let gateway = service.await?;
    drop(handle);
    let resets = outbound.await?;

    for device in &devices {
        log_info(&format!(
            "{} {} {:?} rssi={:?}",
            device.address, device.eep, device.availability, device.last_rssi
        ));
    }
    if decoder.buffered() > 0 {
        bail!("{} trailing bytes without a complete frame", decoder.buffered());
    }
    log_info(&format!(
        "Replayed {packets} packets, {} devices bound, {resets} resets requested",
        gateway.device_count()
    ));
    Ok(())
}
