//! Entity derivation and command routing.

use enocean_rs::dispatch::{self, apply, entities_for, platforms_for};
use enocean_rs::error::EnOceanError;
use enocean_rs::payload::decode;
use enocean_rs::{
    CommandValue, DeviceAddress, DeviceBinding, EepId, PlatformKind, ProfileRegistry,
    RecordingSink, Telegram,
};
use std::collections::BTreeSet;
use std::time::Instant;

const DIMMER: DeviceAddress = DeviceAddress([0x01, 0x9A, 0x33, 0x10]);
const BASE: DeviceAddress = DeviceAddress([0xFF, 0x80, 0x12, 0x00]);

fn eep(text: &str) -> EepId {
    text.parse().unwrap()
}

#[test]
fn test_platform_set_is_static() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.lookup(&eep("A5-38-08")).unwrap();
    let expected: BTreeSet<_> = [PlatformKind::Light, PlatformKind::Switch].into_iter().collect();
    assert_eq!(platforms_for(profile), expected);
}

#[test]
fn test_every_builtin_profile_gets_rssi_entity() {
    let registry = ProfileRegistry::builtin().unwrap();
    for profile in registry.iter() {
        let entities = entities_for(&DIMMER, profile);
        assert_eq!(entities.len(), profile.channels.len() + 1, "{}", profile.eep);
        assert_eq!(entities.last().unwrap().unique_id, "01_9a_33_10-rssi");
    }
}

#[test]
fn test_command_capable_entities() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.lookup(&eep("D2-01-00")).unwrap();
    let capable: Vec<String> = entities_for(&DIMMER, profile)
        .into_iter()
        .filter(|e| e.is_command_capable())
        .map(|e| e.unique_id)
        .collect();
    assert_eq!(capable, vec!["01_9a_33_10-output_value".to_string()]);
}

#[test]
fn test_actuator_status_and_command() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.lookup(&eep("D2-01-00")).unwrap();
    let mut binding = DeviceBinding::new(DIMMER, profile, Instant::now());
    let mut sink = RecordingSink::new();

    // status response, local control on, output 75 %
    let status = Telegram::new(0xD2, vec![0x04, 0x00, 0xCB], DIMMER);
    let report = apply(&mut binding, &decode(&status, profile), &mut sink);
    assert!(report.all_valid());
    assert_eq!(
        sink.updates_for("01_9a_33_10-output_value")[0].as_f64(),
        Some(75.0)
    );

    let telegram = dispatch::encode_command(
        &binding,
        profile,
        "output_value",
        &CommandValue::Number(100.0),
        BASE,
    )
    .unwrap();
    assert_eq!(telegram.payload, vec![0x01, 0x00, 0x64]);
    assert_eq!(telegram.destination, Some(DIMMER));
    assert_eq!(telegram.sender, BASE);
}

#[test]
fn test_command_for_wrong_profile() {
    let registry = ProfileRegistry::builtin().unwrap();
    let actuator = registry.lookup(&eep("D2-01-00")).unwrap();
    let ventilation = registry.lookup(&eep("D2-50-00")).unwrap();
    let binding = DeviceBinding::new(DIMMER, actuator, Instant::now());

    let result = dispatch::encode_command(
        &binding,
        ventilation,
        "fan_speed",
        &CommandValue::Number(10.0),
        BASE,
    );
    assert!(matches!(result, Err(EnOceanError::ProfileNotFound(_))));
}
