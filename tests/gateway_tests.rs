//! Gateway behaviour: teach-in, availability, invalid telegram handling and
//! the device store.

use enocean_rs::{
    Availability, ChannelValue, DeviceAddress, EepId, Gateway, GatewayConfig, IgnoreReason,
    ProfileRegistry, RecordingSink, SinkEvent, Telegram, TelegramOutcome,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAN: DeviceAddress = DeviceAddress([0x05, 0x06, 0x07, 0x08]);
const SENSOR: DeviceAddress = DeviceAddress([0x01, 0x82, 0x5D, 0xAB]);
const CONTACT: DeviceAddress = DeviceAddress([0x00, 0x23, 0x41, 0x9C]);

fn eep(text: &str) -> EepId {
    text.parse().unwrap()
}

fn gateway(config: GatewayConfig) -> Gateway {
    Gateway::new(ProfileRegistry::builtin().unwrap(), config)
}

/// 4BS teach-in for A5-02-05, manufacturer 0x00B.
fn temperature_teach_in() -> Telegram {
    Telegram::new(0xA5, vec![0x08, 0x28, 0x0B, 0x80], SENSOR)
}

fn bad_fan_telegram() -> Telegram {
    Telegram::new(0xD2, vec![0x40, 0xFF, 0x00, 0x00], FAN)
}

fn good_fan_telegram() -> Telegram {
    Telegram::new(0xD2, vec![0x40, 0x64, 0x00, 0x00], FAN)
}

#[test]
fn test_availability_lifecycle() {
    let mut gw = gateway(GatewayConfig::default());
    let start = Instant::now();
    gw.add_device(FAN, eep("D2-50-00"), start).unwrap();
    let mut sink = RecordingSink::new();

    assert!(gw.check_availability(start + Duration::from_secs(3599), &mut sink).is_empty());
    assert_eq!(gw.check_availability(start + Duration::from_secs(3600), &mut sink), vec![FAN]);
    assert_eq!(gw.device(&FAN).unwrap().availability(), Availability::Unavailable);
    // no repeated transition
    assert!(gw.check_availability(start + Duration::from_secs(7200), &mut sink).is_empty());

    gw.handle_telegram(&good_fan_telegram(), start + Duration::from_secs(7300), &mut sink)
        .unwrap();
    let events = sink.take();
    assert_eq!(
        events[0],
        SinkEvent::Availability {
            address: FAN,
            availability: Availability::Unavailable
        }
    );
    assert_eq!(
        events[1],
        SinkEvent::Availability {
            address: FAN,
            availability: Availability::Available
        }
    );
    assert!(matches!(events[2], SinkEvent::Update { .. }));
}

#[test]
fn test_four_bs_teach_in() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    let mut sink = RecordingSink::new();

    assert_eq!(
        gw.handle_telegram(&temperature_teach_in(), now, &mut sink).unwrap(),
        TelegramOutcome::Ignored(IgnoreReason::NotLearning)
    );
    assert_eq!(gw.device_count(), 0);

    gw.start_learning(now, None);
    let outcome = gw.handle_telegram(&temperature_teach_in(), now, &mut sink).unwrap();
    match outcome {
        TelegramOutcome::Registered(teach_in) => {
            assert_eq!(teach_in.eep, eep("A5-02-05"));
            assert_eq!(teach_in.manufacturer, Some(0x00B));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    // first data telegram after teach-in
    let data = Telegram::new(0xA5, vec![0x00, 0x00, 0x00, 0x08], SENSOR);
    gw.handle_telegram(&data, now, &mut sink).unwrap();
    assert_eq!(sink.updates_for("01_82_5d_ab-tmp"), vec![&ChannelValue::Number(40.0)]);
}

#[test]
fn test_one_bs_teach_in_and_contact() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    let mut sink = RecordingSink::new();
    gw.start_learning(now, Some(Duration::from_secs(30)));

    let teach_in = Telegram::new(0xD5, vec![0x00], CONTACT);
    assert!(matches!(
        gw.handle_telegram(&teach_in, now, &mut sink).unwrap(),
        TelegramOutcome::Registered(_)
    ));
    assert_eq!(gw.device(&CONTACT).unwrap().eep, eep("D5-00-01"));

    gw.handle_telegram(&Telegram::new(0xD5, vec![0x09], CONTACT), now, &mut sink)
        .unwrap();
    gw.handle_telegram(&Telegram::new(0xD5, vec![0x08], CONTACT), now, &mut sink)
        .unwrap();
    assert_eq!(
        sink.updates_for("00_23_41_9c-contact"),
        vec![&ChannelValue::Bool(true), &ChannelValue::Bool(false)]
    );
}

#[test]
fn test_teach_in_for_unknown_profile() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    let mut sink = RecordingSink::new();
    gw.start_learning(now, None);

    // UTE query announcing D2-99-00
    let query = Telegram::new(0xD4, vec![0xA0, 0x01, 0x46, 0x00, 0x00, 0x99, 0xD2], SENSOR);
    assert_eq!(
        gw.handle_telegram(&query, now, &mut sink).unwrap(),
        TelegramOutcome::Ignored(IgnoreReason::UnknownProfile(eep("D2-99-00")))
    );
    assert_eq!(gw.device_count(), 0);
}

#[test]
fn test_learning_window_closes() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    let mut sink = RecordingSink::new();
    gw.start_learning(now, Some(Duration::from_secs(60)));

    let later = now + Duration::from_secs(61);
    assert_eq!(
        gw.handle_telegram(&temperature_teach_in(), later, &mut sink).unwrap(),
        TelegramOutcome::Ignored(IgnoreReason::NotLearning)
    );
}

#[test]
fn test_reset_after_consecutive_invalid_telegrams() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    gw.add_device(FAN, eep("D2-50-00"), now).unwrap();
    let mut sink = RecordingSink::new();

    for _ in 0..4 {
        let outcome = gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
        assert!(!outcome.needs_reset());
    }
    let outcome = gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
    assert!(outcome.needs_reset());

    // counters start over after the reset
    let outcome = gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
    assert!(!outcome.needs_reset());
}

#[test]
fn test_valid_telegram_clears_invalid_count() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    gw.add_device(FAN, eep("D2-50-00"), now).unwrap();
    let mut sink = RecordingSink::new();

    for _ in 0..4 {
        gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
    }
    gw.handle_telegram(&good_fan_telegram(), now, &mut sink).unwrap();
    for _ in 0..4 {
        let outcome = gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
        assert!(!outcome.needs_reset());
    }
}

#[test]
fn test_invalid_values_do_not_reach_sink() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    gw.add_device(FAN, eep("D2-50-00"), now).unwrap();
    let mut sink = RecordingSink::new();

    gw.handle_telegram(&bad_fan_telegram(), now, &mut sink).unwrap();
    assert!(sink.updates_for("05_06_07_08-fan_speed").is_empty());
    assert_eq!(sink.updates_for("05_06_07_08-boost").len(), 1);
}

#[test]
fn test_device_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = GatewayConfig {
        device_store: Some(dir.path().join("devices.json")),
        ..Default::default()
    };
    let now = Instant::now();

    {
        let mut gw = Gateway::from_config(config.clone(), now).unwrap();
        assert_eq!(gw.device_count(), 0);
        gw.start_learning(now, None);
        gw.handle_telegram(&temperature_teach_in(), now, &mut RecordingSink::new())
            .unwrap();
        gw.add_device(FAN, eep("D2-50-00"), now).unwrap();
    }

    let mut restored = Gateway::from_config(config, now).unwrap();
    assert_eq!(restored.device_count(), 2);
    assert_eq!(restored.device(&SENSOR).unwrap().eep, eep("A5-02-05"));
    let stored = restored.stored_devices();
    assert_eq!(stored[0].address, SENSOR);
    assert_eq!(stored[0].manufacturer, Some(0x00B));

    restored.remove_device(&FAN);
    let again = Gateway::from_config(restored.config().clone(), now).unwrap();
    assert_eq!(again.device_count(), 1);
}

#[test]
fn test_unbounded_learning_window() {
    let mut gw = gateway(GatewayConfig::default());
    let now = Instant::now();
    gw.start_learning(now, Some(Duration::MAX));
    assert!(gw.is_learning(now + Duration::from_secs(365 * 24 * 3600)));
    assert_eq!(gw.learning_remaining(now), Some(Duration::MAX));

    let mut sink = RecordingSink::new();
    assert!(matches!(
        gw.handle_telegram(&temperature_teach_in(), now, &mut sink).unwrap(),
        TelegramOutcome::Registered(_)
    ));

    gw.stop_learning();
    assert!(!gw.is_learning(now));
    assert_eq!(gw.learning_remaining(now), None);
}

#[test]
fn test_huge_configured_learning_time() {
    let config = GatewayConfig::from_yaml_str("learning_minutes: 18446744073709551615").unwrap();
    let mut gw = gateway(config);
    let now = Instant::now();
    gw.start_learning(now, None);
    assert!(gw.is_learning(now + Duration::from_secs(3600)));
}
