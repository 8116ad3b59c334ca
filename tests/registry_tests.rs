//! Profile table loading, validation and lookup.

use enocean_rs::eep::classify::classify_platform;
use enocean_rs::error::EnOceanError;
use enocean_rs::{EepId, EntityCategory, PlatformKind, ProfileRegistry, RegistryBuilder, StateClass, ValueKind};
use tempfile::TempDir;

const SMALL_TABLE: &str = r#"
version: 1
profiles:
  - eep: A5-09-04
    title: CO2 sensor
    data_len: 4
    channels:
      - name: hum
        description: Humidity
        offset: 0
        size: 8
        kind: value
        raw: [0, 200]
        range: [0, 100]
        unit: percent
      - name: conc
        description: CO2 concentration
        offset: 8
        size: 8
        kind: value
        raw: [0, 255]
        range: [0, 2550]
        unit: ppm
      - name: mode
        description: Operating mode
        offset: 24
        size: 2
        kind: enum
        items:
          - { value: 0, symbol: idle }
          - { value: 1, symbol: running }
"#;

fn eep(text: &str) -> EepId {
    text.parse().unwrap()
}

#[test]
fn test_builtin_profiles_resolve() {
    let registry = ProfileRegistry::builtin().unwrap();
    assert!(registry.len() >= 8);
    let profile = registry.lookup(&eep("A5-04-01")).unwrap();
    assert_eq!(profile.data_len, 4);
    assert_eq!(profile.channels.len(), 3);
}

#[test]
fn test_unknown_triplet_is_profile_not_found() {
    let registry = ProfileRegistry::builtin().unwrap();
    let missing = eep("A5-99-01");
    assert!(matches!(
        registry.lookup(&missing),
        Err(EnOceanError::ProfileNotFound(found)) if found == missing
    ));
    assert!(!registry.contains(&missing));
}

#[test]
fn test_builtin_presentation_metadata() {
    let registry = ProfileRegistry::builtin().unwrap();

    let tmp = registry.lookup(&eep("A5-02-05")).unwrap().channel("tmp").unwrap();
    assert_eq!(tmp.platform, PlatformKind::Sensor);
    assert_eq!(tmp.meta.unit.as_deref(), Some("°C"));
    assert_eq!(tmp.meta.device_class.as_deref(), Some("temperature"));
    assert_eq!(tmp.meta.state_class, Some(StateClass::Measurement));

    let svc = registry.lookup(&eep("A5-07-01")).unwrap().channel("svc").unwrap();
    assert_eq!(svc.meta.device_class.as_deref(), Some("voltage"));
    assert_eq!(svc.meta.entity_category, Some(EntityCategory::Diagnostic));

    let ventilation = registry.lookup(&eep("D2-50-00")).unwrap();
    assert_eq!(ventilation.channel("boost").unwrap().platform, PlatformKind::Select);
    assert_eq!(ventilation.channel("fan_speed").unwrap().platform, PlatformKind::Number);
    assert_eq!(ventilation.command_channels().count(), 2);

    let contact = registry.lookup(&eep("D5-00-01")).unwrap().channel("contact").unwrap();
    assert_eq!(contact.platform, PlatformKind::BinarySensor);
    assert_eq!(contact.meta.device_class.as_deref(), Some("opening"));
}

#[test]
fn test_custom_table_auto_detects() {
    let registry = ProfileRegistry::from_yaml_str(SMALL_TABLE).unwrap();
    let profile = registry.lookup(&eep("A5-09-04")).unwrap();

    let hum = profile.channel("hum").unwrap();
    assert_eq!(hum.meta.device_class.as_deref(), Some("humidity"));
    assert_eq!(hum.meta.unit.as_deref(), Some("%"));

    let conc = profile.channel("conc").unwrap();
    assert_eq!(conc.meta.device_class.as_deref(), Some("carbon_dioxide"));
    assert_eq!(conc.meta.unit.as_deref(), Some("ppm"));

    // Two-valued enums read as binary states
    assert_eq!(profile.channel("mode").unwrap().platform, PlatformKind::BinarySensor);
}

#[test]
fn test_table_file_and_overrides() {
    let dir = TempDir::new().unwrap();
    let table = dir.path().join("table.yaml");
    let overrides = dir.path().join("overrides.yaml");
    std::fs::write(&table, SMALL_TABLE).unwrap();
    std::fs::write(
        &overrides,
        r#"
version: 1
overrides:
  - eep: A5-09-04
    title: Office air quality
    channels:
      - name: conc
        unit: ppm
        icon: "mdi:air-filter"
        entity_category: diagnostic
"#,
    )
    .unwrap();

    let registry = RegistryBuilder::default()
        .table_file(&table)
        .unwrap()
        .overrides_file(&overrides)
        .unwrap()
        .build()
        .unwrap();
    let profile = registry.lookup(&eep("A5-09-04")).unwrap();
    assert_eq!(profile.title, "Office air quality");
    let conc = profile.channel("conc").unwrap();
    assert_eq!(conc.meta.icon.as_deref(), Some("mdi:air-filter"));
    assert_eq!(conc.meta.entity_category, Some(EntityCategory::Diagnostic));
    // bit layout is not touched by overrides
    assert_eq!((conc.offset, conc.size), (8, 8));
}

#[test]
fn test_table_combined_with_builtin_rejects_duplicates() {
    let duplicate = SMALL_TABLE.replace("A5-09-04", "A5-02-05");
    let result = RegistryBuilder::default()
        .builtin()
        .unwrap()
        .table(&duplicate)
        .unwrap()
        .build();
    assert!(matches!(result, Err(EnOceanError::DuplicateProfile(_))));
}

#[test]
fn test_load_time_validation() {
    let overlapping_enum = SMALL_TABLE.replace("{ value: 1, symbol: running }", "{ value: 0, symbol: running }");
    assert!(matches!(
        ProfileRegistry::from_yaml_str(&overlapping_enum),
        Err(EnOceanError::InvalidChannel { .. })
    ));

    let too_wide = SMALL_TABLE.replace("offset: 24\n        size: 2", "offset: 31\n        size: 2");
    assert!(matches!(
        ProfileRegistry::from_yaml_str(&too_wide),
        Err(EnOceanError::InvalidChannel { .. })
    ));

    let newer = SMALL_TABLE.replace("version: 1", "version: 7");
    assert!(matches!(
        ProfileRegistry::from_yaml_str(&newer),
        Err(EnOceanError::UnsupportedTableVersion { found: 7, .. })
    ));
}

#[test]
fn test_missing_table_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        ProfileRegistry::from_path(dir.path().join("absent.yaml")),
        Err(EnOceanError::ProfileTable(_))
    ));
}

#[test]
fn test_classify_by_name_pattern() {
    let scale = match &ProfileRegistry::builtin()
        .unwrap()
        .lookup(&eep("A5-38-08"))
        .unwrap()
        .channel("edim")
        .unwrap()
        .kind
    {
        ValueKind::Value(scale) => *scale,
        other => panic!("unexpected kind {other:?}"),
    };
    assert_eq!(
        classify_platform("DIM", "Dimming value", &ValueKind::Value(scale)),
        PlatformKind::Light
    );
    assert_eq!(
        classify_platform("TMP", "Temperature", &ValueKind::Value(scale)),
        PlatformKind::Sensor
    );
    assert_eq!(classify_platform("CO", "Contact", &ValueKind::Boolean), PlatformKind::BinarySensor);
}
