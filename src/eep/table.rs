//! # Profile Table Documents
//!
//! Serde models of the YAML profile table and override documents, and their
//! validation into [`ProfileDescriptor`]s. A table is rejected as a whole as
//! soon as one entry is self-contradictory; nothing is silently repaired.
//!
//! ```yaml
//! version: 1
//! profiles:
//!   - eep: D2-50-00
//!     title: Ventilation unit
//!     data_len: 4
//!     channels:
//!       - name: fan_speed
//!         offset: 8
//!         size: 8
//!         kind: value
//!         raw: [0, 250]
//!         range: [0, 100]
//!         unit: "%"
//! ```

use crate::constants::{ERP1_MAX_DATA_LEN, MAX_ENUM_ITEMS, PROFILE_TABLE_VERSION, RSSI_ENTITY};
use crate::eep::classify::{auto_detect_meta, classify_platform, normalize_unit};
use crate::eep::id::EepId;
use crate::eep::platform::{EntityCategory, PlatformKind, StateClass};
use crate::eep::profile::{
    entity_key, ChannelSpec, EntityMeta, EnumItem, FixedBits, NumericScale, ProfileDescriptor,
    ValueKind,
};
use crate::error::EnOceanError;
use crate::util::bits::{fits, max_raw, MAX_FIELD_BITS};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Top-level profile table document.
#[derive(Debug, Deserialize)]
pub struct ProfileTableDoc {
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<ProfileDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileDoc {
    pub eep: EepId,
    #[serde(default)]
    pub title: String,
    pub data_len: usize,
    #[serde(default)]
    pub channels: Vec<ChannelDoc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindDoc {
    Value,
    Enum,
    Boolean,
}

#[derive(Debug, Deserialize)]
pub struct EnumItemDoc {
    pub value: u32,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Contiguous enum items generated from a symbol template such as `level_{value}`.
#[derive(Debug, Deserialize)]
pub struct EnumRangeDoc {
    pub start: u32,
    pub end: u32,
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct FixedBitsDoc {
    pub offset: u16,
    pub size: u16,
    pub value: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChannelDoc {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub offset: u16,
    pub size: u16,
    pub kind: KindDoc,
    #[serde(default)]
    pub raw: Option<[u32; 2]>,
    #[serde(default)]
    pub range: Option<[f64; 2]>,
    #[serde(default)]
    pub items: Vec<EnumItemDoc>,
    #[serde(default)]
    pub ranges: Vec<EnumRangeDoc>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub state_class: Option<StateClass>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub entity_category: Option<String>,
    #[serde(default)]
    pub platform: Option<PlatformKind>,
    #[serde(default)]
    pub command_bits: Vec<FixedBitsDoc>,
}

/// Presentation overrides layered on top of a base table.
#[derive(Debug, Deserialize)]
pub struct OverrideDoc {
    pub version: u32,
    #[serde(default)]
    pub overrides: Vec<ProfileOverrideDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileOverrideDoc {
    pub eep: EepId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelOverrideDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelOverrideDoc {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub platform: Option<PlatformKind>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub state_class: Option<StateClass>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub entity_category: Option<String>,
}

fn check_version(found: u32) -> Result<(), EnOceanError> {
    if found == 0 || found > PROFILE_TABLE_VERSION {
        return Err(EnOceanError::UnsupportedTableVersion {
            found,
            supported: PROFILE_TABLE_VERSION,
        });
    }
    Ok(())
}

/// Parse and validate a profile table.
pub fn parse_table(yaml: &str) -> Result<Vec<ProfileDescriptor>, EnOceanError> {
    let doc: ProfileTableDoc =
        serde_yaml::from_str(yaml).map_err(|e| EnOceanError::ProfileTable(e.to_string()))?;
    check_version(doc.version)?;

    let mut seen = HashSet::new();
    let mut profiles = Vec::with_capacity(doc.profiles.len());
    for profile in doc.profiles {
        if !seen.insert(profile.eep) {
            return Err(EnOceanError::DuplicateProfile(profile.eep));
        }
        profiles.push(build_profile(profile)?);
    }
    Ok(profiles)
}

/// Parse an override document without applying it.
pub fn parse_overrides(yaml: &str) -> Result<Vec<ProfileOverrideDoc>, EnOceanError> {
    let doc: OverrideDoc =
        serde_yaml::from_str(yaml).map_err(|e| EnOceanError::ProfileTable(e.to_string()))?;
    check_version(doc.version)?;
    Ok(doc.overrides)
}

fn build_profile(doc: ProfileDoc) -> Result<ProfileDescriptor, EnOceanError> {
    let eep = doc.eep;
    if doc.data_len == 0 || doc.data_len > ERP1_MAX_DATA_LEN {
        return Err(EnOceanError::InvalidProfile {
            eep: eep.to_string(),
            reason: format!(
                "data_len {} outside 1..={}",
                doc.data_len, ERP1_MAX_DATA_LEN
            ),
        });
    }

    // channel names become entity ids: distinct after normalisation, never `rssi`
    let mut keys: HashMap<String, String> = HashMap::new();
    let mut channels = Vec::with_capacity(doc.channels.len());
    for channel in doc.channels {
        let key = entity_key(&channel.name);
        let clash = if key == RSSI_ENTITY {
            Some(format!("channel name {} is reserved", channel.name))
        } else {
            match keys.insert(key, channel.name.clone()) {
                Some(earlier) if earlier == channel.name => {
                    Some(format!("duplicate channel name {}", channel.name))
                }
                Some(earlier) => Some(format!(
                    "channel name {} collides with {earlier}",
                    channel.name
                )),
                None => None,
            }
        };
        if let Some(reason) = clash {
            return Err(EnOceanError::InvalidProfile {
                eep: eep.to_string(),
                reason,
            });
        }
        channels.push(build_channel(eep, doc.data_len, channel)?);
    }

    Ok(ProfileDescriptor {
        eep,
        title: doc.title,
        data_len: doc.data_len,
        channels,
    })
}

fn build_channel(eep: EepId, data_len: usize, doc: ChannelDoc) -> Result<ChannelSpec, EnOceanError> {
    let invalid = |reason: String| EnOceanError::InvalidChannel {
        eep: eep.to_string(),
        channel: doc.name.clone(),
        reason,
    };

    if doc.size == 0 || doc.size > MAX_FIELD_BITS {
        return Err(invalid(format!("width {} outside 1..={}", doc.size, MAX_FIELD_BITS)));
    }
    if !fits(data_len, doc.offset, doc.size) {
        return Err(invalid(format!(
            "bits {}..{} exceed {} payload bytes",
            doc.offset,
            usize::from(doc.offset) + usize::from(doc.size),
            data_len
        )));
    }

    let kind = match doc.kind {
        KindDoc::Boolean => {
            if doc.size != 1 {
                return Err(invalid(format!("boolean must be 1 bit wide, got {}", doc.size)));
            }
            ValueKind::Boolean
        }
        KindDoc::Value => ValueKind::Value(build_scale(&doc).map_err(invalid)?),
        KindDoc::Enum => ValueKind::Enum {
            items: build_items(&doc).map_err(invalid)?,
        },
    };

    let description = doc.description.clone().unwrap_or_else(|| doc.name.clone());

    let platform = match doc.platform {
        Some(platform) => platform,
        None => classify_platform(&doc.name, &description, &kind),
    };
    check_platform(platform, &kind).map_err(invalid)?;

    let mut meta = EntityMeta {
        unit: doc.unit.as_deref().and_then(normalize_unit),
        device_class: doc.device_class.clone(),
        state_class: doc.state_class,
        icon: doc.icon.clone(),
        entity_category: parse_category(doc.entity_category.as_deref()).map_err(invalid)?,
    };
    auto_detect_meta(&doc.name, &description, &kind, &mut meta);

    let mut command_bits = Vec::with_capacity(doc.command_bits.len());
    for bits in &doc.command_bits {
        if bits.size == 0 || bits.size > MAX_FIELD_BITS || !fits(data_len, bits.offset, bits.size) {
            return Err(invalid(format!(
                "command bits at {} width {} do not fit the payload",
                bits.offset, bits.size
            )));
        }
        if bits.value > max_raw(bits.size) {
            return Err(invalid(format!(
                "command bits value {} wider than {} bits",
                bits.value, bits.size
            )));
        }
        command_bits.push(FixedBits {
            offset: bits.offset,
            size: bits.size,
            value: bits.value,
        });
    }

    Ok(ChannelSpec {
        name: doc.name,
        description,
        offset: doc.offset,
        size: doc.size,
        kind,
        platform,
        meta,
        command_bits,
    })
}

fn build_scale(doc: &ChannelDoc) -> Result<NumericScale, String> {
    let limit = max_raw(doc.size);
    let [raw_min, raw_max] = doc.raw.unwrap_or([0, limit]);

    if raw_min == raw_max {
        return Err(format!("degenerate raw range [{raw_min}, {raw_max}]"));
    }
    if raw_min > limit || raw_max > limit {
        return Err(format!(
            "raw range [{raw_min}, {raw_max}] not representable in {} bits",
            doc.size
        ));
    }

    let [min, max] = doc
        .range
        .unwrap_or([f64::from(raw_min), f64::from(raw_max)]);
    if !min.is_finite() || !max.is_finite() {
        return Err("non-finite scale bounds".to_string());
    }
    if min == max {
        return Err(format!("degenerate scale range [{min}, {max}]"));
    }

    Ok(NumericScale {
        raw_min,
        raw_max,
        min,
        max,
    })
}

fn build_items(doc: &ChannelDoc) -> Result<Vec<EnumItem>, String> {
    let limit = max_raw(doc.size);
    let mut items: Vec<EnumItem> = doc
        .items
        .iter()
        .map(|item| EnumItem {
            value: item.value,
            symbol: item.symbol.clone(),
            description: item.description.clone(),
        })
        .collect();

    for range in &doc.ranges {
        if range.start > range.end {
            return Err(format!("enum range {}..={} is empty", range.start, range.end));
        }
        if range.end > limit {
            return Err(format!("enum range end {} wider than {} bits", range.end, doc.size));
        }
        let span = u64::from(range.end - range.start) + 1;
        if items.len() as u64 + span > MAX_ENUM_ITEMS as u64 {
            return Err(format!(
                "enum range {}..={} exceeds {MAX_ENUM_ITEMS} items",
                range.start, range.end
            ));
        }
        for value in range.start..=range.end {
            items.push(EnumItem {
                value,
                symbol: range.symbol.replace("{value}", &value.to_string()),
                description: None,
            });
        }
    }

    if items.is_empty() {
        return Err("enum declares no items".to_string());
    }
    if items.len() > MAX_ENUM_ITEMS {
        return Err(format!("enum declares more than {MAX_ENUM_ITEMS} items"));
    }

    {
        let mut values = HashSet::new();
        let mut symbols = HashSet::new();
        for item in &items {
            if item.value > limit {
                return Err(format!("enum value {} wider than {} bits", item.value, doc.size));
            }
            if !values.insert(item.value) {
                return Err(format!("duplicate enum value {}", item.value));
            }
            if !symbols.insert(item.symbol.as_str()) {
                return Err(format!("duplicate enum symbol {}", item.symbol));
            }
        }
    }
    // symbol lookups binary-search on value
    items.sort_by_key(|item| item.value);
    Ok(items)
}

fn check_platform(platform: PlatformKind, kind: &ValueKind) -> Result<(), String> {
    let compatible = match platform {
        PlatformKind::Select => matches!(kind, ValueKind::Enum { .. }),
        PlatformKind::Number | PlatformKind::Light => matches!(kind, ValueKind::Value(_)),
        _ => true,
    };
    if compatible {
        Ok(())
    } else {
        Err(format!("platform {platform} cannot present a {} channel", kind.name()))
    }
}

fn parse_category(text: Option<&str>) -> Result<Option<EntityCategory>, String> {
    match text {
        None => Ok(None),
        Some(text) => EntityCategory::parse(text)
            .map(Some)
            .ok_or_else(|| format!("unknown entity category {text}")),
    }
}

/// Apply presentation overrides in place.
///
/// Unknown profiles or channels are errors, as is an override that leaves a
/// channel with a platform its kind cannot present.
pub fn apply_overrides(
    profiles: &mut [ProfileDescriptor],
    overrides: &[ProfileOverrideDoc],
) -> Result<(), EnOceanError> {
    for profile_override in overrides {
        let profile = profiles
            .iter_mut()
            .find(|p| p.eep == profile_override.eep)
            .ok_or(EnOceanError::ProfileNotFound(profile_override.eep))?;

        if let Some(title) = &profile_override.title {
            profile.title = title.clone();
        }

        for channel_override in &profile_override.channels {
            let eep = profile.eep;
            let channel = profile
                .channels
                .iter_mut()
                .find(|c| c.name == channel_override.name)
                .ok_or_else(|| EnOceanError::UnknownChannel {
                    eep,
                    channel: channel_override.name.clone(),
                })?;
            apply_channel_override(eep, channel, channel_override)?;
        }
    }
    Ok(())
}

fn apply_channel_override(
    eep: EepId,
    channel: &mut ChannelSpec,
    ov: &ChannelOverrideDoc,
) -> Result<(), EnOceanError> {
    let invalid = |reason: String| EnOceanError::InvalidChannel {
        eep: eep.to_string(),
        channel: ov.name.clone(),
        reason,
    };

    if let Some(platform) = ov.platform {
        check_platform(platform, &channel.kind).map_err(invalid)?;
        channel.platform = platform;
    }
    if let Some(description) = &ov.description {
        channel.description = description.clone();
    }
    if let Some(unit) = &ov.unit {
        channel.meta.unit = normalize_unit(unit);
    }
    if let Some(device_class) = &ov.device_class {
        channel.meta.device_class = Some(device_class.clone());
    }
    if let Some(state_class) = ov.state_class {
        channel.meta.state_class = Some(state_class);
    }
    if let Some(icon) = &ov.icon {
        channel.meta.icon = Some(icon.clone());
    }
    if ov.entity_category.is_some() {
        channel.meta.entity_category = parse_category(ov.entity_category.as_deref()).map_err(invalid)?;
    }
    Ok(())
}
