//! Teach-in telegram recognition.
//!
//! Three shapes carry enough information to bind a device:
//!
//! - UTE (`D4`) teach-in queries name the full EEP and manufacturer
//! - 4BS teach-in telegrams with the LRN-type bit set carry FUNC, TYPE and
//!   manufacturer in DB3..DB1
//! - 1BS telegrams with the LRN bit cleared always mean D5-00-01

use crate::constants::{
    LRN_BIT_MASK_1BS, LRN_BIT_MASK_4BS, LRN_TYPE_MASK_4BS, RORG_1BS, RORG_4BS, RORG_UTE,
    UTE_CMD_TEACH_IN_QUERY, UTE_DATA_LEN,
};
use crate::eep::EepId;
use crate::telegram::Telegram;
use crate::util::bits::extract_bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeachInKind {
    Ute,
    FourBs,
    OneBs,
}

/// Profile announced by a teach-in telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeachIn {
    pub kind: TeachInKind,
    pub eep: EepId,
    /// 11-bit manufacturer id, when the telegram carries one
    pub manufacturer: Option<u16>,
}

/// Recognise a teach-in telegram.
///
/// Returns `None` for data telegrams and for teach-in variants that do not
/// name a profile (4BS with the LRN-type bit clear).
pub fn parse_teach_in(telegram: &Telegram) -> Option<TeachIn> {
    match telegram.rorg {
        RORG_UTE => parse_ute(&telegram.payload),
        RORG_4BS => parse_4bs(&telegram.payload),
        RORG_1BS => parse_1bs(&telegram.payload),
        _ => None,
    }
}

/// `true` for any telegram with its LRN bit cleared or a UTE query,
/// whether or not it names a profile.
pub fn is_learn_telegram(telegram: &Telegram) -> bool {
    match telegram.rorg {
        RORG_UTE => true,
        RORG_4BS if telegram.payload.len() == 4 => telegram.payload[3] & LRN_BIT_MASK_4BS == 0,
        RORG_1BS if telegram.payload.len() == 1 => telegram.payload[0] & LRN_BIT_MASK_1BS == 0,
        _ => false,
    }
}

fn parse_ute(payload: &[u8]) -> Option<TeachIn> {
    if payload.len() != UTE_DATA_LEN {
        return None;
    }
    // DB6 bits 3..0 hold the command id
    if payload[0] & 0x0F != UTE_CMD_TEACH_IN_QUERY {
        return None;
    }
    let manufacturer = (u16::from(payload[3] & 0x07) << 8) | u16::from(payload[2]);
    Some(TeachIn {
        kind: TeachInKind::Ute,
        eep: EepId::new(payload[6], payload[5], payload[4]),
        manufacturer: Some(manufacturer),
    })
}

fn parse_4bs(payload: &[u8]) -> Option<TeachIn> {
    if payload.len() != 4 {
        return None;
    }
    let db0 = payload[3];
    if db0 & LRN_BIT_MASK_4BS != 0 || db0 & LRN_TYPE_MASK_4BS == 0 {
        return None;
    }
    let func = extract_bits(payload, 0, 6)?;
    let type_ = extract_bits(payload, 6, 7)?;
    let manufacturer = extract_bits(payload, 13, 11)?;
    Some(TeachIn {
        kind: TeachInKind::FourBs,
        eep: EepId::new(RORG_4BS, func as u8, type_ as u8),
        manufacturer: Some(manufacturer as u16),
    })
}

fn parse_1bs(payload: &[u8]) -> Option<TeachIn> {
    if payload.len() != 1 || payload[0] & LRN_BIT_MASK_1BS != 0 {
        return None;
    }
    Some(TeachIn {
        kind: TeachInKind::OneBs,
        eep: EepId::new(RORG_1BS, 0x00, 0x01),
        manufacturer: None,
    })
}
