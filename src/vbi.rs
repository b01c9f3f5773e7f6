//! LaserDisc VBI payloads: the three 24-bit words carried on frame lines 16, 17 and 18.

use serde::{Deserialize, Serialize};

use crate::biphase::{to_bcd, BiphaseEncoder, MAX_PICTURE_NUMBER};
use crate::error::{Error, Result};
use crate::timecode::Timecode;

/// Programme status code sent on line 16 of CAV discs.
const CAV_STATUS: u32 = 0x8B_A000;

/// Lead-in code.
const LEAD_IN: u32 = 0x88_FFFF;

/// Lead-out code.
const LEAD_OUT: u32 = 0x80_EEEE;

/// Highest chapter number a disc can carry.
pub const MAX_CHAPTER: i64 = 79;

/// Which part of the disc a frame belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscArea {
    LeadIn,
    #[default]
    Programme,
    LeadOut,
}

/// The VBI words for one frame. A missing word leaves its line blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VbiPayload {
    words: [Option<u32>; 3],
}

impl VbiPayload {
    pub fn new(line16: Option<u32>, line17: Option<u32>, line18: Option<u32>) -> Self {
        Self {
            words: [line16, line17, line18],
        }
    }

    /// The word for VBI line `index` (0 = line 16).
    pub fn word(&self, index: usize) -> Option<u32> {
        self.words.get(index).copied().flatten()
    }

    pub fn words(&self) -> [Option<u32>; 3] {
        self.words
    }

    /// A CAV picture number on lines 17 and 18 with the programme status code on 16.
    pub fn cav(picture_number: i64) -> Result<Self> {
        if picture_number <= 0 {
            return Err(Error::out_of_range("picture number", picture_number));
        }
        let picture = picture_number.min(i64::from(MAX_PICTURE_NUMBER)) as u32;
        let [b0, b1, b2] = BiphaseEncoder::encode_cav_picture_number(picture);
        let word = u32::from(b0) << 16 | u32::from(b1) << 8 | u32::from(b2);
        Ok(Self::new(Some(CAV_STATUS), Some(word), Some(word)))
    }

    /// A CLV chapter number on lines 17 and 18.
    pub fn clv_chapter(chapter: i64) -> Result<Self> {
        if !(1..=MAX_CHAPTER).contains(&chapter) {
            return Err(Error::out_of_range("chapter", chapter));
        }
        let word = 0x80_0DDD | ((to_bcd(chapter as u32) & 0x7F) << 12);
        Ok(Self::new(None, Some(word), Some(word)))
    }

    /// CLV programme time: the picture number within the second and the seconds on line 16,
    /// hours and minutes on lines 17 and 18.
    pub fn clv_timecode(tc: &Timecode) -> Self {
        let sec_tens = tc.seconds / 10;
        let sec_units = tc.seconds % 10;
        let line16 = (0x8 << 20) | ((0x0A + sec_tens) << 16) | (0xE << 12) | (sec_units << 8) | to_bcd(tc.frames % 100);
        let line17 = 0xF0_DD00 | (to_bcd(tc.hours % 10) << 16) | to_bcd(tc.minutes % 60);
        Self::new(Some(line16), Some(line17), Some(line17))
    }

    pub fn lead_in() -> Self {
        Self::new(None, Some(LEAD_IN), Some(LEAD_IN))
    }

    pub fn lead_out() -> Self {
        Self::new(None, Some(LEAD_OUT), Some(LEAD_OUT))
    }

    /// The payload for a disc area outside the programme.
    pub fn for_area(area: DiscArea) -> Option<Self> {
        match area {
            DiscArea::LeadIn => Some(Self::lead_in()),
            DiscArea::LeadOut => Some(Self::lead_out()),
            DiscArea::Programme => None,
        }
    }
}
