use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::params::VideoSystem;

/// The kind of source a signal imitates, which decides what goes in the vertical interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceVideoStandard {
    /// Plain video with an empty vertical interval.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Consumer tape: VITC timecode, no LaserDisc data.
    #[serde(rename = "consumer-tape")]
    ConsumerTape,
    /// NTSC LaserDisc (IEC 60856-1986).
    #[serde(rename = "iec60856-1986")]
    Iec60856_1986,
    /// PAL LaserDisc (IEC 60857-1986).
    #[serde(rename = "iec60857-1986")]
    Iec60857_1986,
}

impl SourceVideoStandard {
    /// Whether LaserDisc biphase VBI is carried for a video system.
    pub fn supports_vbi(self, system: VideoSystem) -> bool {
        matches!(
            (self, system),
            (SourceVideoStandard::Iec60856_1986, VideoSystem::Ntsc)
                | (SourceVideoStandard::Iec60857_1986, VideoSystem::Pal)
        )
    }

    /// Whether vertical interval test signals are inserted.
    pub fn supports_vits(self) -> bool {
        matches!(self, SourceVideoStandard::Iec60856_1986 | SourceVideoStandard::Iec60857_1986)
    }

    /// Whether VITC timecode is inserted.
    pub fn supports_vitc(self) -> bool {
        self == SourceVideoStandard::ConsumerTape
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceVideoStandard::None => "none",
            SourceVideoStandard::ConsumerTape => "consumer-tape",
            SourceVideoStandard::Iec60856_1986 => "iec60856-1986",
            SourceVideoStandard::Iec60857_1986 => "iec60857-1986",
        }
    }
}

impl fmt::Display for SourceVideoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceVideoStandard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SourceVideoStandard::None),
            "consumer-tape" => Ok(SourceVideoStandard::ConsumerTape),
            "iec60856-1986" => Ok(SourceVideoStandard::Iec60856_1986),
            "iec60857-1986" => Ok(SourceVideoStandard::Iec60857_1986),
            other => Err(Error::config(format!("unknown source video standard '{other}'"))),
        }
    }
}
