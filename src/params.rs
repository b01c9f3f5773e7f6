use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::SignalFloat;

/// The frequency of the PAL color carrier wave in hz.
pub const PAL_COLOR_CARRIER_FREQ: SignalFloat = 4_433_618.75;

/// The frequency of the NTSC color carrier wave in hz.
pub const NTSC_COLOR_CARRIER_FREQ: SignalFloat = 315.0e6 / 88.0;

/// The frequency of the PAL-M color carrier wave in hz (227.25 times the 525-line rate).
pub const PAL_M_COLOR_CARRIER_FREQ: SignalFloat = 3_575_611.49;

/// Subcarrier cycles per PAL line, including the 25 Hz offset.
pub const PAL_CYCLES_PER_LINE: SignalFloat = 283.7516;

/// Subcarrier cycles per NTSC line.
pub const NTSC_CYCLES_PER_LINE: SignalFloat = 227.5;

/// Subcarrier cycles per PAL-M line.
pub const PAL_M_CYCLES_PER_LINE: SignalFloat = 227.25;

/// Duration of the horizontal sync pulse in seconds.
pub const HSYNC_DURATION: SignalFloat = 4.7e-6;

/// The television system being synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoSystem {
    /// 625-line PAL.
    Pal,
    /// 525-line NTSC.
    Ntsc,
    /// 525-line PAL (Brazil).
    PalM,
}

impl VideoSystem {
    /// Whether chroma is modulated PAL style (U/V with a line-alternating V component).
    pub fn is_pal_family(self) -> bool {
        matches!(self, VideoSystem::Pal | VideoSystem::PalM)
    }

    /// Number of lines in one interlaced frame.
    pub fn lines_per_frame(self) -> u32 {
        match self {
            VideoSystem::Pal => 625,
            VideoSystem::Ntsc | VideoSystem::PalM => 525,
        }
    }

    /// Number of fields after which the absolute subcarrier phase repeats.
    pub fn color_framing_fields(self) -> u64 {
        match self {
            VideoSystem::Ntsc => 4,
            VideoSystem::Pal | VideoSystem::PalM => 8,
        }
    }

    /// Subcarrier cycles in one line period.
    pub fn cycles_per_line(self) -> SignalFloat {
        match self {
            VideoSystem::Pal => PAL_CYCLES_PER_LINE,
            VideoSystem::Ntsc => NTSC_CYCLES_PER_LINE,
            VideoSystem::PalM => PAL_M_CYCLES_PER_LINE,
        }
    }

    /// Nominal frames per second, as used for timecode.
    pub fn frame_rate(self) -> u32 {
        match self {
            VideoSystem::Pal => 25,
            VideoSystem::Ntsc | VideoSystem::PalM => 30,
        }
    }

    /// The source image size the encoder expects, in pixels.
    pub fn source_size(self) -> (usize, usize) {
        match self {
            VideoSystem::Pal => (720, 576),
            VideoSystem::Ntsc | VideoSystem::PalM => (720, 480),
        }
    }
}

impl fmt::Display for VideoSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoSystem::Pal => "PAL",
            VideoSystem::Ntsc => "NTSC",
            VideoSystem::PalM => "PAL_M",
        };
        f.write_str(name)
    }
}

/// Optional replacements for the preset signal levels, applied once before encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LevelOverrides {
    pub sync: Option<u16>,
    pub blanking: Option<u16>,
    pub black: Option<u16>,
    pub white: Option<u16>,
}

/// Parameters describing the sampled signal for one video system. These mirror the fields
/// archival decode tools expect to find in a TBC's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParameters {
    pub system: VideoSystem,

    /// Subcarrier frequency in hz.
    pub fsc: SignalFloat,

    /// Sample rate in hz, four times the subcarrier.
    pub sample_rate: SignalFloat,

    /// Width of each field line in samples.
    pub field_width: usize,

    /// Number of lines stored per field.
    pub field_height: usize,

    /// First sample of the color burst window.
    pub colour_burst_start: usize,

    /// One past the last sample of the color burst window.
    pub colour_burst_end: usize,

    /// First sample of the active picture.
    pub active_video_start: usize,

    /// One past the last sample of the active picture.
    pub active_video_end: usize,

    /// Number of field lines carrying vertical sync pulses.
    pub vsync_lines: usize,

    /// First field line carrying picture content.
    pub first_active_line: usize,

    /// One past the last field line carrying picture content.
    pub last_active_line: usize,

    pub sync_level: u16,
    pub blanking_level: u16,
    pub black_level: u16,
    pub white_level: u16,
}

impl VideoParameters {
    /// PAL composite, subcarrier locked at 4fSC.
    pub fn create_pal_composite() -> Self {
        Self {
            system: VideoSystem::Pal,
            fsc: PAL_COLOR_CARRIER_FREQ,
            sample_rate: 4.0 * PAL_COLOR_CARRIER_FREQ,
            field_width: 1135,
            field_height: 313,
            colour_burst_start: 98,
            colour_burst_end: 138,
            active_video_start: 185,
            active_video_end: 1107,
            vsync_lines: 5,
            first_active_line: 23,
            last_active_line: 310,
            // Sync tip -300 mV, blanking and black 0 mV (no setup), white 700 mV. This leaves
            // headroom above white for chroma excursions.
            sync_level: 0x0000,
            blanking_level: 0x4000,
            black_level: 0x4000,
            white_level: 0xE000,
        }
    }

    /// NTSC composite, subcarrier locked at 4fSC.
    pub fn create_ntsc_composite() -> Self {
        Self {
            system: VideoSystem::Ntsc,
            fsc: NTSC_COLOR_CARRIER_FREQ,
            sample_rate: 4.0 * NTSC_COLOR_CARRIER_FREQ,
            field_width: 910,
            field_height: 263,
            colour_burst_start: 89,
            colour_burst_end: 125,
            active_video_start: 172,
            active_video_end: 910,
            vsync_lines: 9,
            first_active_line: 21,
            last_active_line: 263,
            // Black carries the 7.5 IRE setup.
            sync_level: 0x0000,
            blanking_level: 0x4000,
            black_level: 0x4680,
            white_level: 0xC800,
        }
    }

    /// PAL-M composite: the 525-line raster of NTSC with PAL chroma.
    pub fn create_pal_m_composite() -> Self {
        Self {
            system: VideoSystem::PalM,
            fsc: PAL_M_COLOR_CARRIER_FREQ,
            sample_rate: 4.0 * PAL_M_COLOR_CARRIER_FREQ,
            field_width: 909,
            active_video_end: 909,
            ..Self::create_ntsc_composite()
        }
    }

    /// The preset parameters for a system.
    pub fn for_system(system: VideoSystem) -> Self {
        match system {
            VideoSystem::Pal => Self::create_pal_composite(),
            VideoSystem::Ntsc => Self::create_ntsc_composite(),
            VideoSystem::PalM => Self::create_pal_m_composite(),
        }
    }

    /// Replace any levels the overrides specify.
    pub fn with_levels(mut self, overrides: &LevelOverrides) -> Self {
        if let Some(sync) = overrides.sync {
            self.sync_level = sync;
        }
        if let Some(blanking) = overrides.blanking {
            self.blanking_level = blanking;
        }
        if let Some(black) = overrides.black {
            self.black_level = black;
        }
        if let Some(white) = overrides.white {
            self.white_level = white;
        }
        self
    }

    /// The duration of one line in seconds.
    pub fn line_period(&self) -> SignalFloat {
        self.field_width as SignalFloat / self.sample_rate
    }

    /// Convert a duration in seconds to a (fractional) number of samples.
    pub fn samples(&self, seconds: SignalFloat) -> SignalFloat {
        seconds * self.sample_rate
    }

    /// Number of samples per microsecond.
    pub fn samples_per_us(&self) -> SignalFloat {
        self.sample_rate / 1.0e6
    }

    /// Width of the active picture in samples.
    pub fn active_width(&self) -> usize {
        self.active_video_end - self.active_video_start
    }

    /// Number of samples in one complete field.
    pub fn field_len(&self) -> usize {
        self.field_width * self.field_height
    }

    /// White minus blanking, the 100 IRE span.
    pub fn ire_span(&self) -> SignalFloat {
        self.white_level as SignalFloat - self.blanking_level as SignalFloat
    }

    /// White minus black, the span used to scale picture content.
    pub fn picture_span(&self) -> SignalFloat {
        self.white_level as SignalFloat - self.black_level as SignalFloat
    }
}
