//! Still-frame sources: decoded images, raw 10-bit frames, colour bars and flat colour fills,
//! converted to the planar layout the encoders read.
//!
//! Frames are produced in 10-bit studio range (Y 64..940, chroma 448 ± 448), which the range
//! detector always recognises, even for an all-black frame.

use std::io::Cursor;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame_buffer::{FrameBuffer, SourceRange, STUDIO_C_NEUTRAL, STUDIO_Y_BLACK, STUDIO_Y_WHITE};
use crate::ntsc::uv_to_iq;
use crate::pal::{U_MAX, V_MAX};
use crate::params::VideoParameters;
use crate::types::{RgbSample, SignalFloat, YuvSample, PI};

/// Lowest and highest 10-bit studio chroma code a raw source may use.
const STUDIO_C_MIN: u16 = 64;
const STUDIO_C_MAX: u16 = 960;

/// Width in pixels of the raised-cosine blend between colour bars.
const BAR_TRANSITION: usize = 4;

/// Generated test pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCard {
    /// Eight vertical bars: EBU 100/0/75/0 for the PAL family, 75% bars for NTSC.
    ColourBars,
}

/// Peak I of the RGB to YIQ matrix (saturated red).
pub const I_RANGE: SignalFloat = 0.5959;

/// Peak Q of the RGB to YIQ matrix (saturated magenta).
pub const Q_RANGE: SignalFloat = 0.5229;

/// Convert from rgb to yuv, with u and v normalized to -1..1.
pub fn rgb_to_yuv((r, g, b): RgbSample) -> YuvSample {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 0.492 * (b - y);
    let v = 0.877 * (r - y);

    (y, u / U_MAX, v / V_MAX)
}

/// Convert from rgb to yiq, with i and q normalized to -1..1.
pub fn rgb_to_yiq((r, g, b): RgbSample) -> YuvSample {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let i = 0.596 * r - 0.274 * g - 0.322 * b;
    let q = 0.211 * r - 0.523 * g + 0.312 * b;

    (y, i / I_RANGE, q / Q_RANGE)
}

fn studio_luma(y: SignalFloat) -> u16 {
    (STUDIO_Y_BLACK + y * (STUDIO_Y_WHITE - STUDIO_Y_BLACK)).round().clamp(0.0, 1023.0) as u16
}

fn studio_chroma(c: SignalFloat) -> u16 {
    (STUDIO_C_NEUTRAL + c * STUDIO_C_NEUTRAL).round().clamp(0.0, 2.0 * STUDIO_C_NEUTRAL) as u16
}

/// Convert normalized YUV (u and v in -1..1) to YIQ normalized the same way as [`rgb_to_yiq`].
pub fn yuv_to_yiq((y, u, v): YuvSample) -> YuvSample {
    let (i, q) = uv_to_iq(u * U_MAX, v * V_MAX);
    (y, i / I_RANGE, q / Q_RANGE)
}

/// Pack normalized luma/chroma triples into studio-range planes.
fn pack_planes(width: usize, height: usize, samples: impl Iterator<Item = YuvSample>) -> Result<FrameBuffer> {
    let plane = width * height;
    let mut y = Vec::with_capacity(plane);
    let mut c1 = Vec::with_capacity(plane);
    let mut c2 = Vec::with_capacity(plane);
    for (luma, a, b) in samples {
        y.push(studio_luma(luma));
        c1.push(studio_chroma(a));
        c2.push(studio_chroma(b));
    }

    FrameBuffer::from_planes(width, height, &y, &c1, &c2)
}

/// Convert normalized RGB pixels to a planar frame, YUV for the PAL family and YIQ for NTSC.
fn to_planar(params: &VideoParameters, width: usize, height: usize, pixels: impl Iterator<Item = RgbSample>) -> Result<FrameBuffer> {
    let convert = if params.system.is_pal_family() {
        rgb_to_yuv
    }
    else {
        rgb_to_yiq
    };
    pack_planes(width, height, pixels.map(convert))
}

/// Check a raw frame holds exactly `components` 16-bit values per pixel at the source size.
fn raw_words(buf: &[u8], params: &VideoParameters, components: usize, format: &str) -> Result<Vec<u16>> {
    let (width, height) = params.system.source_size();
    let expected = width * height * components * 2;
    if buf.len() != expected {
        return Err(Error::frame_size(
            width,
            height,
            format!("{format} frames for {} are {expected} bytes, got {}", params.system, buf.len()),
        ));
    }

    let mut words = vec![0; width * height * components];
    LittleEndian::read_u16_into(buf, &mut words);
    Ok(words)
}

/// Decode a raw Y'CbCr 4:2:2 frame: little-endian 16-bit words ordered Y0 Cb Y1 Cr, holding
/// 10-bit studio-range codes. Chroma is shared by each pixel pair. NTSC frames are rotated onto
/// the I/Q axes.
pub fn from_yuv422_bytes(buf: &[u8], params: &VideoParameters) -> Result<FrameBuffer> {
    let (width, height) = params.system.source_size();
    let words = raw_words(buf, params, 2, "YUV422")?;

    let luma = |code: u16| SourceRange::Studio.luma(code.clamp(STUDIO_Y_BLACK as u16, STUDIO_Y_WHITE as u16));
    let chroma = |code: u16| SourceRange::Studio.chroma(code.clamp(STUDIO_C_MIN, STUDIO_C_MAX) - STUDIO_C_MIN);
    let pixels = words.chunks_exact(4).flat_map(|group| {
        let (cb, cr) = (chroma(group[1]), chroma(group[3]));
        [(luma(group[0]), cb, cr), (luma(group[2]), cb, cr)]
    });

    if params.system.is_pal_family() {
        pack_planes(width, height, pixels)
    }
    else {
        pack_planes(width, height, pixels.map(yuv_to_yiq))
    }
}

/// Decode a raw RGB30 frame: interleaved R, G, B as 10-bit full-range codes in little-endian
/// 16-bit words.
pub fn from_rgb30_bytes(buf: &[u8], params: &VideoParameters) -> Result<FrameBuffer> {
    let (width, height) = params.system.source_size();
    let words = raw_words(buf, params, 3, "RGB30")?;

    let scale = |code: u16| code.min(1023) as SignalFloat / 1023.0;
    let pixels = words.chunks_exact(3).map(|rgb| (scale(rgb[0]), scale(rgb[1]), scale(rgb[2])));
    to_planar(params, width, height, pixels)
}

/// Load a raw YUV422 frame file.
pub fn load_yuv422(path: &Path, params: &VideoParameters) -> Result<FrameBuffer> {
    debug!("Loading YUV422 {}", path.display());
    from_yuv422_bytes(&std::fs::read(path)?, params)
}

/// Load a raw RGB30 frame file.
pub fn load_rgb30(path: &Path, params: &VideoParameters) -> Result<FrameBuffer> {
    debug!("Loading RGB30 {}", path.display());
    from_rgb30_bytes(&std::fs::read(path)?, params)
}

/// Generate a test card at the system's source size.
pub fn test_card(card: TestCard, params: &VideoParameters) -> Result<FrameBuffer> {
    match card {
        TestCard::ColourBars => colour_bars(params),
    }
}

fn colour_bars(params: &VideoParameters) -> Result<FrameBuffer> {
    let white = if params.system.is_pal_family() { 1.0 } else { 0.75 };
    let bars: [RgbSample; 8] = [
        (white, white, white),
        (0.75, 0.75, 0.0),
        (0.0, 0.75, 0.75),
        (0.0, 0.75, 0.0),
        (0.75, 0.0, 0.75),
        (0.75, 0.0, 0.0),
        (0.0, 0.0, 0.75),
        (0.0, 0.0, 0.0),
    ];

    let (width, height) = params.system.source_size();
    let bar_width = width / bars.len();
    let row: Vec<RgbSample> = (0..width)
        .map(|x| {
            let bar = (x / bar_width).min(bars.len() - 1);
            let offset = x % bar_width;
            if bar + 1 < bars.len() && offset >= bar_width - BAR_TRANSITION {
                // Raised-cosine blend into the next bar.
                let pos = (offset + BAR_TRANSITION - bar_width) as SignalFloat;
                let blend = 0.5 * (1.0 - SignalFloat::cos(PI * pos / BAR_TRANSITION as SignalFloat));
                let (a, b) = (bars[bar], bars[bar + 1]);
                (
                    a.0 + (b.0 - a.0) * blend,
                    a.1 + (b.1 - a.1) * blend,
                    a.2 + (b.2 - a.2) * blend,
                )
            }
            else {
                bars[bar]
            }
        })
        .collect();

    to_planar(params, width, height, (0..height).flat_map(|_| row.iter().copied()))
}

/// A frame of one 8-bit RGB colour at the system's source size.
pub fn flat_colour([r, g, b]: [u8; 3], params: &VideoParameters) -> Result<FrameBuffer> {
    let (width, height) = params.system.source_size();
    let pixel = (r as SignalFloat / 255.0, g as SignalFloat / 255.0, b as SignalFloat / 255.0);
    to_planar(params, width, height, std::iter::repeat(pixel).take(width * height))
}
