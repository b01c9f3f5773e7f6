use crate::error::{Error, Result};
use crate::types::SignalFloat;

/// Largest luma value a studio-range (10-bit) source can hold.
pub const STUDIO_RANGE_MAX: u16 = 1023;

/// 10-bit studio-range black.
pub const STUDIO_Y_BLACK: SignalFloat = 64.0;

/// 10-bit studio-range white.
pub const STUDIO_Y_WHITE: SignalFloat = 940.0;

/// 10-bit studio-range chroma neutral point; chroma spans 0..896 around it.
pub const STUDIO_C_NEUTRAL: SignalFloat = 448.0;

/// 16-bit full-range chroma neutral point.
pub const FULL_C_NEUTRAL: SignalFloat = 32768.0;

/// How the samples of a frame buffer are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Interleaved R, G, B, 16 bits each.
    Rgb48,
    /// Three full-resolution 16-bit planes: Y, then U and V (or I and Q for NTSC).
    Yuv444P16,
}

impl PixelFormat {
    /// Number of 16-bit values per pixel.
    pub fn components(self) -> usize {
        3
    }
}

/// The value range of a planar luma/chroma source. There is no flag for this in the buffer,
/// it is inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRange {
    /// 10-bit studio levels: black 64, white 940, sub-black and super-white preserved.
    Studio,
    /// 16-bit full range: 0..65535 luma, chroma centred on 32768.
    Full,
}

impl SourceRange {
    /// Normalized luma, 0 at black and 1 at white. Studio range can fall outside 0..1.
    pub fn luma(self, value: u16) -> SignalFloat {
        match self {
            SourceRange::Studio => {
                (value as SignalFloat - STUDIO_Y_BLACK) / (STUDIO_Y_WHITE - STUDIO_Y_BLACK)
            }
            SourceRange::Full => value as SignalFloat / 65535.0,
        }
    }

    /// Normalized chroma difference, 0 at neutral and roughly -1..1 at the extremes.
    pub fn chroma(self, value: u16) -> SignalFloat {
        match self {
            SourceRange::Studio => (value as SignalFloat - STUDIO_C_NEUTRAL) / STUDIO_C_NEUTRAL,
            SourceRange::Full => (value as SignalFloat - FULL_C_NEUTRAL) / FULL_C_NEUTRAL,
        }
    }
}

/// One progressive input frame at source resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u16>,
}

impl FrameBuffer {
    /// Wrap existing data, checking it holds exactly one frame.
    pub fn from_data(width: usize, height: usize, format: PixelFormat, data: Vec<u16>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::frame_size(width, height, "frame has no pixels"));
        }
        let expected = width * height * format.components();
        if data.len() != expected {
            return Err(Error::frame_size(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Build a planar YUV frame from three separate planes.
    pub fn from_planes(width: usize, height: usize, y: &[u16], u: &[u16], v: &[u16]) -> Result<Self> {
        let mut data = Vec::with_capacity(width * height * 3);
        data.extend_from_slice(y);
        data.extend_from_slice(u);
        data.extend_from_slice(v);
        Self::from_data(width, height, PixelFormat::Yuv444P16, data)
    }

    /// A planar YUV frame with every pixel set to the same value.
    pub fn filled_yuv(width: usize, height: usize, (y, u, v): (u16, u16, u16)) -> Self {
        let plane = width * height;
        let mut data = vec![y; plane * 3];
        data[plane..plane * 2].fill(u);
        data[plane * 2..].fill(v);

        Self {
            width,
            height,
            format: PixelFormat::Yuv444P16,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Fail unless the buffer is planar YUV.
    pub fn require_planar(&self) -> Result<()> {
        match self.format {
            PixelFormat::Yuv444P16 => Ok(()),
            found => Err(Error::UnsupportedPixelFormat {
                found,
                expected: PixelFormat::Yuv444P16,
            }),
        }
    }

    /// One row of one plane of a planar buffer (0 = Y, 1 = U/I, 2 = V/Q).
    pub fn plane_row(&self, plane: usize, row: usize) -> Result<&[u16]> {
        self.require_planar()?;
        if row >= self.height {
            return Err(Error::frame_size(self.width, self.height, format!("row {row} is past the bottom")));
        }
        let start = plane * self.width * self.height + row * self.width;
        Ok(&self.data[start..start + self.width])
    }

    /// Work out whether the buffer holds studio or full range data by scanning the luma
    /// plane's maximum.
    pub fn detect_range(&self) -> Result<SourceRange> {
        self.require_planar()?;
        let luma = &self.data[..self.width * self.height];
        let max = luma.iter().copied().max().unwrap_or(0);

        Ok(if max <= STUDIO_RANGE_MAX {
            SourceRange::Studio
        }
        else {
            SourceRange::Full
        })
    }
}
