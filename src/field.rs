use crate::params::VideoParameters;
use crate::types::SampleValue;

/// One scanned field: `height` lines of `width` 16-bit samples, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    width: usize,
    height: usize,
    samples: Vec<SampleValue>,
}

impl Field {
    /// Create a field with every sample set to `level`.
    pub fn new(width: usize, height: usize, level: SampleValue) -> Self {
        Self {
            width,
            height,
            samples: vec![level; width * height],
        }
    }

    /// Create a field sized for the given parameters, filled with blanking.
    pub fn blank(params: &VideoParameters) -> Self {
        Self::new(params.field_width, params.field_height, params.blanking_level)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The samples of one line.
    pub fn line(&self, line: usize) -> &[SampleValue] {
        &self.samples[line * self.width..(line + 1) * self.width]
    }

    /// The samples of one line, mutably.
    pub fn line_mut(&mut self, line: usize) -> &mut [SampleValue] {
        &mut self.samples[line * self.width..(line + 1) * self.width]
    }

    /// All samples, in line order.
    pub fn samples(&self) -> &[SampleValue] {
        &self.samples
    }
}

/// An interlaced frame: the first (odd-line) field followed by the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub first: Field,
    pub second: Field,
}

impl Frame {
    pub fn new(first: Field, second: Field) -> Self {
        Self { first, second }
    }

    /// The two fields in transmission order.
    pub fn fields(&self) -> [&Field; 2] {
        [&self.first, &self.second]
    }
}
