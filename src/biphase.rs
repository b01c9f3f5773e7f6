//! LaserDisc biphase VBI words (IEC 60856/60857 lines 16, 17 and 18).

use crate::manchester::ManchesterRenderer;
use crate::params::{VideoParameters, VideoSystem};
use crate::types::{SampleValue, SignalFloat};

/// Duration of one bit cell.
pub const BIT_PERIOD: SignalFloat = 2.0e-6;

/// Rise and fall time of each transition.
pub const RISE_TIME: SignalFloat = 225.0e-9;

/// Number of bits in one VBI word.
pub const WORD_BITS: usize = 24;

/// Highest picture number a CAV disc can carry.
pub const MAX_PICTURE_NUMBER: u32 = 79_999;

/// Position of the first bit as a fraction of the line period.
const START_FRACTION: SignalFloat = 0.188;

/// Nominal PAL line period.
const PAL_LINE_PERIOD: SignalFloat = 64.0e-6;

/// Nominal NTSC line period.
const NTSC_LINE_PERIOD: SignalFloat = 63.556e-6;

/// Convert a value to packed BCD, one decimal digit per nibble.
pub fn to_bcd(mut value: u32) -> u32 {
    let mut bcd = 0;
    let mut shift = 0;
    while value > 0 {
        bcd |= (value % 10) << shift;
        value /= 10;
        shift += 4;
    }
    bcd
}

/// Encodes 24-bit words as biphase (Manchester) code on a VBI line.
#[derive(Debug, Clone)]
pub struct BiphaseEncoder {
    renderer: ManchesterRenderer,
    start: usize,
}

impl BiphaseEncoder {
    pub fn new(params: &VideoParameters) -> Self {
        let samples_per_bit = params.samples(BIT_PERIOD) as usize;
        let ramp = (params.samples(RISE_TIME).round() as usize).max(1);
        let line_period = match params.system {
            VideoSystem::Ntsc => NTSC_LINE_PERIOD,
            VideoSystem::Pal | VideoSystem::PalM => PAL_LINE_PERIOD,
        };

        Self {
            renderer: ManchesterRenderer::new(
                samples_per_bit,
                params.black_level as SignalFloat,
                params.white_level as SignalFloat,
                ramp,
            ),
            start: (params.sample_rate * START_FRACTION * line_period) as usize,
        }
    }

    /// Split a CAV picture number into the three bytes of its VBI word: a 0xF lead nibble
    /// followed by five BCD digits. Numbers above 79999 are clamped.
    pub fn encode_cav_picture_number(frame_number: u32) -> [u8; 3] {
        let bcd = to_bcd(frame_number.min(MAX_PICTURE_NUMBER));
        let word = 0xF0_0000 | (bcd & 0x07_FFFF);
        [(word >> 16) as u8, (word >> 8) as u8, word as u8]
    }

    /// The 24 bits of a word, most significant first.
    pub fn encode_word(word: u32) -> [u8; WORD_BITS] {
        let mut bits = [0; WORD_BITS];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = ((word >> (WORD_BITS - 1 - i)) & 1) as u8;
        }
        bits
    }

    /// Sample offset of the first bit within the line.
    pub fn signal_start_position(&self) -> usize {
        self.start
    }

    pub fn samples_per_bit(&self) -> usize {
        self.renderer.samples_per_bit
    }

    /// Draw a word onto a line that already carries sync and blanking.
    pub fn render_word(&self, line: &mut [SampleValue], word: u32) {
        self.renderer.render(&Self::encode_word(word), self.start, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cav_picture_numbers() {
        assert_eq!(BiphaseEncoder::encode_cav_picture_number(12345), [0xF1, 0x23, 0x45]);
        assert_eq!(BiphaseEncoder::encode_cav_picture_number(0), [0xF0, 0x00, 0x00]);
        assert_eq!(BiphaseEncoder::encode_cav_picture_number(79999), [0xF7, 0x99, 0x99]);
        assert_eq!(
            BiphaseEncoder::encode_cav_picture_number(123456),
            BiphaseEncoder::encode_cav_picture_number(79999)
        );
    }

    #[test]
    fn bcd_conversion() {
        assert_eq!(to_bcd(0), 0);
        assert_eq!(to_bcd(9), 0x9);
        assert_eq!(to_bcd(1234), 0x1234);
    }

    #[test]
    fn words_are_msb_first() {
        let bits = BiphaseEncoder::encode_word(0x80_0001);
        assert_eq!(bits[0], 1);
        assert_eq!(bits[23], 1);
        assert_eq!(bits[1..23].iter().filter(|&&b| b == 1).count(), 0);
    }

    #[test]
    fn pal_timing() {
        let encoder = BiphaseEncoder::new(&VideoParameters::create_pal_composite());
        // 17.734475 MHz * 2 us.
        assert_eq!(encoder.samples_per_bit(), 35);
        // 17.734475 MHz * 0.188 * 64 us.
        assert_eq!(encoder.signal_start_position(), 213);
        // The whole word fits in the line.
        assert!(encoder.signal_start_position() + 24 * encoder.samples_per_bit() < 1135);
    }

    #[test]
    fn rendered_word_decodes() {
        let params = VideoParameters::create_ntsc_composite();
        let encoder = BiphaseEncoder::new(&params);
        let mut line = vec![params.blanking_level; params.field_width];
        let word = 0x8B_A000;
        encoder.render_word(&mut line, word);

        let spb = encoder.samples_per_bit();
        let start = encoder.signal_start_position();
        let threshold = (params.black_level as u32 + params.white_level as u32) / 2;
        let mut decoded = 0u32;
        for i in 0..WORD_BITS {
            let q3 = line[start + i * spb + 3 * spb / 4] as u32;
            decoded = (decoded << 1) | u32::from(q3 > threshold);
        }
        assert_eq!(decoded, word);
    }
}
