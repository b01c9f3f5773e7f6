//! Vertical interval timecode.
//!
//! A VITC word is nine groups of ten bits. Each group opens with a `1, 0` sync pair followed by
//! one byte sent least significant bit first: eight bytes of SMPTE timecode and user bits, then
//! a CRC byte. The word is drawn with the Manchester renderer in a line divided into 115 bit
//! cells, so the 90 used cells leave room either side.

use crate::manchester::ManchesterRenderer;
use crate::params::VideoParameters;
use crate::timecode::Timecode;
use crate::types::{SampleValue, SignalFloat};

/// Bits in a complete VITC word including sync pairs and CRC.
pub const VITC_BITS: usize = 90;

/// Number of bit cells a line is divided into.
pub const BIT_CELLS_PER_LINE: usize = 115;

/// 10-90% edge time.
const EDGE_TIME: SignalFloat = 50.0e-9;

/// Gap after the end of color burst before the first bit.
const BURST_GAP: SignalFloat = 1.0e-6;

/// Earliest start of the first bit from the line start.
const EARLIEST_START: SignalFloat = 11.2e-6;

/// Minimum gap between the last bit and the end of the line.
const END_GAP: SignalFloat = 1.9e-6;

/// High level as a fraction of the blanking-to-white span (550 mV of 700 mV).
const HIGH_FRACTION: SignalFloat = 550.0 / 700.0;

/// Bit position of the field mark flag.
const FIELD_MARK_BIT: usize = 75;

/// The eight timecode bytes, laid out as in the SMPTE bit assignment with zero user bits.
pub fn timecode_bytes(tc: &Timecode, second_field: bool) -> [u8; 8] {
    let bcd = |value: u32| ((value % 10) as u8, (value / 10) as u8);
    let (frame_units, frame_tens) = bcd(tc.frames);
    let (sec_units, sec_tens) = bcd(tc.seconds);
    let (min_units, min_tens) = bcd(tc.minutes);
    let (hour_units, hour_tens) = bcd(tc.hours);

    let mut bytes = [
        frame_units & 0x0F,
        frame_tens & 0x03,
        sec_units & 0x0F,
        sec_tens & 0x07,
        min_units & 0x0F,
        min_tens & 0x07,
        hour_units & 0x0F,
        hour_tens & 0x03,
    ];

    if second_field {
        // The field mark sits in the eighth group, after its sync pair.
        let group = FIELD_MARK_BIT / 10;
        bytes[group] |= 1 << (FIELD_MARK_BIT % 10 - 2);
    }
    bytes
}

/// Compute the CRC byte over the first 82 serialized bits (eight groups plus the CRC group's
/// sync pair). Bit k of the CRC is the XOR of every bit whose index is congruent to k + 2
/// modulo 8, which makes the whole 90-bit word fold to zero.
pub fn crc(bits: &[u8; VITC_BITS]) -> u8 {
    let mut crc = 0u8;
    for (j, &bit) in bits[..82].iter().enumerate() {
        let k = (j + 6) % 8;
        crc ^= (bit & 1) << k;
    }
    crc
}

/// Write one sync pair and data byte into its ten-bit group.
fn write_group(bits: &mut [u8; VITC_BITS], group: usize, byte: u8) {
    let base = group * 10;
    bits[base] = 1;
    bits[base + 1] = 0;
    for i in 0..8 {
        bits[base + 2 + i] = (byte >> i) & 1;
    }
}

/// Generates VITC lines for one video system.
#[derive(Debug, Clone)]
pub struct VitcEncoder {
    fps: u32,
    renderer: ManchesterRenderer,
    start: usize,
}

impl VitcEncoder {
    pub fn new(params: &VideoParameters) -> Self {
        let samples_per_bit = ((params.field_width as SignalFloat / BIT_CELLS_PER_LINE as SignalFloat)
            .round() as usize)
            .max(2);
        let edge = (params.samples(EDGE_TIME).round() as usize).clamp(1, samples_per_bit / 2);

        let blanking = params.blanking_level as SignalFloat;
        let high = blanking + params.ire_span() * HIGH_FRACTION;

        let ceil_samples = |seconds: SignalFloat| params.samples(seconds).ceil() as usize;
        let earliest = (params.colour_burst_end + ceil_samples(BURST_GAP)).max(ceil_samples(EARLIEST_START));
        let latest = params
            .field_width
            .saturating_sub(ceil_samples(END_GAP) + VITC_BITS * samples_per_bit);

        Self {
            fps: params.system.frame_rate(),
            renderer: ManchesterRenderer::new(samples_per_bit, blanking, high, edge),
            start: earliest.min(latest),
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn samples_per_bit(&self) -> usize {
        self.renderer.samples_per_bit
    }

    /// Sample offset of the first bit.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The timecode carried for an absolute frame count.
    pub fn timecode(&self, total_frame: u64) -> Timecode {
        Timecode::from_frame_count(total_frame, self.fps)
    }

    /// Serialize the complete 90-bit word for a frame.
    pub fn encode_bits(&self, total_frame: u64, second_field: bool) -> [u8; VITC_BITS] {
        let bytes = timecode_bytes(&self.timecode(total_frame), second_field);

        let mut bits = [0u8; VITC_BITS];
        for (group, &byte) in bytes.iter().enumerate() {
            write_group(&mut bits, group, byte);
        }
        // The CRC covers the last group's sync pair, so that goes in before computing it.
        write_group(&mut bits, 8, 0);
        let crc = crc(&bits);
        write_group(&mut bits, 8, crc);

        bits
    }

    /// Draw the VITC word for a frame onto a blanked line.
    pub fn render(&self, line: &mut [SampleValue], total_frame: u64, second_field: bool) {
        let bits = self.encode_bits(total_frame, second_field);
        self.renderer.render(&bits, self.start, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pull the data byte back out of one ten-bit group.
    fn group_byte(bits: &[u8; VITC_BITS], group: usize) -> u8 {
        (0..8).fold(0, |byte, i| byte | (bits[group * 10 + 2 + i] << i))
    }

    #[test]
    fn frame_zero_is_midnight() {
        let encoder = VitcEncoder::new(&VideoParameters::create_pal_composite());
        assert_eq!(encoder.fps(), 25);

        let bits = encoder.encode_bits(0, false);
        for group in 0..8 {
            assert_eq!(group_byte(&bits, group), 0, "group {group}");
        }
        assert_eq!(group_byte(&bits, 8), crc(&bits));
    }

    #[test]
    fn every_group_starts_with_sync() {
        let encoder = VitcEncoder::new(&VideoParameters::create_ntsc_composite());
        let bits = encoder.encode_bits(123_456, true);
        for group in 0..9 {
            assert_eq!((bits[group * 10], bits[group * 10 + 1]), (1, 0));
        }
    }

    #[test]
    fn word_folds_to_zero() {
        let encoder = VitcEncoder::new(&VideoParameters::create_pal_composite());
        for frame in [0, 1, 24, 25, 90_000, 2_159_999] {
            for second_field in [false, true] {
                let bits = encoder.encode_bits(frame, second_field);
                for residue in 0..8 {
                    let parity = bits
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| j % 8 == residue)
                        .fold(0, |acc, (_, &b)| acc ^ b);
                    assert_eq!(parity, 0, "frame {frame} residue {residue}");
                }
            }
        }
    }

    #[test]
    fn timecode_digits_land_in_their_groups() {
        let encoder = VitcEncoder::new(&VideoParameters::create_ntsc_composite());
        // 12:34:56:17 at 30 fps.
        let frame = Timecode {
            hours: 12,
            minutes: 34,
            seconds: 56,
            frames: 17,
        }
        .to_frame_count(30);
        let bits = encoder.encode_bits(frame, false);

        let digits: Vec<u8> = (0..8).map(|g| group_byte(&bits, g)).collect();
        assert_eq!(digits, vec![7, 1, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn field_mark_only_in_second_field() {
        let encoder = VitcEncoder::new(&VideoParameters::create_pal_composite());
        assert_eq!(encoder.encode_bits(10, false)[75], 0);
        assert_eq!(encoder.encode_bits(10, true)[75], 1);
    }

    #[test]
    fn line_layout_fits() {
        for params in [VideoParameters::create_pal_composite(), VideoParameters::create_ntsc_composite()] {
            let encoder = VitcEncoder::new(&params);
            assert!(encoder.start() > params.colour_burst_end);
            assert!(encoder.start() + VITC_BITS * encoder.samples_per_bit() < params.field_width);
        }
        let pal = VitcEncoder::new(&VideoParameters::create_pal_composite());
        assert_eq!(pal.samples_per_bit(), 10);
        assert_eq!(pal.start(), 199);
    }
}
