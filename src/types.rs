/// The floating point type to use for signal calculations. Phase is accumulated over an
/// unbounded number of lines at roughly 4.4 MHz, which is well past the point where f32 keeps
/// sub-sample accuracy, so everything here is done in f64.
pub type SignalFloat = f64;

/// Not really a type, but the PI constant to use with SignalFloat.
pub const PI: SignalFloat = std::f64::consts::PI;

/// The value of one output sample, as written to a TBC file.
pub type SampleValue = u16;

/// The type for an RGB color sample, in floating point format (0..1 per channel).
pub type RgbSample = (SignalFloat, SignalFloat, SignalFloat);

/// The type for a YUV (PAL) or YIQ (NTSC) color sample, in floating point format. Luma is in
/// 0..1 and the chroma pair in -1..1.
pub type YuvSample = (SignalFloat, SignalFloat, SignalFloat);

/// Round a signal level to the nearest representable sample, saturating at both ends of the
/// 16-bit range.
pub fn clamp_sample(level: SignalFloat) -> SampleValue {
    SignalFloat::clamp(level.round(), 0.0, 65535.0) as SampleValue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_sample_saturates_without_wrapping() {
        assert_eq!(clamp_sample(-12.0), 0);
        assert_eq!(clamp_sample(70000.0), 65535);
    }

    #[test]
    fn clamp_sample_rounds_to_nearest() {
        assert_eq!(clamp_sample(100.4), 100);
        assert_eq!(clamp_sample(100.6), 101);
    }
}
