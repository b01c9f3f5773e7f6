use crate::burst::modulate;
use crate::error::Result;
use crate::field::Field;
use crate::filter::FirFilter;
use crate::frame_buffer::{FrameBuffer, SourceRange};
use crate::line::{prepare_row, source_column, source_row, ActiveSignal, EncoderOptions, LineSynth, SignalPart};
use crate::params::VideoParameters;
use crate::types::SignalFloat;
use crate::vbi::VbiPayload;

/// Peak I excursion the encoder scales normalized I by.
///
/// The RGB to YIQ conversion in `source` uses 0.5959, the value from the conversion matrix.
/// The two agree to 0.03% and both are kept until one is confirmed against the standard.
pub const I_MAX: SignalFloat = 0.5957;

/// Peak Q excursion the encoder scales normalized Q by. See [`I_MAX`]; the conversion matrix
/// gives 0.5229.
pub const Q_MAX: SignalFloat = 0.5226;

/// Angle of the I axis from the +V axis.
const IQ_ROTATION_DEG: SignalFloat = 33.0;

/// Rotate an I/Q pair onto the U/V axes the subcarrier phase is measured against, so that the
/// result is `I cos(wt + 33°) + Q sin(wt + 33°)` once modulated.
pub fn iq_to_uv(i: SignalFloat, q: SignalFloat) -> (SignalFloat, SignalFloat) {
    let (sin, cos) = IQ_ROTATION_DEG.to_radians().sin_cos();
    (q * cos - i * sin, i * cos + q * sin)
}

/// The inverse of [`iq_to_uv`], for sources that arrive as colour differences.
pub fn uv_to_iq(u: SignalFloat, v: SignalFloat) -> (SignalFloat, SignalFloat) {
    let (sin, cos) = IQ_ROTATION_DEG.to_radians().sin_cos();
    (v * cos - u * sin, u * cos + v * sin)
}

/// The NTSC encoder, turns planar YIQ frames into NTSC fields.
#[derive(Debug, Clone)]
pub struct NtscEncoder {
    synth: LineSynth,
    i_filter: Option<FirFilter>,
    q_filter: Option<FirFilter>,
    luma_filter: Option<FirFilter>,
}

impl NtscEncoder {
    pub fn new(params: &VideoParameters, options: EncoderOptions) -> Self {
        Self {
            synth: LineSynth::new(params, options),
            i_filter: options.filter_chroma.then(FirFilter::ntsc_chroma),
            // Q has a third of I's bandwidth.
            q_filter: options.filter_chroma.then(FirFilter::ntsc_q),
            luma_filter: options.filter_luma.then(FirFilter::ntsc_chroma),
        }
    }

    pub fn params(&self) -> &VideoParameters {
        &self.synth.params
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.synth.options
    }

    /// Encode one composite field.
    pub fn encode_field(&self, frame: &FrameBuffer, field_number: u64, vbi: Option<&VbiPayload>) -> Result<Field> {
        self.encode_part(SignalPart::Composite, frame, field_number, vbi)
    }

    /// Encode one field of the requested signal.
    pub fn encode_part(&self, part: SignalPart, frame: &FrameBuffer, field_number: u64, vbi: Option<&VbiPayload>) -> Result<Field> {
        frame.require_planar()?;
        let range = frame.detect_range()?;

        self.synth.encode_field(part, field_number, vbi, |line, signal| {
            self.active_line(frame, range, field_number, line, signal)
        })
    }

    fn active_line(&self, frame: &FrameBuffer, range: SourceRange, field_number: u64, line: usize, signal: &mut ActiveSignal) -> Result<bool> {
        let params = &self.synth.params;
        let burst = &self.synth.burst;
        let Some(row) = source_row(params, line, field_number % 2 == 0, frame.height()) else {
            return Ok(false);
        };

        let y = prepare_row(frame.plane_row(0, row)?, SourceRange::luma, range, self.luma_filter.as_ref());
        let i = prepare_row(frame.plane_row(1, row)?, SourceRange::chroma, range, self.i_filter.as_ref());
        let q = prepare_row(frame.plane_row(2, row)?, SourceRange::chroma, range, self.q_filter.as_ref());

        let black = params.black_level as SignalFloat;
        let span = params.picture_span();
        let mut rotator = burst.rotator(field_number, line, params.active_video_start);

        for sample in params.active_video_start..params.active_video_end {
            let x = source_column(params, sample, frame.width());
            let (u, v) = iq_to_uv(i[x] * I_MAX, q[x] * Q_MAX);
            signal.luma.push(black + y[x] * span);
            signal.chroma.push(modulate(u, v, rotator.sin(), rotator.cos(), 1.0) * span);
            rotator.advance();
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PI;

    #[test]
    fn iq_rotation_matches_direct_form() {
        let (i, q) = (0.3, -0.2);
        let (u, v) = iq_to_uv(i, q);
        for k in 0..16 {
            let phase = k as SignalFloat * PI / 7.0;
            let direct = i * SignalFloat::cos(phase + 33.0f64.to_radians()) + q * SignalFloat::sin(phase + 33.0f64.to_radians());
            let rotated = modulate(u, v, phase.sin(), phase.cos(), 1.0);
            assert!((direct - rotated).abs() < 1e-12);
        }
    }

    #[test]
    fn uv_rotation_inverts() {
        let (i, q) = uv_to_iq(0.25, -0.4);
        let (u, v) = iq_to_uv(i, q);
        assert!((u - 0.25).abs() < 1e-12);
        assert!((v + 0.4).abs() < 1e-12);
    }

    #[test]
    fn lines_past_the_source_are_blanked() {
        let params = VideoParameters::create_ntsc_composite();
        let encoder = NtscEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (940, 448, 448));

        for field_number in [0, 1] {
            let field = encoder.encode_field(&frame, field_number, None).unwrap();
            // Rows 478 and 479 are the last with picture.
            assert_eq!(field.line(260)[500], params.white_level);
            for line in [261, 262] {
                assert_eq!(field.line(line)[0], params.sync_level);
                assert_eq!(field.line(line)[500], params.blanking_level);
                assert!(field.line(line)[95..120].iter().any(|&s| s != params.blanking_level));
            }
        }
    }

    #[test]
    fn neutral_gray_sits_between_black_and_white() {
        let params = VideoParameters::create_ntsc_composite();
        let encoder = NtscEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (32768, 32768, 32768));
        let field = encoder.encode_field(&frame, 0, None).unwrap();

        let expected = params.black_level as SignalFloat + 32768.0 / 65535.0 * params.picture_span();
        for &sample in &field.line(100)[params.active_video_start..params.active_video_end] {
            assert!((sample as SignalFloat - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn colour_framing_repeats_every_four_fields() {
        let params = VideoParameters::create_ntsc_composite();
        let encoder = NtscEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (30000, 45000, 25000));

        let fields: Vec<Field> = (0..6).map(|n| encoder.encode_field(&frame, n, None).unwrap()).collect();
        assert_eq!(fields[0], fields[4]);
        assert_eq!(fields[1], fields[5]);
        assert_ne!(fields[0], fields[2]);
    }

    #[test]
    fn vits_lines_appear_when_enabled() {
        let params = VideoParameters::create_ntsc_composite();
        let with = NtscEncoder::new(&params, EncoderOptions {
            vits: true,
            ..Default::default()
        });
        let without = NtscEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (64, 448, 448));

        let a = with.encode_field(&frame, 0, None).unwrap();
        let b = without.encode_field(&frame, 0, None).unwrap();
        assert_ne!(a.line(18), b.line(18));
        assert_eq!(a.line(17), b.line(17));
        // 50 IRE luminance reference of the VIR line.
        let at_40us = (40.0 * params.samples_per_us()) as usize;
        assert_eq!(a.line(18)[at_40us], (params.blanking_level as SignalFloat + 0.5 * params.ire_span()).round() as u16);
    }

    #[test]
    fn samples_never_leave_the_sample_range() {
        // Extreme levels push the chroma well past both rails.
        let params = VideoParameters::create_ntsc_composite().with_levels(&crate::params::LevelOverrides {
            white: Some(0xFFFF),
            black: Some(0x0100),
            ..Default::default()
        });
        let encoder = NtscEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (65535, 0, 65535));
        let field = encoder.encode_field(&frame, 3, None).unwrap();
        assert!(field.samples().iter().any(|&s| s == u16::MAX));
    }
}
