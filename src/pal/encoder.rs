use crate::burst::modulate;
use crate::error::Result;
use crate::field::Field;
use crate::filter::FirFilter;
use crate::frame_buffer::{FrameBuffer, SourceRange};
use crate::line::{prepare_row, source_column, source_row, ActiveSignal, EncoderOptions, LineSynth, SignalPart};
use crate::params::VideoParameters;
use crate::types::SignalFloat;
use crate::vbi::VbiPayload;

/// Peak U excursion, 0.492 (B - Y) for saturated blue.
pub const U_MAX: SignalFloat = 0.436010;

/// Peak V excursion, 0.877 (R - Y) for saturated red.
pub const V_MAX: SignalFloat = 0.614975;

/// The PAL encoder, turns planar YUV frames into PAL (or PAL-M) fields.
#[derive(Debug, Clone)]
pub struct PalEncoder {
    synth: LineSynth,
    chroma_filter: Option<FirFilter>,
    luma_filter: Option<FirFilter>,
}

impl PalEncoder {
    /// Create a PAL encoder. The parameters may describe PAL or PAL-M.
    pub fn new(params: &VideoParameters, options: EncoderOptions) -> Self {
        Self {
            synth: LineSynth::new(params, options),
            chroma_filter: options.filter_chroma.then(FirFilter::pal_chroma),
            // The luma filter reuses the chroma kernel.
            luma_filter: options.filter_luma.then(FirFilter::pal_chroma),
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

    /// Modulate one active line: `Y + U sin(wt) + V cos(wt)`, with V's sign switched on
    /// alternate lines.
    fn active_line(&self, frame: &FrameBuffer, range: SourceRange, field_number: u64, line: usize, signal: &mut ActiveSignal) -> Result<bool> {
        let params = &self.synth.params;
        let burst = &self.synth.burst;
        let Some(row) = source_row(params, line, field_number % 2 == 0, frame.height()) else {
            return Ok(false);
        };

        let y = prepare_row(frame.plane_row(0, row)?, SourceRange::luma, range, self.luma_filter.as_ref());
        let u = prepare_row(frame.plane_row(1, row)?, SourceRange::chroma, range, self.chroma_filter.as_ref());
        let v = prepare_row(frame.plane_row(2, row)?, SourceRange::chroma, range, self.chroma_filter.as_ref());

        let black = params.black_level as SignalFloat;
        let span = params.picture_span();
        let v_switch = burst.v_switch(field_number, line);
        let mut rotator = burst.rotator(field_number, line, params.active_video_start);

        for sample in params.active_video_start..params.active_video_end {
            let x = source_column(params, sample, frame.width());
            let chroma = modulate(u[x] * U_MAX, v[x] * V_MAX, rotator.sin(), rotator.cos(), v_switch);
            signal.luma.push(black + y[x] * span);
            signal.chroma.push(chroma * span);
            rotator.advance();
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frame_buffer::PixelFormat;

    fn gray_frame() -> FrameBuffer {
        FrameBuffer::filled_yuv(720, 576, (32768, 32768, 32768))
    }

    #[test]
    fn neutral_gray_has_no_chroma() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        let field = encoder.encode_field(&gray_frame(), 0, None).unwrap();

        let expected = params.blanking_level as i32 + (params.white_level as i32 - params.black_level as i32) / 2;
        let line = field.line(23);
        for &sample in &line[params.active_video_start..params.active_video_end] {
            assert!((sample as i32 - expected).abs() <= 1, "sample {sample} expected {expected}");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions {
            vits: true,
            ..Default::default()
        });
        let frame = FrameBuffer::filled_yuv(720, 576, (40000, 20000, 50000));
        let payload = VbiPayload::cav(42).unwrap();

        let a = encoder.encode_field(&frame, 5, Some(&payload)).unwrap();
        let b = encoder.encode_field(&frame, 5, Some(&payload)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_interleaved_rgb() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::from_data(4, 4, PixelFormat::Rgb48, vec![0; 48]).unwrap();

        let err = encoder.encode_field(&frame, 0, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPixelFormat { .. }));
    }

    #[test]
    fn saturated_colour_modulates_the_subcarrier() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        // Strong blue: U high, V slightly low.
        let frame = FrameBuffer::filled_yuv(720, 576, (7400, 65535, 27000));
        let field = encoder.encode_field(&frame, 0, None).unwrap();

        let active = &field.line(100)[params.active_video_start + 20..params.active_video_end - 20];
        let max = *active.iter().max().unwrap() as i32;
        let min = *active.iter().min().unwrap() as i32;
        // Roughly 2 * 0.44 * 40960 peak to peak.
        assert!(max - min > 25_000, "peak to peak {}", max - min);
    }

    #[test]
    fn studio_range_sub_black_is_kept() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        // Y=32 is below studio black at 64.
        let frame = FrameBuffer::filled_yuv(720, 576, (32, 448, 448));
        let field = encoder.encode_field(&frame, 0, None).unwrap();

        let sample = field.line(50)[600];
        assert!(sample < params.black_level, "sub-black clipped to {sample}");
    }

    #[test]
    fn yc_parts_split_luma_and_chroma() {
        let params = VideoParameters::create_pal_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 576, (40000, 50000, 20000));

        let luma = encoder.encode_part(SignalPart::Luma, &frame, 0, None).unwrap();
        let chroma = encoder.encode_part(SignalPart::Chroma, &frame, 0, None).unwrap();

        // No burst on the luma signal.
        assert!(luma.line(40)[90..146].iter().all(|&s| s == params.blanking_level));
        // Luma is flat across the picture.
        let active = &luma.line(40)[params.active_video_start + 20..params.active_video_end - 20];
        assert!(active.windows(2).all(|w| w[0] == w[1]));
        // Chroma has the burst, centred on mid-scale, and no sync.
        assert!(chroma.line(40)[100..136].iter().any(|&s| s > 32768 + 2000));
        assert_eq!(chroma.line(40)[0], 32768);
    }

    #[test]
    fn pal_m_uses_the_525_line_raster() {
        let params = VideoParameters::create_pal_m_composite();
        let encoder = PalEncoder::new(&params, EncoderOptions::default());
        let frame = FrameBuffer::filled_yuv(720, 480, (32768, 32768, 32768));
        let field = encoder.encode_field(&frame, 1, None).unwrap();
        assert_eq!(field.height(), 263);
        assert_eq!(field.width(), 909);
    }
}
