use crate::error::Result;
use crate::field::{Field, Frame};
use crate::frame_buffer::FrameBuffer;
use crate::line::{EncoderOptions, SignalPart};
use crate::ntsc::NtscEncoder;
use crate::pal::PalEncoder;
use crate::params::VideoParameters;
use crate::vbi::VbiPayload;

/// An encoder for whichever system the parameters describe.
#[derive(Debug, Clone)]
pub enum Encoder {
    /// PAL and PAL-M.
    Pal(PalEncoder),
    Ntsc(NtscEncoder),
}

impl Encoder {
    pub fn new(params: &VideoParameters, options: EncoderOptions) -> Self {
        if params.system.is_pal_family() {
            Encoder::Pal(PalEncoder::new(params, options))
        }
        else {
            Encoder::Ntsc(NtscEncoder::new(params, options))
        }
    }

    pub fn params(&self) -> &VideoParameters {
        match self {
            Encoder::Pal(encoder) => encoder.params(),
            Encoder::Ntsc(encoder) => encoder.params(),
        }
    }

    fn encode_part(&self, part: SignalPart, frame: &FrameBuffer, field_number: u64, vbi: Option<&VbiPayload>) -> Result<Field> {
        match self {
            Encoder::Pal(encoder) => encoder.encode_part(part, frame, field_number, vbi),
            Encoder::Ntsc(encoder) => encoder.encode_part(part, frame, field_number, vbi),
        }
    }

    /// Encode one composite field. Even field numbers are first fields.
    pub fn encode_field(&self, frame: &FrameBuffer, field_number: u64, vbi: Option<&VbiPayload>) -> Result<Field> {
        self.encode_part(SignalPart::Composite, frame, field_number, vbi)
    }

    /// Encode frame `frame_number` as fields `2n` and `2n + 1`.
    pub fn encode_frame(&self, frame: &FrameBuffer, frame_number: u64, vbi: Option<&VbiPayload>) -> Result<Frame> {
        let field = frame_number * 2;
        Ok(Frame::new(
            self.encode_field(frame, field, vbi)?,
            self.encode_field(frame, field + 1, vbi)?,
        ))
    }

    /// Encode a frame as separate luma and chroma signals, returned as `(luma, chroma)`.
    pub fn encode_frame_yc(&self, frame: &FrameBuffer, frame_number: u64, vbi: Option<&VbiPayload>) -> Result<(Frame, Frame)> {
        let field = frame_number * 2;
        let luma = Frame::new(
            self.encode_part(SignalPart::Luma, frame, field, vbi)?,
            self.encode_part(SignalPart::Luma, frame, field + 1, vbi)?,
        );
        let chroma = Frame::new(
            self.encode_part(SignalPart::Chroma, frame, field, vbi)?,
            self.encode_part(SignalPart::Chroma, frame, field + 1, vbi)?,
        );
        Ok((luma, chroma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LevelOverrides, VideoSystem};

    #[test]
    fn picks_the_encoder_for_the_system() {
        let options = EncoderOptions::default();
        for (system, pal) in [(VideoSystem::Pal, true), (VideoSystem::PalM, true), (VideoSystem::Ntsc, false)] {
            let encoder = Encoder::new(&VideoParameters::for_system(system), options);
            assert_eq!(matches!(encoder, Encoder::Pal(_)), pal);
            assert_eq!(encoder.params().system, system);
        }
    }

    #[test]
    fn frames_are_consecutive_field_pairs() {
        let params = VideoParameters::create_pal_composite();
        let encoder = Encoder::new(&params, EncoderOptions::default());
        let source = FrameBuffer::filled_yuv(720, 576, (30000, 40000, 20000));

        let frame = encoder.encode_frame(&source, 3, None).unwrap();
        assert_eq!(frame.first, encoder.encode_field(&source, 6, None).unwrap());
        assert_eq!(frame.second, encoder.encode_field(&source, 7, None).unwrap());
    }

    #[test]
    fn extreme_levels_clamp_instead_of_wrapping() {
        let overrides = LevelOverrides {
            sync: Some(0x0000),
            blanking: Some(0x0100),
            black: Some(0x0100),
            white: Some(0xFFFF),
        };
        for system in [VideoSystem::Pal, VideoSystem::Ntsc] {
            let params = VideoParameters::for_system(system).with_levels(&overrides);
            let encoder = Encoder::new(&params, EncoderOptions::default());
            let (width, height) = system.source_size();
            let source = FrameBuffer::filled_yuv(width, height, (65535, 65535, 0));
            let field = encoder.encode_field(&source, 1, None).unwrap();

            // Saturated chroma on white luma swings past the top rail.
            let line = field.line(100);
            assert!(line.iter().any(|&s| s == u16::MAX));
            assert_eq!(line[0], params.sync_level);
        }
    }

    #[test]
    fn yc_chroma_is_the_composite_minus_luma() {
        let params = VideoParameters::create_ntsc_composite();
        let encoder = Encoder::new(&params, EncoderOptions::default());
        let source = FrameBuffer::filled_yuv(720, 480, (30000, 40000, 28000));

        let composite = encoder.encode_frame(&source, 0, None).unwrap();
        let (luma, chroma) = encoder.encode_frame_yc(&source, 0, None).unwrap();
        for s in [200, 400, 600, 800] {
            let sum = luma.first.line(50)[s] as i32 + chroma.first.line(50)[s] as i32 - 32768;
            assert!((sum - composite.first.line(50)[s] as i32).abs() <= 1);
        }
    }
}
