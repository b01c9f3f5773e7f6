//! The per-line state machine shared by the PAL and NTSC encoders.
//!
//! A field is built line by line. What goes on a line depends only on the line index, the field
//! parity and the encoder options: vertical sync, one of the VBI payloads, active picture, or
//! plain blanking after the picture. The system encoders only supply the active picture.

use crate::biphase::BiphaseEncoder;
use crate::burst::ColorBurst;
use crate::error::Result;
use crate::field::Field;
use crate::filter::FirFilter;
use crate::frame_buffer::SourceRange;
use crate::params::{VideoParameters, VideoSystem, HSYNC_DURATION};
use crate::types::{clamp_sample, SampleValue, SignalFloat};
use crate::vbi::VbiPayload;
use crate::vitc::VitcEncoder;
use crate::vits::{VitsGenerator, VitsSignal};

/// Sample value the chroma half of a Y/C pair rests at.
pub const CHROMA_NEUTRAL: SignalFloat = 32768.0;

/// Field line of the first biphase VBI word (frame line 16).
pub const FIRST_BIPHASE_LINE: usize = 15;

/// Duration of an equalizing pulse.
const EQUALIZING_DURATION: SignalFloat = 2.35e-6;

/// Gap between the broad pulses of a vertical sync line (the serration).
const SERRATION_DURATION: SignalFloat = 4.7e-6;

/// Options controlling what an encoder puts in the vertical interval and how it filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Insert vertical interval test signals.
    pub vits: bool,
    /// Insert VITC timecode.
    pub vitc: bool,
    /// Frame number VITC counts from at field 0.
    pub vitc_start_frame: u64,
    /// Low-pass the chroma rows before modulation.
    pub filter_chroma: bool,
    /// Low-pass the luma rows with the chroma kernel before modulation.
    pub filter_luma: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            vits: false,
            vitc: false,
            vitc_start_frame: 0,
            filter_chroma: true,
            filter_luma: false,
        }
    }
}

/// Which signal a field is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPart {
    /// Luma, sync and chroma combined.
    Composite,
    /// Sync, blanking, luma and VBI data with no burst or picture chroma.
    Luma,
    /// Burst and picture chroma around the neutral level.
    Chroma,
}

/// The pulse pattern of a vertical sync line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsyncPulse {
    /// Two short sync pulses per line.
    Equalizing,
    /// Two long sync pulses per line, each ending in a serration.
    Broad,
    /// A broad pulse in the first half line and an equalizing pulse in the second.
    BroadThenEqualizing,
}

impl VsyncPulse {
    /// The pulse pattern of a line in the vertical sync interval.
    ///
    /// Both fields get the same pattern. The half-line shift of the PAL second field's pulse
    /// train is not reproduced.
    pub fn for_line(system: VideoSystem, line: usize) -> Self {
        match system {
            VideoSystem::Pal => match line {
                0 | 1 => VsyncPulse::Broad,
                2 => VsyncPulse::BroadThenEqualizing,
                _ => VsyncPulse::Equalizing,
            },
            VideoSystem::Ntsc | VideoSystem::PalM => match line {
                3..=5 => VsyncPulse::Broad,
                _ => VsyncPulse::Equalizing,
            },
        }
    }
}

/// What a VBI line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbiContent {
    Blank,
    /// A 24-bit LaserDisc word.
    Biphase(u32),
    Vits(VitsSignal),
    Vitc,
}

/// The kind of one field line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    VerticalSync(VsyncPulse),
    Vbi(VbiContent),
    Active,
    PostBlanking,
}

/// Field lines carrying VITC.
fn vitc_lines(system: VideoSystem) -> [usize; 2] {
    match system {
        VideoSystem::Pal => [18, 20],
        VideoSystem::Ntsc | VideoSystem::PalM => [13, 15],
    }
}

impl LineKind {
    /// Decide what goes on a field line.
    pub fn classify(
        params: &VideoParameters,
        options: &EncoderOptions,
        first_field: bool,
        line: usize,
        vbi: Option<&VbiPayload>,
    ) -> Self {
        if line < params.vsync_lines {
            return LineKind::VerticalSync(VsyncPulse::for_line(params.system, line));
        }
        if line >= params.last_active_line {
            return LineKind::PostBlanking;
        }
        if line >= params.first_active_line {
            return LineKind::Active;
        }

        let biphase = line
            .checked_sub(FIRST_BIPHASE_LINE)
            .and_then(|index| vbi.and_then(|payload| payload.word(index)));
        if let Some(word) = biphase {
            return LineKind::Vbi(VbiContent::Biphase(word));
        }
        if options.vits {
            if let Some(signal) = VitsSignal::for_line(params.system, first_field, line) {
                return LineKind::Vbi(VbiContent::Vits(signal));
            }
        }
        if options.vitc && vitc_lines(params.system).contains(&line) {
            return LineKind::Vbi(VbiContent::Vitc);
        }
        LineKind::Vbi(VbiContent::Blank)
    }
}

/// One active line's picture content, covering the active sample range.
#[derive(Debug, Clone, Default)]
pub struct ActiveSignal {
    /// Absolute luma level per sample.
    pub luma: Vec<SignalFloat>,
    /// Chroma deviation from the luma level per sample.
    pub chroma: Vec<SignalFloat>,
}

/// Map a sample in the active range to a source column.
pub fn source_column(params: &VideoParameters, sample: usize, source_width: usize) -> usize {
    let x = (sample - params.active_video_start) * source_width / params.active_width();
    x.min(source_width - 1)
}

/// Map an active field line to its source row: even rows for the first field, odd rows for the
/// second. `None` once the line runs past the bottom of a source `height` rows tall.
pub fn source_row(params: &VideoParameters, line: usize, first_field: bool, height: usize) -> Option<usize> {
    let k = line - params.first_active_line;
    let row = if first_field {
        2 * k
    }
    else {
        2 * k + 1
    };
    (row < height).then_some(row)
}

/// Normalize a source row, run it through an optional filter, and return it.
pub fn prepare_row(
    row: &[u16],
    normalize: impl Fn(SourceRange, u16) -> SignalFloat,
    range: SourceRange,
    filter: Option<&FirFilter>,
) -> Vec<SignalFloat> {
    let values: Vec<SignalFloat> = row.iter().map(|&v| normalize(range, v)).collect();
    match filter {
        Some(filter) => filter.filter(&values),
        None => values,
    }
}

/// Builds whole fields out of lines. Holds everything a line may need apart from the picture.
#[derive(Debug, Clone)]
pub struct LineSynth {
    pub params: VideoParameters,
    pub options: EncoderOptions,
    pub burst: ColorBurst,
    biphase: BiphaseEncoder,
    vitc: VitcEncoder,
    vits: VitsGenerator,
}

impl LineSynth {
    pub fn new(params: &VideoParameters, options: EncoderOptions) -> Self {
        Self {
            params: params.clone(),
            options,
            burst: ColorBurst::new(params),
            biphase: BiphaseEncoder::new(params),
            vitc: VitcEncoder::new(params),
            vits: VitsGenerator::new(params),
        }
    }

    fn samples(&self, seconds: SignalFloat) -> usize {
        self.params.samples(seconds) as usize
    }

    /// The horizontal sync pulse at the start of a line.
    pub fn sync_pulse(&self, buf: &mut [SampleValue]) {
        let end = self.samples(HSYNC_DURATION).min(buf.len());
        buf[..end].fill(self.params.sync_level);
    }

    /// A vertical sync line made of two half-line pulse patterns.
    pub fn vsync_line(&self, buf: &mut [SampleValue], pulse: VsyncPulse) {
        let width = buf.len();
        let half = width / 2;
        let sync = self.params.sync_level;
        buf.fill(self.params.blanking_level);

        let equalizing = self.samples(EQUALIZING_DURATION);
        let broad = half.saturating_sub(self.samples(SERRATION_DURATION));
        let (first, second) = match pulse {
            VsyncPulse::Equalizing => (equalizing, equalizing),
            VsyncPulse::Broad => (broad, broad),
            VsyncPulse::BroadThenEqualizing => (broad, equalizing),
        };
        buf[..first.min(half)].fill(sync);
        buf[half..(half + second).min(width)].fill(sync);
    }

    /// Blanking with a sync pulse, plus burst when `with_burst` is set.
    pub fn blanked_line(&self, buf: &mut [SampleValue], field_number: u64, line: usize, with_burst: bool) {
        buf.fill(self.params.blanking_level);
        self.sync_pulse(buf);
        if with_burst {
            self.burst.render(buf, field_number, line);
        }
    }

    /// Draw a VBI line's data onto a blanked line.
    fn vbi_content(&self, buf: &mut [SampleValue], content: VbiContent, field_number: u64, line: usize, first_field: bool) {
        match content {
            VbiContent::Blank => {}
            VbiContent::Biphase(word) => self.biphase.render_word(buf, word),
            VbiContent::Vits(signal) => self.vits.render(signal, buf, field_number, line),
            VbiContent::Vitc => {
                let frame = self.options.vitc_start_frame + field_number / 2;
                self.vitc.render(buf, frame, !first_field);
            }
        }
    }

    /// Fill a line with the neutral chroma level plus burst.
    fn chroma_line(&self, buf: &mut [SampleValue], field_number: u64, line: usize, with_burst: bool) {
        buf.fill(clamp_sample(CHROMA_NEUTRAL));
        if with_burst {
            self.burst.render_around(buf, field_number, line, CHROMA_NEUTRAL);
        }
    }

    /// Build one field. `active` is called for each active line with the line index and a
    /// signal to fill for the active sample range. It returns `false` when the source has no
    /// row for the line, which is then sent as blanking.
    pub fn encode_field<F>(&self, part: SignalPart, field_number: u64, vbi: Option<&VbiPayload>, mut active: F) -> Result<Field>
    where
        F: FnMut(usize, &mut ActiveSignal) -> Result<bool>,
    {
        let params = &self.params;
        let first_field = field_number % 2 == 0;
        let mut field = Field::blank(params);
        let mut signal = ActiveSignal::default();
        let active_range = params.active_video_start..params.active_video_end.min(params.field_width);

        for line in 0..params.field_height {
            let mut kind = LineKind::classify(params, &self.options, first_field, line, vbi);
            if kind == LineKind::Active {
                signal.luma.clear();
                signal.chroma.clear();
                if !active(line, &mut signal)? {
                    kind = LineKind::PostBlanking;
                }
            }
            let buf = field.line_mut(line);

            match (part, kind) {
                (SignalPart::Chroma, LineKind::VerticalSync(_)) => self.chroma_line(buf, field_number, line, false),
                (_, LineKind::VerticalSync(pulse)) => self.vsync_line(buf, pulse),

                // Test signals belong wholly to the luma half of a Y/C pair.
                (SignalPart::Chroma, LineKind::Vbi(VbiContent::Vits(_))) => {
                    self.chroma_line(buf, field_number, line, false)
                }
                (SignalPart::Chroma, LineKind::Vbi(_) | LineKind::PostBlanking) => {
                    self.chroma_line(buf, field_number, line, true)
                }
                (_, LineKind::Vbi(content)) => {
                    self.blanked_line(buf, field_number, line, part == SignalPart::Composite);
                    self.vbi_content(buf, content, field_number, line, first_field);
                }
                (_, LineKind::PostBlanking) => {
                    self.blanked_line(buf, field_number, line, part == SignalPart::Composite)
                }

                (_, LineKind::Active) => {
                    match part {
                        SignalPart::Composite => {
                            self.blanked_line(buf, field_number, line, true);
                            for ((out, luma), chroma) in buf[active_range.clone()].iter_mut().zip(&signal.luma).zip(&signal.chroma) {
                                *out = clamp_sample(luma + chroma);
                            }
                        }
                        SignalPart::Luma => {
                            self.blanked_line(buf, field_number, line, false);
                            for (out, luma) in buf[active_range.clone()].iter_mut().zip(&signal.luma) {
                                *out = clamp_sample(*luma);
                            }
                        }
                        SignalPart::Chroma => {
                            self.chroma_line(buf, field_number, line, true);
                            for (out, chroma) in buf[active_range.clone()].iter_mut().zip(&signal.chroma) {
                                *out = clamp_sample(CHROMA_NEUTRAL + chroma);
                            }
                        }
                    }
                }
            }
        }

        Ok(field)
    }
}
