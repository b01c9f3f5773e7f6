//! Vertical interval test signals.
//!
//! Each test line is a variant of a per-system enum; [`VitsGenerator::render`] resolves the
//! variant with an exhaustive match, so adding a line means the compiler points at every place
//! that needs to handle it. The waveforms themselves are built from the primitives on
//! [`VitsPainter`], which express timings in microseconds from the line start and levels in IRE.

use crate::burst::{modulate, ColorBurst};
use crate::ntsc::NtscVits;
use crate::pal::PalVits;
use crate::params::{VideoParameters, VideoSystem};
use crate::types::{clamp_sample, SampleValue, SignalFloat, PI};

/// PAL sync tip in IRE (-300 mV against a 700 mV white).
pub const PAL_SYNC_IRE: SignalFloat = -300.0 / 7.0;

/// NTSC sync tip in IRE.
pub const NTSC_SYNC_IRE: SignalFloat = -40.0;

/// One test line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitsSignal {
    Pal(PalVits),
    Ntsc(NtscVits),
}

impl VitsSignal {
    /// The test signal carried on a field line, if any.
    pub fn for_line(system: VideoSystem, first_field: bool, line: usize) -> Option<Self> {
        match system {
            VideoSystem::Pal => PalVits::for_line(first_field, line).map(VitsSignal::Pal),
            VideoSystem::Ntsc => NtscVits::for_line(first_field, line).map(VitsSignal::Ntsc),
            // IEC 60856/60857 define no PAL-M test lines.
            VideoSystem::PalM => None,
        }
    }
}

/// Draws VITS waveforms for one line of one field.
pub struct VitsPainter<'a> {
    params: &'a VideoParameters,
    burst: &'a ColorBurst,
    field_number: u64,
    line: usize,
    sync_ire: SignalFloat,
}

impl<'a> VitsPainter<'a> {
    pub fn new(params: &'a VideoParameters, burst: &'a ColorBurst, field_number: u64, line: usize) -> Self {
        let sync_ire = if params.system.is_pal_family() {
            PAL_SYNC_IRE
        }
        else {
            NTSC_SYNC_IRE
        };

        Self {
            params,
            burst,
            field_number,
            line,
            sync_ire,
        }
    }

    /// Map an IRE level to a sample level: 0 IRE is blanking, 100 IRE is white and the sync tip
    /// sits at -43 IRE (PAL) or -40 IRE (NTSC). Levels are clamped to that range.
    pub fn ire_to_sample(&self, ire: SignalFloat) -> SignalFloat {
        let ire = SignalFloat::clamp(ire, self.sync_ire, 100.0);
        let blanking = self.params.blanking_level as SignalFloat;
        if ire < 0.0 {
            let sync = self.params.sync_level as SignalFloat;
            blanking - (ire / self.sync_ire) * (blanking - sync)
        }
        else {
            blanking + ire / 100.0 * self.params.ire_span()
        }
    }

    /// Convert an IRE difference (e.g. a chroma amplitude) to a sample difference.
    fn ire_delta(&self, ire: SignalFloat) -> SignalFloat {
        ire / 100.0 * self.params.ire_span()
    }

    /// Sample index of a time in microseconds, limited to the line.
    fn at(&self, us: SignalFloat) -> usize {
        let sample = (us * self.params.samples_per_us()).round().max(0.0) as usize;
        sample.min(self.params.field_width)
    }

    /// Time in microseconds of a sample index.
    fn time_of(&self, sample: usize) -> SignalFloat {
        sample as SignalFloat / self.params.samples_per_us()
    }

    /// Unit subcarrier at `angle_deg` from the +U axis at a sample.
    fn subcarrier(&self, sample: usize, angle_deg: SignalFloat) -> SignalFloat {
        let phase = self.burst.phase(self.field_number, self.line, sample);
        let angle = angle_deg.to_radians();
        modulate(
            SignalFloat::cos(angle),
            SignalFloat::sin(angle),
            SignalFloat::sin(phase),
            SignalFloat::cos(phase),
            self.burst.v_switch(self.field_number, self.line),
        )
    }

    /// Hold a constant level from `start_us` to `end_us`.
    pub fn flat(&self, buf: &mut [SampleValue], start_us: SignalFloat, end_us: SignalFloat, ire: SignalFloat) {
        let level = clamp_sample(self.ire_to_sample(ire));
        let (start, end) = (self.at(start_us), self.at(end_us).min(buf.len()));
        if start < end {
            buf[start..end].fill(level);
        }
    }

    /// A sine-squared luma pulse from blanking with the given half-amplitude duration (2T).
    pub fn sin2_pulse(&self, buf: &mut [SampleValue], centre_us: SignalFloat, had_us: SignalFloat, peak_ire: SignalFloat) {
        let base = self.ire_to_sample(0.0);
        let height = self.ire_to_sample(peak_ire) - base;
        for s in self.at(centre_us - had_us)..self.at(centre_us + had_us).min(buf.len()) {
            let t = (self.time_of(s) - centre_us) / had_us;
            let envelope = pulse_envelope(t);
            buf[s] = clamp_sample(base + height * envelope);
        }
    }

    /// A chroma-modulated sine-squared pulse (10T or 12.5T): half the height is luma and half a
    /// subcarrier under the same envelope, so the composite peak is `peak_ire` and the base
    /// stays at blanking.
    pub fn modulated_pulse(&self, buf: &mut [SampleValue], centre_us: SignalFloat, had_us: SignalFloat, peak_ire: SignalFloat, angle_deg: SignalFloat) {
        let base = self.ire_to_sample(0.0);
        let half = (self.ire_to_sample(peak_ire) - base) / 2.0;
        for s in self.at(centre_us - had_us)..self.at(centre_us + had_us).min(buf.len()) {
            let t = (self.time_of(s) - centre_us) / had_us;
            let envelope = pulse_envelope(t);
            buf[s] = clamp_sample(base + half * envelope * (1.0 + self.subcarrier(s, angle_deg)));
        }
    }

    /// Luma steps with a constant subcarrier riding on all of them. `steps` lists each step's
    /// start time and level; the last step runs to `end_us`. The subcarrier fades in and out
    /// over `edge_us` at the ends of the staircase.
    pub fn modulated_staircase(
        &self,
        buf: &mut [SampleValue],
        steps: &[(SignalFloat, SignalFloat)],
        end_us: SignalFloat,
        chroma_pp_ire: SignalFloat,
        angle_deg: SignalFloat,
        edge_us: SignalFloat,
    ) {
        let Some(&(first_us, _)) = steps.first() else {
            return;
        };
        let amplitude = self.ire_delta(chroma_pp_ire) / 2.0;

        for (i, &(start_us, ire)) in steps.iter().enumerate() {
            let step_end = steps.get(i + 1).map_or(end_us, |&(next, _)| next);
            let luma = self.ire_to_sample(ire);
            for s in self.at(start_us)..self.at(step_end).min(buf.len()) {
                let envelope = edge_envelope(self.time_of(s), first_us, end_us, edge_us);
                buf[s] = clamp_sample(luma + amplitude * envelope * self.subcarrier(s, angle_deg));
            }
        }
    }

    /// A luma pedestal at `centre_ire` carrying a subcarrier of `chroma_pp_ire` peak to peak.
    pub fn modulated_pedestal(
        &self,
        buf: &mut [SampleValue],
        start_us: SignalFloat,
        duration_us: SignalFloat,
        centre_ire: SignalFloat,
        chroma_pp_ire: SignalFloat,
        angle_deg: SignalFloat,
        edge_us: SignalFloat,
    ) {
        self.modulated_staircase(buf, &[(start_us, centre_ire)], start_us + duration_us, chroma_pp_ire, angle_deg, edge_us);
    }

    /// A sine wave packet of `freq_mhz` on a pedestal. The packet starts at zero phase.
    pub fn multiburst_packet(
        &self,
        buf: &mut [SampleValue],
        start_us: SignalFloat,
        duration_us: SignalFloat,
        freq_mhz: SignalFloat,
        pedestal_ire: SignalFloat,
        pp_ire: SignalFloat,
    ) {
        let pedestal = self.ire_to_sample(pedestal_ire);
        let amplitude = self.ire_delta(pp_ire) / 2.0;
        let start = self.at(start_us);
        for s in start..self.at(start_us + duration_us).min(buf.len()) {
            let t = self.time_of(s - start);
            buf[s] = clamp_sample(pedestal + amplitude * SignalFloat::sin(2.0 * PI * freq_mhz * t));
        }
    }
}

/// Sine-squared pulse shape with t in half-amplitude durations: 1 at the centre, 0.5 at
/// ±0.5 and 0 from ±1 out.
fn pulse_envelope(t: SignalFloat) -> SignalFloat {
    if t.abs() >= 1.0 {
        0.0
    }
    else {
        let c = SignalFloat::cos(PI * t / 2.0);
        c * c
    }
}

/// Raised-cosine fade in after `start` and out before `end`.
fn edge_envelope(t: SignalFloat, start: SignalFloat, end: SignalFloat, edge: SignalFloat) -> SignalFloat {
    if edge <= 0.0 {
        return 1.0;
    }
    let rise = SignalFloat::clamp((t - start) / edge, 0.0, 1.0);
    let fall = SignalFloat::clamp((end - t) / edge, 0.0, 1.0);
    let shape = |x: SignalFloat| 0.5 * (1.0 - SignalFloat::cos(PI * x));
    shape(rise) * shape(fall)
}

/// Renders test lines for one video system.
#[derive(Debug, Clone)]
pub struct VitsGenerator {
    params: VideoParameters,
    burst: ColorBurst,
}

impl VitsGenerator {
    pub fn new(params: &VideoParameters) -> Self {
        Self {
            params: params.clone(),
            burst: ColorBurst::new(params),
        }
    }

    /// Draw a test signal onto a line that already carries sync and blanking. `line` is the
    /// field line being written, which fixes the subcarrier phase of the modulated parts.
    pub fn render(&self, signal: VitsSignal, buf: &mut [SampleValue], field_number: u64, line: usize) {
        let painter = VitsPainter::new(&self.params, &self.burst, field_number, line);
        match signal {
            VitsSignal::Pal(pal) => pal.render(&painter, buf),
            VitsSignal::Ntsc(ntsc) => ntsc.render(&painter, buf),
        }
    }
}
