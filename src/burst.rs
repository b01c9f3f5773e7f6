//! Subcarrier phase bookkeeping and the color burst.
//!
//! Every user of the subcarrier (the burst, active picture chroma and the modulated VITS
//! waveforms) takes its phase from [`ColorBurst::phase`], so a decoder locked to the burst sees
//! exactly the hue that was encoded.

use crate::params::{VideoParameters, VideoSystem};
use crate::types::{SampleValue, SignalFloat, PI, clamp_sample};

/// Burst rise and fall time in subcarrier cycles.
const BURST_EDGE_CYCLES: SignalFloat = 3.0;

/// Lines in the first PAL field as counted by the 8-field sequence.
const PAL_FIRST_FIELD_LINES: u64 = 313;

/// Lines in the first 525-line field as counted by the PAL-M 8-field sequence.
const PAL_M_FIRST_FIELD_LINES: u64 = 263;

/// Combine a U/V pair onto the subcarrier. `v_switch` is the PAL line alternation (always 1
/// for NTSC). A pair of (cos θ, sin θ) gives a unit vector at θ from the +U axis.
pub fn modulate(u: SignalFloat, v: SignalFloat, sin_phase: SignalFloat, cos_phase: SignalFloat, v_switch: SignalFloat) -> SignalFloat {
    u * sin_phase + v * v_switch * cos_phase
}

/// Sine-squared ramp from 0 to 1 over x in 0..1.
fn raised_cosine(x: SignalFloat) -> SignalFloat {
    let x = SignalFloat::clamp(x, 0.0, 1.0);
    0.5 * (1.0 - SignalFloat::cos(PI * x))
}

/// The color burst and subcarrier phase for one video system.
#[derive(Debug, Clone)]
pub struct ColorBurst {
    system: VideoSystem,
    fsc: SignalFloat,
    sample_rate: SignalFloat,
    blanking: SignalFloat,
    amplitude: SignalFloat,
    burst_start: usize,
    burst_end: usize,
    edge: SignalFloat,
}

impl ColorBurst {
    pub fn new(params: &VideoParameters) -> Self {
        let amplitude = match params.system {
            // 300 mV peak to peak on a 700 mV white.
            VideoSystem::Pal => params.ire_span() * 3.0 / 14.0,
            // 40 IRE peak to peak.
            VideoSystem::Ntsc | VideoSystem::PalM => params.ire_span() * 20.0 / 100.0,
        };

        Self {
            system: params.system,
            fsc: params.fsc,
            sample_rate: params.sample_rate,
            blanking: params.blanking_level as SignalFloat,
            amplitude,
            burst_start: params.colour_burst_start,
            burst_end: params.colour_burst_end,
            edge: BURST_EDGE_CYCLES * params.sample_rate / params.fsc,
        }
    }

    /// Number of whole lines since the start of the PAL/PAL-M colour framing sequence.
    fn sequence_line(&self, field_number: u64, line: usize) -> u64 {
        let field_id = field_number % 8;
        let first_field = field_id % 2 == 0;
        let (frame_lines, first_field_lines) = match self.system {
            VideoSystem::PalM => (525, PAL_M_FIRST_FIELD_LINES),
            _ => (625, PAL_FIRST_FIELD_LINES),
        };

        let frame_line = if first_field {
            line as u64 * 2 + 1
        }
        else {
            line as u64 * 2 + 2
        };
        (field_id / 2) * frame_lines + (field_id % 2) * first_field_lines + frame_line / 2
    }

    /// Subcarrier cycles elapsed between the start of the colour framing sequence and the start
    /// of a line. Only the fractional part matters to the waveform.
    pub fn line_cycles(&self, field_number: u64, line: usize) -> SignalFloat {
        match self.system {
            VideoSystem::Ntsc => {
                // 262.5 lines per field keeps the half-line offset between fields; four fields are
                // a whole number of cycles, so reducing the field number loses nothing.
                let field = (field_number % 4) as SignalFloat;
                (field * 262.5 + line as SignalFloat) * self.system.cycles_per_line()
            }
            VideoSystem::Pal | VideoSystem::PalM => {
                self.sequence_line(field_number, line) as SignalFloat * self.system.cycles_per_line()
            }
        }
    }

    /// Absolute subcarrier phase in radians at a sample of a line, reduced to 0..2π at the line
    /// start.
    pub fn phase(&self, field_number: u64, line: usize, sample: usize) -> SignalFloat {
        let line_phase = 2.0 * PI * self.line_cycles(field_number, line).fract();
        line_phase + 2.0 * PI * self.fsc * sample as SignalFloat / self.sample_rate
    }

    /// Phase advance per sample.
    pub fn phase_step(&self) -> SignalFloat {
        2.0 * PI * self.fsc / self.sample_rate
    }

    /// A rotator positioned at `sample` of a line.
    pub fn rotator(&self, field_number: u64, line: usize, sample: usize) -> PhaseRotator {
        PhaseRotator::new(self.phase(field_number, line, sample), self.phase_step())
    }

    /// The PAL V-switch: +1 on even sequence lines, -1 on odd ones. Always +1 for NTSC.
    pub fn v_switch(&self, field_number: u64, line: usize) -> SignalFloat {
        match self.system {
            VideoSystem::Ntsc => 1.0,
            VideoSystem::Pal | VideoSystem::PalM => {
                if self.sequence_line(field_number, line) % 2 == 0 {
                    1.0
                }
                else {
                    -1.0
                }
            }
        }
    }

    /// Burst phase relative to the +U axis: the swinging ±135° for PAL, 180° for NTSC.
    pub fn burst_offset(&self, field_number: u64, line: usize) -> SignalFloat {
        match self.system {
            VideoSystem::Ntsc => PI,
            VideoSystem::Pal | VideoSystem::PalM => 0.75 * PI * self.v_switch(field_number, line),
        }
    }

    /// Peak burst deviation from blanking.
    pub fn amplitude(&self) -> SignalFloat {
        self.amplitude
    }

    /// Burst envelope at a sample: raised-cosine edges three cycles long, centred so that the
    /// nominal burst window is at (nearly) full amplitude.
    pub fn envelope(&self, sample: usize) -> SignalFloat {
        let s = sample as SignalFloat;
        let rise_start = self.burst_start as SignalFloat - self.edge * 2.0 / 3.0;
        let fall_start = self.burst_end as SignalFloat - self.edge / 3.0;

        if s < fall_start {
            raised_cosine((s - rise_start) / self.edge)
        }
        else {
            1.0 - raised_cosine((s - fall_start) / self.edge)
        }
    }

    /// Samples the burst (including its edges) touches.
    pub fn window(&self) -> std::ops::Range<usize> {
        let start = (self.burst_start as SignalFloat - self.edge * 2.0 / 3.0).floor().max(0.0) as usize;
        let end = (self.burst_end as SignalFloat + self.edge * 2.0 / 3.0).ceil() as usize;
        start..end
    }

    /// The burst's deviation from blanking at a sample.
    pub fn sample(&self, field_number: u64, line: usize, sample: usize) -> SignalFloat {
        let phase = self.phase(field_number, line, sample) + self.burst_offset(field_number, line);
        self.amplitude * self.envelope(sample) * SignalFloat::sin(phase)
    }

    /// Write blanking plus burst over the burst window, offset from `centre` (blanking for a
    /// composite line, the chroma midpoint for a separate chroma line).
    pub fn render_around(&self, line_buf: &mut [SampleValue], field_number: u64, line: usize, centre: SignalFloat) {
        let window = self.window();
        let end = window.end.min(line_buf.len());
        for s in window.start..end {
            line_buf[s] = clamp_sample(centre + self.sample(field_number, line, s));
        }
    }

    /// Write the burst onto a composite line.
    pub fn render(&self, line_buf: &mut [SampleValue], field_number: u64, line: usize) {
        self.render_around(line_buf, field_number, line, self.blanking);
    }
}

/// Steps sin/cos of the subcarrier phase along a line by rotation instead of evaluating the
/// trig functions at every sample.
#[derive(Debug, Clone, Copy)]
pub struct PhaseRotator {
    sin: SignalFloat,
    cos: SignalFloat,
    step_sin: SignalFloat,
    step_cos: SignalFloat,
}

impl PhaseRotator {
    pub fn new(phase: SignalFloat, step: SignalFloat) -> Self {
        Self {
            sin: SignalFloat::sin(phase),
            cos: SignalFloat::cos(phase),
            step_sin: SignalFloat::sin(step),
            step_cos: SignalFloat::cos(step),
        }
    }

    pub fn sin(&self) -> SignalFloat {
        self.sin
    }

    pub fn cos(&self) -> SignalFloat {
        self.cos
    }

    /// Move on by one sample.
    pub fn advance(&mut self) {
        let sin = self.sin * self.step_cos + self.cos * self.step_sin;
        let cos = self.cos * self.step_cos - self.sin * self.step_sin;
        self.sin = sin;
        self.cos = cos;
    }
}
