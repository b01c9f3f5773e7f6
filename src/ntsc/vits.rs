use crate::types::{SampleValue, SignalFloat};
use crate::vits::VitsPainter;

/// 2T half-amplitude duration (T = 125 ns).
const PULSE_2T: SignalFloat = 0.25;

/// 12.5T half-amplitude duration.
const PULSE_12_5T: SignalFloat = 1.5625;

/// Subcarrier fade time at the ends of staircases and pedestals.
const CHROMA_EDGE: SignalFloat = 0.4;

/// Test chroma is in phase with the burst, which sits at 180 degrees from +U.
const BURST_PHASE: SignalFloat = 180.0;

/// VIR and NTC-7 test lines for NTSC. Field lines are 0-indexed; the names give the frame line
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtscVits {
    /// Vertical interval reference, first field.
    VirLine19,
    /// NTC-7 composite: white bar, 2T and 12.5T pulses and a modulated staircase.
    Ntc7CompositeLine20,
    /// Vertical interval reference, second field.
    VirLine282,
    /// NTC-7 combination: multiburst and three modulated pedestals.
    Ntc7CombinationLine283,
}

impl NtscVits {
    pub fn for_line(first_field: bool, line: usize) -> Option<Self> {
        match (first_field, line) {
            (true, 18) => Some(NtscVits::VirLine19),
            (true, 19) => Some(NtscVits::Ntc7CompositeLine20),
            (false, 18) => Some(NtscVits::VirLine282),
            (false, 19) => Some(NtscVits::Ntc7CombinationLine283),
            _ => None,
        }
    }

    /// Draw this line's waveform.
    pub fn render(self, painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
        match self {
            NtscVits::VirLine19 | NtscVits::VirLine282 => vir(painter, buf),
            NtscVits::Ntc7CompositeLine20 => ntc7_composite(painter, buf),
            NtscVits::Ntc7CombinationLine283 => ntc7_combination(painter, buf),
        }
    }
}

fn vir(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    // Chroma reference: 50 to 90 IRE at burst phase.
    painter.modulated_pedestal(buf, 12.0, 24.0, 70.0, 40.0, BURST_PHASE, CHROMA_EDGE);
    // Luminance reference, then black reference.
    painter.flat(buf, 36.0, 48.0, 50.0);
    painter.flat(buf, 48.0, 60.0, 7.5);
}

fn ntc7_composite(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    const STEPS: [(SignalFloat, SignalFloat); 6] =
        [(42.0, 0.0), (46.0, 20.0), (49.0, 40.0), (52.0, 60.0), (55.0, 80.0), (58.0, 90.0)];

    painter.flat(buf, 12.0, 30.0, 100.0);
    painter.sin2_pulse(buf, 34.0, PULSE_2T, 100.0);
    painter.modulated_pulse(buf, 37.0, PULSE_12_5T, 100.0, BURST_PHASE);
    painter.modulated_staircase(buf, &STEPS, 61.0, 40.0, BURST_PHASE, CHROMA_EDGE);
    painter.flat(buf, 61.0, 62.0, 90.0);
}

fn ntc7_combination(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    const PACKETS: [(SignalFloat, SignalFloat, SignalFloat); 6] = [
        (18.0, 5.0, 0.5),
        (24.0, 3.0, 1.0),
        (28.0, 3.0, 2.0),
        (32.0, 3.0, 3.0),
        (36.0, 3.0, 3.6),
        (40.0, 3.0, 4.2),
    ];

    painter.flat(buf, 12.0, 16.0, 100.0);
    painter.flat(buf, 16.0, 46.0, 50.0);
    for (start_us, duration_us, freq_mhz) in PACKETS {
        painter.multiburst_packet(buf, start_us, duration_us, freq_mhz, 50.0, 50.0);
    }
    painter.modulated_pedestal(buf, 46.0, 4.0, 50.0, 20.0, BURST_PHASE, CHROMA_EDGE);
    painter.modulated_pedestal(buf, 50.0, 4.0, 50.0, 40.0, BURST_PHASE, CHROMA_EDGE);
    painter.modulated_pedestal(buf, 54.0, 6.0, 50.0, 80.0, BURST_PHASE, CHROMA_EDGE);
    painter.flat(buf, 60.0, 61.0, 50.0);
}
