use crate::types::{SampleValue, SignalFloat};
use crate::vits::VitsPainter;

/// 2T half-amplitude duration (T = 100 ns).
const PULSE_2T: SignalFloat = 0.2;

/// 10T half-amplitude duration.
const PULSE_10T: SignalFloat = 1.0;

/// Subcarrier fade time at the ends of staircases and pedestals.
const CHROMA_EDGE: SignalFloat = 1.0;

/// Angle of modulated test chroma from the +U axis.
const CHROMA_ANGLE: SignalFloat = 60.0;

/// Luma levels of the five-riser staircase.
const STAIRCASE_LEVELS: [SignalFloat; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

/// IEC 60857 / ITU test lines for PAL LaserDisc. Field lines are 0-indexed; the names give the
/// frame line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalVits {
    /// ITU composite test signal: white bar, 2T pulse and a modulated staircase.
    ItuCompositeLine19,
    /// ITU insertion test signal: three modulated pedestals and an extended subcarrier packet.
    ItsLine20,
    /// UK national test signal: white bar, 2T and 10T pulses and a modulated staircase.
    UkNationalLine332,
    /// Multiburst from 0.5 to 5.8 MHz.
    MultiburstLine333,
}

impl PalVits {
    /// The test line on a field line. The first field carries lines 332/333 because PAL frames
    /// on disc begin with the field holding the odd-numbered upper lines.
    pub fn for_line(first_field: bool, line: usize) -> Option<Self> {
        match (first_field, line) {
            (true, 18) => Some(PalVits::UkNationalLine332),
            (true, 19) => Some(PalVits::MultiburstLine333),
            (false, 18) => Some(PalVits::ItuCompositeLine19),
            (false, 19) => Some(PalVits::ItsLine20),
            _ => None,
        }
    }

    /// Draw this line's waveform.
    pub fn render(self, painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
        match self {
            PalVits::ItuCompositeLine19 => itu_composite(painter, buf),
            PalVits::ItsLine20 => its(painter, buf),
            PalVits::UkNationalLine332 => uk_national(painter, buf),
            PalVits::MultiburstLine333 => multiburst(painter, buf),
        }
    }
}

/// Staircase steps starting at `first_us`, the risers at 40, 44, 48, 52 and 56 us.
fn staircase_steps(first_us: SignalFloat) -> Vec<(SignalFloat, SignalFloat)> {
    let starts = [first_us, 40.0, 44.0, 48.0, 52.0, 56.0];
    starts.into_iter().zip(STAIRCASE_LEVELS).collect()
}

fn itu_composite(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    painter.flat(buf, 12.0, 22.0, 100.0);
    painter.sin2_pulse(buf, 26.0, PULSE_2T, 100.0);
    // 300 mV peak to peak of chroma.
    painter.modulated_staircase(buf, &staircase_steps(30.0), 60.0, 42.86, CHROMA_ANGLE, CHROMA_EDGE);
    painter.flat(buf, 60.0, 62.0, 100.0);
}

fn its(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    painter.flat(buf, 12.0, 14.0, 50.0);
    painter.modulated_pedestal(buf, 14.0, 4.0, 50.0, 20.0, CHROMA_ANGLE, CHROMA_EDGE);
    painter.modulated_pedestal(buf, 18.0, 4.0, 50.0, 60.0, CHROMA_ANGLE, CHROMA_EDGE);
    painter.modulated_pedestal(buf, 22.0, 6.0, 50.0, 100.0, CHROMA_ANGLE, CHROMA_EDGE);
    painter.flat(buf, 28.0, 34.0, 50.0);
    painter.modulated_pedestal(buf, 34.0, 26.0, 50.0, 60.0, CHROMA_ANGLE, CHROMA_EDGE);
    painter.flat(buf, 60.0, 61.0, 50.0);
    painter.flat(buf, 61.0, 64.0, 0.0);
}

fn uk_national(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    painter.flat(buf, 12.0, 22.0, 100.0);
    painter.sin2_pulse(buf, 26.0, PULSE_2T, 100.0);
    painter.modulated_pulse(buf, 30.0, PULSE_10T, 100.0, 0.0);
    // 150 mV peak to peak of chroma.
    painter.modulated_staircase(buf, &staircase_steps(34.0), 60.0, 21.43, CHROMA_ANGLE, CHROMA_EDGE);
    painter.flat(buf, 60.0, 62.0, 100.0);
}

fn multiburst(painter: &VitsPainter<'_>, buf: &mut [SampleValue]) {
    const PACKETS: [(SignalFloat, SignalFloat); 6] =
        [(24.0, 0.5), (30.0, 1.0), (36.0, 2.0), (42.0, 4.0), (48.0, 4.8), (54.0, 5.8)];

    painter.flat(buf, 12.0, 18.0, 80.0);
    painter.flat(buf, 18.0, 20.0, 20.0);
    painter.flat(buf, 20.0, 62.0, 50.0);
    painter.flat(buf, 62.0, 64.0, 0.0);
    for (start_us, freq_mhz) in PACKETS {
        painter.multiburst_packet(buf, start_us, 5.0, freq_mhz, 50.0, 60.0);
    }
}
