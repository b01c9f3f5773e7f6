//! Two-level Manchester rendering shared by the VBI and VITC encoders.

use crate::types::{clamp_sample, SampleValue, SignalFloat, PI};

/// Renders bit sequences as Manchester code: every bit cell holds one level for its first half
/// and the other for its second half, so there is always a transition at the cell centre. A 1
/// goes low to high, a 0 goes high to low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManchesterRenderer {
    /// Width of one bit cell in samples.
    pub samples_per_bit: usize,
    pub low: SignalFloat,
    pub high: SignalFloat,
    /// Length of each edge in samples. 0 or 1 gives hard edges.
    pub ramp_samples: usize,
}

/// Sine-squared easing: 0 at x = 0, 1 at x = 1, with zero slope at both ends.
fn sine_squared(x: SignalFloat) -> SignalFloat {
    let s = SignalFloat::sin(PI / 2.0 * x);
    s * s
}

impl ManchesterRenderer {
    pub fn new(samples_per_bit: usize, low: SignalFloat, high: SignalFloat, ramp_samples: usize) -> Self {
        Self {
            samples_per_bit,
            low,
            high,
            ramp_samples,
        }
    }

    /// The (first half, second half) levels of a bit.
    fn cell_levels(&self, bit: u8) -> (SignalFloat, SignalFloat) {
        if bit != 0 {
            (self.low, self.high)
        }
        else {
            (self.high, self.low)
        }
    }

    /// Render `bits` into `buffer` starting at sample `start`. Cells that start past the end of
    /// the buffer are dropped, and a cell running off the end is truncated.
    pub fn render(&self, bits: &[u8], start: usize, buffer: &mut [SampleValue]) {
        let spb = self.samples_per_bit;
        if spb == 0 {
            return;
        }
        let half = spb / 2;
        let ramp = self.ramp_samples.min(spb.saturating_sub(1)).max(1);
        let boundary_ramp = ramp.min((spb / 4).max(1));

        let mut cell = vec![0.0; spb];
        let mut previous: Option<SignalFloat> = None;

        for (index, &bit) in bits.iter().enumerate() {
            let cell_start = start + index * spb;
            if cell_start >= buffer.len() {
                break;
            }

            let (first, second) = self.cell_levels(bit);
            cell[..half].fill(first);
            cell[half..].fill(second);

            // Mid-cell transition, centred on the cell centre.
            if ramp > 1 {
                let before = ramp / 2;
                let after = ramp - before;
                let from = half.saturating_sub(before);
                let to = (half + after).min(spb);
                let len = to - from;
                for i in 0..len {
                    let x = i as SignalFloat / (len - 1).max(1) as SignalFloat;
                    cell[from + i] = first + (second - first) * sine_squared(x);
                }
            }

            // Carry the previous cell's ending level into this one, easing across the boundary
            // only when the level actually changes.
            if let Some(prev) = previous {
                if prev != first && boundary_ramp > 1 {
                    for i in 0..boundary_ramp.min(half) {
                        let x = (i + 1) as SignalFloat / boundary_ramp as SignalFloat;
                        cell[i] = prev + (first - prev) * sine_squared(x);
                    }
                }
            }
            previous = Some(second);

            let end = (cell_start + spb).min(buffer.len());
            for (out, &level) in buffer[cell_start..end].iter_mut().zip(&cell) {
                *out = clamp_sample(level);
            }
        }
    }
}
