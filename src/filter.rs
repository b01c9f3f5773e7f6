use crate::types::SignalFloat;

/// Half of the PAL chroma low-pass: a 13-tap Gaussian, -3 dB at 1.3 MHz.
const PAL_CHROMA_HALF: [SignalFloat; 7] = [
    0.00010852890120228184,
    0.0011732778293138913,
    0.008227778710181127,
    0.03742748297181873,
    0.11043962430879829,
    0.21139051659718247,
    0.2624655813630064,
];

/// Half of the NTSC chroma low-pass (9 taps).
const NTSC_CHROMA_HALF: [SignalFloat; 5] = [0.0021, 0.0191, 0.0903, 0.2308, 0.3153];

/// Half of the NTSC narrowband Q low-pass (23 taps, 0.6 MHz).
const NTSC_Q_HALF: [SignalFloat; 12] = [
    0.0002, 0.0027, 0.0085, 0.0171, 0.0278, 0.0398, 0.0522, 0.0639, 0.0742, 0.0821, 0.0872,
    0.0889,
];

/// Mirror the first half of a symmetric kernel (centre tap last) into the full kernel.
fn symmetric(half: &[SignalFloat]) -> Vec<SignalFloat> {
    let mut taps = half.to_vec();
    taps.extend(half.iter().rev().skip(1));
    taps
}

/// A zero-phase FIR low-pass filter. The kernel always has an odd number of taps so its centre
/// lines up with the sample being produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    coefficients: Vec<SignalFloat>,
}

impl FirFilter {
    /// Create a filter from its coefficients, used as given.
    ///
    /// Panics if the kernel is empty or has an even number of taps.
    pub fn new(coefficients: Vec<SignalFloat>) -> Self {
        assert!(
            coefficients.len() % 2 == 1,
            "FIR filter needs an odd number of taps, got {}",
            coefficients.len()
        );
        Self { coefficients }
    }

    /// Create a filter whose coefficients are scaled to sum to one, so a flat input passes
    /// through unchanged.
    pub fn normalized(coefficients: Vec<SignalFloat>) -> Self {
        let sum: SignalFloat = coefficients.iter().sum();
        Self::new(coefficients.into_iter().map(|c| c / sum).collect())
    }

    /// PAL chroma low-pass (13-tap Gaussian, -3 dB at 1.3 MHz).
    pub fn pal_chroma() -> Self {
        Self::normalized(symmetric(&PAL_CHROMA_HALF))
    }

    /// NTSC chroma low-pass (9 taps).
    pub fn ntsc_chroma() -> Self {
        Self::normalized(symmetric(&NTSC_CHROMA_HALF))
    }

    /// NTSC narrowband Q low-pass (23 taps, 0.6 MHz).
    pub fn ntsc_q() -> Self {
        Self::normalized(symmetric(&NTSC_Q_HALF))
    }

    pub fn taps(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &[SignalFloat] {
        &self.coefficients
    }

    /// Filter a row of samples. The output is the same length as the input; the edges are
    /// padded by reflecting the input about its first and last samples so the ends are neither
    /// attenuated nor left ringing.
    pub fn filter(&self, input: &[SignalFloat]) -> Vec<SignalFloat> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }

        let half = self.coefficients.len() / 2;
        let last = n - 1;

        // Reflected index into the input for a position that may lie outside it.
        let reflect = |pos: isize| -> SignalFloat {
            let idx = if pos < 0 {
                (-pos) as usize
            }
            else if pos as usize > last {
                (2 * last).saturating_sub(pos as usize)
            }
            else {
                pos as usize
            };
            input[idx.min(last)]
        };

        let mut padded = Vec::with_capacity(n + 2 * half);
        padded.extend((0..half).map(|i| reflect(i as isize - half as isize)));
        padded.extend_from_slice(input);
        padded.extend((0..half).map(|i| reflect((n + i) as isize)));

        padded
            .windows(self.coefficients.len())
            .map(|window| {
                window
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(x, c)| x * c)
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_lengths() {
        assert_eq!(FirFilter::pal_chroma().taps(), 13);
        assert_eq!(FirFilter::ntsc_chroma().taps(), 9);
        assert_eq!(FirFilter::ntsc_q().taps(), 23);
    }

    #[test]
    fn presets_preserve_dc() {
        let input = vec![12345.0; 64];
        for filter in [FirFilter::pal_chroma(), FirFilter::ntsc_chroma(), FirFilter::ntsc_q()] {
            let output = filter.filter(&input);
            assert_eq!(output.len(), input.len());
            for value in output {
                assert!((value - 12345.0).abs() < 0.5, "{} taps gave {value}", filter.taps());
            }
        }
    }

    #[test]
    fn short_inputs_keep_their_length() {
        let filter = FirFilter::ntsc_q();
        let output = filter.filter(&[1.0, 1.0, 1.0]);
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|v| (v - 1.0).abs() < 1e-9));
        assert!(filter.filter(&[]).is_empty());
    }

    #[test]
    fn impulse_response_is_the_kernel() {
        let filter = FirFilter::new(vec![0.25, 0.5, 0.25]);
        let output = filter.filter(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(output, vec![0.0, 0.25, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn edges_are_reflected() {
        let filter = FirFilter::new(vec![0.25, 0.5, 0.25]);
        // Reflection about the first sample sees 2.0 on both sides of it.
        let output = filter.filter(&[0.0, 2.0, 0.0]);
        assert_eq!(output[0], 1.0);
        assert_eq!(output[2], 1.0);
    }

    #[test]
    #[should_panic(expected = "odd number of taps")]
    fn even_length_kernel_is_rejected() {
        FirFilter::new(vec![0.5, 0.5]);
    }
}
