//! Signal/reset tap separation for multi-tap readout frames.
//!
//! A raw frame holds `num_taps` taps side by side, each `tap_width` columns
//! wide: the left half of a tap is the signal sample, the right half the
//! reset sample. The frame carries one extra tap's worth of columns that is
//! not read.

use super::error::{ModelError, Result};
use super::image::Plane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapLayout {
    pub tap_width: usize,
    pub num_taps: usize,
}

impl Default for TapLayout {
    fn default() -> Self {
        TapLayout { tap_width: 128, num_taps: 32 }
    }
}

impl TapLayout {
    pub fn expected_width(&self) -> usize {
        self.tap_width * (self.num_taps + 1)
    }

    pub fn half(&self) -> usize {
        self.tap_width / 2
    }

    fn check(&self, plane: &Plane) -> Result<()> {
        if plane.width != self.expected_width() {
            return Err(ModelError::TapLayout {
                actual: plane.width,
                expected: self.expected_width(),
                tap_width: self.tap_width,
                num_taps: self.num_taps,
            });
        }
        Ok(())
    }

    /// Gather the half-tap at `offset` (0 = signal, `half` = reset) of every tap.
    fn gather(&self, plane: &Plane, offset: usize) -> Result<Plane> {
        self.check(plane)?;
        let half = self.half();
        let mut out = Plane::zeros(half * self.num_taps, plane.height);
        for y in 0..plane.height {
            let src = plane.row(y);
            let dst = out.row_mut(y);
            for tap in 0..self.num_taps {
                let start = tap * self.tap_width + offset;
                dst[tap * half..(tap + 1) * half].copy_from_slice(&src[start..start + half]);
            }
        }
        Ok(out)
    }

    pub fn extract_signal(&self, plane: &Plane) -> Result<Plane> {
        self.gather(plane, 0)
    }

    pub fn extract_reset(&self, plane: &Plane) -> Result<Plane> {
        self.gather(plane, self.half())
    }

    /// `reset - signal` per tap, clipped to the signed 16-bit range.
    pub fn subtract(&self, signal: &Plane, reset: &Plane) -> Result<Plane> {
        if signal.width != reset.width || signal.height != reset.height {
            return Err(ModelError::SizeMismatch(format!(
                "signal {}x{} vs reset {}x{}",
                signal.width, signal.height, reset.width, reset.height
            )));
        }
        let half = self.half();
        let mut out = Plane::zeros(signal.width, signal.height);
        for y in 0..signal.height {
            let (s, r) = (signal.row(y), reset.row(y));
            let dst = out.row_mut(y);
            for tap in 0..self.num_taps {
                for x in tap * half..((tap + 1) * half).min(signal.width) {
                    dst[x] = (r[x] - s[x]).clamp(i16::MIN as f32, i16::MAX as f32).trunc();
                }
            }
        }
        Ok(out)
    }
}

/// Signal of the first frame, reset of the second, and their difference.
#[derive(Debug, Clone, PartialEq)]
pub struct TapProducts {
    pub signal: Plane,
    pub reset: Plane,
    pub result: Plane,
}

impl TapProducts {
    pub fn compute(first: &Plane, second: &Plane, layout: TapLayout) -> Result<Self> {
        let signal = layout.extract_signal(first)?;
        let reset = layout.extract_reset(second)?;
        let result = layout.subtract(&signal, &reset)?;
        Ok(TapProducts { signal, reset, result })
    }
}
