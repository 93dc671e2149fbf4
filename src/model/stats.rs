//! Pixel statistics: ranges, histograms and histogram-based quantiles.

pub const MAX_BINS: usize = 256;

/// Bin count used for quantile estimates; avoids sorting multi-megapixel frames.
const QUANTILE_BINS: usize = 4096;

/// Min and max over finite values, `(0, 1)` when there are none.
pub fn min_max(values: &[f32]) -> (f32, f32) {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min > max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// Equal-width histogram of pixel intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Vec<f32>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin finite samples over their own `[min, max]` range.
    ///
    /// The last bin is closed on the right. A constant sample set is binned
    /// over `[v - 0.5, v + 0.5]`, an empty one over `[0, 1]`.
    pub fn compute(samples: &[f32], bins: usize) -> Self {
        let bins = bins.clamp(1, MAX_BINS);
        let finite = samples.iter().filter(|v| v.is_finite());
        let (lo, hi) = match finite.clone().fold(None, |acc: Option<(f32, f32)>, &v| {
            Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
        }) {
            None => (0.0, 1.0),
            Some((v, w)) if v == w => (v - 0.5, v + 0.5),
            Some(range) => range,
        };

        let width = (hi - lo) / bins as f32;
        let edges = (0..=bins).map(|i| lo + width * i as f32).collect();
        let mut counts = vec![0u64; bins];
        for &v in finite {
            let bin = (((v - lo) / (hi - lo)) * bins as f32) as usize;
            counts[bin.min(bins - 1)] += 1;
        }
        Histogram { edges, counts }
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Cumulative-count histogram over `[lo, hi]` used by the quantile helpers.
struct Cumulative {
    hist: Vec<u64>,
    count: u64,
}

impl Cumulative {
    fn new(data: &[f32], lo: f32, hi: f32) -> Option<Self> {
        let range = hi - lo;
        if range <= 0.0 {
            return None;
        }
        let mut hist = vec![0u64; QUANTILE_BINS];
        let mut count = 0u64;
        for &v in data.iter().filter(|v| v.is_finite()) {
            let norm = ((v - lo) / range).clamp(0.0, 1.0);
            hist[((norm * (QUANTILE_BINS - 1) as f32) as usize).min(QUANTILE_BINS - 1)] += 1;
            count += 1;
        }
        (count > 0).then_some(Cumulative { hist, count })
    }

    /// Fraction of `[lo, hi]` at which the running count reaches `target`.
    fn position(&self, target: u64) -> f32 {
        let mut seen = 0u64;
        for (i, &h) in self.hist.iter().enumerate() {
            seen += h;
            if seen >= target {
                return i as f32 / (QUANTILE_BINS - 1) as f32;
            }
        }
        1.0
    }
}

/// Quantile `q` (0..=1) of the finite values in `[lo, hi]`, expressed as a
/// fraction of that range. Returns 1.0 when the range or data is empty.
pub fn percentile(data: &[f32], lo: f32, hi: f32, q: f64) -> f32 {
    match Cumulative::new(data, lo, hi) {
        Some(c) => {
            let target = ((c.count as f64 * q).ceil() as u64).clamp(1, c.count);
            c.position(target)
        }
        None => 1.0,
    }
}

/// Median of the finite values in `[lo, hi]` as a fraction of that range.
pub fn median(data: &[f32], lo: f32, hi: f32) -> f32 {
    match Cumulative::new(data, lo, hi) {
        Some(c) => c.position(c.count.div_ceil(2)),
        None => 0.5,
    }
}
