use crate::NeeCandidate;

/// Snapshot of a single cache cell.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct NeeCell {
    pub id: u32,
    pub count: u32,
    pub total_weight: f32,
    pub candidates: [NeeCandidate; NeeCell::CAPACITY],
}

impl NeeCell {
    /// Maximum number of candidates a single cell can hold.
    pub const CAPACITY: usize = 16;

    /// Number of `Vec4`s occupied by a cell: one for the header, plus one per
    /// each candidate.
    pub const STRIDE: usize = 1 + Self::CAPACITY;

    /// Lookups use jitter values from range `<0, JITTER_RANGE)`.
    pub const JITTER_RANGE: u32 = 8;

    /// How quickly a candidate's weight follows newly observed radiance.
    pub const BLEND: f32 = 0.125;

    pub fn empty(id: u32) -> Self {
        Self {
            id,
            count: 0,
            total_weight: 0.0,
            candidates: [NeeCandidate::default(); Self::CAPACITY],
        }
    }

    pub fn len(&self) -> usize {
        (self.count as usize).min(Self::CAPACITY)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || !(self.total_weight > 0.0)
    }

    /// Picks one candidate proportionally to its weight, using `sample` (in
    /// range `<0.0, 1.0)`) to invert the cumulative distribution.
    ///
    /// Returns the candidate together with the probability of picking it;
    /// returns `None` if there's nothing to pick from.
    pub fn sample(&self, sample: f32) -> Option<(NeeCandidate, f32)> {
        if self.is_empty() {
            return None;
        }

        let len = self.len();

        // Weights are normalized by the largest one so that tiny and
        // wildly-skewed weights don't underflow or overflow the sum
        let mut max_weight = 0.0f32;
        let mut idx = 0;

        while idx < len {
            max_weight = max_weight.max(self.candidates[idx].clamped_weight());
            idx += 1;
        }

        if !(max_weight > 0.0) {
            return None;
        }

        let mut sum = 0.0;
        let mut idx = 0;

        while idx < len {
            sum += self.candidates[idx].clamped_weight() / max_weight;
            idx += 1;
        }

        let target = sample * sum;
        let mut cdf = 0.0;
        let mut picked = None;
        let mut idx = 0;

        while idx < len {
            let weight = self.candidates[idx].clamped_weight() / max_weight;

            if weight > 0.0 {
                picked = Some((idx, weight));
                cdf += weight;

                if target < cdf {
                    break;
                }
            }

            idx += 1;
        }

        // If rounding made us walk past the end, `picked` holds the last
        // candidate with a positive weight
        let (idx, weight) = picked?;

        Some((self.candidates[idx], weight / sum))
    }
}
