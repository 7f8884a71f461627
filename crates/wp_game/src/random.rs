//! Injectable uniform random source for ball spawning.

pub trait RandomSource {
    /// Uniform sample in `[low, high)`. Returns `low` for an empty range.
    fn range(&mut self, low: f32, high: f32) -> f32;
}

impl RandomSource for fastrand::Rng {
    fn range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        low + self.f32() * (high - low)
    }
}

/// Replays fixed unit samples in `[0, 1)`, cycling when exhausted.
#[cfg(test)]
pub struct ScriptedRandom {
    samples: Vec<f32>,
    cursor: usize,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(samples: &[f32]) -> Self {
        Self {
            samples: samples.to_vec(),
            cursor: 0,
        }
    }

    /// Always the midpoint of the requested range.
    pub fn midpoint() -> Self {
        Self::new(&[0.5])
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low || self.samples.is_empty() {
            return low;
        }
        let t = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        low + t * (high - low)
    }
}
