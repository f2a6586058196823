pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Mono PCM at [`TARGET_SAMPLE_RATE`], samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAudio {
    samples: Vec<f32>,
}

impl NormalizedAudio {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        TARGET_SAMPLE_RATE
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / TARGET_SAMPLE_RATE as f64
    }
}
