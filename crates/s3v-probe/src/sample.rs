//! Random vectors and run identifiers

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces uniformly random `[0, 1)` vectors of a fixed dimension.
#[derive(Debug)]
pub struct VectorSampler {
    rng: StdRng,
    dimension: usize,
}

impl VectorSampler {
    /// Seeded sampler; the clock is used when `seed` is `None`.
    pub fn new(dimension: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(clock_seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Next random vector
    pub fn sample(&mut self) -> Vec<f32> {
        (0..self.dimension).map(|_| self.rng.gen::<f32>()).collect()
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 8 hex characters shared by all keys inserted in one run
pub fn key_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Correlation id for log lines of one run: `s3v-<kind>-<pid>-<micros>`.
pub fn generate_run_id(kind: &str) -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    format!("s3v-{}-{}-{}", kind, std::process::id(), micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_dimension_and_range() {
        let mut sampler = VectorSampler::new(16, Some(7));
        let v = sampler.sample();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_same_seed_same_vectors() {
        let mut a = VectorSampler::new(8, Some(42));
        let mut b = VectorSampler::new(8, Some(42));
        assert_eq!(a.sample(), b.sample());
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn test_consecutive_samples_differ() {
        let mut sampler = VectorSampler::new(8, Some(1));
        assert_ne!(sampler.sample(), sampler.sample());
    }

    #[test]
    fn test_key_suffix() {
        let suffix = key_suffix();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id("smoke");
        assert!(id.starts_with(&format!("s3v-smoke-{}-", std::process::id())));
    }
}
