//! Injectable randomness for the gate and the delivery delay.

use rand::Rng;

/// Uniform random source: one draw in [0, 1) per call.
///
/// Injected everywhere chance is needed so tests can supply deterministic
/// sequences.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Default source backed by the thread-local RNG.
///
/// Each task draws from its own thread's generator, so concurrent handler
/// tasks never contend or order each other.
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Replays a fixed sequence of draws. Panics when exhausted, which makes
/// tests fail loudly if a code path draws more than expected.
#[cfg(test)]
pub struct SequenceSource {
    values: std::sync::Mutex<std::collections::VecDeque<f64>>,
}

#[cfg(test)]
impl SequenceSource {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: std::sync::Mutex::new(values.iter().copied().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}

#[cfg(test)]
impl RandomSource for SequenceSource {
    fn next_f64(&self) -> f64 {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .expect("SequenceSource exhausted")
    }
}
