//! Deterministic randomness shared across a run.
//!
//! A single seeded stream is created from the run configuration and handed
//! to every component that needs random choices, so a fixed seed reproduces
//! the same sequence of tie-breaks for the whole run.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A uniform random integer source.
pub trait RandomSource {
    /// Draw a value uniformly from `[0, bound)`.
    ///
    /// A `bound` of 0 or 1 always yields 0.
    fn draw(&mut self, bound: usize) -> usize;
}

/// Shared handle to the run's random stream.
///
/// Merging is single-threaded, so shared ownership is `Rc<RefCell<_>>`.
pub type SharedRandom = Rc<RefCell<dyn RandomSource>>;

/// Seeded pseudo-random source backed by [`StdRng`].
#[derive(Clone, Debug)]
pub struct SeededRng {
    seed: u64,
    inner: StdRng,
}

impl SeededRng {
    /// Create a stream from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a stream and wrap it for sharing.
    pub fn shared(seed: u64) -> SharedRandom {
        Rc::new(RefCell::new(Self::new(seed)))
    }

    /// The seed this stream was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRng {
    fn draw(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        self.inner.gen_range(0..bound)
    }
}
