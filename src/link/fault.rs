//! Deterministic fault injection for the loopback link.
//!
//! A [`FaultPlan`] describes what happens to bytes written into one direction
//! of a loopback pair: dropped, corrupted, or surrounded by injected noise.
//! Faults come from explicit position lists and from seeded probabilities, so
//! a given plan always produces the same damage.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// A byte position paired with a value.
///
/// For corruption the value is XORed into the byte; for injection it is the
/// byte injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteFault {
    /// Zero-based position in the stream of written bytes.
    pub position: u64,
    /// XOR mask or injected byte.
    pub value: u8,
}

impl ByteFault {
    /// Create a new byte fault.
    pub fn new(position: u64, value: u8) -> Self {
        Self { position, value }
    }
}

/// Errors in a fault plan.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FaultPlanError {
    /// A position list is not sorted ascending.
    #[error("{0} must be sorted by position")]
    Unsorted(&'static str),

    /// A probability is outside its allowed range.
    #[error("{name} must be within {range}, got {value}")]
    InvalidProbability {
        /// Which probability.
        name: &'static str,
        /// Allowed range.
        range: &'static str,
        /// Value given.
        value: f64,
    },
}

/// Faults applied to one direction of a loopback link.
///
/// Worked example:
///
/// ```text
/// drop_list    = [2, 3]
/// corrupt_list = [(0, 0x14), (3, 0x14)]
/// add_list     = [(0, 0xF0), (0, 0x0D), (4, 0xFF)]
///
/// written:  10 15 20 25 30
/// read:     F0 0D 04 15 FF 30
/// ```
///
/// Injected bytes do not advance the position counter, so they never shift
/// the drop and corruption lists.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultPlan {
    /// Seed of the random generator behind the probabilities.
    pub seed: u64,
    /// Positions of written bytes that never arrive. Sorted ascending.
    pub drop_list: Vec<u64>,
    /// Bytes XORed with a mask. Sorted by position.
    pub corrupt_list: Vec<ByteFault>,
    /// Bytes injected after `position` written bytes. Position 0 injects
    /// immediately at link creation. Sorted by position.
    pub add_list: Vec<ByteFault>,
    /// Probability of dropping each written byte.
    pub drop_prob: f64,
    /// Probability of a single-bit error in each written byte.
    pub corrupt_prob: f64,
    /// Probability of injecting a random byte after each byte on the wire,
    /// including injected ones. Must stay below 1.
    pub add_prob: f64,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self::flawless()
    }
}

impl FaultPlan {
    /// A plan that delivers every byte untouched.
    pub fn flawless() -> Self {
        Self {
            seed: 1,
            drop_list: Vec::new(),
            corrupt_list: Vec::new(),
            add_list: Vec::new(),
            drop_prob: 0.0,
            corrupt_prob: 0.0,
            add_prob: 0.0,
        }
    }

    /// Set the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the drop probability.
    pub fn drop_prob(mut self, prob: f64) -> Self {
        self.drop_prob = prob;
        self
    }

    /// Set the single-bit corruption probability.
    pub fn corrupt_prob(mut self, prob: f64) -> Self {
        self.corrupt_prob = prob;
        self
    }

    /// Set the noise injection probability.
    pub fn add_prob(mut self, prob: f64) -> Self {
        self.add_prob = prob;
        self
    }

    /// Check list ordering and probability ranges.
    pub fn validate(&self) -> Result<(), FaultPlanError> {
        if !self.drop_list.is_sorted() {
            return Err(FaultPlanError::Unsorted("drop_list"));
        }
        if !self.corrupt_list.is_sorted_by_key(|f| f.position) {
            return Err(FaultPlanError::Unsorted("corrupt_list"));
        }
        if !self.add_list.is_sorted_by_key(|f| f.position) {
            return Err(FaultPlanError::Unsorted("add_list"));
        }

        check_probability("drop_prob", self.drop_prob, "[0, 1]", |p| (0.0..=1.0).contains(&p))?;
        check_probability("corrupt_prob", self.corrupt_prob, "[0, 1]", |p| {
            (0.0..=1.0).contains(&p)
        })?;
        // A certain injection would never let a write return.
        check_probability("add_prob", self.add_prob, "[0, 1)", |p| (0.0..1.0).contains(&p))?;

        Ok(())
    }
}

fn check_probability(
    name: &'static str,
    value: f64,
    range: &'static str,
    valid: impl Fn(f64) -> bool,
) -> Result<(), FaultPlanError> {
    if valid(value) {
        Ok(())
    } else {
        Err(FaultPlanError::InvalidProbability { name, range, value })
    }
}

/// Applies a [`FaultPlan`] to a stream of written bytes.
#[derive(Debug)]
pub(crate) struct FaultInjector {
    plan: FaultPlan,
    rng: StdRng,
    /// Written bytes so far, injected bytes excluded.
    written: u64,
    next_drop: usize,
    next_corrupt: usize,
    next_add: usize,
}

impl FaultInjector {
    /// Validate `plan` and emit its position-0 injections into `out`.
    pub(crate) fn new(plan: FaultPlan, out: &mut VecDeque<u8>) -> Result<Self, FaultPlanError> {
        plan.validate()?;

        let mut injector = Self {
            rng: StdRng::seed_from_u64(plan.seed),
            plan,
            written: 0,
            next_drop: 0,
            next_corrupt: 0,
            next_add: 0,
        };
        injector.inject_listed(out);
        Ok(injector)
    }

    /// Pass one written byte through the plan, appending what arrives to `out`.
    pub(crate) fn transmit(&mut self, mut byte: u8, out: &mut VecDeque<u8>) {
        let position = self.written;
        self.written += 1;

        while let Some(fault) = self.plan.corrupt_list.get(self.next_corrupt) {
            if fault.position != position {
                break;
            }
            byte ^= fault.value;
            self.next_corrupt += 1;
        }

        let mut dropped = false;
        while self.plan.drop_list.get(self.next_drop) == Some(&position) {
            dropped = true;
            self.next_drop += 1;
        }

        if self.rng.gen_bool(self.plan.corrupt_prob) {
            byte ^= 1 << self.rng.gen_range(0..8u32);
        }
        if self.rng.gen_bool(self.plan.drop_prob) {
            dropped = true;
        }

        if !dropped {
            out.push_back(byte);
        }

        self.inject_listed(out);
        while self.rng.gen_bool(self.plan.add_prob) {
            out.push_back(self.rng.gen_range(0..=u8::MAX));
        }
    }

    fn inject_listed(&mut self, out: &mut VecDeque<u8>) {
        while let Some(fault) = self.plan.add_list.get(self.next_add) {
            if fault.position != self.written {
                break;
            }
            out.push_back(fault.value);
            self.next_add += 1;
        }
    }
}
