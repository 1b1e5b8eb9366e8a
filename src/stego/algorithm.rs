// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! The streaming contract shared by every embedding strategy.
//!
//! A strategy behaves like two independent FIFO pipelines:
//!
//! - **untampered → tampered**: cover samples are pushed in, the caller asks
//!   how many bits each queued sample can carry, then pops tampered samples
//!   while supplying that many payload bits per sample.
//! - **tampered → recovered**: stego samples are pushed in and the hidden bits
//!   are popped out, together with how many bits each sample carried.
//!
//! Payload bits for one sample are packed into a `u32`, least significant bit
//! first. Index 0 always refers to the next sample to be popped.

use crate::g711::Sample;

/// A tampered sample plus the strategy's informational side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tampered {
    pub sample: Sample,
    /// Diagnostic state (e.g. the transcoder's signed output). Not needed for
    /// correctness.
    pub state: i32,
}

/// Bits recovered from one stego sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recovered {
    pub bits: u32,
    /// Number of valid low bits in `bits`; 0 when nothing was encodable.
    pub bit_len: u32,
    pub state: i32,
}

impl Recovered {
    /// Nothing hidden at this position.
    pub const EMPTY: Recovered = Recovered {
        bits: 0,
        bit_len: 0,
        state: 0,
    };

    /// `bits` with everything above `bit_len` cleared.
    pub fn masked(&self) -> u32 {
        self.bits & low_mask(self.bit_len)
    }
}

/// A G.711 embedding strategy.
///
/// Implementations must keep `capacity_at` consistent with what
/// `pop_tampered` accepts, and the recovery path must reproduce exactly the
/// capacities reported at embed time. Requesting more bits than reported, or
/// popping fewer than [`minimum_pop`](Self::minimum_pop) samples, is a caller
/// error with an unspecified result.
pub trait StegAlgorithm: Send {
    /// Short human-readable identifier.
    fn name(&self) -> &'static str;

    /// Queue cover samples for embedding.
    fn push_untampered(&mut self, samples: &[Sample]);

    /// Number of cover samples that can be popped right now.
    fn untampered_ready(&self) -> usize;

    /// Smallest number of samples that must be popped together, or 0 when
    /// nothing is poppable.
    fn minimum_pop(&self) -> usize;

    /// Bits that can be embedded into the queued sample at `index`.
    fn capacity_at(&self, index: usize) -> u32;

    /// Pop up to `payload.len()` samples, embedding `payload[i]` into sample `i`.
    fn pop_tampered(&mut self, payload: &[u32]) -> Vec<Tampered>;

    /// Drop all queued cover samples and derived state.
    fn reset_untampered(&mut self);

    /// Queue stego samples for recovery.
    fn push_tampered(&mut self, samples: &[Sample]);

    /// Number of stego samples whose data can be popped right now.
    fn recovered_ready(&self) -> usize;

    /// Pop the hidden data of up to `count` stego samples.
    fn pop_recovered(&mut self, count: usize) -> Vec<Recovered>;

    /// Drop all queued stego samples and derived state.
    fn reset_tampered(&mut self);

    /// The queued cover sample at `index`, untouched.
    fn untampered_at(&self, index: usize) -> Option<Sample>;

    /// What the queued cover sample at `index` would become with `payload`
    /// embedded. Does not modify the queue.
    fn tampered_candidate(&self, index: usize, payload: u32) -> Option<Sample>;

    /// The embeddable pattern causing the largest linear deviation at `index`.
    fn noisiest_pattern(&self, index: usize) -> u32 {
        exhaustive_noisiest_pattern(self, index)
    }
}

/// Mask with the low `bits` bits set.
pub(crate) fn low_mask(bits: u32) -> u32 {
    if bits >= u32::BITS { u32::MAX } else { (1u32 << bits) - 1 }
}

/// Try every pattern that fits at `index` and keep the noisiest.
///
/// Ties keep the first pattern found, so an all-silent candidate set yields 0.
pub fn exhaustive_noisiest_pattern<A: StegAlgorithm + ?Sized>(algorithm: &A, index: usize) -> u32 {
    let Some(original) = algorithm.untampered_at(index) else {
        return 0;
    };
    let bits = algorithm.capacity_at(index);
    if bits == 0 {
        return 0;
    }

    let mut best = 0u32;
    let mut highest = 0i32;
    for pattern in 0..=low_mask(bits) {
        let Some(candidate) = algorithm.tampered_candidate(index, pattern) else {
            continue;
        };
        let noise = original.linear_difference(&candidate);
        if noise.abs() > highest.abs() {
            highest = noise;
            best = pattern;
        }
    }
    best
}

/// Compare only the all-zeros and all-ones patterns.
///
/// Valid for strategies whose deviation is monotone in the pattern's value.
pub fn extreme_noisiest_pattern<A: StegAlgorithm + ?Sized>(algorithm: &A, index: usize) -> u32 {
    let Some(original) = algorithm.untampered_at(index) else {
        return 0;
    };
    let bits = algorithm.capacity_at(index);
    if bits == 0 {
        return 0;
    }

    let all_ones = low_mask(bits);
    let noise_of = |pattern| {
        algorithm
            .tampered_candidate(index, pattern)
            .map_or(0, |c| original.linear_difference(&c).abs())
    };
    if noise_of(all_ones) > noise_of(0) { all_ones } else { 0 }
}
