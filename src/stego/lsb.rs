// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Plain least-significant-bit substitution.
//!
//! Every sample carries exactly one bit in the low bit of its uninverted
//! value. No state, no analysis: the reference baseline the other strategies
//! are measured against.

use std::collections::VecDeque;

use crate::g711::Sample;
use crate::stego::algorithm::{Recovered, StegAlgorithm, Tampered};

#[derive(Debug, Default)]
pub struct Lsb {
    untampered: VecDeque<Sample>,
    tampered: VecDeque<Sample>,
}

impl Lsb {
    pub fn new() -> Self {
        Self::default()
    }

    fn embed(sample: Sample, payload: u32) -> Sample {
        if payload & 1 != 0 { sample | 1 } else { sample & !1 }
    }
}

impl StegAlgorithm for Lsb {
    fn name(&self) -> &'static str {
        "lsb"
    }

    fn push_untampered(&mut self, samples: &[Sample]) {
        self.untampered.extend(samples.iter().copied());
    }

    fn untampered_ready(&self) -> usize {
        self.untampered.len()
    }

    fn minimum_pop(&self) -> usize {
        usize::from(!self.untampered.is_empty())
    }

    fn capacity_at(&self, _index: usize) -> u32 {
        1
    }

    fn pop_tampered(&mut self, payload: &[u32]) -> Vec<Tampered> {
        let n = payload.len().min(self.untampered.len());
        self.untampered
            .drain(..n)
            .zip(payload)
            .map(|(sample, &bits)| Tampered {
                sample: Self::embed(sample, bits),
                state: 0,
            })
            .collect()
    }

    fn reset_untampered(&mut self) {
        self.untampered.clear();
    }

    fn push_tampered(&mut self, samples: &[Sample]) {
        self.tampered.extend(samples.iter().copied());
    }

    fn recovered_ready(&self) -> usize {
        self.tampered.len()
    }

    fn pop_recovered(&mut self, count: usize) -> Vec<Recovered> {
        let n = count.min(self.tampered.len());
        self.tampered
            .drain(..n)
            .map(|s| Recovered {
                bits: u32::from(s.uninverted() & 1),
                bit_len: 1,
                state: 0,
            })
            .collect()
    }

    fn reset_tampered(&mut self) {
        self.tampered.clear();
    }

    fn untampered_at(&self, index: usize) -> Option<Sample> {
        self.untampered.get(index).copied()
    }

    fn tampered_candidate(&self, index: usize, payload: u32) -> Option<Sample> {
        self.untampered_at(index).map(|s| Self::embed(s, payload))
    }

    /// Flipping the current low bit is always the noisier choice.
    fn noisiest_pattern(&self, index: usize) -> u32 {
        self.untampered_at(index).map_or(0, |s| u32::from(s.uninverted() & 1 == 0))
    }
}
