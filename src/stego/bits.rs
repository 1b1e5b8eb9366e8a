// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload bit sources and the byte sink used on extraction.
//!
//! Bytes are serialized least significant bit first, both ways.

use std::collections::VecDeque;

use crate::stego::algorithm::StegAlgorithm;

/// A supply of payload bits.
pub trait BitSource {
    /// Bits left to hand out, or `None` when the source never runs dry.
    fn remaining_bits(&self) -> Option<usize>;

    /// The next bit, or `None` when nothing is available.
    ///
    /// The strategy being embedded into is passed along for sources that
    /// derive their bits from it.
    fn next_bit(&mut self, algorithm: &dyn StegAlgorithm) -> Option<bool>;
}

/// Bits of an in-memory byte buffer.
#[derive(Debug, Clone)]
pub struct ByteBitSource {
    bytes: Vec<u8>,
    position: usize,
}

impl ByteBitSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            position: 0,
        }
    }

    /// Bits handed out so far.
    pub fn consumed_bits(&self) -> usize {
        self.position
    }
}

impl BitSource for ByteBitSource {
    fn remaining_bits(&self) -> Option<usize> {
        Some(self.bytes.len() * 8 - self.position)
    }

    fn next_bit(&mut self, _algorithm: &dyn StegAlgorithm) -> Option<bool> {
        let byte = *self.bytes.get(self.position / 8)?;
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;
        Some(bit)
    }
}

/// Replays each sample's noisiest embeddable pattern as payload.
///
/// Patterns are loaded one minimum-pop unit at a time, and only once the
/// previous unit's bits have all been handed out: the caller may not have
/// pushed the next samples yet. Capacities are latched when a unit is loaded.
#[derive(Debug, Default)]
pub struct WorstNoiseBitSource {
    /// `(pattern, bits)` of the loaded unit's samples that carry data.
    pending: VecDeque<(u32, u32)>,
    bit: u32,
}

impl WorstNoiseBitSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, algorithm: &dyn StegAlgorithm) {
        let unit = algorithm.minimum_pop();
        for index in 0..unit {
            let bits = algorithm.capacity_at(index);
            if bits > 0 {
                self.pending.push_back((algorithm.noisiest_pattern(index), bits));
            }
        }
        self.bit = 0;
    }
}

impl BitSource for WorstNoiseBitSource {
    fn remaining_bits(&self) -> Option<usize> {
        None
    }

    fn next_bit(&mut self, algorithm: &dyn StegAlgorithm) -> Option<bool> {
        if self.pending.is_empty() {
            self.load(algorithm);
        }
        let &(pattern, bits) = self.pending.front()?;

        let value = (pattern >> self.bit) & 1 != 0;
        self.bit += 1;
        if self.bit >= bits {
            self.pending.pop_front();
            self.bit = 0;
        }
        Some(value)
    }
}

/// Reassembles recovered bits into bytes.
#[derive(Debug, Default, Clone)]
pub struct ByteSink {
    bytes: Vec<u8>,
    current: u8,
    filled: u32,
    received: u64,
}

impl ByteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bit(&mut self, bit: bool) {
        self.current |= u8::from(bit) << self.filled;
        self.filled += 1;
        self.received += 1;
        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Push the low `len` bits of `bits`, lowest first.
    pub fn push_bits(&mut self, bits: u32, len: u32) {
        for i in 0..len {
            self.push_bit((bits >> i) & 1 != 0);
        }
    }

    /// Total bits pushed, including any held-back partial byte.
    pub fn bits_received(&self) -> u64 {
        self.received
    }

    /// Completed bytes. A trailing partial byte is dropped.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
