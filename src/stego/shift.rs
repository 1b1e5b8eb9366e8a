// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Silent-sample shift embedding.
//!
//! Only silent samples (signed magnitude 0) carry data: the payload is written
//! directly as a small magnitude in `[0, j]` plus a sign bit. Every other
//! sample has its magnitude pushed away from zero by `j`, so that after
//! embedding, "magnitude ≤ j" identifies exactly the data-carrying samples.
//! Loud samples keep their shape and only move by `j` steps, trading capacity
//! for low perceptual noise.
//!
//! References:
//! - Aoki. "A Semi-Lossless Steganography Technique for G.711 Telephony
//!   Speech", IIH-MSP 2010.

use std::collections::VecDeque;

use serde::Deserialize;
use tracing::info;

use crate::g711::{Sample, MAX_MAGNITUDE, SIGN};
use crate::stego::algorithm::{Recovered, StegAlgorithm, Tampered};
use crate::stego::config::Configurable;
use crate::stego::error::StegoError;

/// Configuration for [`SilentShift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftConfig {
    /// Shift applied to non-silent samples; must be `2^m - 1`, at most 63.
    #[serde(default)]
    pub j: u8,
}

impl ShiftConfig {
    /// Bits carried by a silent sample: `ceil(log2(j + 2))`.
    pub fn bits_per_silent_sample(&self) -> u32 {
        u8::BITS - self.j.leading_zeros() + 1
    }
}

impl Configurable for ShiftConfig {
    fn options(&self) -> &'static [&'static str] {
        &["j"]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StegoError> {
        match name {
            "j" => {
                self.j = value
                    .trim()
                    .parse()
                    .map_err(|_| StegoError::invalid("j", value, "try a power of 2 less 1"))?;
                self.validate()
            }
            other => Err(StegoError::UnknownOption(other.to_string())),
        }
    }

    fn validate(&self) -> Result<(), StegoError> {
        if self.j <= 63 && (u16::from(self.j) + 1).is_power_of_two() {
            Ok(())
        } else {
            Err(StegoError::invalid("j", self.j, "try a power of 2 less 1"))
        }
    }
}

#[derive(Debug)]
pub struct SilentShift {
    j: u8,
    bits: u32,
    untampered: VecDeque<Sample>,
    tampered: VecDeque<Sample>,
}

impl SilentShift {
    pub fn new(config: ShiftConfig) -> Result<Self, StegoError> {
        config.validate()?;
        info!(j = config.j, bits = config.bits_per_silent_sample(), "silent-shift configured");
        Ok(Self {
            j: config.j,
            bits: config.bits_per_silent_sample(),
            untampered: VecDeque::new(),
            tampered: VecDeque::new(),
        })
    }

    fn embed(&self, sample: Sample, payload: u32) -> Sample {
        let j = u32::from(self.j);
        let signed = i32::from(sample.signed_magnitude());

        if signed == 0 {
            let sign = if payload & (j + 1) != 0 { SIGN } else { 0 };
            return Sample::from_uninverted(sample.law(), (payload & j) as u8 | sign);
        }

        if signed.unsigned_abs() + j >= u32::from(SIGN) {
            // Would overflow the magnitude: pin to the loudest value, same sign.
            let sign = if signed < 0 { SIGN } else { 0 };
            Sample::from_uninverted(sample.law(), sign | MAX_MAGNITUDE)
        } else {
            sample + self.j
        }
    }

    fn recover(&self, sample: Sample) -> Recovered {
        if sample.signed_magnitude().unsigned_abs() > u16::from(self.j) {
            return Recovered::EMPTY;
        }
        let u = sample.uninverted();
        let sign = if u & SIGN != 0 { u32::from(self.j) + 1 } else { 0 };
        Recovered {
            bits: u32::from(u & self.j) + sign,
            bit_len: self.bits,
            state: 0,
        }
    }
}

impl StegAlgorithm for SilentShift {
    fn name(&self) -> &'static str {
        "silent-shift"
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

    fn capacity_at(&self, index: usize) -> u32 {
        match self.untampered.get(index) {
            Some(s) if s.signed_magnitude() == 0 => self.bits,
            _ => 0,
        }
    }

    fn pop_tampered(&mut self, payload: &[u32]) -> Vec<Tampered> {
        let n = payload.len().min(self.untampered.len());
        let mut out = Vec::with_capacity(n);
        for &bits in &payload[..n] {
            if let Some(sample) = self.untampered.pop_front() {
                out.push(Tampered {
                    sample: self.embed(sample, bits),
                    state: 0,
                });
            }
        }
        out
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
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let Some(sample) = self.tampered.pop_front() else { break };
            out.push(self.recover(sample));
        }
        out
    }

    fn reset_tampered(&mut self) {
        self.tampered.clear();
    }

    fn untampered_at(&self, index: usize) -> Option<Sample> {
        self.untampered.get(index).copied()
    }

    fn tampered_candidate(&self, index: usize, payload: u32) -> Option<Sample> {
        self.untampered_at(index).map(|s| self.embed(s, payload))
    }

    /// Largest magnitude, with the sign opposite to the silent sample's own.
    fn noisiest_pattern(&self, index: usize) -> u32 {
        let j = u32::from(self.j);
        let positive = self.untampered_at(index).is_some_and(|s| !s.is_negative());
        j + (j + 1) * u32::from(positive)
    }
}
