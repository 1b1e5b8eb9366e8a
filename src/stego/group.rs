// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Mean-centred group embedding.
//!
//! Samples are taken in groups of `n = 2k + 1`. Each group's floor mean `µ`
//! anchors the scheme: every non-centre slot's distance from `µ` falls into
//! one of fifteen fixed buckets, and the payload moves the slot to another
//! distance *inside the same bucket*. The centre slot absorbs the sum of all
//! moves so the group mean is preserved exactly, which lets the receiver
//! recompute `µ`, the buckets, and therefore the capacities from the stego
//! samples alone.
//!
//! A group is rejected outright when the extremes reachable through its
//! buckets could push the centre past `maxLambda`.
//!
//! References:
//! - Miao, Huang. "An Approach of Covert Communication Based on the Adaptive
//!   Steganography Scheme on Voice over IP", ICC 2011.

use std::collections::VecDeque;

use serde::Deserialize;
use tracing::{debug, info};

use crate::g711::{Sample, MAX_MAGNITUDE};
use crate::stego::algorithm::{
    extreme_noisiest_pattern, low_mask, Recovered, StegAlgorithm, Tampered,
};
use crate::stego::config::Configurable;
use crate::stego::error::StegoError;

/// One band of distances from the group mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    low: i32,
    high: i32,
    bits: u32,
}

const fn bucket(low: i32, high: i32, bits: u32) -> Bucket {
    Bucket { low, high, bits }
}

/// Inclusive bands, searched in order. Distances of at most 1 carry nothing.
const BUCKETS: [Bucket; 15] = [
    bucket(-256, -128, 4),
    bucket(-127, -64, 4),
    bucket(-63, -32, 4),
    bucket(-31, -16, 4),
    bucket(-15, -8, 3),
    bucket(-7, -4, 2),
    bucket(-3, -2, 1),
    bucket(-1, 1, 0),
    bucket(2, 3, 1),
    bucket(4, 7, 2),
    bucket(8, 15, 3),
    bucket(16, 31, 4),
    bucket(32, 63, 4),
    bucket(64, 127, 4),
    bucket(128, 256, 4),
];

fn bucket_for(delta: i32) -> Option<&'static Bucket> {
    BUCKETS.iter().find(|b| (b.low..=b.high).contains(&delta))
}

/// Configuration for [`GroupDelta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Group half-width; groups hold `2k + 1` samples.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Tolerance on the extremes the centre slot may be pushed to.
    #[serde(rename = "maxLambda", default = "default_max_lambda")]
    pub max_lambda: u8,
}

fn default_k() -> usize {
    3
}

fn default_max_lambda() -> u8 {
    60
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_lambda: default_max_lambda(),
        }
    }
}

impl GroupConfig {
    pub fn group_size(&self) -> usize {
        2 * self.k + 1
    }
}

impl Configurable for GroupConfig {
    fn options(&self) -> &'static [&'static str] {
        &["k", "maxLambda"]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StegoError> {
        match name {
            "k" => {
                self.k = value
                    .trim()
                    .parse()
                    .map_err(|_| StegoError::invalid("k", value, "try 1-79"))?;
            }
            "maxLambda" => {
                self.max_lambda = value
                    .trim()
                    .parse()
                    .map_err(|_| StegoError::invalid("maxLambda", value, "try 8-127"))?;
            }
            other => return Err(StegoError::UnknownOption(other.to_string())),
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), StegoError> {
        if !(1..=79).contains(&self.k) {
            return Err(StegoError::invalid("k", self.k, "try 1-79"));
        }
        if !(8..=127).contains(&self.max_lambda) {
            return Err(StegoError::invalid("maxLambda", self.max_lambda, "try 8-127"));
        }
        Ok(())
    }
}

/// Analysis of one non-centre slot.
#[derive(Debug, Clone, Copy)]
struct Slot {
    /// `µ` minus the slot's signed magnitude.
    delta: i32,
    /// Bucket edge nearest zero on the delta's side.
    bound: i32,
    bits: u32,
}

impl Slot {
    fn moved_delta(&self, payload: u32) -> i32 {
        let step = (payload & low_mask(self.bits)) as i32;
        self.bound + self.bound.signum() * step
    }

    fn recovered_bits(&self) -> u32 {
        let distance = if self.delta >= 0 {
            self.delta - self.bound
        } else {
            self.bound - self.delta
        };
        distance as u32 & low_mask(self.bits)
    }
}

/// A complete group with its analysis.
#[derive(Debug, Clone)]
struct Group {
    samples: Vec<Sample>,
    mu: i32,
    /// `None` at the centre.
    slots: Vec<Option<Slot>>,
    valid: bool,
}

impl Group {
    fn analyze(samples: Vec<Sample>, centre: usize, max_lambda: i32) -> Self {
        let n = samples.len() as i32;
        let sum: i32 = samples.iter().map(|s| i32::from(s.signed_magnitude())).sum();
        let mu = sum.div_euclid(n);

        let (mut upper, mut lower) = (mu, mu);
        let mut slots = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            if i == centre {
                slots.push(None);
                continue;
            }
            let delta = mu - i32::from(sample.signed_magnitude());
            // Every delta between two 7-bit magnitudes lies in some bucket.
            let Some(b) = bucket_for(delta) else {
                slots.push(Some(Slot {
                    delta,
                    bound: delta.signum(),
                    bits: 0,
                }));
                continue;
            };
            upper += b.high;
            lower += b.low;

            let bound = if delta >= 0 { b.low } else { b.high };
            let tolerable = (mu - b.high).abs() <= max_lambda || (mu - b.low).abs() <= max_lambda;
            let mut slot = Slot {
                delta,
                bound,
                bits: if tolerable { b.bits } else { 0 },
            };
            // The farthest move must stay representable or the mean drifts.
            if (mu - slot.moved_delta(u32::MAX)).abs() > i32::from(MAX_MAGNITUDE) {
                slot.bits = 0;
            }
            slots.push(Some(slot));
        }

        let valid = upper.abs() <= max_lambda && lower.abs() <= max_lambda;
        if !valid {
            debug!(mu, upper, lower, "group exceeds tolerance, left untouched");
        }
        Self {
            samples,
            mu,
            slots,
            valid,
        }
    }

    fn capacity(&self, slot: usize) -> u32 {
        if !self.valid {
            return 0;
        }
        self.slots.get(slot).copied().flatten().map_or(0, |s| s.bits)
    }

    fn candidate(&self, slot: usize, payload: u32) -> Option<Sample> {
        let original = *self.samples.get(slot)?;
        match self.slots[slot] {
            Some(s) if self.valid => {
                Some(original.with_signed(self.mu - s.moved_delta(payload)))
            }
            _ => Some(original),
        }
    }

    fn embed(mut self, payload: &[u32]) -> Vec<Sample> {
        if !self.valid {
            return self.samples;
        }
        let mut moved_sum = 0;
        let mut centre = None;
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(s) => {
                    let moved = s.moved_delta(payload.get(i).copied().unwrap_or(0));
                    moved_sum += moved;
                    self.samples[i] = self.samples[i].with_signed(self.mu - moved);
                }
                None => centre = Some(i),
            }
        }
        if let Some(c) = centre {
            self.samples[c] = self.samples[c].with_signed(self.mu + moved_sum);
        }
        self.samples
    }

    fn recover(&self) -> Vec<Recovered> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(s) if self.valid => Recovered {
                    bits: s.recovered_bits(),
                    bit_len: s.bits,
                    state: 0,
                },
                _ => Recovered::EMPTY,
            })
            .collect()
    }
}

/// Two-stage pipeline: raw samples wait until a full group is available.
#[derive(Debug, Default)]
struct GroupQueue {
    pending: VecDeque<Sample>,
    groups: VecDeque<Group>,
}

impl GroupQueue {
    fn push(&mut self, samples: &[Sample], k: usize, max_lambda: i32) {
        self.pending.extend(samples.iter().copied());
        let n = 2 * k + 1;
        while self.pending.len() >= n {
            let members: Vec<Sample> = self.pending.drain(..n).collect();
            self.groups.push_back(Group::analyze(members, k, max_lambda));
        }
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.groups.clear();
    }
}

#[derive(Debug)]
pub struct GroupDelta {
    k: usize,
    max_lambda: i32,
    untampered: GroupQueue,
    tampered: GroupQueue,
}

impl GroupDelta {
    pub fn new(config: GroupConfig) -> Result<Self, StegoError> {
        config.validate()?;
        info!(k = config.k, max_lambda = config.max_lambda, "group-delta configured");
        Ok(Self {
            k: config.k,
            max_lambda: i32::from(config.max_lambda),
            untampered: GroupQueue::default(),
            tampered: GroupQueue::default(),
        })
    }

    pub fn group_size(&self) -> usize {
        2 * self.k + 1
    }

    /// Queued cover groups that failed the tolerance check.
    pub fn invalid_groups(&self) -> usize {
        self.untampered.groups.iter().filter(|g| !g.valid).count()
    }

    fn locate(&self, index: usize) -> Option<(&Group, usize)> {
        let n = self.group_size();
        self.untampered.groups.get(index / n).map(|g| (g, index % n))
    }
}

impl StegAlgorithm for GroupDelta {
    fn name(&self) -> &'static str {
        "group-delta"
    }

    fn push_untampered(&mut self, samples: &[Sample]) {
        self.untampered.push(samples, self.k, self.max_lambda);
    }

    fn untampered_ready(&self) -> usize {
        self.untampered.groups.len() * self.group_size()
    }

    fn minimum_pop(&self) -> usize {
        if self.untampered.groups.is_empty() { 0 } else { self.group_size() }
    }

    fn capacity_at(&self, index: usize) -> u32 {
        self.locate(index).map_or(0, |(group, slot)| group.capacity(slot))
    }

    fn pop_tampered(&mut self, payload: &[u32]) -> Vec<Tampered> {
        let n = self.group_size();
        let count = payload.len().min(self.untampered_ready()) / n;
        let mut out = Vec::with_capacity(count * n);
        for chunk in payload.chunks_exact(n).take(count) {
            let Some(group) = self.untampered.groups.pop_front() else { break };
            let tampered = group.embed(chunk).into_iter();
            out.extend(tampered.map(|sample| Tampered { sample, state: 0 }));
        }
        out
    }

    fn reset_untampered(&mut self) {
        self.untampered.clear();
    }

    fn push_tampered(&mut self, samples: &[Sample]) {
        self.tampered.push(samples, self.k, self.max_lambda);
    }

    fn recovered_ready(&self) -> usize {
        self.tampered.groups.len() * self.group_size()
    }

    fn pop_recovered(&mut self, count: usize) -> Vec<Recovered> {
        let n = self.group_size();
        let groups = count.min(self.recovered_ready()) / n;
        let mut out = Vec::with_capacity(groups * n);
        for _ in 0..groups {
            let Some(group) = self.tampered.groups.pop_front() else { break };
            out.extend(group.recover());
        }
        out
    }

    fn reset_tampered(&mut self) {
        self.tampered.clear();
    }

    fn untampered_at(&self, index: usize) -> Option<Sample> {
        self.locate(index).and_then(|(group, slot)| group.samples.get(slot).copied())
    }

    /// The centre slot and invalid groups always report the original sample.
    fn tampered_candidate(&self, index: usize, payload: u32) -> Option<Sample> {
        self.locate(index).and_then(|(group, slot)| group.candidate(slot, payload))
    }

    fn noisiest_pattern(&self, index: usize) -> u32 {
        extreme_noisiest_pattern(self, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g711::Law;

    fn signed(law: Law, values: &[i32]) -> Vec<Sample> {
        values.iter().map(|&v| Sample::from_signed(law, v)).collect()
    }

    fn group(k: usize, max_lambda: u8) -> GroupDelta {
        GroupDelta::new(GroupConfig { k, max_lambda }).unwrap()
    }

    fn magnitudes(samples: &[Tampered]) -> Vec<i16> {
        samples.iter().map(|t| t.sample.signed_magnitude()).collect()
    }

    #[test]
    fn bucket_table_covers_every_delta() {
        for delta in -254..=254 {
            let b = bucket_for(delta).unwrap();
            assert!(b.low <= delta && delta <= b.high);
        }
        assert_eq!(bucket_for(0).unwrap().bits, 0);
        assert_eq!(bucket_for(-1).unwrap().bits, 0);
        assert_eq!(bucket_for(2).unwrap().bits, 1);
        assert_eq!(bucket_for(-128).unwrap().low, -256);
        assert_eq!(bucket_for(-127).unwrap().low, -127);
    }

    #[test]
    fn config_validation() {
        assert!(GroupConfig::default().validate().is_ok());
        assert_eq!(GroupConfig::default().group_size(), 7);
        for (k, max_lambda) in [(0, 60), (80, 60), (3, 7), (3, 128)] {
            let cfg = GroupConfig { k, max_lambda };
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }

        let mut cfg = GroupConfig::default();
        cfg.set_option("maxLambda", "100").unwrap();
        assert_eq!(cfg.max_lambda, 100);
        assert!(cfg.set_option("k", "0").is_err());
        assert!(matches!(cfg.set_option("lambda", "9"), Err(StegoError::UnknownOption(_))));
    }

    #[test]
    fn small_group_capacities_and_round_trip() {
        // mean floor(15 / 3) = 5; deltas -5 and -7 share the (-7, -4) band.
        let mut alg = group(1, 60);
        alg.push_untampered(&signed(Law::A, &[10, -7, 12]));
        assert_eq!(alg.minimum_pop(), 3);
        let capacities: Vec<u32> = (0..3).map(|i| alg.capacity_at(i)).collect();
        assert_eq!(capacities, vec![2, 0, 2]);

        let stego = alg.pop_tampered(&[3, 0, 1]);
        assert_eq!(magnitudes(&stego), vec![12, -7, 10]);

        alg.push_tampered(&stego.iter().map(|t| t.sample).collect::<Vec<_>>());
        let recovered = alg.pop_recovered(3);
        let bits: Vec<(u32, u32)> = recovered.iter().map(|r| (r.masked(), r.bit_len)).collect();
        assert_eq!(bits, vec![(3, 2), (0, 0), (1, 2)]);
    }

    #[test]
    fn intolerable_group_is_untouched() {
        let mut alg = group(1, 60);
        let cover = signed(Law::Mu, &[100, -100, 100]);
        alg.push_untampered(&cover);
        assert_eq!(alg.invalid_groups(), 1);
        assert!((0..3).all(|i| alg.capacity_at(i) == 0));
        assert_eq!(alg.tampered_candidate(0, 7), Some(cover[0]));

        let stego: Vec<Sample> = alg.pop_tampered(&[7, 7, 7]).iter().map(|t| t.sample).collect();
        assert_eq!(stego, cover);

        alg.push_tampered(&stego);
        assert!(alg.pop_recovered(3).iter().all(|r| r.bit_len == 0));
    }

    #[test]
    fn moves_that_would_saturate_carry_nothing() {
        // mean -50: slot 0 sits 64 above the mean in a 4-bit band, but moving it
        // further would fall below -127.
        let mut alg = group(1, 127);
        alg.push_untampered(&signed(Law::A, &[-114, -18, -18]));
        let capacities: Vec<u32> = (0..3).map(|i| alg.capacity_at(i)).collect();
        assert_eq!(capacities, vec![0, 0, 4]);

        let stego = alg.pop_tampered(&[15, 0, 15]);
        assert_eq!(magnitudes(&stego), vec![-114, -33, -3]);

        alg.push_tampered(&stego.iter().map(|t| t.sample).collect::<Vec<_>>());
        let recovered = alg.pop_recovered(3);
        assert_eq!(recovered[2].masked(), 15);
        assert_eq!(recovered[0].bit_len, 0);
    }

    #[test]
    fn partial_groups_are_not_exposed() {
        let mut alg = group(2, 60);
        alg.push_untampered(&signed(Law::A, &[1, 2, 3, 4]));
        assert_eq!(alg.untampered_ready(), 0);
        assert_eq!(alg.minimum_pop(), 0);
        assert_eq!(alg.capacity_at(0), 0);
        alg.push_untampered(&signed(Law::A, &[5, 6, 7]));
        assert_eq!(alg.untampered_ready(), 5);
        assert_eq!(alg.minimum_pop(), 5);
    }

    #[test]
    fn pops_round_down_to_whole_groups() {
        let mut alg = group(1, 60);
        alg.push_untampered(&signed(Law::A, &[3, 4, 5, 6, 7, 8]));
        assert_eq!(alg.pop_tampered(&[0; 5]).len(), 3);
        assert_eq!(alg.untampered_ready(), 3);
        assert!(alg.pop_tampered(&[0; 2]).is_empty());
    }

    #[test]
    fn mean_is_preserved_and_data_recovered() {
        let values: Vec<i32> = (0..210).map(|i| ((i * 37) % 61) - 30 + (i % 7) * 3).collect();
        for law in [Law::A, Law::Mu] {
            for k in [1, 3, 10] {
                let cover = signed(law, &values);
                let mut alg = group(k, 60);
                alg.push_untampered(&cover);
                let ready = alg.untampered_ready();
                let capacities: Vec<u32> = (0..ready).map(|i| alg.capacity_at(i)).collect();
                let payload: Vec<u32> = (0..ready as u32)
                    .map(|i| i.wrapping_mul(0x9E37_79B9) >> 9)
                    .collect();

                let tampered = alg.pop_tampered(&payload);
                let stego: Vec<Sample> = tampered.iter().map(|t| t.sample).collect();
                let n = 2 * k + 1;
                let mean = |g: &[Sample]| {
                    let sum: i32 = g.iter().map(|s| i32::from(s.signed_magnitude())).sum();
                    sum.div_euclid(n as i32)
                };
                for (before, after) in cover.chunks_exact(n).zip(stego.chunks_exact(n)) {
                    assert_eq!(mean(before), mean(after));
                }

                alg.push_tampered(&stego);
                let recovered = alg.pop_recovered(stego.len());
                for (i, r) in recovered.iter().enumerate() {
                    assert_eq!(r.bit_len, capacities[i], "k {k} sample {i}");
                    let expected = payload[i] & low_mask(capacities[i]);
                    assert_eq!(r.masked(), expected, "k {k} sample {i}");
                }
            }
        }
    }

    #[test]
    fn candidates_and_noisiest_pattern() {
        let mut alg = group(1, 60);
        alg.push_untampered(&signed(Law::A, &[10, -7, 12]));
        // Centre reports the original whatever the payload.
        assert_eq!(alg.tampered_candidate(1, 3), alg.untampered_at(1));
        assert_eq!(alg.tampered_candidate(0, 3).unwrap().signed_magnitude(), 12);
        // Delta -5 moves towards -7 at most; pattern 3 is the farther move.
        assert_eq!(alg.noisiest_pattern(0), 3);
        assert_eq!(alg.noisiest_pattern(1), 0);
        assert_eq!(alg.untampered_at(3), None);
    }

    #[test]
    fn reset_behaves_like_fresh_instance() {
        let cover = signed(Law::Mu, &[4, 9, -3, 20, 1, -6, 0]);
        let mut used = group(1, 60);
        used.push_untampered(&cover[..5]);
        used.push_tampered(&cover[..4]);
        used.reset_untampered();
        used.reset_tampered();
        used.push_untampered(&cover);

        let mut fresh = group(1, 60);
        fresh.push_untampered(&cover);
        assert_eq!(used.untampered_ready(), fresh.untampered_ready());
        assert_eq!(used.recovered_ready(), 0);
        for i in 0..cover.len() {
            assert_eq!(used.capacity_at(i), fresh.capacity_at(i));
        }
    }
}
