// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic speech-like covers shared by the integration tests.

use g711_steg::g711::{Law, Sample};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Alternating bursts of silence and random-walk "voice" of varying loudness.
pub fn speech_like(law: Law, seed: u64, len: usize) -> Vec<Sample> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(len);
    let mut level: i32 = 0;

    while out.len() < len {
        let burst = rng.gen_range(80..400);
        if rng.gen_bool(0.3) {
            out.extend(std::iter::repeat(Sample::silent(law)).take(burst));
            level = 0;
            continue;
        }
        let amplitude = rng.gen_range(4..100);
        for _ in 0..burst {
            level = (level + rng.gen_range(-12..=12)).clamp(-amplitude, amplitude);
            out.push(Sample::from_signed(law, level));
        }
    }

    out.truncate(len);
    out
}

#[allow(dead_code)]
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}
