// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embed and extract drivers.
//!
//! The cover is fed to the strategy in transport-sized packets. For each
//! minimum-pop unit the driver:
//! 1. reads each sample's capacity and pulls exactly that many payload bits
//! 2. pops the tampered samples
//! 3. pushes them straight back through the same strategy's recovery path
//!    and checks that every sample reports the capacity and bits embedded
//!
//! Any disagreement in step 3 means embed and recover have diverged, and the
//! run is aborted with [`StegoError::Corruption`]. Once the payload is
//! exhausted the remaining cover is copied through unchanged.

use tracing::{debug, warn};

use crate::g711::{Sample, SAMPLES_PER_PACKET, SAMPLES_PER_SECOND};
use crate::stego::algorithm::{low_mask, StegAlgorithm};
use crate::stego::bits::{BitSource, ByteSink};
use crate::stego::error::StegoError;

/// Embedding statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmbedReport {
    /// Samples that went through the strategy (excludes pass-through).
    pub samples: usize,
    pub hidden_bits: u64,
    /// Mean of `(Δlinear / linear)²` over processed samples with non-zero signal.
    pub noise_to_signal: f64,
}

impl EmbedReport {
    /// Hidden bits per second of processed audio.
    pub fn hidden_bitrate(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.hidden_bits as f64 * SAMPLES_PER_SECOND as f64 / self.samples as f64
    }
}

/// What happened to one processed cover sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDetail {
    pub input: Sample,
    /// The strategy's side channel, e.g. the signed transcoder symbol.
    pub state: i32,
    pub output: Sample,
    /// Embedded bits, least significant first.
    pub data: u32,
    pub bit_len: u32,
}

#[derive(Debug, Clone)]
pub struct EmbedOutcome {
    /// Same length as the cover.
    pub stego: Vec<Sample>,
    pub report: EmbedReport,
    /// One record per processed sample; pass-through samples have none.
    pub details: Vec<SampleDetail>,
}

#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    /// Recovered bytes; a trailing partial byte is dropped.
    pub data: Vec<u8>,
    pub hidden_bits: u64,
}

#[derive(Debug, Default)]
struct NoiseStats {
    samples: usize,
    hidden_bits: u64,
    ratio_sum: f64,
    ratio_count: usize,
}

impl NoiseStats {
    fn record(&mut self, original: Sample, tampered: Sample) {
        self.samples += 1;
        let signal = original.linear();
        if signal != 0 {
            let ratio = f64::from(original.linear_difference(&tampered)) / f64::from(signal);
            self.ratio_sum += ratio * ratio;
            self.ratio_count += 1;
        }
    }

    fn report(&self) -> EmbedReport {
        let noise_to_signal = if self.ratio_count == 0 {
            0.0
        } else {
            self.ratio_sum / self.ratio_count as f64
        };
        EmbedReport {
            samples: self.samples,
            hidden_bits: self.hidden_bits,
            noise_to_signal,
        }
    }
}

/// Hide bits from `source` in `cover`.
///
/// The strategy's pipelines are reset first, so one instance can be reused
/// across runs.
///
/// # Errors
/// [`StegoError::Corruption`] if a tampered unit does not recover to the
/// bits that were embedded into it.
pub fn embed(
    algorithm: &mut dyn StegAlgorithm,
    cover: &[Sample],
    source: &mut dyn BitSource,
) -> Result<EmbedOutcome, StegoError> {
    algorithm.reset_untampered();
    algorithm.reset_tampered();

    let mut stego = Vec::with_capacity(cover.len());
    let mut details = Vec::new();
    let mut stats = NoiseStats::default();

    for packet in cover.chunks(SAMPLES_PER_PACKET) {
        if source.remaining_bits() == Some(0) {
            break;
        }
        algorithm.push_untampered(packet);
        embed_ready_units(algorithm, cover, source, &mut stego, &mut details, &mut stats)?;
    }

    // Payload exhausted or cover ended mid-unit: the rest goes out untouched.
    let passed_through = cover.len() - stego.len();
    if passed_through > 0 {
        debug!(passed_through, "copying remaining cover samples unchanged");
        stego.extend_from_slice(&cover[stego.len()..]);
    }
    algorithm.reset_untampered();
    algorithm.reset_tampered();

    Ok(EmbedOutcome {
        stego,
        report: stats.report(),
        details,
    })
}

fn embed_ready_units(
    algorithm: &mut dyn StegAlgorithm,
    cover: &[Sample],
    source: &mut dyn BitSource,
    stego: &mut Vec<Sample>,
    details: &mut Vec<SampleDetail>,
    stats: &mut NoiseStats,
) -> Result<(), StegoError> {
    loop {
        let unit = algorithm.minimum_pop();
        if unit == 0 || algorithm.untampered_ready() < unit || source.remaining_bits() == Some(0) {
            return Ok(());
        }

        let mut payload = Vec::with_capacity(unit);
        let mut lengths = Vec::with_capacity(unit);
        for index in 0..unit {
            let bits = algorithm.capacity_at(index);
            let mut value = 0u32;
            for bit in 0..bits {
                // A source that runs dry mid-unit pads with zeros.
                if source.next_bit(&*algorithm) == Some(true) {
                    value |= 1 << bit;
                }
            }
            stats.hidden_bits += u64::from(bits);
            payload.push(value);
            lengths.push(bits);
        }

        let popped = algorithm.pop_tampered(&payload);
        let tampered: Vec<Sample> = popped.iter().map(|t| t.sample).collect();
        let offset = stego.len();
        for (i, (original, t)) in cover[offset..].iter().zip(&popped).enumerate() {
            stats.record(*original, t.sample);
            details.push(SampleDetail {
                input: *original,
                state: t.state,
                output: t.sample,
                data: payload[i] & low_mask(lengths[i]),
                bit_len: lengths[i],
            });
        }

        algorithm.push_tampered(&tampered);
        let recovered = algorithm.pop_recovered(tampered.len());
        for (i, r) in recovered.iter().enumerate() {
            let expected_len = lengths[i];
            let expected_bits = payload[i] & low_mask(expected_len);
            if r.bit_len != expected_len || r.masked() != expected_bits {
                let error = StegoError::Corruption {
                    sample: offset + i,
                    expected_bits,
                    expected_len,
                    actual_bits: r.masked(),
                    actual_len: r.bit_len,
                };
                warn!(strategy = algorithm.name(), %error, "round-trip verification failed");
                return Err(error);
            }
        }

        stego.extend(tampered);
    }
}

/// Recover the hidden bytes from `stego`.
pub fn extract(algorithm: &mut dyn StegAlgorithm, stego: &[Sample]) -> ExtractOutcome {
    algorithm.reset_tampered();

    let mut sink = ByteSink::new();
    for packet in stego.chunks(SAMPLES_PER_PACKET) {
        algorithm.push_tampered(packet);
        loop {
            let ready = algorithm.recovered_ready().min(SAMPLES_PER_PACKET);
            if ready == 0 {
                break;
            }
            let recovered = algorithm.pop_recovered(ready);
            if recovered.is_empty() {
                break;
            }
            for r in &recovered {
                sink.push_bits(r.masked(), r.bit_len);
            }
        }
    }
    algorithm.reset_tampered();

    let hidden_bits = sink.bits_received();
    ExtractOutcome {
        data: sink.into_bytes(),
        hidden_bits,
    }
}
