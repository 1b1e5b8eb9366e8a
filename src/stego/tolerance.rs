// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Distortion-tolerance embedding guided by a lower-bitrate transcoder.
//!
//! Each sample is re-encoded through a companion G.726 encoder with its low
//! bits cleared (lower candidate) and set (upper candidate), one bit at a
//! time from bit 0 upwards. As long as both candidates produce the same
//! G.726 code word, the transcoder "cannot tell" the difference, so that bit
//! is free to carry payload. The probe stops at the first diverging bit or
//! after [`MAX_TOLERANCE_BITS`] bits.
//!
//! The running encoder state is always advanced along the lower-candidate
//! trace. Because the lower candidate has every payload bit cleared, the
//! receiver, probing the *tampered* sample, walks the exact same trace and
//! re-derives the same capacities without side information.
//!
//! A sample whose unmodified code word already sits at the edge of the code
//! space is marked saturated and carries nothing: the encoder clips there, so
//! an unchanged code says nothing about tolerance.
//!
//! [`PacketBoundary::EveryPacket`] resets the running encoder every
//! [`SAMPLES_PER_PACKET`] samples, matching transports that restart the codec
//! per packet.
//!
//! References:
//! - Ito, Abe, Suzuki. "Information Hiding for G.711 Speech Based on
//!   Substitution of Least Significant Bits and Estimation of Tolerable
//!   Distortion", ICASSP 2009.

use std::collections::VecDeque;

use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::g711::{Sample, SAMPLES_PER_PACKET};
use crate::g726::{Bitrate, Transcoder, G726};
use crate::stego::algorithm::{
    extreme_noisiest_pattern, low_mask, Recovered, StegAlgorithm, Tampered,
};
use crate::stego::config::Configurable;
use crate::stego::error::StegoError;

/// Upper bound on bits probed per sample.
pub const MAX_TOLERANCE_BITS: u32 = 4;

/// When the running transcoder state is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketBoundary {
    /// One continuous encoder for the whole stream.
    #[default]
    Never,
    /// Fresh encoder every [`SAMPLES_PER_PACKET`] samples.
    EveryPacket,
}

/// Configuration for [`Tolerance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceConfig {
    #[serde(rename = "g726bitrate", default = "default_bitrate")]
    pub bitrate: Bitrate,
    #[serde(default)]
    pub packet_boundary: PacketBoundary,
}

fn default_bitrate() -> Bitrate {
    Bitrate::Kbps40
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            packet_boundary: PacketBoundary::Never,
        }
    }
}

impl Configurable for ToleranceConfig {
    fn options(&self) -> &'static [&'static str] {
        &["g726bitrate", "packet_boundary"]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StegoError> {
        const BITRATE_HINT: &str = "try {16,24,32,40}000";
        match name {
            "g726bitrate" => {
                let bps: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| StegoError::invalid("g726bitrate", value, BITRATE_HINT))?;
                self.bitrate = Bitrate::try_from(bps)
                    .map_err(|_| StegoError::invalid("g726bitrate", value, BITRATE_HINT))?;
                Ok(())
            }
            "packet_boundary" => {
                self.packet_boundary = match value.trim() {
                    "never" => PacketBoundary::Never,
                    "every_packet" | "packet" => PacketBoundary::EveryPacket,
                    _ => {
                        return Err(StegoError::invalid(
                            "packet_boundary",
                            value,
                            "try never or every_packet",
                        ))
                    }
                };
                Ok(())
            }
            other => Err(StegoError::UnknownOption(other.to_string())),
        }
    }

    fn validate(&self) -> Result<(), StegoError> {
        // Both fields are closed enums; nothing can be out of range.
        Ok(())
    }
}

/// A queued sample with its probe result.
#[derive(Debug, Clone, Copy)]
struct ProbedSample {
    sample: Sample,
    capacity: u32,
    /// Code word of the unmodified sample.
    code: u8,
    saturated: bool,
}

/// One pipeline: probed samples plus the encoder state they were probed with.
#[derive(Debug)]
struct ToleranceQueue<T> {
    entries: VecDeque<ProbedSample>,
    codec: T,
    packet_position: usize,
}

impl<T: Transcoder> ToleranceQueue<T> {
    fn new(bitrate: Bitrate) -> Self {
        Self {
            entries: VecDeque::new(),
            codec: T::init(bitrate),
            packet_position: 0,
        }
    }

    fn push(&mut self, sample: Sample, bitrate: Bitrate, boundary: PacketBoundary) {
        let probed = probe(&mut self.codec, bitrate, sample);
        if probed.saturated {
            trace!(code = probed.code, "transcoder saturated, sample carries nothing");
        }
        self.entries.push_back(probed);

        if boundary == PacketBoundary::EveryPacket {
            self.packet_position += 1;
            if self.packet_position >= SAMPLES_PER_PACKET {
                debug!("packet boundary reached, resetting transcoder");
                self.codec = T::init(bitrate);
                self.packet_position = 0;
            }
        }
    }
}

/// Measure how many low bits of `sample` the transcoder tolerates, and
/// advance `codec` along the lower-candidate trace.
fn probe<T: Transcoder>(codec: &mut T, bitrate: Bitrate, sample: Sample) -> ProbedSample {
    let mut committed = *codec;
    let code = committed.encode(sample.linear() as i16);
    let mut probed = ProbedSample {
        sample,
        capacity: 0,
        code,
        saturated: false,
    };

    let edge = i16::from(bitrate.sign_threshold()) - 1;
    if bitrate.signed_code(code).abs() >= edge {
        probed.saturated = true;
    } else {
        let (mut lower, mut upper) = (sample, sample);
        while probed.capacity < MAX_TOLERANCE_BITS {
            let mask = 1u8 << probed.capacity;
            lower = lower & !mask;
            upper = upper | mask;

            let mut high_trace = *codec;
            let high = high_trace.encode(upper.linear() as i16);
            let mut low_trace = *codec;
            let low = low_trace.encode(lower.linear() as i16);
            if low != high {
                break;
            }

            committed = low_trace;
            probed.capacity += 1;
        }
    }

    *codec = committed;
    probed
}

/// The transcoder-guided strategy. Generic over the transcoder so tests and
/// experiments can swap the reference encoder.
#[derive(Debug)]
pub struct Tolerance<T: Transcoder = G726> {
    bitrate: Bitrate,
    boundary: PacketBoundary,
    untampered: Option<ToleranceQueue<T>>,
    tampered: Option<ToleranceQueue<T>>,
}

impl<T: Transcoder + Send> Tolerance<T> {
    pub fn new(config: ToleranceConfig) -> Result<Self, StegoError> {
        config.validate()?;
        info!(
            bitrate = %config.bitrate,
            boundary = ?config.packet_boundary,
            "tolerance configured"
        );
        Ok(Self {
            bitrate: config.bitrate,
            boundary: config.packet_boundary,
            untampered: None,
            tampered: None,
        })
    }

    fn push(
        queue: &mut Option<ToleranceQueue<T>>,
        bitrate: Bitrate,
        boundary: PacketBoundary,
        samples: &[Sample],
    ) {
        let queue = queue.get_or_insert_with(|| ToleranceQueue::new(bitrate));
        for &sample in samples {
            queue.push(sample, bitrate, boundary);
        }
    }

    fn entry(&self, index: usize) -> Option<&ProbedSample> {
        self.untampered.as_ref().and_then(|q| q.entries.get(index))
    }

    fn embed(entry: &ProbedSample, payload: u32) -> Sample {
        let mask = low_mask(entry.capacity) as u8;
        entry.sample.map_uninverted(|u| (u & !mask) | (payload as u8 & mask))
    }

    fn state(&self, entry: &ProbedSample) -> i32 {
        i32::from(self.bitrate.signed_code(entry.code))
    }
}

impl<T: Transcoder + Send> StegAlgorithm for Tolerance<T> {
    fn name(&self) -> &'static str {
        match self.boundary {
            PacketBoundary::Never => "tolerance",
            PacketBoundary::EveryPacket => "tolerance-packet",
        }
    }

    fn push_untampered(&mut self, samples: &[Sample]) {
        Self::push(&mut self.untampered, self.bitrate, self.boundary, samples);
    }

    fn untampered_ready(&self) -> usize {
        self.untampered.as_ref().map_or(0, |q| q.entries.len())
    }

    fn minimum_pop(&self) -> usize {
        usize::from(self.untampered_ready() > 0)
    }

    fn capacity_at(&self, index: usize) -> u32 {
        self.entry(index).map_or(0, |e| e.capacity)
    }

    fn pop_tampered(&mut self, payload: &[u32]) -> Vec<Tampered> {
        let Some(queue) = self.untampered.as_mut() else {
            return Vec::new();
        };
        let n = payload.len().min(queue.entries.len());
        let entries: Vec<ProbedSample> = queue.entries.drain(..n).collect();
        entries
            .iter()
            .zip(payload)
            .map(|(entry, &bits)| Tampered {
                sample: Self::embed(entry, bits),
                state: self.state(entry),
            })
            .collect()
    }

    fn reset_untampered(&mut self) {
        self.untampered = None;
    }

    fn push_tampered(&mut self, samples: &[Sample]) {
        Self::push(&mut self.tampered, self.bitrate, self.boundary, samples);
    }

    fn recovered_ready(&self) -> usize {
        self.tampered.as_ref().map_or(0, |q| q.entries.len())
    }

    fn pop_recovered(&mut self, count: usize) -> Vec<Recovered> {
        let Some(queue) = self.tampered.as_mut() else {
            return Vec::new();
        };
        let n = count.min(queue.entries.len());
        let entries: Vec<ProbedSample> = queue.entries.drain(..n).collect();
        entries
            .iter()
            .map(|entry| Recovered {
                bits: u32::from(entry.sample.uninverted()) & low_mask(entry.capacity),
                bit_len: entry.capacity,
                state: self.state(entry),
            })
            .collect()
    }

    fn reset_tampered(&mut self) {
        self.tampered = None;
    }

    fn untampered_at(&self, index: usize) -> Option<Sample> {
        self.entry(index).map(|e| e.sample)
    }

    fn tampered_candidate(&self, index: usize, payload: u32) -> Option<Sample> {
        self.entry(index).map(|e| Self::embed(e, payload))
    }

    fn noisiest_pattern(&self, index: usize) -> u32 {
        extreme_noisiest_pattern(self, index)
    }
}
