// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! G.711 sample representation.
//!
//! A [`Sample`] is one companded byte together with its law. The byte is
//! stored exactly as transmitted (line-coded, with the law's alternate-bit
//! inversion applied), but every arithmetic or bitwise operation is defined on
//! the *uninverted* value: the sample is uninverted, modified, and re-inverted
//! on write-back. [`Sample::map_uninverted`] is the single place where that
//! conversion happens; all operators and strategy code go through it.
//!
//! This module is zero-dependency (std only).

pub mod companding;

use core::ops::{Add, BitAnd, BitOr, BitXor, Sub};

/// Sign bit of an uninverted sample.
pub const SIGN: u8 = 0x80;

/// Largest representable magnitude of an uninverted sample.
pub const MAX_MAGNITUDE: u8 = 0x7F;

/// Telephony sampling rate.
pub const SAMPLES_PER_SECOND: usize = 8000;

/// Samples per 20 ms transport packet.
pub const SAMPLES_PER_PACKET: usize = 160;

/// Companding law of a G.711 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Law {
    /// A-law (PCMA). Even bits inverted on the line.
    #[default]
    A,
    /// µ-law (PCMU). All bits inverted on the line.
    Mu,
}

impl Law {
    /// Mask XORed onto the uninverted byte for transmission.
    pub const fn inversion_mask(self) -> u8 {
        match self {
            Law::A => 0x55,
            Law::Mu => 0xFF,
        }
    }
}

/// One G.711 sample.
///
/// Value type: operations return a new sample rather than mutating in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    law: Law,
    wire: u8,
}

impl Default for Sample {
    /// A silent A-law sample.
    fn default() -> Self {
        Self::silent(Law::A)
    }
}

impl Sample {
    /// Wrap a byte as received from the line.
    pub const fn new(law: Law, wire: u8) -> Self {
        Self { law, wire }
    }

    /// Build a sample from its uninverted (arithmetic) form.
    pub const fn from_uninverted(law: Law, uninverted: u8) -> Self {
        Self {
            law,
            wire: uninverted ^ law.inversion_mask(),
        }
    }

    /// Build a sample from a signed magnitude.
    ///
    /// Magnitudes beyond [`MAX_MAGNITUDE`] are clamped, the sign is kept.
    pub fn from_signed(law: Law, value: i32) -> Self {
        let magnitude = value.unsigned_abs().min(u32::from(MAX_MAGNITUDE)) as u8;
        let sign = if value < 0 { SIGN } else { 0 };
        Self::from_uninverted(law, magnitude | sign)
    }

    /// The zero-magnitude sample of a law.
    pub const fn silent(law: Law) -> Self {
        Self::from_uninverted(law, 0)
    }

    pub const fn law(&self) -> Law {
        self.law
    }

    /// The byte as transmitted.
    pub const fn wire(&self) -> u8 {
        self.wire
    }

    /// The byte with the line inversion undone.
    pub const fn uninverted(&self) -> u8 {
        self.wire ^ self.law.inversion_mask()
    }

    /// 7-bit magnitude of the uninverted byte.
    pub const fn magnitude(&self) -> u8 {
        self.uninverted() & MAX_MAGNITUDE
    }

    pub const fn is_negative(&self) -> bool {
        self.uninverted() & SIGN != 0
    }

    /// Sign-and-magnitude view of the uninverted byte, in `-127..=127`.
    ///
    /// Both `0x00` and `0x80` map to 0.
    pub const fn signed_magnitude(&self) -> i16 {
        let m = self.magnitude() as i16;
        if self.is_negative() { -m } else { m }
    }

    /// Linear PCM amplitude (16-bit left-justified).
    pub fn linear(&self) -> i32 {
        let linear = match self.law {
            Law::A => companding::alaw_to_linear(self.wire),
            Law::Mu => companding::ulaw_to_linear(self.wire),
        };
        i32::from(linear)
    }

    /// Linear difference `self - other`, a direct measure of introduced noise.
    pub fn linear_difference(&self, other: &Sample) -> i32 {
        self.linear() - other.linear()
    }

    /// Apply `f` to the uninverted byte and re-invert the result.
    pub fn map_uninverted(self, f: impl FnOnce(u8) -> u8) -> Self {
        Self::from_uninverted(self.law, f(self.uninverted()))
    }

    /// Replace the value with a signed magnitude, keeping the law.
    pub fn with_signed(self, value: i32) -> Self {
        Self::from_signed(self.law, value)
    }
}

macro_rules! uninverted_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<u8> for Sample {
            type Output = Sample;

            fn $method(self, $b: u8) -> Sample {
                self.map_uninverted(|$a| $body)
            }
        }
    };
}

uninverted_op!(BitOr, bitor, |a, b| a | b);
uninverted_op!(BitAnd, bitand, |a, b| a & b);
uninverted_op!(BitXor, bitxor, |a, b| a ^ b);
uninverted_op!(Add, add, |a, b| a.wrapping_add(b));
uninverted_op!(Sub, sub, |a, b| a.wrapping_sub(b));

/// Wrap a buffer of line bytes as samples.
pub fn samples_from_wire(law: Law, bytes: &[u8]) -> Vec<Sample> {
    bytes.iter().map(|&b| Sample::new(law, b)).collect()
}

/// Serialize samples back to line bytes.
pub fn wire_from_samples(samples: &[Sample]) -> Vec<u8> {
    samples.iter().map(Sample::wire).collect()
}
