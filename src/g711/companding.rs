// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! G.711 expansion from line-coded bytes to linear PCM.
//!
//! Both expanders take the byte exactly as it appears on the wire (with the
//! law's bit inversion still applied) and return the linear amplitude
//! left-justified into the 16-bit range, matching the ITU reference decoder.
//! A-law carries 13 significant bits, µ-law 14.

/// Low nibble of an uninverted byte: the quantization step within a segment.
const QUANT_MASK: u8 = 0x0F;
/// Segment (exponent) bits of an uninverted byte.
const SEG_MASK: u8 = 0x70;
const SEG_SHIFT: u8 = 4;
/// Sign bit of an uninverted byte.
const SIGN_BIT: u8 = 0x80;
/// µ-law bias added before segment scaling.
const ULAW_BIAS: i32 = 0x84;

/// Expand an A-law wire byte to linear PCM.
///
/// Note the A-law sign convention: a *set* sign bit means a positive
/// amplitude.
pub fn alaw_to_linear(wire: u8) -> i16 {
    let a = wire ^ 0x55;
    let mut t = i32::from(a & QUANT_MASK) << 4;
    let seg = (a & SEG_MASK) >> SEG_SHIFT;
    match seg {
        0 => t += 8,
        1 => t += 0x108,
        _ => {
            t += 0x108;
            t <<= seg - 1;
        }
    }
    let linear = if a & SIGN_BIT != 0 { t } else { -t };
    linear as i16
}

/// Expand a µ-law wire byte to linear PCM.
pub fn ulaw_to_linear(wire: u8) -> i16 {
    let u = !wire;
    let mut t = (i32::from(u & QUANT_MASK) << 3) + ULAW_BIAS;
    t <<= (u & SEG_MASK) >> SEG_SHIFT;
    let linear = if u & SIGN_BIT != 0 { ULAW_BIAS - t } else { t - ULAW_BIAS };
    linear as i16
}
