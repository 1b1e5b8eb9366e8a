// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! G.726 ADPCM encoder (linear input, unpacked code words).
//!
//! Used as the companion "lower-bitrate transcoder" of the tolerance-probing
//! strategy: the strategy never interprets the encoder state, it only copies
//! it and feeds linear samples through [`Transcoder::encode`]. The arithmetic
//! follows the ITU-T fixed-point reference, including its 16-bit wrap-around
//! on intermediate values, so two encoders fed the same samples always emit
//! the same code words.
//!
//! Only the encoder half is provided; decoding is never needed to measure
//! tolerance.

pub mod tables;

use core::fmt;

use serde::Deserialize;

use tables::{CodeTables, POWER2};

/// Supported G.726 bitrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum Bitrate {
    Kbps16,
    Kbps24,
    Kbps32,
    Kbps40,
}

/// A bitrate outside {16000, 24000, 32000, 40000}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedBitrate(pub u32);

impl fmt::Display for UnsupportedBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported G.726 bitrate {} (expected 16000, 24000, 32000 or 40000)", self.0)
    }
}

impl std::error::Error for UnsupportedBitrate {}

impl TryFrom<u32> for Bitrate {
    type Error = UnsupportedBitrate;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        match bps {
            16_000 => Ok(Self::Kbps16),
            24_000 => Ok(Self::Kbps24),
            32_000 => Ok(Self::Kbps32),
            40_000 => Ok(Self::Kbps40),
            other => Err(UnsupportedBitrate(other)),
        }
    }
}

impl Bitrate {
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Self::Kbps16 => 16_000,
            Self::Kbps24 => 24_000,
            Self::Kbps32 => 32_000,
            Self::Kbps40 => 40_000,
        }
    }

    /// Smallest code word that belongs to the negative half of the code space.
    pub const fn sign_threshold(self) -> u8 {
        match self {
            Self::Kbps16 => 2,
            Self::Kbps24 => 4,
            Self::Kbps32 => 8,
            Self::Kbps40 => 16,
        }
    }

    /// Number of distinct code words.
    pub const fn max_code(self) -> u8 {
        self.sign_threshold() * 2
    }

    /// Interpret a code word as a signed quantizer level.
    ///
    /// Negative codes are stored one's-complement style, so the top code
    /// maps to 0 rather than -1.
    pub fn signed_code(self, code: u8) -> i16 {
        let sign = self.sign_threshold();
        if code < sign {
            i16::from(code)
        } else {
            i16::from(code) + 1 - i16::from(self.max_code())
        }
    }

    fn tables(self) -> &'static CodeTables {
        match self {
            Self::Kbps16 => &tables::G726_16,
            Self::Kbps24 => &tables::G726_24,
            Self::Kbps32 => &tables::G726_32,
            Self::Kbps40 => &tables::G726_40,
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bit/s", self.bits_per_second())
    }
}

/// A transcoder whose output can be compared to detect perceptible change.
///
/// The state is a plain value: copying it snapshots the encoder, so a probe
/// can explore a hypothetical continuation without committing it.
pub trait Transcoder: Copy {
    /// Fresh encoder state for a bitrate.
    fn init(bitrate: Bitrate) -> Self;

    /// Encode one linear sample, advancing the state. Returns the code word.
    fn encode(&mut self, linear: i16) -> u8;
}

/// G.726 encoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G726 {
    bitrate: Bitrate,
    /// Locked quantizer scale factor.
    yl: i32,
    /// Unlocked quantizer scale factor.
    yu: i32,
    /// Short-term average of F(I).
    dms: i32,
    /// Long-term average of F(I).
    dml: i32,
    /// Speed control.
    ap: i32,
    /// Pole predictor coefficients.
    a: [i32; 2],
    /// Zero predictor coefficients.
    b: [i32; 6],
    /// Signs of previous partial reconstructions.
    pk: [i32; 2],
    /// Previous quantized differences, floating-point format.
    dq: [i32; 6],
    /// Previous reconstructed signal, floating-point format.
    sr: [i32; 2],
    /// Tone detect.
    td: bool,
}

impl Transcoder for G726 {
    fn init(bitrate: Bitrate) -> Self {
        Self {
            bitrate,
            yl: 34816,
            yu: 544,
            dms: 0,
            dml: 0,
            ap: 0,
            a: [0; 2],
            b: [0; 6],
            pk: [0; 2],
            dq: [32; 6],
            sr: [32; 2],
            td: false,
        }
    }

    fn encode(&mut self, linear: i16) -> u8 {
        let t = self.bitrate.tables();

        let sl = i32::from(linear) >> 2;
        let sezi = short(self.predictor_zero());
        let sez = sezi >> 1;
        let se = short(sezi + self.predictor_pole()) >> 1;

        let d = short(sl - se);
        let y = self.step_size();
        let code = quantize(d, y, t);

        let sign = code & (1 << (t.code_bits - 1)) != 0;
        let dq = reconstruct(sign, t.dqln[code], y);
        let sr = short(if dq < 0 { se - (dq & t.dq_mask) } else { se + dq });
        let dqsez = short(sr + sez - se);

        self.update(t, y, t.wi[code], t.fi[code], dq, sr, dqsez);

        code as u8
    }
}

impl G726 {
    fn predictor_zero(&self) -> i32 {
        self.b.iter().zip(self.dq.iter()).map(|(&b, &dq)| fmult(b >> 2, dq)).sum()
    }

    fn predictor_pole(&self) -> i32 {
        fmult(self.a[1] >> 2, self.sr[1]) + fmult(self.a[0] >> 2, self.sr[0])
    }

    fn step_size(&self) -> i32 {
        if self.ap >= 256 {
            return self.yu;
        }
        let mut y = self.yl >> 6;
        let dif = self.yu - y;
        let al = self.ap >> 2;
        if dif > 0 {
            y += (dif * al) >> 6;
        } else if dif < 0 {
            y += (dif * al + 0x3F) >> 6;
        }
        y
    }

    #[allow(clippy::too_many_arguments)]
    fn update(&mut self, t: &CodeTables, y: i32, wi: i32, fi: i32, dq: i32, sr: i32, dqsez: i32) {
        let pk0 = i32::from(dqsez < 0);
        let mag = dq & 0x7FFF;

        // Transition detect.
        let ylint = self.yl >> 15;
        let ylfrac = (self.yl >> 10) & 0x1F;
        let thr1 = (32 + ylfrac) << ylint;
        let thr2 = if ylint > 9 { 31 << 10 } else { thr1 };
        let dqthr = (thr2 + (thr2 >> 1)) >> 1;
        let tr = self.td && mag > dqthr;

        // Quantizer scale factor adaptation.
        self.yu = (y + ((wi - y) >> 5)).clamp(544, 5120);
        self.yl += self.yu + ((-self.yl) >> 6);

        // Adaptive predictor coefficients.
        let mut a2p = 0;
        if tr {
            self.a = [0; 2];
            self.b = [0; 6];
        } else {
            let pks1 = pk0 ^ self.pk[0];

            a2p = self.a[1] - (self.a[1] >> 7);
            if dqsez != 0 {
                let fa1 = if pks1 != 0 { self.a[0] } else { -self.a[0] };
                if fa1 < -8191 {
                    a2p -= 0x100;
                } else if fa1 > 8191 {
                    a2p += 0xFF;
                } else {
                    a2p += fa1 >> 5;
                }

                if pk0 ^ self.pk[1] != 0 {
                    if a2p <= -12160 {
                        a2p = -12288;
                    } else if a2p >= 12416 {
                        a2p = 12288;
                    } else {
                        a2p -= 0x80;
                    }
                } else if a2p <= -12416 {
                    a2p = -12288;
                } else if a2p >= 12160 {
                    a2p = 12288;
                } else {
                    a2p += 0x80;
                }
            }
            self.a[1] = a2p;

            self.a[0] -= self.a[0] >> 8;
            if dqsez != 0 {
                if pks1 == 0 {
                    self.a[0] += 192;
                } else {
                    self.a[0] -= 192;
                }
            }
            let a1ul = 15360 - a2p;
            self.a[0] = self.a[0].clamp(-a1ul, a1ul);

            let leak = if t.code_bits == 5 { 9 } else { 8 };
            for (b, &prev_dq) in self.b.iter_mut().zip(self.dq.iter()) {
                *b -= *b >> leak;
                if mag != 0 {
                    if (dq ^ prev_dq) >= 0 {
                        *b += 128;
                    } else {
                        *b -= 128;
                    }
                }
            }
        }

        // Delay lines.
        self.dq.copy_within(0..5, 1);
        self.dq[0] = if mag == 0 {
            if dq >= 0 { 0x20 } else { 0x20 - 0x400 }
        } else {
            let exp = quan(mag, &POWER2);
            let v = (exp << 6) + ((mag << 6) >> exp);
            if dq >= 0 { v } else { v - 0x400 }
        };

        self.sr[1] = self.sr[0];
        self.sr[0] = if sr == 0 {
            0x20
        } else if sr > 0 {
            let exp = quan(sr, &POWER2);
            (exp << 6) + ((sr << 6) >> exp)
        } else if sr > -32768 {
            let m = -sr;
            let exp = quan(m, &POWER2);
            (exp << 6) + ((m << 6) >> exp) - 0x400
        } else {
            0x20 - 0x400
        };

        self.pk[1] = self.pk[0];
        self.pk[0] = pk0;

        // Tone detect.
        self.td = !tr && a2p < -11776;

        // Adaptation speed control.
        self.dms += (fi - self.dms) >> 5;
        self.dml += ((fi << 2) - self.dml) >> 7;

        if tr {
            self.ap = 256;
        } else if y < 1536 || self.td || ((self.dms << 2) - self.dml).abs() >= (self.dml >> 3) {
            self.ap += (0x200 - self.ap) >> 4;
        } else {
            self.ap += (-self.ap) >> 4;
        }
    }
}

/// Truncate to 16 bits with sign, as the reference's `short` locals do.
fn short(v: i32) -> i32 {
    i32::from(v as i16)
}

/// Index of the first table entry greater than `val`.
fn quan(val: i32, table: &[i32]) -> i32 {
    table.iter().position(|&t| val < t).unwrap_or(table.len()) as i32
}

/// Fixed-point multiply of a predictor coefficient with a floating-point
/// format history value.
fn fmult(an: i32, srn: i32) -> i32 {
    let anmag = if an > 0 { an } else { (-an) & 0x1FFF };
    let anexp = quan(anmag, &POWER2) - 6;
    let anmant = if anmag == 0 {
        32
    } else if anexp >= 0 {
        anmag >> anexp
    } else {
        anmag << -anexp
    };
    let wanexp = anexp + ((srn >> 6) & 0xF) - 13;
    let wanmant = (anmant * (srn & 0o77) + 0x30) >> 4;
    let retval = if wanexp >= 0 {
        (wanmant << wanexp) & 0x7FFF
    } else {
        wanmant >> -wanexp
    };
    if (an ^ srn) < 0 { -retval } else { retval }
}

fn quantize(d: i32, y: i32, t: &CodeTables) -> usize {
    let dqm = d.abs();
    let exp = quan(dqm >> 1, &POWER2);
    let mant = ((dqm << 7) >> exp) & 0x7F;
    let dl = (exp << 7) + mant;
    let dln = dl - (y >> 2);

    let size = (t.states - 1) >> 1;
    let i = quan(dln, t.quant);
    let code = if d < 0 {
        (size << 1) + 1 - i
    } else if i == 0 && t.states & 1 == 1 {
        // Zero is not a valid code with an odd number of states.
        t.states
    } else {
        i
    };
    code as usize
}

fn reconstruct(sign: bool, dqln: i32, y: i32) -> i32 {
    let dql = dqln + (y >> 2);
    if dql < 0 {
        return if sign { -0x8000 } else { 0 };
    }
    let dex = (dql >> 7) & 15;
    let dqt = 128 + (dql & 127);
    let dq = (dqt << 7) >> (14 - dex);
    if sign { dq - 0x8000 } else { dq }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Bitrate; 4] = [Bitrate::Kbps16, Bitrate::Kbps24, Bitrate::Kbps32, Bitrate::Kbps40];

    fn tone(n: usize) -> Vec<i16> {
        // Cheap deterministic waveform: a triangle sweep with growing amplitude.
        (0..n)
            .map(|i| {
                let phase = (i % 40) as i32;
                let tri = if phase < 20 { phase - 10 } else { 30 - phase };
                (tri * (50 + i as i32 * 7)).clamp(-32000, 32000) as i16
            })
            .collect()
    }

    #[test]
    fn bitrate_parsing() {
        assert_eq!(Bitrate::try_from(40_000), Ok(Bitrate::Kbps40));
        assert_eq!(Bitrate::try_from(16_000), Ok(Bitrate::Kbps16));
        assert_eq!(Bitrate::try_from(8_000), Err(UnsupportedBitrate(8_000)));
    }

    #[test]
    fn signed_code_interpretation() {
        let b = Bitrate::Kbps40;
        assert_eq!(b.signed_code(0), 0);
        assert_eq!(b.signed_code(15), 15);
        assert_eq!(b.signed_code(16), -15);
        assert_eq!(b.signed_code(31), 0);
        let b = Bitrate::Kbps16;
        assert_eq!(b.signed_code(1), 1);
        assert_eq!(b.signed_code(2), -1);
        assert_eq!(b.signed_code(3), 0);
    }

    #[test]
    fn codes_fit_code_width() {
        for bitrate in ALL {
            let mut enc = G726::init(bitrate);
            for s in tone(2000) {
                let code = enc.encode(s);
                assert!(code < bitrate.max_code(), "{bitrate}: code {code}");
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        for bitrate in ALL {
            let mut a = G726::init(bitrate);
            let mut b = G726::init(bitrate);
            let ca: Vec<u8> = tone(500).into_iter().map(|s| a.encode(s)).collect();
            let cb: Vec<u8> = tone(500).into_iter().map(|s| b.encode(s)).collect();
            assert_eq!(ca, cb);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn copied_state_is_independent() {
        let mut original = G726::init(Bitrate::Kbps32);
        for s in tone(100) {
            original.encode(s);
        }
        let snapshot = original;
        let mut probe = original;
        probe.encode(12_000);
        probe.encode(-12_000);
        assert_eq!(original, snapshot);
        assert_ne!(probe, snapshot);
    }

    #[test]
    fn first_code_follows_input_sign() {
        for bitrate in ALL {
            let up = G726::init(bitrate).encode(8000);
            let down = G726::init(bitrate).encode(-8000);
            assert!(bitrate.signed_code(up) > 0, "{bitrate}: {up}");
            assert!(bitrate.signed_code(down) < 0, "{bitrate}: {down}");
        }
    }
}
