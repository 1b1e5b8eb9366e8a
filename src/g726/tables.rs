// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Quantizer and adaptation tables for the four G.726 bitrates.
//!
//! Values are those of the ITU-T reference encoder. Each [`CodeTables`] is
//! indexed by the ADPCM code word.

/// Powers of two used by the floating-point-like magnitude quantization.
pub const POWER2: [i32; 15] = [
    1, 2, 4, 8, 0x10, 0x20, 0x40, 0x80, 0x100, 0x200, 0x400, 0x800, 0x1000, 0x2000, 0x4000,
];

/// Per-bitrate coding tables.
pub struct CodeTables {
    /// Number of quantizer states (odd rates exclude the zero code).
    pub states: i32,
    /// Bits per code word.
    pub code_bits: u32,
    /// Decision levels of the log-domain quantizer.
    pub quant: &'static [i32],
    /// Reconstructed normalized log magnitude per code.
    pub dqln: &'static [i32],
    /// Scale factor multiplier per code (already scaled for the update step).
    pub wi: &'static [i32],
    /// Rate-of-change speed-control input per code.
    pub fi: &'static [i32],
    /// Mask applied to a negative reconstructed difference when forming the
    /// reconstructed signal.
    pub dq_mask: i32,
}

pub static G726_16: CodeTables = CodeTables {
    states: 4,
    code_bits: 2,
    quant: &[261],
    dqln: &[116, 365, 365, 116],
    wi: &[-704, 14048, 14048, -704],
    fi: &[0x000, 0xE00, 0xE00, 0x000],
    dq_mask: 0x3FFF,
};

pub static G726_24: CodeTables = CodeTables {
    states: 7,
    code_bits: 3,
    quant: &[8, 218, 331],
    dqln: &[-2048, 135, 273, 373, 373, 273, 135, -2048],
    wi: &[-128, 960, 4384, 18624, 18624, 4384, 960, -128],
    fi: &[0, 0x200, 0x400, 0xE00, 0xE00, 0x400, 0x200, 0],
    dq_mask: 0x3FFF,
};

pub static G726_32: CodeTables = CodeTables {
    states: 15,
    code_bits: 4,
    quant: &[-124, 80, 178, 246, 300, 349, 400],
    dqln: &[
        -2048, 4, 135, 213, 273, 323, 373, 425, 425, 373, 323, 273, 213, 135, 4, -2048,
    ],
    // Reference values {-12, 18, 41, 64, 112, 198, 355, 1122} shifted left by 5.
    wi: &[
        -384, 576, 1312, 2048, 3584, 6336, 11360, 35904, 35904, 11360, 6336, 3584, 2048, 1312,
        576, -384,
    ],
    fi: &[
        0, 0, 0, 0x200, 0x200, 0x200, 0x600, 0xE00, 0xE00, 0x600, 0x200, 0x200, 0x200, 0, 0, 0,
    ],
    dq_mask: 0x3FFF,
};

pub static G726_40: CodeTables = CodeTables {
    states: 31,
    code_bits: 5,
    quant: &[
        -122, -16, 68, 139, 198, 250, 298, 339, 378, 413, 445, 475, 502, 528, 553,
    ],
    dqln: &[
        -2048, -66, 28, 104, 169, 224, 274, 318, 358, 395, 429, 459, 488, 514, 539, 566, 566, 539,
        514, 488, 459, 429, 395, 358, 318, 274, 224, 169, 104, 28, -66, -2048,
    ],
    wi: &[
        448, 448, 768, 1248, 1280, 1312, 1856, 3200, 4512, 5728, 7008, 8960, 11456, 14080, 16928,
        22272, 22272, 16928, 14080, 11456, 8960, 7008, 5728, 4512, 3200, 1856, 1312, 1280, 1248,
        768, 448, 448,
    ],
    fi: &[
        0, 0, 0, 0, 0, 0x200, 0x200, 0x200, 0x200, 0x200, 0x400, 0x600, 0x800, 0xA00, 0xC00,
        0xC00, 0xC00, 0xC00, 0xA00, 0x800, 0x600, 0x400, 0x200, 0x200, 0x200, 0x200, 0x200, 0, 0,
        0, 0, 0,
    ],
    dq_mask: 0x7FFF,
};
