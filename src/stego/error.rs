// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the embedding engine.
//!
//! [`StegoError`] covers configuration rejection and round-trip corruption.
//! Running out of payload bits or samples is not an error: it shows up as
//! zero counts.

use core::fmt;

/// Errors that can occur while configuring a strategy or embedding data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// A configuration value is out of range or unparsable.
    InvalidOption {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The strategy has no option with this name.
    UnknownOption(String),
    /// Verified embedding recovered something other than what was embedded.
    ///
    /// This points at a capacity-accounting mismatch between the embed and
    /// recover paths, never at transient noise, so the run is aborted.
    Corruption {
        /// Zero-based index of the offending sample in the cover stream.
        sample: usize,
        expected_bits: u32,
        expected_len: u32,
        actual_bits: u32,
        actual_len: u32,
    },
}

impl StegoError {
    pub(crate) fn invalid(
        option: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        Self::InvalidOption {
            option,
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOption {
                option,
                value,
                expected,
            } => {
                write!(f, "{value} is not a valid {option} - {expected}")
            }
            Self::UnknownOption(name) => write!(f, "unknown option: {name}"),
            Self::Corruption {
                sample,
                expected_bits,
                expected_len,
                actual_bits,
                actual_len,
            } => {
                write!(f, "corruption detected at sample {sample}: ")?;
                if expected_len != actual_len {
                    write!(f, "expected length {expected_len}; got length {actual_len}")
                } else {
                    write!(f, "expected data {expected_bits}; got data {actual_bits}")
                }
            }
        }
    }
}

impl std::error::Error for StegoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = StegoError::invalid("j", 5, "try a power of 2 less 1");
        assert_eq!(e.to_string(), "5 is not a valid j - try a power of 2 less 1");

        let e = StegoError::Corruption {
            sample: 7,
            expected_bits: 3,
            expected_len: 2,
            actual_bits: 3,
            actual_len: 1,
        };
        assert!(e.to_string().contains("expected length 2; got length 1"));

        let e = StegoError::Corruption {
            sample: 7,
            expected_bits: 3,
            expected_len: 2,
            actual_bits: 1,
            actual_len: 2,
        };
        assert!(e.to_string().contains("expected data 3; got data 1"));
    }
}
