// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Strategy configuration.
//!
//! Each strategy has a plain config struct that can be filled either from
//! serialized settings (serde) or from `name=value` option pairs, and is
//! validated before a strategy is built from it. Out-of-range values never
//! reach the embedding code.

use serde::Deserialize;

use crate::g726::G726;
use crate::stego::algorithm::StegAlgorithm;
use crate::stego::error::StegoError;
use crate::stego::group::{GroupConfig, GroupDelta};
use crate::stego::lsb::Lsb;
use crate::stego::shift::{ShiftConfig, SilentShift};
use crate::stego::tolerance::{Tolerance, ToleranceConfig};

/// Options settable by name, as given on a command line or in a settings file.
pub trait Configurable {
    /// Names accepted by [`set_option`](Self::set_option).
    fn options(&self) -> &'static [&'static str];

    /// Parse and apply one option.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StegoError>;

    /// Check every field against its allowed range.
    fn validate(&self) -> Result<(), StegoError>;
}

/// Which strategy to run, with its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum StrategyConfig {
    Lsb,
    Shift(ShiftConfig),
    Tolerance(ToleranceConfig),
    Group(GroupConfig),
}

impl StrategyConfig {
    /// Default settings for a strategy identified by name.
    pub fn from_name(name: &str) -> Result<Self, StegoError> {
        match name {
            "lsb" => Ok(Self::Lsb),
            "shift" => Ok(Self::Shift(ShiftConfig::default())),
            "tolerance" => Ok(Self::Tolerance(ToleranceConfig::default())),
            "group" => Ok(Self::Group(GroupConfig::default())),
            other => Err(StegoError::invalid(
                "algorithm",
                other,
                "try lsb, shift, tolerance or group",
            )),
        }
    }

    /// Validate and instantiate.
    pub fn build(&self) -> Result<Box<dyn StegAlgorithm>, StegoError> {
        let algorithm: Box<dyn StegAlgorithm> = match *self {
            Self::Lsb => Box::new(Lsb::new()),
            Self::Shift(c) => Box::new(SilentShift::new(c)?),
            Self::Tolerance(c) => Box::new(Tolerance::<G726>::new(c)?),
            Self::Group(c) => Box::new(GroupDelta::new(c)?),
        };
        Ok(algorithm)
    }
}

impl Configurable for StrategyConfig {
    fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Lsb => &[],
            Self::Shift(c) => c.options(),
            Self::Tolerance(c) => c.options(),
            Self::Group(c) => c.options(),
        }
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StegoError> {
        match self {
            Self::Lsb => Err(StegoError::UnknownOption(name.to_string())),
            Self::Shift(c) => c.set_option(name, value),
            Self::Tolerance(c) => c.set_option(name, value),
            Self::Group(c) => c.set_option(name, value),
        }
    }

    fn validate(&self) -> Result<(), StegoError> {
        match self {
            Self::Lsb => Ok(()),
            Self::Shift(c) => c.validate(),
            Self::Tolerance(c) => c.validate(),
            Self::Group(c) => c.validate(),
        }
    }
}
