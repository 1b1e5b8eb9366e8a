// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedding strategies and the drivers that run them.
//!
//! Four strategies implement the [`StegAlgorithm`] streaming contract:
//!
//! - **LSB** ([`Lsb`]): one bit in the low bit of every sample.
//! - **Silent shift** ([`SilentShift`]): data only in silent samples, loud
//!   samples pushed away from zero so the receiver can tell them apart.
//! - **Tolerance** ([`Tolerance`]): as many low bits as a G.726 encoder
//!   cannot distinguish, optionally restarting the encoder every packet.
//! - **Group delta** ([`GroupDelta`]): mean-preserving moves within fixed
//!   distance bands inside groups of `2k + 1` samples.
//!
//! [`embed`] and [`extract`] drive a strategy over a whole buffer, verifying
//! every embedded unit by recovering it immediately. [`compare`] runs several
//! strategies against their own worst-case payload.

pub mod algorithm;
pub mod bits;
pub mod compare;
pub mod config;
pub mod error;
pub mod group;
pub mod lsb;
mod pipeline;
pub mod shift;
pub mod tolerance;

pub use algorithm::{Recovered, StegAlgorithm, Tampered};
pub use bits::{BitSource, ByteBitSource, ByteSink, WorstNoiseBitSource};
pub use compare::{compare, Comparison};
pub use config::{Configurable, StrategyConfig};
pub use error::StegoError;
pub use group::{GroupConfig, GroupDelta};
pub use lsb::Lsb;
pub use pipeline::{embed, extract, EmbedOutcome, EmbedReport, ExtractOutcome, SampleDetail};
pub use shift::{ShiftConfig, SilentShift};
pub use tolerance::{PacketBoundary, Tolerance, ToleranceConfig};
