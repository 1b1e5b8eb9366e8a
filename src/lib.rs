// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # g711-steg
//!
//! Data hiding in G.711 telephony audio. A cover stream of A-law or µ-law
//! samples is modified so that it carries a payload, while staying playable
//! as ordinary speech.
//!
//! The crate is organised in three layers:
//!
//! - [`g711`]: the sample type. All arithmetic happens on the uninverted
//!   byte; the line inversion is applied in exactly one place.
//! - [`g726`]: an ADPCM encoder used as a reference for how much a sample may
//!   change without a lower-bitrate transcoder noticing.
//! - [`stego`]: the embedding strategies, payload sources, and drivers.
//!
//! No encryption is performed. Callers wanting confidentiality encrypt the
//! payload before embedding.
//!
//! The strategy set and the worst-case comparison follow the G.711 data
//! hiding work of Harrison Neal and Hala ElAarag.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use g711_steg::g711::{samples_from_wire, wire_from_samples, Law};
//! use g711_steg::stego::{embed, extract, ByteBitSource, StrategyConfig};
//!
//! let cover = samples_from_wire(Law::Mu, &std::fs::read("call.ulaw").unwrap());
//! let mut strategy = StrategyConfig::from_name("tolerance").unwrap().build().unwrap();
//! let outcome = embed(strategy.as_mut(), &cover, &mut ByteBitSource::new(*b"hello")).unwrap();
//! std::fs::write("stego.ulaw", wire_from_samples(&outcome.stego)).unwrap();
//!
//! let recovered = extract(strategy.as_mut(), &outcome.stego);
//! assert_eq!(&recovered.data[..5], b"hello");
//! ```

pub mod g711;
pub mod g726;
pub mod stego;

pub use g711::{Law, Sample};
pub use g726::Bitrate;
pub use stego::{
    compare, embed, extract, BitSource, ByteBitSource, Configurable, EmbedOutcome, EmbedReport,
    ExtractOutcome, SampleDetail, StegAlgorithm, StegoError, StrategyConfig, WorstNoiseBitSource,
};
