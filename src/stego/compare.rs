// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Side-by-side worst-case runs of several strategies over one cover.
//!
//! Each configuration gets its own strategy instance and its own
//! [`WorstNoiseBitSource`], so runs share nothing but the read-only cover.
//! With the `parallel` feature the runs are spread over the rayon pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

use crate::g711::Sample;
use crate::stego::bits::WorstNoiseBitSource;
use crate::stego::config::StrategyConfig;
use crate::stego::error::StegoError;
use crate::stego::pipeline::{embed, EmbedReport};

/// Result of one strategy's worst-case run.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub config: StrategyConfig,
    pub name: &'static str,
    pub report: EmbedReport,
}

/// Embed each strategy's noisiest payload into `cover` and report the cost.
///
/// Results are in the order of `configs`. When several configurations fail,
/// the error of the one listed first is returned.
pub fn compare(
    configs: &[StrategyConfig],
    cover: &[Sample],
) -> Result<Vec<Comparison>, StegoError> {
    let run = |config: &StrategyConfig| -> Result<Comparison, StegoError> {
        let mut algorithm = config.build()?;
        let outcome = embed(algorithm.as_mut(), cover, &mut WorstNoiseBitSource::new())?;
        let report = outcome.report;
        info!(
            strategy = algorithm.name(),
            bits = report.hidden_bits,
            bitrate = report.hidden_bitrate(),
            nsr = report.noise_to_signal,
            "worst-case run finished"
        );
        Ok(Comparison {
            config: *config,
            name: algorithm.name(),
            report,
        })
    };

    // Errors are picked in config order, after every run has finished.
    #[cfg(feature = "parallel")]
    let results: Vec<Result<Comparison, StegoError>> = configs.par_iter().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Comparison, StegoError>> = configs.iter().map(run).collect();

    results.into_iter().collect()
}
