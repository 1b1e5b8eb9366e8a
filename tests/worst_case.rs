// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Worst-case payloads across the whole configuration space.
//!
//! Every run embeds each sample's noisiest pattern and verifies each unit on
//! the fly, so any capacity mismatch between embed and recover paths surfaces
//! as an error here.

mod common;

use g711_steg::g711::Law;
use g711_steg::g726::Bitrate;
use g711_steg::stego::{
    compare, GroupConfig, PacketBoundary, ShiftConfig, StrategyConfig, ToleranceConfig,
};

use common::speech_like;

fn configuration_space() -> Vec<StrategyConfig> {
    let mut configs = vec![StrategyConfig::Lsb];
    for j in [0, 1, 3, 7, 15, 31, 63] {
        configs.push(StrategyConfig::Shift(ShiftConfig { j }));
    }
    for bitrate in [Bitrate::Kbps16, Bitrate::Kbps24, Bitrate::Kbps32, Bitrate::Kbps40] {
        for packet_boundary in [PacketBoundary::Never, PacketBoundary::EveryPacket] {
            configs.push(StrategyConfig::Tolerance(ToleranceConfig {
                bitrate,
                packet_boundary,
            }));
        }
    }
    for k in [1, 3, 10, 79] {
        for max_lambda in [8, 60, 127] {
            configs.push(StrategyConfig::Group(GroupConfig { k, max_lambda }));
        }
    }
    configs
}

#[test]
fn every_configuration_verifies_under_worst_case_payload() {
    let configs = configuration_space();
    for (law, seed) in [(Law::A, 21), (Law::Mu, 22)] {
        let cover = speech_like(law, seed, 16_000);
        let results = compare(&configs, &cover).unwrap();
        assert_eq!(results.len(), configs.len());
        for (result, config) in results.iter().zip(&configs) {
            assert_eq!(&result.config, config);
            assert!(result.report.noise_to_signal.is_finite(), "{config:?}");
        }
    }
}

#[test]
fn lsb_worst_case_is_one_bit_per_sample() {
    let cover = speech_like(Law::A, 5, 1_000);
    let results = compare(&[StrategyConfig::Lsb], &cover).unwrap();
    assert_eq!(results[0].report.hidden_bits, 1_000);
    assert_eq!(results[0].report.hidden_bitrate(), 8_000.0);
}

#[test]
fn wider_shift_hides_more_per_silent_sample() {
    let cover = speech_like(Law::Mu, 6, 8_000);
    let configs = [
        StrategyConfig::Shift(ShiftConfig { j: 0 }),
        StrategyConfig::Shift(ShiftConfig { j: 15 }),
    ];
    let results = compare(&configs, &cover).unwrap();
    // Same silent samples, five bits each instead of one.
    assert_eq!(results[1].report.hidden_bits, results[0].report.hidden_bits * 5);
}
