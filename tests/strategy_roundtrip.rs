// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! End-to-end embed/extract round trips for every strategy and both laws.

mod common;

use g711_steg::g711::{samples_from_wire, wire_from_samples, Law, Sample};
use g711_steg::g726::Bitrate;
use g711_steg::stego::{
    embed, extract, BitSource, ByteBitSource, GroupConfig, PacketBoundary, Recovered, ShiftConfig,
    StrategyConfig, ToleranceConfig, WorstNoiseBitSource,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use common::{random_bytes, speech_like};

const COVER_SAMPLES: usize = 32_000;

fn strategies() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig::Lsb,
        StrategyConfig::Shift(ShiftConfig { j: 3 }),
        StrategyConfig::Tolerance(ToleranceConfig::default()),
        StrategyConfig::Tolerance(ToleranceConfig {
            bitrate: Bitrate::Kbps16,
            packet_boundary: PacketBoundary::EveryPacket,
        }),
        StrategyConfig::Group(GroupConfig::default()),
    ]
}

#[test]
fn every_strategy_round_trips_a_message() {
    let message = random_bytes(7, 24);
    for law in [Law::A, Law::Mu] {
        let cover = speech_like(law, 1, COVER_SAMPLES);
        for config in strategies() {
            let mut strategy = config.build().unwrap();
            let mut source = ByteBitSource::new(message.clone());

            let outcome = embed(strategy.as_mut(), &cover, &mut source).unwrap();
            assert_eq!(source.remaining_bits(), Some(0), "{config:?}: cover too small");
            assert_eq!(outcome.stego.len(), cover.len());

            // Through the wire format and back, as a receiver would see it.
            let received = samples_from_wire(law, &wire_from_samples(&outcome.stego));
            let extracted = extract(strategy.as_mut(), &received);
            assert_eq!(&extracted.data[..message.len()], &message[..], "{config:?} {law:?}");
        }
    }
}

#[test]
fn embedding_is_deterministic_across_reuse() {
    let message = random_bytes(11, 16);
    let cover = speech_like(Law::Mu, 2, 8_000);
    for config in strategies() {
        let mut strategy = config.build().unwrap();
        let mut source = ByteBitSource::new(message.clone());
        let first = embed(strategy.as_mut(), &cover, &mut source).unwrap();
        let mut source = ByteBitSource::new(message.clone());
        let second = embed(strategy.as_mut(), &cover, &mut source).unwrap();
        assert_eq!(first.stego, second.stego, "{config:?}");
        assert_eq!(first.report, second.report, "{config:?}");

        let mut fresh = config.build().unwrap();
        let mut source = ByteBitSource::new(message.clone());
        let third = embed(fresh.as_mut(), &cover, &mut source).unwrap();
        assert_eq!(first.stego, third.stego, "{config:?}");
    }
}

#[test]
fn oversized_payload_fills_the_cover() {
    let cover = speech_like(Law::A, 3, 100);
    let mut strategy = StrategyConfig::Lsb.build().unwrap();
    let mut source = ByteBitSource::new(vec![0xA5; 100]);
    let outcome = embed(strategy.as_mut(), &cover, &mut source).unwrap();
    assert_eq!(outcome.stego.len(), 100);
    assert_eq!(outcome.report.hidden_bits, 100);
    assert_eq!(source.remaining_bits(), Some(700));
}

/// Pop everything recoverable after pushing `stego` in arbitrary chunks.
fn recover_chunked(config: StrategyConfig, stego: &[Sample], seed: u64) -> Vec<Recovered> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut strategy = config.build().unwrap();
    let mut out = Vec::new();
    let mut fed = 0;
    while fed < stego.len() {
        let n = rng.gen_range(1..200).min(stego.len() - fed);
        strategy.push_tampered(&stego[fed..fed + n]);
        fed += n;
        let ready = strategy.recovered_ready();
        out.extend(strategy.pop_recovered(ready));
    }
    out
}

#[test]
fn recovery_does_not_depend_on_chunking() {
    let cover = speech_like(Law::Mu, 4, 6_000);
    let message = random_bytes(5, 300);
    for config in strategies() {
        let mut strategy = config.build().unwrap();
        let mut source = ByteBitSource::new(message.clone());
        let stego = embed(strategy.as_mut(), &cover, &mut source).unwrap().stego;

        let whole = {
            let mut s = config.build().unwrap();
            s.push_tampered(&stego);
            let ready = s.recovered_ready();
            s.pop_recovered(ready)
        };
        assert_eq!(whole, recover_chunked(config, &stego, 99), "{config:?}");
        assert_eq!(whole, recover_chunked(config, &stego, 100), "{config:?}");
    }
}

#[test]
fn tolerance_details_carry_the_transcoder_symbol() {
    let cover = speech_like(Law::A, 8, 4_000);
    for bitrate in [Bitrate::Kbps16, Bitrate::Kbps40] {
        let config = StrategyConfig::Tolerance(ToleranceConfig {
            bitrate,
            packet_boundary: PacketBoundary::Never,
        });
        let mut strategy = config.build().unwrap();
        let outcome = embed(strategy.as_mut(), &cover, &mut WorstNoiseBitSource::new()).unwrap();
        assert_eq!(outcome.details.len(), cover.len());

        let edge = i32::from(bitrate.sign_threshold()) - 1;
        for (i, d) in outcome.details.iter().enumerate() {
            assert!(d.state.abs() <= edge, "{bitrate}: sample {i}");
            if d.state.abs() == edge {
                assert_eq!(d.bit_len, 0, "{bitrate}: saturated sample {i} carried data");
            }
        }
        let hidden: u64 = outcome.details.iter().map(|d| u64::from(d.bit_len)).sum();
        assert_eq!(hidden, outcome.report.hidden_bits);
    }
}
