//! Deterministic run fingerprint used for cross-host comparison.
//!
//! Runs a small mixed design under every commit strategy and hashes the
//! committed state and rule statistics. Identical output across hosts and
//! strategies is expected.

use num_bigint as _;
use proptest as _;
use rstest as _;
use rulesim_core::{register_file, Bits, Footprint, Rule, Simulation};
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;

register_file! {
    mod lfsr {
        plain state: Bits<16> = Bits::new(0xACE1),
        ehr acc: Bits<32> = Bits::new(0),
        wire tap: Bits<1> = Bits::new(0),
        plain wide: Bits<96> = Bits::zero(),
    }
}

use lfsr::{reg, Design, Field};

fn rules(footprint: Footprint<Field>) -> Vec<Rule<Design>> {
    vec![
        Rule::<Design>::new("shift", |tx| {
            let state = tx.read0(reg::state)?;
            let bit = state.index(&Bits::<4>::new(0)) ^ state.index(&Bits::<4>::new(2))
                ^ state.index(&Bits::<4>::new(3))
                ^ state.index(&Bits::<4>::new(5));
            tx.write0(reg::tap, bit)?;
            tx.write0(reg::state, state.lsr(1).slice_subst::<15, 1>(&bit))
        })
        .with_footprint(footprint),
        Rule::<Design>::new("widen", |tx| {
            let acc = tx.read0(reg::acc)?;
            let wide = tx.read0(reg::wide)?;
            tx.write0(reg::wide, wide.lsl(7) ^ acc.zext())
        })
        .with_footprint(footprint),
        Rule::<Design>::new("accumulate", |tx| {
            let tap = tx.read1(reg::tap)?;
            let acc = tx.read1(reg::acc)?;
            tx.write1(reg::acc, acc + tap.zext())
        })
        .with_footprint(footprint),
    ]
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint(footprint: Footprint<Field>) -> String {
    let mut sim = Simulation::new(rules(footprint));
    sim.run(10_000);

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    let state = sim.state();
    hash_bytes(&mut hash, &state.state.to_u64().to_le_bytes());
    hash_bytes(&mut hash, &state.acc.to_u64().to_le_bytes());
    hash_bytes(&mut hash, &state.tap.to_u64().to_le_bytes());
    hash_bytes(&mut hash, &state.wide.to_u128().to_le_bytes());
    for (_, stats) in sim.stats() {
        hash_bytes(&mut hash, &stats.commits.to_le_bytes());
        hash_bytes(&mut hash, &stats.aborts.to_le_bytes());
    }
    format!("{hash:016x}")
}

const ALL_FIELDS: &[Field] = &[Field::state, Field::acc, Field::tap, Field::wide];

fn main() {
    let whole = fingerprint(Footprint::Whole);
    let declared = fingerprint(Footprint::Static(ALL_FIELDS));
    let journaled = fingerprint(Footprint::Dynamic);
    assert_eq!(whole, declared, "declared footprint diverged");
    assert_eq!(whole, journaled, "journaled footprint diverged");
    println!("{whole}");
}
