//! Scheduling integration tests for rulesim-core.

use num_bigint as _;
use proptest::prelude::*;
use rstest::rstest;
use rulesim_core::{
    init_and_run, register_file, AccessResult, Bits, Footprint, Log, Rule, Scheduler, Simulation,
    Tx,
};
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;

register_file! {
    /// Single-bit flag fought over by two rules.
    mod toggle {
        plain flag: Bits<1> = Bits::new(0),
    }
}

register_file! {
    /// Four EHRs addressed by index.
    mod bank {
        ehr e0: Bits<8> = Bits::new(0x10),
        ehr e1: Bits<8> = Bits::new(0x11),
        ehr e2: Bits<8> = Bits::new(0x12),
        ehr e3: Bits<8> = Bits::new(0x13),
    }
}

register_file! {
    /// Wire handing a value from a producer to a consumer.
    mod pipe {
        wire data: Bits<16> = Bits::zero(),
        plain sink: Bits<16> = Bits::zero(),
        plain source: Bits<16> = Bits::new(7),
    }
}

fn toggle_rules() -> Vec<Rule<toggle::Design>> {
    use toggle::reg::flag;
    vec![
        Rule::<toggle::Design>::new("set", |tx| tx.write0(flag, Bits::new(1))),
        Rule::<toggle::Design>::new("flip", |tx| {
            let value = tx.read0(flag)?;
            tx.write0(flag, !value)
        }),
    ]
}

#[test]
fn plain_toggle_pair_settles_after_one_cycle() {
    let mut sim = Simulation::new(toggle_rules());
    let report = sim.step();
    assert_eq!(report.committed, 1);
    assert_eq!(report.aborted, 1);
    assert_eq!(sim.state().flag, Bits::new(1));

    let after_many = init_and_run(toggle_rules(), 1000);
    assert_eq!(after_many.flag, Bits::new(1));
}

#[test]
fn plain_reader_sees_pre_cycle_value_after_commit() {
    use toggle::reg::flag;
    let rules = vec![
        Rule::<toggle::Design>::new("set", |tx| tx.write0(flag, Bits::new(1))),
        Rule::<toggle::Design>::new("observe", |tx| {
            assert_eq!(tx.read0(flag)?, Bits::new(0));
            Ok(())
        }),
    ];
    let report = Simulation::new(rules).step();
    assert_eq!(report.committed, 2);
}

#[test]
fn ehr_write0_forwards_to_later_read1() {
    use bank::reg::{e0, e1};
    let rules = vec![
        Rule::<bank::Design>::new("write", |tx| tx.write0(e0, Bits::new(0xAA))),
        Rule::<bank::Design>::new("forward", |tx| {
            let value = tx.read1(e0)?;
            tx.write0(e1, value)
        }),
    ];
    let state = init_and_run(rules, 1);
    assert_eq!(state.e0, Bits::new(0xAA));
    assert_eq!(state.e1, Bits::new(0xAA));
}

#[test]
fn ehr_read0_never_observes_same_cycle_writes() {
    use bank::reg::{e0, e2, e3};
    let rules = vec![
        Rule::<bank::Design>::new("early-reader", |tx| {
            let value = tx.read0(e0)?;
            tx.write0(e2, value)
        }),
        Rule::<bank::Design>::new("write", |tx| tx.write0(e0, Bits::new(0xAA))),
        Rule::<bank::Design>::new("late-reader", |tx| {
            let value = tx.read0(e0)?;
            tx.write0(e3, value)
        }),
    ];
    let mut sim = Simulation::new(rules);
    let report = sim.step();
    assert_eq!(report.committed, 2);
    assert_eq!(sim.state().e2, Bits::new(0x10));
    assert_eq!(sim.state().e3, Bits::new(0x13));
    let aborts: Vec<_> = sim.stats().map(|(_, stats)| stats.aborts).collect();
    assert_eq!(aborts, [0, 0, 1]);
}

#[test]
fn write1_overrides_write0_within_a_cycle() {
    use bank::reg::e0;
    let rules = vec![
        Rule::<bank::Design>::new("first", |tx| tx.write0(e0, Bits::new(1))),
        Rule::<bank::Design>::new("last", |tx| {
            let seen = tx.read1(e0)?;
            tx.write1(e0, seen + Bits::new(1))
        }),
        Rule::<bank::Design>::new("too-late", |tx| tx.write1(e0, Bits::new(9))),
    ];
    let mut sim = Simulation::new(rules);
    sim.step();
    assert_eq!(sim.state().e0, Bits::new(2));
}

#[test]
fn wire_carries_value_to_later_reader_only() {
    use pipe::reg::{data, sink, source};
    let rules = vec![
        Rule::<pipe::Design>::new("produce", |tx| {
            let value = tx.read0(source)?;
            tx.write0(data, value)
        }),
        Rule::<pipe::Design>::new("consume", |tx| {
            let value = tx.read1(data)?;
            tx.write0(sink, value)
        }),
        Rule::<pipe::Design>::new("late-producer", |tx| tx.write0(data, Bits::new(99))),
    ];
    let mut sim = Simulation::new(rules);
    let report = sim.step();
    assert_eq!(report.aborted, 1);
    assert_eq!(sim.state().sink, Bits::new(7));
    assert_eq!(sim.state().data, Bits::new(7));
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Read0(usize),
    Read1(usize),
    Write0(usize, u8),
    Write1(usize, u8),
}

fn apply(tx: &mut Tx<'_, bank::Design>, ops: &[Op]) -> AccessResult<()> {
    use bank::reg::{e0, e1, e2, e3};

    macro_rules! on {
        ($index:expr, |$reg:ident| $body:expr) => {
            match $index % 4 {
                0 => {
                    let $reg = e0;
                    $body
                }
                1 => {
                    let $reg = e1;
                    $body
                }
                2 => {
                    let $reg = e2;
                    $body
                }
                _ => {
                    let $reg = e3;
                    $body
                }
            }
        };
    }

    for op in ops {
        match *op {
            Op::Read0(i) => on!(i, |r| tx.read0(r).map(drop))?,
            Op::Read1(i) => on!(i, |r| tx.read1(r).map(drop))?,
            Op::Write0(i, v) => on!(i, |r| tx.write0(r, Bits::new(u64::from(v))))?,
            Op::Write1(i, v) => on!(i, |r| tx.write1(r, Bits::new(u64::from(v))))?,
        }
    }
    Ok(())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_usize..4).prop_map(Op::Read0),
        (0_usize..4).prop_map(Op::Read1),
        (0_usize..4, any::<u8>()).prop_map(|(i, v)| Op::Write0(i, v)),
        (0_usize..4, any::<u8>()).prop_map(|(i, v)| Op::Write1(i, v)),
    ]
}

const ALL_BANK_FIELDS: &[bank::Field] =
    &[bank::Field::e0, bank::Field::e1, bank::Field::e2, bank::Field::e3];

/// Runs `prelude` then `body` for one cycle; returns the committed log and
/// whether `body` aborted.
fn run_pair(prelude: &[Op], body: &[Op], footprint: Footprint<bank::Field>) -> (Log<bank::Design>, bool) {
    let prelude = prelude.to_vec();
    let body = body.to_vec();
    let rules = vec![
        Rule::<bank::Design>::new("prelude", move |tx| apply(tx, &prelude)),
        Rule::<bank::Design>::new("body", move |tx| apply(tx, &body)).with_footprint(footprint),
    ];
    let mut scheduler = Scheduler::new(rules);
    let mut log = Log::initial();
    scheduler.run_cycle(&mut log);
    (log, scheduler.stats()[1].aborts == 1)
}

proptest! {
    #[test]
    fn rollback_strategies_agree(
        prelude in proptest::collection::vec(op_strategy(), 0..6),
        body in proptest::collection::vec(op_strategy(), 0..10),
    ) {
        let (whole, aborted) = run_pair(&prelude, &body, Footprint::Whole);
        let (declared, _) = run_pair(&prelude, &body, Footprint::Static(ALL_BANK_FIELDS));
        let (journaled, _) = run_pair(&prelude, &body, Footprint::Dynamic);
        prop_assert_eq!(&whole, &declared);
        prop_assert_eq!(&whole, &journaled);

        if aborted {
            let (prelude_only, _) = run_pair(&prelude, &[], Footprint::Whole);
            prop_assert_eq!(&whole, &prelude_only);
        }
    }

    #[test]
    fn scheduling_is_deterministic(
        bodies in proptest::collection::vec(proptest::collection::vec(op_strategy(), 0..6), 1..5),
        cycles in 1_u64..20,
    ) {
        let build = |bodies: &[Vec<Op>]| -> Vec<Rule<bank::Design>> {
            bodies
                .iter()
                .enumerate()
                .map(|(index, ops)| {
                    let ops = ops.clone();
                    let footprint = if index % 2 == 0 { Footprint::Dynamic } else { Footprint::Whole };
                    Rule::<bank::Design>::new("random", move |tx| apply(tx, &ops)).with_footprint(footprint)
                })
                .collect()
        };
        let first = init_and_run(build(&bodies), cycles);
        let second = init_and_run(build(&bodies), cycles);
        prop_assert_eq!(first, second);
    }
}

#[rstest]
#[case::whole(Footprint::Whole)]
#[case::declared(Footprint::Static(ALL_BANK_FIELDS))]
#[case::journaled(Footprint::Dynamic)]
fn failure_after_many_accesses_restores_committed_log(#[case] footprint: Footprint<bank::Field>) {
    let body = [
        Op::Write0(0, 1),
        Op::Read1(0),
        Op::Write1(1, 2),
        Op::Write0(2, 3),
        Op::Write1(3, 4),
        Op::Write1(3, 5),
    ];
    let (log, aborted) = run_pair(&[Op::Write0(3, 0xEE)], &body, footprint);
    assert!(aborted);
    let (expected, _) = run_pair(&[Op::Write0(3, 0xEE)], &[], Footprint::Whole);
    assert_eq!(log, expected);
    assert_eq!(log.state.e3, Bits::new(0xEE));
}
