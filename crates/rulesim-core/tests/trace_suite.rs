//! Tracing and dump integration tests for rulesim-core.

use std::fs;
use std::io;

use num_bigint as _;
use proptest as _;
use rstest::rstest;
use rulesim_core::{
    init_and_trace, register_file, Bits, Rule, SimConfig, SimError, Simulation, TraceConfig,
    TraceHeader, TraceSink, TraceValue, TraceVar,
};
#[cfg(feature = "serde")]
use serde as _;
use tempfile::tempdir;
use thiserror as _;
use tracing as _;

register_file! {
    mod shifter {
        plain step: Bits<4> = Bits::new(0),
        plain lanes: [Bits<2>; 3] = [Bits::new(1), Bits::new(2), Bits::new(3)],
        wire pulse: bool = false,
        plain nothing: Bits<0> = Bits::zero(),
    }
}

fn rules() -> Vec<Rule<shifter::Design>> {
    use shifter::reg::{lanes, pulse, step};
    vec![
        Rule::<shifter::Design>::new("advance", |tx| {
            let value = tx.read0(step)?;
            tx.write0(step, value + Bits::new(1))?;
            tx.write0(pulse, value.bit(0))
        }),
        Rule::<shifter::Design>::new("rotate", |tx| {
            let [a, b, c] = tx.read0(lanes)?;
            tx.write0(lanes, [b, c, a])
        }),
    ]
}

#[derive(Default)]
struct Recorder {
    vars: Vec<TraceVar>,
    samples: Vec<(u64, Vec<String>)>,
    finished_at: Option<u64>,
}

impl TraceSink for Recorder {
    fn begin(&mut self, _header: &TraceHeader, vars: &[TraceVar]) -> io::Result<()> {
        self.vars = vars.to_vec();
        Ok(())
    }

    fn sample(&mut self, cycle: u64, values: &[TraceValue<'_>]) -> io::Result<()> {
        self.samples.push((cycle, values.iter().map(|value| value.bits.to_owned()).collect()));
        Ok(())
    }

    fn finish(&mut self, cycle: u64) -> io::Result<()> {
        self.finished_at = Some(cycle);
        Ok(())
    }
}

#[test]
fn samples_use_declared_order_and_packed_widths() {
    let mut recorder = Recorder::default();
    Simulation::new(rules())
        .trace(&mut recorder, &TraceHeader::new("1 ps"), 2, 1)
        .unwrap();

    let declared: Vec<_> = recorder.vars.iter().map(|var| (var.name, var.width)).collect();
    assert_eq!(declared, [("step", 4), ("lanes", 6), ("pulse", 1), ("nothing", 0)]);

    assert_eq!(recorder.samples.len(), 2);
    assert_eq!(recorder.samples[0], (0, vec!["0000".into(), "011011".into(), "0".into(), String::new()]));
    assert_eq!(recorder.samples[1], (1, vec!["0001".into(), "101101".into(), "0".into(), String::new()]));
    assert_eq!(recorder.finished_at, Some(2));
}

#[rstest]
#[case(7, 1, vec![0, 1, 2, 3, 4, 5, 6])]
#[case(7, 3, vec![0, 3, 6])]
#[case(6, 3, vec![0, 3])]
#[case(2, 5, vec![0])]
#[case(0, 1, vec![])]
fn period_selects_sampled_cycles(#[case] cycles: u64, #[case] period: u64, #[case] expected: Vec<u64>) {
    let mut recorder = Recorder::default();
    let mut sim = Simulation::new(rules());
    sim.trace(&mut recorder, &TraceHeader::new("1 ps"), cycles, period).unwrap();
    let sampled: Vec<_> = recorder.samples.iter().map(|(cycle, _)| *cycle).collect();
    assert_eq!(sampled, expected);
    assert_eq!(sim.cycle(), cycles);
}

#[test]
fn zero_period_is_rejected_before_running() {
    let mut sim = Simulation::new(rules());
    let error = sim.trace(&mut Recorder::default(), &TraceHeader::new("1 ps"), 5, 0).unwrap_err();
    assert!(matches!(error, SimError::ZeroTracePeriod));
    assert_eq!(sim.cycle(), 0);
}

#[test]
fn vcd_file_contains_header_and_samples() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shifter.vcd");
    init_and_trace(rules(), &path, 3).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("$version rulesim "));
    assert!(text.contains("$timescale 1 ps $end\n"));
    assert!(text.contains("$var reg 6 lanes lanes $end\n"));
    assert!(!text.contains("nothing"));
    assert!(text.contains("#0\nb0000 step\nb011011 lanes\nb0 pulse\n"));
    assert!(text.contains("#2\nb0010 step\nb110110 lanes\nb1 pulse\n"));
    assert!(text.ends_with("#3\n"));
}

#[test]
fn config_driven_trace_uses_its_timescale_and_period() {
    let dir = tempdir().unwrap();
    let mut trace = TraceConfig::new(dir.path().join("run.vcd"));
    trace.period = 2;
    trace.timescale = "10 ns".into();
    let config = SimConfig { cycles: 4, trace: Some(trace.clone()) };

    let mut sim = Simulation::new(rules());
    sim.execute(&config).unwrap();
    assert_eq!(sim.cycle(), 4);

    let text = fs::read_to_string(&trace.path).unwrap();
    assert!(text.contains("$timescale 10 ns $end"));
    let stamps: Vec<_> = text.lines().filter(|line| line.starts_with('#')).collect();
    assert_eq!(stamps, ["#0", "#2", "#4"]);
}

#[test]
fn untraced_config_runs_and_dumps() {
    let mut sim = Simulation::new(rules());
    sim.execute(&SimConfig { cycles: 5, trace: None }).unwrap();
    let mut out = Vec::new();
    sim.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("step = 4'b0101 (0x5, 5)\nlanes = [2'x3; 2'x1; 2'x2]\n"));
    assert!(text.contains("pulse = 1'b0 (0x0, 0)\n"));
}

#[test]
fn unwritable_trace_path_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.vcd");
    let error = Simulation::new(rules()).trace_to_path(&path, 1, 1).unwrap_err();
    match error {
        SimError::TraceCreate { path: reported, source } => {
            assert_eq!(reported, path);
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}
