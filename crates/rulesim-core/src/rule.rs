//! Rules and the per-cycle scheduler.

use std::fmt;

use tracing::trace;

use crate::error::AccessResult;
use crate::log::{AccessLog, Log, RegisterFile, Tracking, Tx};

/// How a rule's effects are committed or discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footprint<F: 'static> {
    /// Copy the entire register file.
    Whole,
    /// The rule only ever touches these registers.
    Static(&'static [F]),
    /// Journal every access and copy exactly the registers touched.
    Dynamic,
}

/// Body of a rule: a sequence of register accesses that either completes or
/// stops at the first refused access.
pub type RuleBody<D> = Box<dyn Fn(&mut Tx<'_, D>) -> AccessResult<()>>;

/// A named atomic rule.
pub struct Rule<D: RegisterFile> {
    name: &'static str,
    footprint: Footprint<D::Field>,
    body: RuleBody<D>,
}

impl<D: RegisterFile> Rule<D> {
    /// Rule whose commit and rollback copy the whole register file.
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: Fn(&mut Tx<'_, D>) -> AccessResult<()> + 'static,
    {
        Self { name, footprint: Footprint::Whole, body: Box::new(body) }
    }

    /// Replaces the commit/rollback strategy.
    #[must_use]
    pub fn with_footprint(mut self, footprint: Footprint<D::Field>) -> Self {
        self.footprint = footprint;
        self
    }

    /// Rule name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Commit/rollback strategy.
    #[must_use]
    pub const fn footprint(&self) -> Footprint<D::Field> {
        self.footprint
    }
}

impl<D: RegisterFile> fmt::Debug for Rule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).field("footprint", &self.footprint).finish()
    }
}

/// Commit and abort counts of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RuleStats {
    /// Cycles in which the rule committed.
    pub commits: u64,
    /// Cycles in which the rule aborted.
    pub aborts: u64,
}

/// Outcome of one scheduled cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CycleReport {
    /// Rules that committed.
    pub committed: usize,
    /// Rules that aborted.
    pub aborted: usize,
}

/// Runs every rule once per cycle in priority order.
///
/// The scheduler owns the tentative log and a snapshot of the state at the
/// start of the cycle; the committed log is lent to it for one cycle at a
/// time. Between rules the tentative log always equals the committed one.
pub struct Scheduler<D: RegisterFile> {
    rules: Vec<Rule<D>>,
    stats: Vec<RuleStats>,
    start: D::State,
    tentative: Log<D>,
    journal: AccessLog<D::Field>,
}

impl<D: RegisterFile> Scheduler<D> {
    /// Scheduler over `rules`, highest priority first.
    #[must_use]
    pub fn new(rules: Vec<Rule<D>>) -> Self {
        let tentative: Log<D> = Log::initial();
        Self {
            stats: vec![RuleStats::default(); rules.len()],
            rules,
            start: tentative.state.clone(),
            tentative,
            journal: AccessLog::with_capacity(4 * D::REGISTERS.len()),
        }
    }

    /// Rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[Rule<D>] {
        &self.rules
    }

    /// Statistics, indexed like [`rules`](Self::rules).
    #[must_use]
    pub fn stats(&self) -> &[RuleStats] {
        &self.stats
    }

    /// Runs one cycle against `committed`.
    pub fn run_cycle(&mut self, committed: &mut Log<D>) -> CycleReport {
        committed.reset_rwset();
        self.start.clone_from(&committed.state);
        self.tentative.copy_from(committed);

        let mut report = CycleReport::default();
        for (rule, stats) in self.rules.iter().zip(self.stats.iter_mut()) {
            match fire(rule, &self.start, committed, &mut self.tentative, &mut self.journal) {
                Ok(()) => {
                    report.committed += 1;
                    stats.commits = stats.commits.saturating_add(1);
                }
                Err(conflict) => {
                    trace!(
                        rule = rule.name,
                        register = conflict.register,
                        port = %conflict.port,
                        "rule aborted"
                    );
                    report.aborted += 1;
                    stats.aborts = stats.aborts.saturating_add(1);
                }
            }
        }
        report
    }
}

impl<D: RegisterFile> fmt::Debug for Scheduler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("rules", &self.rules).field("stats", &self.stats).finish()
    }
}

/// Runs one rule and either merges its effects into `committed` or restores
/// `tentative` from it.
fn fire<D: RegisterFile>(
    rule: &Rule<D>,
    start: &D::State,
    committed: &mut Log<D>,
    tentative: &mut Log<D>,
    journal: &mut AccessLog<D::Field>,
) -> AccessResult<()> {
    journal.clear();
    let tracking = match rule.footprint {
        Footprint::Whole => Tracking::Whole,
        Footprint::Static(fields) => Tracking::Declared(fields),
        Footprint::Dynamic => Tracking::Journal(&mut *journal),
    };
    let outcome = (rule.body)(&mut Tx::new(start, committed, tentative, tracking));

    match (&outcome, rule.footprint) {
        (Ok(()), Footprint::Whole) => committed.copy_from(tentative),
        (Err(_), Footprint::Whole) => tentative.copy_from(committed),
        (Ok(()), Footprint::Static(fields)) => {
            for &field in fields {
                committed.copy_field(tentative, field);
            }
        }
        (Err(_), Footprint::Static(fields)) => {
            for &field in fields {
                tentative.copy_field(committed, field);
            }
        }
        (Ok(()), Footprint::Dynamic) => journal.replay(committed, tentative),
        (Err(_), Footprint::Dynamic) => journal.unwind(tentative, committed),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Footprint, Rule, Scheduler};
    use crate::{Bits, Log};

    crate::register_file! {
        mod regs {
            ehr a: Bits<8> = Bits::new(10),
            plain b: Bits<8> = Bits::zero(),
            plain c: Bits<8> = Bits::zero(),
        }
    }

    use regs::{reg, Design, Field};

    /// Writes `a` and `b`, then refuses on a second `write1` of `a`.
    fn failing_rule(footprint: Footprint<Field>) -> Rule<Design> {
        Rule::<Design>::new("partial", |tx| {
            tx.write1(reg::a, Bits::new(1))?;
            tx.write0(reg::b, Bits::new(2))?;
            tx.write1(reg::a, Bits::new(3))?;
            Ok(())
        })
        .with_footprint(footprint)
    }

    #[rstest]
    #[case::whole(Footprint::Whole)]
    #[case::declared(Footprint::Static(&[Field::a, Field::b]))]
    #[case::journaled(Footprint::Dynamic)]
    fn aborted_rule_leaves_no_trace(#[case] footprint: Footprint<Field>) {
        let mut scheduler = Scheduler::new(vec![failing_rule(footprint)]);
        let mut log = Log::<Design>::initial();
        let before = log.clone();

        let report = scheduler.run_cycle(&mut log);
        assert_eq!(report.aborted, 1);
        assert_eq!(log, before);
        assert_eq!(scheduler.stats()[0].aborts, 1);
    }

    #[rstest]
    #[case::whole(Footprint::Whole)]
    #[case::declared(Footprint::Static(&[Field::c]))]
    #[case::journaled(Footprint::Dynamic)]
    fn later_rules_see_committed_writes(#[case] footprint: Footprint<Field>) {
        let rules = vec![
            Rule::<Design>::new("write", |tx| tx.write0(reg::a, Bits::new(42))).with_footprint(Footprint::Dynamic),
            Rule::<Design>::new("copy", |tx| {
                let value = tx.read1(reg::a)?;
                tx.write0(reg::c, value)
            })
            .with_footprint(match footprint {
                Footprint::Static(_) => Footprint::Static(&[Field::a, Field::c]),
                other => other,
            }),
        ];
        let mut scheduler = Scheduler::new(rules);
        let mut log = Log::<Design>::initial();
        let report = scheduler.run_cycle(&mut log);

        assert_eq!(report.committed, 2);
        assert_eq!(log.state.a, Bits::new(42));
        assert_eq!(log.state.c, Bits::new(42));
    }

    #[test]
    fn empty_scheduler_leaves_the_design_untouched() {
        let mut scheduler = Scheduler::<Design>::new(Vec::new());
        assert!(scheduler.rules().is_empty());
        let mut log = Log::<Design>::initial();
        let report = scheduler.run_cycle(&mut log);
        assert_eq!((report.committed, report.aborted), (0, 0));
        assert_eq!(log, Log::<Design>::initial());
    }

    #[test]
    fn conflict_sets_clear_between_cycles() {
        let rules = vec![Rule::<Design>::new("bump", |tx| {
            let value = tx.read0(reg::a)?;
            tx.write0(reg::a, value + Bits::new(1))
        })];
        let mut scheduler = Scheduler::new(rules);
        let mut log = Log::<Design>::initial();
        for _ in 0..5 {
            assert_eq!(scheduler.run_cycle(&mut log).committed, 1);
        }
        assert_eq!(log.state.a, Bits::new(15));
        assert_eq!(scheduler.stats()[0].commits, 5);
    }
}
