use rulesim_core::{register_file, AccessResult, Bits, Footprint, Rule, Tx};

register_file! {
    /// Generator, routing wire and four scatter targets.
    pub mod layout {
        plain seed: Bits<8> = Bits::new(1),
        wire value: Bits<8> = Bits::zero(),
        plain cursor: Bits<2> = Bits::zero(),
        plain r0: Bits<8> = Bits::zero(),
        plain r1: Bits<8> = Bits::zero(),
        plain r2: Bits<8> = Bits::zero(),
        plain r3: Bits<8> = Bits::zero(),
        plain totals: [Bits<10>; 2] = [Bits::zero(); 2],
    }
}

pub use layout::Design;
use layout::reg;

fn store(tx: &mut Tx<'_, Design>, target: Bits<2>, value: Bits<8>) -> AccessResult<()> {
    match target.to_u64() {
        0 => tx.write0(reg::r0, value),
        1 => tx.write0(reg::r1, value),
        2 => tx.write0(reg::r2, value),
        _ => tx.write0(reg::r3, value),
    }
}

/// `produce` steps an LCG and puts its value on the wire; `scatter` forwards
/// it to the register picked by `cursor`, so its footprint is only known at
/// run time; `total` sums even and odd targets from the pre-cycle values;
/// `jam` tries to drive the wire late and is always refused.
#[must_use]
pub fn rules() -> Vec<Rule<Design>> {
    vec![
        Rule::<Design>::new("produce", |tx| {
            let seed = tx.read0(reg::seed)?;
            tx.write0(reg::value, seed)?;
            tx.write0(reg::seed, seed.lsl(2) + seed + Bits::new(1))
        }),
        Rule::<Design>::new("scatter", |tx| {
            let cursor = tx.read0(reg::cursor)?;
            let value = tx.read1(reg::value)?;
            store(tx, cursor, value)?;
            tx.write0(reg::cursor, cursor + Bits::new(1))
        })
        .with_footprint(Footprint::Dynamic),
        Rule::<Design>::new("total", |tx| {
            let even = tx.read0(reg::r0)?.zext::<10>() + tx.read0(reg::r2)?.zext();
            let odd = tx.read0(reg::r1)?.zext::<10>() + tx.read0(reg::r3)?.zext();
            tx.write0(reg::totals, [even, odd])
        }),
        Rule::<Design>::new("jam", |tx| tx.write0(reg::value, Bits::ones())),
    ]
}

#[cfg(test)]
mod tests {
    use rulesim_core::{init_and_run, Bits, Simulation};

    use super::rules;

    #[test]
    fn cursor_selects_each_target_in_turn() {
        let state = init_and_run(rules(), 4);
        assert_eq!(state.r0, Bits::new(1));
        assert_eq!(state.r1, Bits::new(6));
        assert_eq!(state.r2, Bits::new(31));
        assert_eq!(state.r3, Bits::new(156));
        assert_eq!(state.cursor, Bits::new(0));
        assert_eq!(state.totals, [Bits::new(32), Bits::new(6)]);
    }

    #[test]
    fn late_wire_driver_is_always_refused() {
        let mut sim = Simulation::new(rules());
        sim.run(20);
        let jam = sim.stats().find(|(name, _)| *name == "jam").map(|(_, stats)| stats);
        assert_eq!(jam.map(|stats| (stats.commits, stats.aborts)), Some((0, 20)));
        assert_ne!(sim.state().value, Bits::ones());
    }
}
