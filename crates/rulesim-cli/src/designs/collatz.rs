use rulesim_core::{register_file, Bits, Rule};

register_file! {
    /// Collatz state with the running value on an EHR.
    pub mod layout {
        ehr x: Bits<32> = Bits::new(27),
        plain steps: Bits<16> = Bits::zero(),
    }
}

pub use layout::Design;
use layout::reg::{steps, x};

fn is_one(value: &Bits<32>) -> bool {
    *value == Bits::new(1)
}

/// One Collatz round per cycle: halve an even value on port 0, then apply
/// `3x + 1` to the forwarded value on port 1 when it is odd. A cycle can
/// therefore perform both steps.
#[must_use]
pub fn rules() -> Vec<Rule<Design>> {
    vec![
        Rule::<Design>::new("count", |tx| {
            if !is_one(&tx.read0(x)?) {
                let count = tx.read0(steps)?;
                tx.write0(steps, count + Bits::new(1))?;
            }
            Ok(())
        }),
        Rule::<Design>::new("divide", |tx| {
            let value = tx.read0(x)?;
            if !value.bit(0) {
                tx.write0(x, value.lsr(1))?;
            }
            Ok(())
        }),
        Rule::<Design>::new("multiply", |tx| {
            let value = tx.read1(x)?;
            if value.bit(0) && !is_one(&value) {
                tx.write1(x, value.lsl(1) + value + Bits::new(1))?;
            }
            Ok(())
        }),
    ]
}

#[cfg(test)]
mod tests {
    use rulesim_core::{init_and_run, Bits, Simulation};

    use super::rules;

    #[test]
    fn first_cycle_multiplies_odd_start() {
        let state = init_and_run(rules(), 1);
        assert_eq!(state.x, Bits::new(82));
        assert_eq!(state.steps, Bits::new(1));
    }

    #[test]
    fn forwarding_halves_and_multiplies_in_one_cycle() {
        let mut sim = Simulation::with_state(super::layout::State { x: Bits::new(6), steps: Bits::zero() }, rules());
        sim.step();
        assert_eq!(sim.state().x, Bits::new(10));
    }

    #[test]
    fn reaches_one_and_stays() {
        let state = init_and_run(rules(), 1000);
        assert_eq!(state.x, Bits::new(1));
        let settled = state.steps;
        assert!(settled > Bits::new(0));
        assert!(settled < Bits::new(111));
        assert_eq!(init_and_run(rules(), 2000).steps, settled);
    }
}
