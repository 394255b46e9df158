use rulesim_core::{register_file, Bits, Rule};

register_file! {
    /// Single-bit plain register.
    pub mod layout {
        plain flag: Bits<1> = Bits::new(0),
    }
}

pub use layout::Design;
use layout::reg::flag;

/// `set` writes 1; `flip` writes the complement of the pre-cycle value and
/// is refused whenever `set` has already written.
#[must_use]
pub fn rules() -> Vec<Rule<Design>> {
    vec![
        Rule::<Design>::new("set", |tx| tx.write0(flag, Bits::new(1))),
        Rule::<Design>::new("flip", |tx| {
            let value = tx.read0(flag)?;
            tx.write0(flag, !value)
        }),
    ]
}
