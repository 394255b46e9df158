#![no_main]

use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;
use rulesim_core::{pack, packable, unpack, Bits};

packable! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Pair {
        high: Bits<100>,
        low: Bits<37>,
    }
}

fn wide(bytes: &[u8]) -> Bits<100> {
    Bits::from_biguint(&BigUint::from_bytes_le(bytes))
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 34 {
        return;
    }
    let (left, rest) = data.split_at(16);
    let (right, rest) = rest.split_at(16);
    let shift = u32::from(rest[0]);
    let offset = u32::from(rest[1]);

    let a = wide(left);
    let b = wide(right);
    for value in [&a + &b, &a - &b, &a & &b, &a | &b, &a ^ &b, !&a, a.lsl(shift), a.lsr(shift), a.asr(shift)] {
        value.check_invariant();
    }

    let narrow = Bits::<37>::from_u128(u128::from_le_bytes(left.try_into().unwrap_or([0; 16])));
    narrow.check_invariant();
    let widened: Bits<100> = narrow.sext();
    assert_eq!(widened.truncate::<37>(), narrow);
    assert_eq!(narrow.to_i128(), widened.to_i128());
    let field: Bits<13> = a.islice(offset);
    field.check_invariant();

    let pair = Pair { high: a, low: narrow };
    let packed: Bits<137> = pack(&pair);
    assert_eq!(packed.slice::<0, 37>(), pair.low);
    assert_eq!(unpack::<Pair, 137>(&packed), pair);
});
