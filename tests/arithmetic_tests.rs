use quasm::arithmetic::QInteger;
use quasm::quantum::Circuit;

#[test]
fn test_adder_all_two_bit_pairs() {
    for a in 0..4u64 {
        for b in 0..4u64 {
            let mut circuit = Circuit::seeded(a * 4 + b);
            let sum = QInteger::from_int(a)
                .add_on(&QInteger::from_int(b), &mut circuit)
                .unwrap();
            assert_eq!(sum.to_int(), a + b, "{} + {}", a, b);
        }
    }
}

#[test]
fn test_adder_width_is_one_more_than_widest_operand() {
    let sum = QInteger::from_int(2).add(&QInteger::from_int(1)).unwrap();
    assert_eq!(sum.width(), 3);
    assert_eq!(sum.to_string(), "011");
}

#[test]
fn test_adder_carries_through_three_bits() {
    for (a, b) in [(7u64, 1u64), (6, 7)] {
        let sum = QInteger::from_int(a).add(&QInteger::from_int(b)).unwrap();
        assert_eq!(sum.to_int(), a + b, "{} + {}", a, b);
        assert_eq!(sum.width(), 4);
    }
}

#[test]
fn test_adder_four_bit_carry_chain() {
    for (a, b) in [(15u64, 1u64), (9, 7), (10, 5)] {
        let mut circuit = Circuit::seeded(a + b);
        let sum = QInteger::from_int(a)
            .add_on(&QInteger::from_int(b), &mut circuit)
            .unwrap();
        assert_eq!(sum.to_int(), a + b, "{} + {}", a, b);
        assert_eq!(sum.width(), 5);
    }
}

#[test]
fn test_adder_with_padded_operands() {
    let left = QInteger::from_bits(vec![false, true]);
    let right = QInteger::from_int(3);
    assert_eq!(left.add(&right).unwrap().to_int(), 4);
}
