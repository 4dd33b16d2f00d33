//! Tests for branch/set condition-code selection
//!
//! The table must match the specification row for row, and selecting with
//! inverted polarity must always yield the logical inverse under integer
//! comparison semantics.

use ollie_ir::{select_branch, select_set, ConditionCode, Operator, Polarity};
use proptest::prelude::*;

use ConditionCode::*;
use Operator::*;
use Polarity::*;

#[test]
fn test_signed_relational_table() {
    let rows = [
        (GreaterThan, Greater, LessOrEqual),
        (LessThan, Less, GreaterOrEqual),
        (GreaterThanOrEq, GreaterOrEqual, Less),
        (LessThanOrEq, LessOrEqual, Greater),
        (Equals, Equal, NotEqual),
        (NotEquals, NotEqual, Equal),
    ];
    for (op, normal, inverse) in rows {
        assert_eq!(
            select_branch(op, Normal, true),
            normal,
            "signed normal row for {}",
            op
        );
        assert_eq!(
            select_branch(op, Inverse, true),
            inverse,
            "signed inverse row for {}",
            op
        );
    }
}

#[test]
fn test_unsigned_relational_table() {
    let rows = [
        (GreaterThan, Above, BelowOrEqual),
        (LessThan, Below, AboveOrEqual),
        (GreaterThanOrEq, AboveOrEqual, Below),
        (LessThanOrEq, BelowOrEqual, Above),
        (Equals, Equal, NotEqual),
        (NotEquals, NotEqual, Equal),
    ];
    for (op, normal, inverse) in rows {
        assert_eq!(
            select_branch(op, Normal, false),
            normal,
            "unsigned normal row for {}",
            op
        );
        assert_eq!(
            select_branch(op, Inverse, false),
            inverse,
            "unsigned inverse row for {}",
            op
        );
    }
}

#[test]
fn test_logical_not_row_tests_for_zero() {
    assert_eq!(select_branch(LogicalNot, Normal, true), Zero);
    assert_eq!(select_branch(LogicalNot, Inverse, true), NotZero);
    assert_eq!(select_branch(LogicalNot, Normal, false), Zero);
}

#[test]
fn test_catch_all_row_tests_for_not_zero() {
    for op in [Plus, Minus, Star, BitwiseAnd, LogicalOr] {
        assert_eq!(
            select_branch(op, Normal, true),
            NotZero,
            "non-relational {} branches on not-zero",
            op
        );
        assert_eq!(select_branch(op, Inverse, true), Zero);
    }
}

#[test]
fn test_set_selection_follows_the_branch_table() {
    for op in [GreaterThan, LessThan, Equals, NotEquals, LogicalNot, Plus] {
        for polarity in [Normal, Inverse] {
            for signed in [true, false] {
                assert_eq!(
                    select_set(op, polarity, signed),
                    select_branch(op, polarity, signed),
                    "set and branch selection must agree for {}",
                    op
                );
            }
        }
    }
}

/// Evaluate a condition code against the outcome of `cmp b, a` (AT&T order:
/// the flags describe `a - b`).
fn condition_holds(code: ConditionCode, a: i64, b: i64) -> bool {
    let (ua, ub) = (a as u64, b as u64);
    match code {
        Equal | Zero => a == b,
        NotEqual | NotZero => a != b,
        Greater => a > b,
        GreaterOrEqual => a >= b,
        Less => a < b,
        LessOrEqual => a <= b,
        Above => ua > ub,
        AboveOrEqual => ua >= ub,
        Below => ua < ub,
        BelowOrEqual => ua <= ub,
    }
}

fn relational_operators() -> [Operator; 6] {
    [
        GreaterThan,
        LessThan,
        GreaterThanOrEq,
        LessThanOrEq,
        Equals,
        NotEquals,
    ]
}

proptest! {
    #[test]
    fn prop_inverse_polarity_is_the_logical_inverse(
        a in any::<i64>(),
        b in any::<i64>(),
        op_index in 0usize..6,
        signed in any::<bool>(),
    ) {
        let op = relational_operators()[op_index];
        let normal = select_branch(op, Normal, signed);
        let inverse = select_branch(op, Inverse, signed);
        prop_assert_eq!(
            condition_holds(normal, a, b),
            !condition_holds(inverse, a, b),
            "normal and inverse selections must partition every input pair"
        );
    }

    #[test]
    fn prop_normal_selection_matches_operator_semantics(
        a in any::<i64>(),
        b in any::<i64>(),
        op_index in 0usize..6,
    ) {
        let op = relational_operators()[op_index];
        let signed_expected = match op {
            GreaterThan => a > b,
            LessThan => a < b,
            GreaterThanOrEq => a >= b,
            LessThanOrEq => a <= b,
            Equals => a == b,
            NotEquals => a != b,
            _ => unreachable!(),
        };
        let code = select_branch(op, Normal, true);
        prop_assert_eq!(condition_holds(code, a, b), signed_expected);

        let (ua, ub) = (a as u64, b as u64);
        let unsigned_expected = match op {
            GreaterThan => ua > ub,
            LessThan => ua < ub,
            GreaterThanOrEq => ua >= ub,
            LessThanOrEq => ua <= ub,
            Equals => ua == ub,
            NotEquals => ua != ub,
            _ => unreachable!(),
        };
        let code = select_branch(op, Normal, false);
        prop_assert_eq!(condition_holds(code, a, b), unsigned_expected);
    }
}
