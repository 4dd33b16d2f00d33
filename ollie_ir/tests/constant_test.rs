//! Tests for constant folding and the constant predicates

use ollie_ir::constant::{
    fold_add, fold_add_raw, fold_logical_and, fold_logical_or, fold_mul, fold_sub,
};
use ollie_ir::{BasicType, ConstantValue, IrContext};
use proptest::prelude::*;

#[test]
fn test_logical_folds_on_literal_truthiness() {
    let c1 = ConstantValue::Int(0);
    let c2 = ConstantValue::Int(7);

    assert_eq!(
        fold_logical_or(&c1, &c2).expect("fold should succeed"),
        ConstantValue::ULong(1),
        "0 || 7 must produce a ULong 1"
    );
    assert_eq!(
        fold_logical_and(&c1, &c2).expect("fold should succeed"),
        ConstantValue::ULong(0),
        "0 && 7 must produce a ULong 0"
    );
}

#[test]
fn test_logical_or_short_circuits_on_truthy_operand_one() {
    // Operand 2 has no integer interpretation; a truthy operand 1 must not
    // read it.
    let truthy = ConstantValue::Int(3);
    let opaque = ConstantValue::String("not a number".to_string());
    assert_eq!(
        fold_logical_or(&truthy, &opaque).expect("short-circuit must skip operand 2"),
        ConstantValue::ULong(1)
    );

    let falsy = ConstantValue::Int(0);
    assert_eq!(
        fold_logical_and(&falsy, &opaque).expect("short-circuit must skip operand 2"),
        ConstantValue::ULong(0)
    );
}

#[test]
fn test_raw_fold_promotes_to_signed_long() {
    let c = ConstantValue::UByte(200);
    assert_eq!(
        fold_add_raw(&c, 100).expect("fold should succeed"),
        ConstantValue::Long(300),
        "raw folding promotes regardless of the prior kind"
    );
}

#[test]
fn test_fold_result_takes_operand_one_width() {
    let a = ConstantValue::Short(i16::MAX);
    let b = ConstantValue::Long(1);
    assert_eq!(
        fold_add(&a, &b).expect("fold should succeed"),
        ConstantValue::Short(i16::MIN),
        "arithmetic wraps at operand 1's width"
    );
}

#[test]
fn test_context_fold_interns_a_fresh_constant() {
    let mut ctx = IrContext::new();
    let ty = ctx.types.basic(BasicType::I32);
    let a = ctx.int_constant(20, ty).expect("constant should build");
    let b = ctx.int_constant(22, ty).expect("constant should build");

    let sum = ctx.fold_add(a, b).expect("fold should succeed");
    assert_ne!(sum, a, "folding must not reuse operand 1's handle");
    assert_eq!(ctx.constant(sum), &ConstantValue::Int(42));
    assert_eq!(
        ctx.constant(a),
        &ConstantValue::Int(20),
        "operand 1 is left untouched"
    );
}

#[test]
fn test_direct_constant_emitter_rejects_oversized_literals() {
    let mut ctx = IrContext::new();
    let i8_ty = ctx.types.basic(BasicType::I8);
    let err = ctx
        .int_constant(300, i8_ty)
        .expect_err("300 must not fit in an i8");
    assert!(
        err.to_string().contains("does not fit"),
        "the error should name the classification failure: {}",
        err
    );
}

#[test]
fn test_direct_constant_emitter_rejects_float_types() {
    let mut ctx = IrContext::new();
    let f32_ty = ctx.types.basic(BasicType::F32);
    assert!(
        ctx.int_constant(1, f32_ty).is_err(),
        "floats must go through the local-constant pool"
    );
}

#[test]
fn test_char_constant_kind() {
    let mut ctx = IrContext::new();
    let char_ty = ctx.types.basic(BasicType::Char);
    let c = ctx.int_constant(65, char_ty).expect("constant should build");
    assert_eq!(ctx.constant(c), &ConstantValue::Char(65));
}

proptest! {
    #[test]
    fn prop_add_zero_is_identity(a in any::<i32>()) {
        let lhs = ConstantValue::Int(a);
        let zero = ConstantValue::Int(0);
        prop_assert_eq!(fold_add(&lhs, &zero).unwrap(), ConstantValue::Int(a));
    }

    #[test]
    fn prop_mul_one_is_identity(a in any::<i64>()) {
        let lhs = ConstantValue::Long(a);
        let one = ConstantValue::Long(1);
        prop_assert_eq!(fold_mul(&lhs, &one).unwrap(), ConstantValue::Long(a));
    }

    #[test]
    fn prop_mul_zero_is_zero(a in any::<u32>()) {
        let lhs = ConstantValue::UInt(a);
        let zero = ConstantValue::UInt(0);
        prop_assert_eq!(fold_mul(&lhs, &zero).unwrap(), ConstantValue::UInt(0));
    }

    #[test]
    fn prop_sub_self_is_zero(a in any::<i32>()) {
        let lhs = ConstantValue::Int(a);
        let rhs = ConstantValue::Int(a);
        prop_assert_eq!(fold_sub(&lhs, &rhs).unwrap(), ConstantValue::Int(0));
    }

    #[test]
    fn prop_logical_or_zero_iff_both_zero(a in any::<i32>(), b in any::<i32>()) {
        let result = fold_logical_or(&ConstantValue::Int(a), &ConstantValue::Int(b)).unwrap();
        let expect_zero = a == 0 && b == 0;
        prop_assert_eq!(result, ConstantValue::ULong(if expect_zero { 0 } else { 1 }));
    }

    #[test]
    fn prop_logical_and_nonzero_iff_both_nonzero(a in any::<i32>(), b in any::<i32>()) {
        let result = fold_logical_and(&ConstantValue::Int(a), &ConstantValue::Int(b)).unwrap();
        let expect_one = a != 0 && b != 0;
        prop_assert_eq!(result, ConstantValue::ULong(if expect_one { 1 } else { 0 }));
    }

    #[test]
    fn prop_signed_power_of_two_has_one_bit_and_is_positive(v in any::<i32>()) {
        let c = ConstantValue::Int(v);
        let expected = v > 0 && v.count_ones() == 1;
        prop_assert_eq!(c.is_power_of_2(), expected);
    }

    #[test]
    fn prop_unsigned_power_of_two_has_one_bit(v in any::<u64>()) {
        let c = ConstantValue::ULong(v);
        prop_assert_eq!(c.is_power_of_2(), v.count_ones() == 1);
    }

    #[test]
    fn prop_lea_compatible_iff_one_two_four_eight(v in any::<i64>()) {
        let c = ConstantValue::Long(v);
        let expected = matches!(v, 1 | 2 | 4 | 8);
        prop_assert_eq!(c.is_lea_compatible_power_of_2(), expected);
    }
}
