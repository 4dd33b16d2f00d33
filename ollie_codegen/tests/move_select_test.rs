//! Tests for move and conversion selection
//!
//! Selection must be sound for every (source width, destination width,
//! signedness) tuple: widening pairs choose the canonical MOVS/MOVZ form,
//! cross-class pairs choose the CVT families, and truncating
//! float-to-integer conversions always use CVTT*.

use ollie_codegen::moves::{memory_direction, select_move, MoveSelection};
use ollie_codegen::Opcode;
use ollie_ir::{MemoryAccessType, VariableSize};

use VariableSize::*;

fn one(selection: MoveSelection) -> Opcode {
    match selection {
        MoveSelection::One(opcode) => opcode,
        MoveSelection::Two { first, second } => {
            panic!("expected one opcode, found {:?} then {:?}", first, second)
        }
    }
}

#[test]
fn test_equal_width_integer_moves() {
    assert_eq!(one(select_move(Byte, Byte, true).unwrap()), Opcode::Movb);
    assert_eq!(one(select_move(Word, Word, false).unwrap()), Opcode::Movw);
    assert_eq!(
        one(select_move(DoubleWord, DoubleWord, true).unwrap()),
        Opcode::Movl
    );
    assert_eq!(
        one(select_move(QuadWord, QuadWord, false).unwrap()),
        Opcode::Movq
    );
}

#[test]
fn test_signed_widening_uses_movs_family() {
    let rows = [
        (Byte, Word, Opcode::Movsbw),
        (Byte, DoubleWord, Opcode::Movsbl),
        (Byte, QuadWord, Opcode::Movsbq),
        (Word, DoubleWord, Opcode::Movswl),
        (Word, QuadWord, Opcode::Movswq),
        (DoubleWord, QuadWord, Opcode::Movslq),
    ];
    for (src, dst, expected) in rows {
        assert_eq!(
            one(select_move(src, dst, true).unwrap()),
            expected,
            "signed widening {:?} -> {:?}",
            src,
            dst
        );
    }
}

#[test]
fn test_unsigned_widening_uses_canonical_movz_family() {
    let rows = [
        (Byte, Word, Opcode::Movzbw),
        (Byte, DoubleWord, Opcode::Movzbl),
        (Byte, QuadWord, Opcode::Movzbq),
        (Word, DoubleWord, Opcode::Movzwl),
        (Word, QuadWord, Opcode::Movzwq),
    ];
    for (src, dst, expected) in rows {
        assert_eq!(
            one(select_move(src, dst, false).unwrap()),
            expected,
            "unsigned widening {:?} -> {:?}",
            src,
            dst
        );
    }
}

#[test]
fn test_unsigned_dword_to_qword_relies_on_implicit_zero_extension() {
    // There is no MOVZLQ; a 32-bit register write zero-extends.
    assert_eq!(
        one(select_move(DoubleWord, QuadWord, false).unwrap()),
        Opcode::Movl
    );
}

#[test]
fn test_narrowing_moves_at_destination_width() {
    assert_eq!(one(select_move(QuadWord, Byte, true).unwrap()), Opcode::Movb);
    assert_eq!(
        one(select_move(DoubleWord, Word, false).unwrap()),
        Opcode::Movw
    );
}

#[test]
fn test_floating_point_moves_and_conversions() {
    assert_eq!(
        one(select_move(SinglePrecision, SinglePrecision, true).unwrap()),
        Opcode::Movss
    );
    assert_eq!(
        one(select_move(DoublePrecision, DoublePrecision, true).unwrap()),
        Opcode::Movsd
    );
    assert_eq!(
        one(select_move(SinglePrecision, DoublePrecision, true).unwrap()),
        Opcode::Cvtss2sd
    );
    assert_eq!(
        one(select_move(DoublePrecision, SinglePrecision, true).unwrap()),
        Opcode::Cvtsd2ss
    );
}

#[test]
fn test_integer_to_float_conversions() {
    assert_eq!(
        one(select_move(DoubleWord, SinglePrecision, true).unwrap()),
        Opcode::Cvtsi2ssl
    );
    assert_eq!(
        one(select_move(QuadWord, SinglePrecision, true).unwrap()),
        Opcode::Cvtsi2ssq
    );
    assert_eq!(
        one(select_move(DoubleWord, DoublePrecision, true).unwrap()),
        Opcode::Cvtsi2sdl
    );
    assert_eq!(
        one(select_move(QuadWord, DoublePrecision, true).unwrap()),
        Opcode::Cvtsi2sdq
    );
}

#[test]
fn test_small_integer_to_float_widens_first() {
    match select_move(Byte, DoublePrecision, true).unwrap() {
        MoveSelection::Two { first, second } => {
            assert_eq!(first, Opcode::Movsbl, "signed byte widens to 32 bits");
            assert_eq!(second, Opcode::Cvtsi2sdl);
        }
        other => panic!("expected a two-step conversion, found {:?}", other),
    }
    match select_move(Word, SinglePrecision, false).unwrap() {
        MoveSelection::Two { first, second } => {
            assert_eq!(first, Opcode::Movzwl, "unsigned word widens to 32 bits");
            assert_eq!(second, Opcode::Cvtsi2ssl);
        }
        other => panic!("expected a two-step conversion, found {:?}", other),
    }
}

#[test]
fn test_float_to_integer_always_truncates() {
    assert_eq!(
        one(select_move(SinglePrecision, DoubleWord, true).unwrap()),
        Opcode::Cvttss2sil
    );
    assert_eq!(
        one(select_move(SinglePrecision, QuadWord, true).unwrap()),
        Opcode::Cvttss2siq
    );
    assert_eq!(
        one(select_move(DoublePrecision, DoubleWord, true).unwrap()),
        Opcode::Cvttsd2sil
    );
    assert_eq!(
        one(select_move(DoublePrecision, QuadWord, true).unwrap()),
        Opcode::Cvttsd2siq
    );
}

#[test]
fn test_float_to_narrow_integer_truncates_then_moves() {
    match select_move(DoublePrecision, Byte, true).unwrap() {
        MoveSelection::Two { first, second } => {
            assert_eq!(first, Opcode::Cvttsd2sil);
            assert_eq!(second, Opcode::Movb);
        }
        other => panic!("expected a two-step conversion, found {:?}", other),
    }
}

#[test]
fn test_widening_is_sound_for_all_integer_pairs() {
    // Decoding the chosen opcode must reproduce the identity whenever
    // src_width <= dst_width.
    let widths = [Byte, Word, DoubleWord, QuadWord];
    for src in widths {
        for dst in widths {
            if src.bytes() > dst.bytes() {
                continue;
            }
            for signed in [true, false] {
                let opcode = one(select_move(src, dst, signed).unwrap());
                let name = opcode.mnemonic();
                if src == dst {
                    assert_eq!(
                        opcode,
                        Opcode::mov(dst),
                        "same-width move for {:?} must be the plain form",
                        src
                    );
                } else if signed {
                    assert!(
                        name.starts_with("movs"),
                        "signed widening {:?} -> {:?} must sign-extend, chose {}",
                        src,
                        dst,
                        name
                    );
                } else {
                    assert!(
                        name.starts_with("movz") || opcode == Opcode::Movl,
                        "unsigned widening {:?} -> {:?} must zero-extend, chose {}",
                        src,
                        dst,
                        name
                    );
                }
            }
        }
    }
}

#[test]
fn test_memory_direction_classification() {
    assert_eq!(
        memory_direction(true, false).unwrap(),
        MemoryAccessType::Read
    );
    assert_eq!(
        memory_direction(false, true).unwrap(),
        MemoryAccessType::Write
    );
    assert_eq!(
        memory_direction(false, false).unwrap(),
        MemoryAccessType::None
    );
    assert!(
        memory_direction(true, true).is_err(),
        "memory-to-memory moves cannot be encoded"
    );
}
